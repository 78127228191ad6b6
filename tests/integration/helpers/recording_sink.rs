// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use async_trait::async_trait;
use netwatch::domain::models::log_entry::LogEntry;
use netwatch::domain::models::task::Task;
use netwatch::domain::services::notification_service::NotificationSink;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 记录所有通知的通知服务
#[derive(Default)]
pub struct RecordingSink {
    failures: Mutex<Vec<(Task, LogEntry)>>,
    alarms: Mutex<Vec<i64>>,
    foreground_raised: AtomicUsize,
    foreground_cleared: AtomicUsize,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn failures(&self) -> Vec<(Task, LogEntry)> {
        self.failures.lock().clone()
    }

    /// 每次通知时任务的连续失败次数
    pub fn failure_counts(&self) -> Vec<u32> {
        self.failures
            .lock()
            .iter()
            .map(|(task, _)| task.failure_count)
            .collect()
    }

    pub fn alarms(&self) -> Vec<i64> {
        self.alarms.lock().clone()
    }

    pub fn foreground_raised(&self) -> usize {
        self.foreground_raised.load(Ordering::SeqCst)
    }

    pub fn foreground_cleared(&self) -> usize {
        self.foreground_cleared.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send_failure_notification(&self, task: &Task, entry: &LogEntry) -> Result<()> {
        self.failures.lock().push((task.clone(), entry.clone()));
        Ok(())
    }

    async fn send_alarm_notification(&self, task: &Task, _entry: &LogEntry) -> Result<()> {
        self.alarms.lock().push(task.id);
        Ok(())
    }

    async fn send_foreground_status_notification(&self) -> Result<()> {
        self.foreground_raised.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear_foreground_status_notification(&self) -> Result<()> {
        self.foreground_cleared.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
