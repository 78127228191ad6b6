// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::log_entry::LogEntry;
use crate::domain::models::task::Task;
use crate::domain::services::notification_service::NotificationSink;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// 把通知转发给多个实现
///
/// 单个实现失败不会影响其余实现，全部尝试后汇总错误
#[derive(Default, Clone)]
pub struct FanoutNotificationSink {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl FanoutNotificationSink {
    pub fn new(sinks: Vec<Arc<dyn NotificationSink>>) -> Self {
        Self { sinks }
    }

    pub fn with(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    fn collect(results: Vec<Result<()>>) -> Result<()> {
        let errors: Vec<String> = results
            .into_iter()
            .filter_map(|result| result.err())
            .inspect(|e| warn!("Notification sink failed: {}", e))
            .map(|e| e.to_string())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("{} notification sink(s) failed: {}", errors.len(), errors.join("; ")))
        }
    }
}

#[async_trait]
impl NotificationSink for FanoutNotificationSink {
    async fn send_failure_notification(&self, task: &Task, entry: &LogEntry) -> Result<()> {
        let results = futures::future::join_all(
            self.sinks
                .iter()
                .map(|sink| sink.send_failure_notification(task, entry)),
        )
        .await;
        Self::collect(results)
    }

    async fn send_alarm_notification(&self, task: &Task, entry: &LogEntry) -> Result<()> {
        let results = futures::future::join_all(
            self.sinks
                .iter()
                .map(|sink| sink.send_alarm_notification(task, entry)),
        )
        .await;
        Self::collect(results)
    }

    async fn send_foreground_status_notification(&self) -> Result<()> {
        let results = futures::future::join_all(
            self.sinks
                .iter()
                .map(|sink| sink.send_foreground_status_notification()),
        )
        .await;
        Self::collect(results)
    }

    async fn clear_foreground_status_notification(&self) -> Result<()> {
        let results = futures::future::join_all(
            self.sinks
                .iter()
                .map(|sink| sink.clear_foreground_status_notification()),
        )
        .await;
        Self::collect(results)
    }
}
