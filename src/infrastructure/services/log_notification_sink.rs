// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::log_entry::LogEntry;
use crate::domain::models::task::Task;
use crate::domain::services::notification_service::NotificationSink;
use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info, warn};

/// 把通知写入日志的通知实现
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn send_failure_notification(&self, task: &Task, entry: &LogEntry) -> Result<()> {
        if entry.success {
            info!(
                task_id = task.id,
                address = %task.address,
                access_type = %task.access_type,
                "Task recovered: {}",
                entry.message
            );
        } else {
            warn!(
                task_id = task.id,
                address = %task.address,
                access_type = %task.access_type,
                failure_count = task.failure_count,
                "Task failed: {}",
                entry.message
            );
        }
        Ok(())
    }

    async fn send_alarm_notification(&self, task: &Task, entry: &LogEntry) -> Result<()> {
        error!(
            task_id = task.id,
            address = %task.address,
            "High priority task failed: {}",
            entry.message
        );
        Ok(())
    }

    async fn send_foreground_status_notification(&self) -> Result<()> {
        info!("Scheduler running in foreground mode");
        Ok(())
    }

    async fn clear_foreground_status_notification(&self) -> Result<()> {
        info!("Scheduler left foreground mode");
        Ok(())
    }
}
