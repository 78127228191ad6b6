// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::log_entry::LogEntry;
use crate::domain::models::task::Task;
use anyhow::Result;
use async_trait::async_trait;

/// 通知服务特质
///
/// 定义失败通知、告警通知和前台状态通知的发送接口
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// 发送失败状态通知
    ///
    /// 在 CHANGE 策略下，恢复成功时同样通过此方法发送，`entry.success` 为 true
    ///
    /// # 参数
    ///
    /// * `task` - 相关任务
    /// * `entry` - 触发通知的日志条目
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 发送成功
    /// * `Err(anyhow::Error)` - 发送失败
    async fn send_failure_notification(&self, task: &Task, entry: &LogEntry) -> Result<()>;

    /// 高优先级任务的告警式通知
    async fn send_alarm_notification(&self, _task: &Task, _entry: &LogEntry) -> Result<()> {
        Ok(())
    }

    /// 前台状态通知，表示调度器正在持续运行
    async fn send_foreground_status_notification(&self) -> Result<()>;

    /// 撤销前台状态通知
    async fn clear_foreground_status_notification(&self) -> Result<()> {
        Ok(())
    }
}
