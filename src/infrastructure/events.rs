// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Serialize;
use tokio::sync::broadcast;

/// 状态变化事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "task_id", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// 任务的运行状态或计数器发生变化
    TaskChanged(i64),
    /// 任务新增了日志
    LogChanged(i64),
}

/// 进程内事件总线
///
/// 没有订阅者时事件被直接丢弃
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<MonitorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.sender.subscribe()
    }

    pub fn task_changed(&self, task_id: i64) {
        let _ = self.sender.send(MonitorEvent::TaskChanged(task_id));
    }

    pub fn log_changed(&self, task_id: i64) {
        let _ = self.sender.send(MonitorEvent::LogChanged(task_id));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
