// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 一次探测执行的结果记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub task_id: i64,
    pub success: bool,
    /// 毫秒时间戳
    pub timestamp: i64,
    pub message: String,
}

impl LogEntry {
    pub fn new(task_id: i64, success: bool, timestamp: i64, message: impl Into<String>) -> Self {
        Self {
            id: 0,
            task_id,
            success,
            timestamp,
            message: message.into(),
        }
    }

    pub fn success(task_id: i64, timestamp: i64, message: impl Into<String>) -> Self {
        Self::new(task_id, true, timestamp, message)
    }

    pub fn failure(task_id: i64, timestamp: i64, message: impl Into<String>) -> Self {
        Self::new(task_id, false, timestamp, message)
    }
}
