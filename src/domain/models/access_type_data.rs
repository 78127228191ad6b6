// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 每个任务的探测参数
///
/// 工作器只读取这些值，从不修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTypeData {
    pub id: i64,
    pub task_id: i64,
    /// 每次执行发送的 ping 次数
    pub ping_count: u32,
    /// ping 负载大小（字节）
    pub ping_package_size: u32,
    /// 每次执行尝试连接的次数
    pub connect_count: u32,
    /// 首次成功后停止剩余尝试
    pub stop_on_success: bool,
    /// 下载时忽略证书错误
    pub ignore_ssl_error: bool,
}

impl AccessTypeData {
    pub fn for_task(task_id: i64) -> Self {
        Self {
            task_id,
            ..Self::default()
        }
    }
}

impl Default for AccessTypeData {
    fn default() -> Self {
        Self {
            id: 0,
            task_id: 0,
            ping_count: 3,
            ping_package_size: 56,
            connect_count: 1,
            stop_on_success: false,
            ignore_ssl_error: false,
        }
    }
}
