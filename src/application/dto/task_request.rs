// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::access_type_data::AccessTypeData;
use crate::domain::models::log_entry::LogEntry;
use crate::domain::models::task::{AccessType, Task};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 创建或修改任务的请求DTO
///
/// 修改时整体替换任务定义，运行状态和计数器不受影响
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct TaskRequestDto {
    /// 目标地址（主机名、IP 或下载 URL）
    #[validate(length(min = 1, max = 2048))]
    pub address: String,

    /// 目标端口，Connect 类型必填
    pub port: Option<u16>,

    /// 探测方式
    pub access_type: AccessType,

    /// 执行间隔（分钟）
    #[validate(range(min = 1, max = 525600))]
    pub interval_minutes: u32,

    pub only_when_preferred_network: Option<bool>,

    pub notify_on_failure: Option<bool>,

    pub high_priority: Option<bool>,

    /// 探测参数，未提供时使用默认值
    #[validate(nested)]
    pub access_type_data: Option<AccessTypeDataDto>,
}

impl TaskRequestDto {
    /// 转换为任务定义
    ///
    /// # 参数
    ///
    /// * `id` - 任务ID，新建时为 0
    pub fn to_task(&self, id: i64) -> Task {
        let mut task = Task::new(self.address.trim(), self.access_type, self.interval_minutes);
        task.id = id;
        task.port = self.port.unwrap_or(0);
        task.only_when_preferred_network = self.only_when_preferred_network.unwrap_or(false);
        task.notify_on_failure = self.notify_on_failure.unwrap_or(false);
        task.high_priority = self.high_priority.unwrap_or(false);
        task
    }

    /// 转换为探测参数
    pub fn to_access_type_data(&self, task_id: i64) -> AccessTypeData {
        let mut data = AccessTypeData::for_task(task_id);
        if let Some(dto) = &self.access_type_data {
            data.ping_count = dto.ping_count.unwrap_or(data.ping_count);
            data.ping_package_size = dto.ping_package_size.unwrap_or(data.ping_package_size);
            data.connect_count = dto.connect_count.unwrap_or(data.connect_count);
            data.stop_on_success = dto.stop_on_success.unwrap_or(data.stop_on_success);
            data.ignore_ssl_error = dto.ignore_ssl_error.unwrap_or(data.ignore_ssl_error);
        }
        data
    }
}

/// 探测参数DTO
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct AccessTypeDataDto {
    #[validate(range(min = 1, max = 100))]
    pub ping_count: Option<u32>,

    /// ICMP 负载字节数
    #[validate(range(max = 65500))]
    pub ping_package_size: Option<u32>,

    #[validate(range(min = 1, max = 100))]
    pub connect_count: Option<u32>,

    pub stop_on_success: Option<bool>,

    pub ignore_ssl_error: Option<bool>,
}

/// 任务详情响应DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponseDto {
    pub task: Task,
    pub access_type_data: AccessTypeData,
    /// 下一次执行的预计时间，没有待触发的闹钟时为空
    pub next_run_at: Option<DateTime<Local>>,
}

/// 日志查询参数
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct LogQueryDto {
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
}

/// 日志查询响应DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogResponseDto {
    pub task_id: i64,
    pub entries: Vec<LogEntry>,
}
