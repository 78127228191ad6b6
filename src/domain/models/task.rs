// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 从未被调度过时 `last_scheduled` 的取值
pub const NEVER_SCHEDULED: i64 = -1;

/// 网络监控任务
///
/// 描述一个周期性执行的可达性检查。`generation_id` 在每次启动或
/// 编辑时递增，携带旧代号的闹钟和执行一律视为过期。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// 任务唯一标识符
    pub id: i64,
    /// 调度代号，用于识别过期的闹钟和执行
    pub generation_id: i64,
    /// 目标地址（主机名、IP 或下载 URL）
    pub address: String,
    /// 目标端口，仅 Connect 类型使用
    pub port: u16,
    /// 探测方式
    pub access_type: AccessType,
    /// 执行间隔（分钟），至少为 1
    pub interval_minutes: u32,
    /// 仅在首选网络可用时执行
    pub only_when_preferred_network: bool,
    /// 是否发送失败通知
    pub notify_on_failure: bool,
    /// 任务是否处于运行状态
    pub running: bool,
    /// 当前正在执行的实例数
    pub active_instances: u32,
    /// 连续失败次数
    pub failure_count: u32,
    /// 最近一次执行的时间戳（毫秒），从未执行时为 -1
    pub last_scheduled: i64,
    /// 高优先级任务会额外触发告警式通知
    pub high_priority: bool,
}

impl Task {
    /// 创建一个尚未持久化的新任务
    ///
    /// # 参数
    ///
    /// * `address` - 目标地址
    /// * `access_type` - 探测方式
    /// * `interval_minutes` - 执行间隔（分钟）
    ///
    /// # 返回值
    ///
    /// 返回 `id` 和 `generation_id` 均为 0 的任务
    pub fn new(address: impl Into<String>, access_type: AccessType, interval_minutes: u32) -> Self {
        Self {
            id: 0,
            generation_id: 0,
            address: address.into(),
            port: 0,
            access_type,
            interval_minutes: interval_minutes.max(1),
            only_when_preferred_network: false,
            notify_on_failure: false,
            running: false,
            active_instances: 0,
            failure_count: 0,
            last_scheduled: NEVER_SCHEDULED,
            high_priority: false,
        }
    }

    /// 执行间隔（毫秒）
    pub fn interval_millis(&self) -> i64 {
        i64::from(self.interval_minutes.max(1)) * 60_000
    }

    /// 是否曾经被调度执行
    pub fn was_scheduled(&self) -> bool {
        self.last_scheduled >= 0
    }

    /// 校验任务定义是否合法
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.address.trim().is_empty() {
            return Err(DomainError::InvalidTask("address cannot be empty".to_string()));
        }
        if self.interval_minutes < 1 {
            return Err(DomainError::InvalidTask(
                "interval must be at least one minute".to_string(),
            ));
        }
        if self.access_type == AccessType::Connect && self.port == 0 {
            return Err(DomainError::InvalidTask(
                "connect tasks require a port".to_string(),
            ));
        }
        Ok(())
    }
}

/// 探测方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    /// ICMP echo
    #[default]
    Ping,
    /// TCP 连接
    Connect,
    /// HTTP(S) 下载
    Download,
    /// 不访问网络，只记录一条成功日志
    Null,
}

impl AccessType {
    pub const ALL: [AccessType; 4] = [
        AccessType::Ping,
        AccessType::Connect,
        AccessType::Download,
        AccessType::Null,
    ];
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AccessType::Ping => write!(f, "ping"),
            AccessType::Connect => write!(f, "connect"),
            AccessType::Download => write!(f, "download"),
            AccessType::Null => write!(f, "null"),
        }
    }
}

impl FromStr for AccessType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ping" => Ok(AccessType::Ping),
            "connect" => Ok(AccessType::Connect),
            "download" => Ok(AccessType::Download),
            "null" => Ok(AccessType::Null),
            other => Err(DomainError::UnknownAccessType(other.to_string())),
        }
    }
}

/// 领域错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid task: {0}")]
    InvalidTask(String),
    #[error("invalid suspension interval: {0}")]
    InvalidInterval(String),
    #[error("unknown access type: {0}")]
    UnknownAccessType(String),
}
