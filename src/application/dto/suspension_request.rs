// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::suspension::SuspensionInterval;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 新增挂起窗口的请求DTO
///
/// 时间以一天中的分钟数表示，`end_minute < start_minute` 表示跨越午夜
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SuspensionIntervalRequestDto {
    #[validate(range(max = 1439))]
    pub start_minute: u32,

    #[validate(range(max = 1439))]
    pub end_minute: u32,
}

/// 开关时间挂起的请求DTO
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SuspensionToggleDto {
    pub enabled: bool,
}

/// 挂起状态响应DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspensionStatusDto {
    pub enabled: bool,
    pub running: bool,
    pub suspended: bool,
    pub epoch: u64,
    pub intervals: Vec<SuspensionInterval>,
    /// 下一次挂起或恢复的时间
    pub next_transition_at: Option<DateTime<Local>>,
}
