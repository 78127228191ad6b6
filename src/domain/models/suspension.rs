// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::task::DomainError;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// 每日挂起窗口 `[start, end)`
///
/// `end < start` 时窗口跨越午夜，例如 22:00-06:00。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspensionInterval {
    pub id: i64,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SuspensionInterval {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { id: 0, start, end }
    }

    /// 由一天中的分钟数构造
    pub fn from_minutes(id: i64, start_minute: u32, end_minute: u32) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            start: time_of_minute(start_minute)?,
            end: time_of_minute(end_minute)?,
        })
    }

    pub fn start_minute(&self) -> u32 {
        minute_of_day(self.start)
    }

    pub fn end_minute(&self) -> u32 {
        minute_of_day(self.end)
    }

    /// 是否跨越午夜
    pub fn does_overlap_midnight(&self) -> bool {
        self.end < self.start
    }

    /// 判断某个时刻是否落在窗口内
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.does_overlap_midnight() {
            time >= self.start || time < self.end
        } else {
            time >= self.start && time < self.end
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.start == self.end {
            return Err(DomainError::InvalidInterval(
                "start and end must differ".to_string(),
            ));
        }
        Ok(())
    }
}

fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn time_of_minute(minute: u32) -> Result<NaiveTime, DomainError> {
    NaiveTime::from_hms_opt(minute / 60, minute % 60, 0)
        .ok_or_else(|| DomainError::InvalidInterval(format!("minute {} out of range", minute)))
}

/// 持久化的挂起状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SchedulerState {
    pub suspended: bool,
    /// 最近一次状态变化的毫秒时间戳
    pub timestamp: i64,
}
