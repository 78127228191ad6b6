// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::task_repository::RepositoryError;
use crate::domain::models::log_entry::LogEntry;
use async_trait::async_trait;

/// 日志仓库特质
#[async_trait]
pub trait LogRepository: Send + Sync {
    /// 追加一条日志，并把该任务的日志裁剪到 `limit` 条以内
    async fn insert_and_trim(&self, entry: &LogEntry, limit: u64)
        -> Result<LogEntry, RepositoryError>;
    /// 按时间倒序读取任务的日志
    async fn find_by_task(&self, task_id: i64, limit: u64)
        -> Result<Vec<LogEntry>, RepositoryError>;
    /// 读取任务最近的一条日志
    async fn find_latest(&self, task_id: i64) -> Result<Option<LogEntry>, RepositoryError>;
    /// 删除任务的全部日志
    async fn delete_by_task(&self, task_id: i64) -> Result<u64, RepositoryError>;
}
