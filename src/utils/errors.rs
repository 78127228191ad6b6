// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::DomainError;
use crate::domain::repositories::task_repository::RepositoryError;
use thiserror::Error;

/// 调度器错误类型
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("仓库错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error("领域错误: {0}")]
    Domain(#[from] DomainError),

    #[error("未找到任务: {0}")]
    TaskNotFound(i64),
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("仓库错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error("调度错误: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("执行异常终止: {0}")]
    Aborted(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}
