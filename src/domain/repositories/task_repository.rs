// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::Task;
use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 任务仓库特质
///
/// 定义监控任务的数据访问接口。计数器相关的方法必须是原子的，
/// 调度器和多个并发执行会同时调用它们。
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// 插入新任务，`generation_id` 固定为 0
    async fn insert(&self, task: &Task) -> Result<Task, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: i64) -> Result<Option<Task>, RepositoryError>;
    /// 读取所有任务
    async fn find_all(&self) -> Result<Vec<Task>, RepositoryError>;
    /// 更新任务定义（地址、间隔等），同时分配新的调度代号
    async fn update(&self, task: &Task) -> Result<Task, RepositoryError>;
    /// 删除任务
    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;
    /// 设置运行标志，并分配新的调度代号
    ///
    /// # 返回值
    ///
    /// 返回新的调度代号
    async fn update_running(&self, id: i64, running: bool) -> Result<i64, RepositoryError>;
    /// 是否还有处于运行状态的任务
    async fn any_running(&self) -> Result<bool, RepositoryError>;
    /// 在未超过上限时占用一个执行实例
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 已占用，`active_instances` 加一
    /// * `Ok(false)` - 已达上限，未做修改
    async fn try_acquire_instance(&self, id: i64, max_instances: u32)
        -> Result<bool, RepositoryError>;
    /// 释放一个执行实例，计数不会低于 0
    async fn release_instance(&self, id: i64) -> Result<(), RepositoryError>;
    /// 将所有任务的实例计数清零
    async fn reset_all_instances(&self) -> Result<(), RepositoryError>;
    /// 更新连续失败次数
    async fn update_failure_count(&self, id: i64, failure_count: u32)
        -> Result<(), RepositoryError>;
    /// 将连续失败次数原子地加一
    ///
    /// # 返回值
    ///
    /// 返回加一之后的次数，任务不存在时返回 `RepositoryError::NotFound`
    async fn increment_failure_count(&self, id: i64) -> Result<u32, RepositoryError>;
    /// 将连续失败次数原子地清零
    ///
    /// # 返回值
    ///
    /// 清零前次数是否大于零
    async fn reset_failure_count(&self, id: i64) -> Result<bool, RepositoryError>;
    /// 更新最近一次调度时间
    async fn update_last_scheduled(&self, id: i64, last_scheduled: i64)
        -> Result<(), RepositoryError>;
    /// 清空失败次数和最近调度时间
    async fn reset_counters(&self, id: i64) -> Result<(), RepositoryError>;
}
