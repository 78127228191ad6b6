// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::task_repository::RepositoryError;
use crate::domain::models::suspension::{SchedulerState, SuspensionInterval};
use async_trait::async_trait;

/// 挂起状态与挂起窗口仓库特质
#[async_trait]
pub trait SchedulerStateRepository: Send + Sync {
    /// 读取挂起状态，未保存过时返回默认状态
    async fn read_state(&self) -> Result<SchedulerState, RepositoryError>;
    /// 保存挂起状态
    async fn update_state(&self, state: SchedulerState) -> Result<(), RepositoryError>;
    /// 读取全部挂起窗口，按开始时间排序
    async fn read_intervals(&self) -> Result<Vec<SuspensionInterval>, RepositoryError>;
    async fn insert_interval(
        &self,
        interval: &SuspensionInterval,
    ) -> Result<SuspensionInterval, RepositoryError>;
    async fn delete_interval(&self, id: i64) -> Result<(), RepositoryError>;
}
