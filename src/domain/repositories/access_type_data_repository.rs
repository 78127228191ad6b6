// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::task_repository::RepositoryError;
use crate::domain::models::access_type_data::AccessTypeData;
use async_trait::async_trait;

/// 探测参数仓库特质
#[async_trait]
pub trait AccessTypeDataRepository: Send + Sync {
    async fn find_by_task(&self, task_id: i64) -> Result<Option<AccessTypeData>, RepositoryError>;
    /// 插入或替换任务的探测参数
    async fn upsert(&self, data: &AccessTypeData) -> Result<AccessTypeData, RepositoryError>;
    async fn delete_by_task(&self, task_id: i64) -> Result<(), RepositoryError>;
}
