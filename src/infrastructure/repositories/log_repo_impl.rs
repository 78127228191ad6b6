// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::log_entry::LogEntry;
use crate::domain::repositories::log_repository::LogRepository;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::infrastructure::database::entities::log_entry as log_entity;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;

/// 日志仓库实现
#[derive(Clone)]
pub struct LogRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl LogRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<log_entity::Model> for LogEntry {
    fn from(model: log_entity::Model) -> Self {
        Self {
            id: model.id,
            task_id: model.task_id,
            success: model.success,
            timestamp: model.timestamp,
            message: model.message,
        }
    }
}

#[async_trait]
impl LogRepository for LogRepositoryImpl {
    async fn insert_and_trim(
        &self,
        entry: &LogEntry,
        limit: u64,
    ) -> Result<LogEntry, RepositoryError> {
        let txn = self.db.begin().await?;

        let model = log_entity::ActiveModel {
            id: NotSet,
            task_id: Set(entry.task_id),
            success: Set(entry.success),
            timestamp: Set(entry.timestamp),
            message: Set(entry.message.clone()),
        };
        let inserted = model.insert(&txn).await?;

        // Keep only the newest `limit` entries of this task.
        let expired: Vec<i64> = log_entity::Entity::find()
            .select_only()
            .column(log_entity::Column::Id)
            .filter(log_entity::Column::TaskId.eq(entry.task_id))
            .order_by_desc(log_entity::Column::Timestamp)
            .order_by_desc(log_entity::Column::Id)
            .offset(limit.max(1))
            .into_tuple()
            .all(&txn)
            .await?;
        if !expired.is_empty() {
            log_entity::Entity::delete_many()
                .filter(log_entity::Column::Id.is_in(expired))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(inserted.into())
    }

    async fn find_by_task(
        &self,
        task_id: i64,
        limit: u64,
    ) -> Result<Vec<LogEntry>, RepositoryError> {
        let models = log_entity::Entity::find()
            .filter(log_entity::Column::TaskId.eq(task_id))
            .order_by_desc(log_entity::Column::Timestamp)
            .order_by_desc(log_entity::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_latest(&self, task_id: i64) -> Result<Option<LogEntry>, RepositoryError> {
        let model = log_entity::Entity::find()
            .filter(log_entity::Column::TaskId.eq(task_id))
            .order_by_desc(log_entity::Column::Timestamp)
            .order_by_desc(log_entity::Column::Id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn delete_by_task(&self, task_id: i64) -> Result<u64, RepositoryError> {
        let result = log_entity::Entity::delete_many()
            .filter(log_entity::Column::TaskId.eq(task_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
