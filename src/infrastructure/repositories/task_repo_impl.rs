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

use crate::domain::models::task::{Task, NEVER_SCHEDULED};
use crate::domain::repositories::task_repository::{RepositoryError, TaskRepository};
use crate::infrastructure::database::entities::network_task as task_entity;
use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, NotSet, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use std::sync::Arc;

/// 任务仓库实现
///
/// 基于SeaORM实现的任务数据访问层
#[derive(Clone)]
pub struct TaskRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl TaskRepositoryImpl {
    /// 创建新的任务仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    ///
    /// # 返回值
    ///
    /// 返回新的任务仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 分配下一个调度代号
    ///
    /// 代号在全部任务中单调递增，删除任务后也不会复用
    async fn next_generation<C: ConnectionTrait>(conn: &C) -> Result<i64, RepositoryError> {
        let max = task_entity::Entity::find()
            .select_only()
            .column_as(task_entity::Column::GenerationId.max(), "max_generation")
            .into_tuple::<Option<i64>>()
            .one(conn)
            .await?
            .flatten()
            .unwrap_or(0);
        Ok(max + 1)
    }
}

impl From<task_entity::Model> for Task {
    fn from(model: task_entity::Model) -> Self {
        Self {
            id: model.id,
            generation_id: model.generation_id,
            address: model.address,
            port: u16::try_from(model.port).unwrap_or(0),
            access_type: model.access_type.parse().unwrap_or_default(),
            interval_minutes: u32::try_from(model.interval_minutes).unwrap_or(1).max(1),
            only_when_preferred_network: model.only_when_preferred_network,
            notify_on_failure: model.notify_on_failure,
            running: model.running,
            active_instances: u32::try_from(model.active_instances).unwrap_or(0),
            failure_count: u32::try_from(model.failure_count).unwrap_or(0),
            last_scheduled: model.last_scheduled,
            high_priority: model.high_priority,
        }
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[async_trait]
impl TaskRepository for TaskRepositoryImpl {
    async fn insert(&self, task: &Task) -> Result<Task, RepositoryError> {
        let model = task_entity::ActiveModel {
            id: NotSet,
            generation_id: Set(0),
            address: Set(task.address.clone()),
            port: Set(i32::from(task.port)),
            access_type: Set(task.access_type.to_string()),
            interval_minutes: Set(to_i32(task.interval_minutes)),
            only_when_preferred_network: Set(task.only_when_preferred_network),
            notify_on_failure: Set(task.notify_on_failure),
            running: Set(false),
            active_instances: Set(0),
            failure_count: Set(0),
            last_scheduled: Set(NEVER_SCHEDULED),
            high_priority: Set(task.high_priority),
        };

        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Task>, RepositoryError> {
        let model = task_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn find_all(&self) -> Result<Vec<Task>, RepositoryError> {
        let models = task_entity::Entity::find()
            .order_by_asc(task_entity::Column::Id)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, task: &Task) -> Result<Task, RepositoryError> {
        let txn = self.db.begin().await?;

        let existing = task_entity::Entity::find_by_id(task.id)
            .one(&txn)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let generation_id = Self::next_generation(&txn).await?;

        let mut model: task_entity::ActiveModel = existing.into();
        model.generation_id = Set(generation_id);
        model.address = Set(task.address.clone());
        model.port = Set(i32::from(task.port));
        model.access_type = Set(task.access_type.to_string());
        model.interval_minutes = Set(to_i32(task.interval_minutes));
        model.only_when_preferred_network = Set(task.only_when_preferred_network);
        model.notify_on_failure = Set(task.notify_on_failure);
        model.high_priority = Set(task.high_priority);

        let updated = model.update(&txn).await?;
        txn.commit().await?;

        Ok(updated.into())
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = task_entity::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn update_running(&self, id: i64, running: bool) -> Result<i64, RepositoryError> {
        let txn = self.db.begin().await?;

        let generation_id = Self::next_generation(&txn).await?;
        let result = task_entity::Entity::update_many()
            .col_expr(task_entity::Column::Running, Expr::value(running))
            .col_expr(task_entity::Column::GenerationId, Expr::value(generation_id))
            .filter(task_entity::Column::Id.eq(id))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(RepositoryError::NotFound);
        }

        txn.commit().await?;
        Ok(generation_id)
    }

    async fn any_running(&self) -> Result<bool, RepositoryError> {
        let count = task_entity::Entity::find()
            .filter(task_entity::Column::Running.eq(true))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn try_acquire_instance(
        &self,
        id: i64,
        max_instances: u32,
    ) -> Result<bool, RepositoryError> {
        // Check and increment in one statement so concurrent executions
        // cannot both pass the limit.
        let result = task_entity::Entity::update_many()
            .col_expr(
                task_entity::Column::ActiveInstances,
                Expr::col(task_entity::Column::ActiveInstances).add(1),
            )
            .filter(task_entity::Column::Id.eq(id))
            .filter(task_entity::Column::ActiveInstances.lt(to_i32(max_instances)))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn release_instance(&self, id: i64) -> Result<(), RepositoryError> {
        task_entity::Entity::update_many()
            .col_expr(
                task_entity::Column::ActiveInstances,
                Expr::col(task_entity::Column::ActiveInstances).sub(1),
            )
            .filter(task_entity::Column::Id.eq(id))
            .filter(task_entity::Column::ActiveInstances.gt(0))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn reset_all_instances(&self) -> Result<(), RepositoryError> {
        task_entity::Entity::update_many()
            .col_expr(task_entity::Column::ActiveInstances, Expr::value(0))
            .filter(task_entity::Column::ActiveInstances.ne(0))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn update_failure_count(
        &self,
        id: i64,
        failure_count: u32,
    ) -> Result<(), RepositoryError> {
        task_entity::Entity::update_many()
            .col_expr(
                task_entity::Column::FailureCount,
                Expr::value(to_i32(failure_count)),
            )
            .filter(task_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn increment_failure_count(&self, id: i64) -> Result<u32, RepositoryError> {
        // The update holds the row until commit, so the read returns this increment.
        let txn = self.db.begin().await?;
        let result = task_entity::Entity::update_many()
            .col_expr(
                task_entity::Column::FailureCount,
                Expr::col(task_entity::Column::FailureCount).add(1),
            )
            .filter(task_entity::Column::Id.eq(id))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(RepositoryError::NotFound);
        }
        let failure_count: Option<i32> = task_entity::Entity::find_by_id(id)
            .select_only()
            .column(task_entity::Column::FailureCount)
            .into_tuple()
            .one(&txn)
            .await?;
        txn.commit().await?;

        failure_count
            .map(|count| u32::try_from(count).unwrap_or(0))
            .ok_or(RepositoryError::NotFound)
    }

    async fn reset_failure_count(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = task_entity::Entity::update_many()
            .col_expr(task_entity::Column::FailureCount, Expr::value(0))
            .filter(task_entity::Column::Id.eq(id))
            .filter(task_entity::Column::FailureCount.gt(0))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected > 0 {
            return Ok(true);
        }
        match self.find_by_id(id).await? {
            Some(_) => Ok(false),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn update_last_scheduled(
        &self,
        id: i64,
        last_scheduled: i64,
    ) -> Result<(), RepositoryError> {
        task_entity::Entity::update_many()
            .col_expr(task_entity::Column::LastScheduled, Expr::value(last_scheduled))
            .filter(task_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn reset_counters(&self, id: i64) -> Result<(), RepositoryError> {
        task_entity::Entity::update_many()
            .col_expr(task_entity::Column::FailureCount, Expr::value(0))
            .col_expr(task_entity::Column::LastScheduled, Expr::value(NEVER_SCHEDULED))
            .filter(task_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }
}
