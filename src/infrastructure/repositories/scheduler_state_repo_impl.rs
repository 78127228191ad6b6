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

use crate::domain::models::suspension::{SchedulerState, SuspensionInterval};
use crate::domain::repositories::scheduler_state_repository::SchedulerStateRepository;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::infrastructure::database::entities::scheduler_state::{self as state_entity, STATE_ROW_ID};
use crate::infrastructure::database::entities::suspension_interval as interval_entity;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, NotSet, QueryOrder, Set,
};
use std::sync::Arc;

/// 挂起状态与挂起窗口的仓库实现
#[derive(Clone)]
pub struct SchedulerStateRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl SchedulerStateRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn to_interval(model: interval_entity::Model) -> Option<SuspensionInterval> {
    let start = u32::try_from(model.start_minute).ok()?;
    let end = u32::try_from(model.end_minute).ok()?;
    SuspensionInterval::from_minutes(model.id, start, end).ok()
}

#[async_trait]
impl SchedulerStateRepository for SchedulerStateRepositoryImpl {
    async fn read_state(&self) -> Result<SchedulerState, RepositoryError> {
        let model = state_entity::Entity::find_by_id(STATE_ROW_ID)
            .one(self.db.as_ref())
            .await?;
        Ok(model
            .map(|model| SchedulerState {
                suspended: model.suspended,
                timestamp: model.timestamp,
            })
            .unwrap_or_default())
    }

    async fn update_state(&self, state: SchedulerState) -> Result<(), RepositoryError> {
        let exists = state_entity::Entity::find_by_id(STATE_ROW_ID)
            .one(self.db.as_ref())
            .await?
            .is_some();

        let model = state_entity::ActiveModel {
            id: Set(STATE_ROW_ID),
            suspended: Set(state.suspended),
            timestamp: Set(state.timestamp),
        };
        if exists {
            model.update(self.db.as_ref()).await?;
        } else {
            model.insert(self.db.as_ref()).await?;
        }
        Ok(())
    }

    async fn read_intervals(&self) -> Result<Vec<SuspensionInterval>, RepositoryError> {
        let models = interval_entity::Entity::find()
            .order_by_asc(interval_entity::Column::StartMinute)
            .order_by_asc(interval_entity::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().filter_map(to_interval).collect())
    }

    async fn insert_interval(
        &self,
        interval: &SuspensionInterval,
    ) -> Result<SuspensionInterval, RepositoryError> {
        let model = interval_entity::ActiveModel {
            id: NotSet,
            start_minute: Set(interval.start_minute() as i32),
            end_minute: Set(interval.end_minute() as i32),
        };
        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(SuspensionInterval {
            id: inserted.id,
            ..*interval
        })
    }

    async fn delete_interval(&self, id: i64) -> Result<(), RepositoryError> {
        let result = interval_entity::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
