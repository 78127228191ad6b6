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

use crate::domain::models::access_type_data::AccessTypeData;
use crate::domain::repositories::access_type_data_repository::AccessTypeDataRepository;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::infrastructure::database::entities::access_type_data as data_entity;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set,
};
use std::sync::Arc;

/// 探测参数仓库实现
#[derive(Clone)]
pub struct AccessTypeDataRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl AccessTypeDataRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<data_entity::Model> for AccessTypeData {
    fn from(model: data_entity::Model) -> Self {
        Self {
            id: model.id,
            task_id: model.task_id,
            ping_count: u32::try_from(model.ping_count).unwrap_or(1),
            ping_package_size: u32::try_from(model.ping_package_size).unwrap_or(0),
            connect_count: u32::try_from(model.connect_count).unwrap_or(1),
            stop_on_success: model.stop_on_success,
            ignore_ssl_error: model.ignore_ssl_error,
        }
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[async_trait]
impl AccessTypeDataRepository for AccessTypeDataRepositoryImpl {
    async fn find_by_task(&self, task_id: i64) -> Result<Option<AccessTypeData>, RepositoryError> {
        let model = data_entity::Entity::find()
            .filter(data_entity::Column::TaskId.eq(task_id))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn upsert(&self, data: &AccessTypeData) -> Result<AccessTypeData, RepositoryError> {
        let existing = data_entity::Entity::find()
            .filter(data_entity::Column::TaskId.eq(data.task_id))
            .one(self.db.as_ref())
            .await?;

        let model = data_entity::ActiveModel {
            id: existing.as_ref().map_or(NotSet, |model| Set(model.id)),
            task_id: Set(data.task_id),
            ping_count: Set(to_i32(data.ping_count)),
            ping_package_size: Set(to_i32(data.ping_package_size)),
            connect_count: Set(to_i32(data.connect_count)),
            stop_on_success: Set(data.stop_on_success),
            ignore_ssl_error: Set(data.ignore_ssl_error),
        };

        let saved = if existing.is_some() {
            model.update(self.db.as_ref()).await?
        } else {
            model.insert(self.db.as_ref()).await?
        };
        Ok(saved.into())
    }

    async fn delete_by_task(&self, task_id: i64) -> Result<(), RepositoryError> {
        data_entity::Entity::delete_many()
            .filter(data_entity::Column::TaskId.eq(task_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }
}
