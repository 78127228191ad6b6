// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供领域仓库接口的 SeaORM 实现和内存实现
pub mod access_type_data_repo_impl;
pub mod log_repo_impl;
pub mod memory_store;
pub mod scheduler_state_repo_impl;
pub mod task_repo_impl;

use crate::config::settings::DatabaseSettings;
use crate::domain::repositories::Repositories;
use crate::infrastructure::database::connection;
use access_type_data_repo_impl::AccessTypeDataRepositoryImpl;
use log_repo_impl::LogRepositoryImpl;
use memory_store::InMemoryStore;
use scheduler_state_repo_impl::SchedulerStateRepositoryImpl;
use sea_orm::{DatabaseConnection, DbErr};
use std::sync::Arc;
use task_repo_impl::TaskRepositoryImpl;
use tracing::info;

/// 基于数据库连接构建全部仓库
pub fn database_repositories(db: Arc<DatabaseConnection>) -> Repositories {
    Repositories {
        tasks: Arc::new(TaskRepositoryImpl::new(db.clone())),
        logs: Arc::new(LogRepositoryImpl::new(db.clone())),
        access_data: Arc::new(AccessTypeDataRepositoryImpl::new(db.clone())),
        scheduler_state: Arc::new(SchedulerStateRepositoryImpl::new(db)),
    }
}

/// 构建共享同一个内存存储的全部仓库
pub fn memory_repositories(store: Arc<InMemoryStore>) -> Repositories {
    Repositories {
        tasks: store.clone(),
        logs: store.clone(),
        access_data: store.clone(),
        scheduler_state: store,
    }
}

/// 按配置打开存储
///
/// 地址为 `memory` 时使用进程内存储，其余地址连接数据库并执行迁移
///
/// # 参数
///
/// * `settings` - 数据库配置
pub async fn open_repositories(settings: &DatabaseSettings) -> Result<Repositories, DbErr> {
    if settings.is_memory() {
        info!("Using in-memory store");
        return Ok(memory_repositories(Arc::new(InMemoryStore::new())));
    }
    let db = connection::connect_and_migrate(settings).await?;
    info!("Database connection established");
    Ok(database_repositories(Arc::new(db)))
}
