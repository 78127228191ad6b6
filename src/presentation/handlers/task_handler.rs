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

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    application::{
        dto::task_request::{LogQueryDto, LogResponseDto, TaskRequestDto, TaskResponseDto},
        use_cases::monitor_use_case::{MonitorUseCase, MonitorUseCaseError},
    },
    presentation::errors::AppError,
};

/// 创建监控任务
pub async fn create_task(
    Extension(use_case): Extension<Arc<MonitorUseCase>>,
    Json(payload): Json<TaskRequestDto>,
) -> Result<(StatusCode, Json<TaskResponseDto>), AppError> {
    let task = use_case.create_task(&payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// 列出全部任务
pub async fn list_tasks(
    Extension(use_case): Extension<Arc<MonitorUseCase>>,
) -> Result<Json<Vec<TaskResponseDto>>, AppError> {
    Ok(Json(use_case.list_tasks().await?))
}

pub async fn get_task(
    Extension(use_case): Extension<Arc<MonitorUseCase>>,
    Path(id): Path<i64>,
) -> Result<Json<TaskResponseDto>, AppError> {
    Ok(Json(use_case.get_task(id).await?))
}

/// 修改任务定义
pub async fn update_task(
    Extension(use_case): Extension<Arc<MonitorUseCase>>,
    Path(id): Path<i64>,
    Json(payload): Json<TaskRequestDto>,
) -> Result<Json<TaskResponseDto>, AppError> {
    Ok(Json(use_case.update_task(id, &payload).await?))
}

pub async fn delete_task(
    Extension(use_case): Extension<Arc<MonitorUseCase>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    use_case.delete_task(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 启动任务，已在运行的任务以新代号重新开始
pub async fn start_task(
    Extension(use_case): Extension<Arc<MonitorUseCase>>,
    Path(id): Path<i64>,
) -> Result<Json<TaskResponseDto>, AppError> {
    Ok(Json(use_case.start_task(id).await?))
}

pub async fn stop_task(
    Extension(use_case): Extension<Arc<MonitorUseCase>>,
    Path(id): Path<i64>,
) -> Result<Json<TaskResponseDto>, AppError> {
    Ok(Json(use_case.stop_task(id).await?))
}

/// 查询任务日志
///
/// # 参数
///
/// * `limit` - 返回的最大条数，缺省为 50
pub async fn task_logs(
    Extension(use_case): Extension<Arc<MonitorUseCase>>,
    Path(id): Path<i64>,
    Query(query): Query<LogQueryDto>,
) -> Result<Json<LogResponseDto>, AppError> {
    query
        .validate()
        .map_err(|e| MonitorUseCaseError::ValidationError(e.to_string()))?;
    Ok(Json(use_case.task_logs(id, query.limit).await?))
}
