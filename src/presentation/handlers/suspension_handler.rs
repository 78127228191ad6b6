// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::application::dto::suspension_request::{
    SuspensionIntervalRequestDto, SuspensionStatusDto, SuspensionToggleDto,
};
use crate::application::use_cases::monitor_use_case::MonitorUseCase;
use crate::domain::models::suspension::SuspensionInterval;
use crate::presentation::errors::AppError;

pub async fn get_status(
    Extension(use_case): Extension<Arc<MonitorUseCase>>,
) -> Result<Json<SuspensionStatusDto>, AppError> {
    Ok(Json(use_case.suspension_status().await?))
}

/// 开启或关闭时间挂起
pub async fn set_enabled(
    Extension(use_case): Extension<Arc<MonitorUseCase>>,
    Json(payload): Json<SuspensionToggleDto>,
) -> Result<Json<SuspensionStatusDto>, AppError> {
    Ok(Json(use_case.set_suspension_enabled(payload.enabled).await?))
}

pub async fn add_interval(
    Extension(use_case): Extension<Arc<MonitorUseCase>>,
    Json(payload): Json<SuspensionIntervalRequestDto>,
) -> Result<(StatusCode, Json<SuspensionInterval>), AppError> {
    let interval = use_case.add_suspension_interval(&payload).await?;
    Ok((StatusCode::CREATED, Json(interval)))
}

pub async fn remove_interval(
    Extension(use_case): Extension<Arc<MonitorUseCase>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    use_case.remove_suspension_interval(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
