// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::application::use_cases::monitor_use_case::MonitorUseCaseError;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::utils::errors::SchedulerError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<MonitorUseCaseError>() {
            return match err {
                MonitorUseCaseError::ValidationError(_) => StatusCode::BAD_REQUEST,
                MonitorUseCaseError::NotFound(_) | MonitorUseCaseError::IntervalNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                MonitorUseCaseError::Repository(err) => repository_status(err),
                MonitorUseCaseError::Scheduler(err) => scheduler_status(err),
            };
        }
        if let Some(err) = self.0.downcast_ref::<SchedulerError>() {
            return scheduler_status(err);
        }
        match self.0.downcast_ref::<RepositoryError>() {
            Some(err) => repository_status(err),
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
    }
}

fn scheduler_status(err: &SchedulerError) -> StatusCode {
    match err {
        SchedulerError::TaskNotFound(_) => StatusCode::NOT_FOUND,
        SchedulerError::Domain(_) => StatusCode::BAD_REQUEST,
        SchedulerError::Repository(err) => repository_status(err),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = self.0.to_string();
        if status.is_server_error() {
            error!(error = %error_message, "Request failed");
        }

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
