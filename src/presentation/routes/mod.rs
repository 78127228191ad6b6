// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::monitor_use_case::MonitorUseCase;
use crate::presentation::handlers::{suspension_handler, task_handler};
use axum::{
    routing::{delete, get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 参数
///
/// * `use_case` - 控制接口共享的用例实例
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(use_case: Arc<MonitorUseCase>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let task_routes = Router::new()
        .route(
            "/v1/tasks",
            get(task_handler::list_tasks).post(task_handler::create_task),
        )
        .route(
            "/v1/tasks/{id}",
            get(task_handler::get_task)
                .put(task_handler::update_task)
                .delete(task_handler::delete_task),
        )
        .route("/v1/tasks/{id}/start", post(task_handler::start_task))
        .route("/v1/tasks/{id}/stop", post(task_handler::stop_task))
        .route("/v1/tasks/{id}/logs", get(task_handler::task_logs));

    let suspension_routes = Router::new()
        .route(
            "/v1/suspension",
            get(suspension_handler::get_status).put(suspension_handler::set_enabled),
        )
        .route(
            "/v1/suspension/intervals",
            post(suspension_handler::add_interval),
        )
        .route(
            "/v1/suspension/intervals/{id}",
            delete(suspension_handler::remove_interval),
        );

    Router::new()
        .merge(public_routes)
        .merge(task_routes)
        .merge(suspension_routes)
        .layer(Extension(use_case))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
