// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::super::helpers::{settle, test_settings, Harness};
use axum::http::StatusCode;
use axum_test::TestServer;
use netwatch::application::dto::suspension_request::SuspensionStatusDto;
use netwatch::application::dto::task_request::{LogResponseDto, TaskResponseDto};
use netwatch::application::use_cases::monitor_use_case::MonitorUseCase;
use netwatch::domain::models::suspension::SuspensionInterval;
use netwatch::domain::models::task::AccessType;
use netwatch::presentation::routes;
use netwatch::utils::clock::Clock;
use serde_json::json;
use std::sync::Arc;

fn create_test_server() -> (TestServer, Harness) {
    let harness = Harness::new(test_settings());
    let use_case = Arc::new(MonitorUseCase::new(harness.context.clone()));
    let server = TestServer::new(routes::routes(use_case)).unwrap();
    (server, harness)
}

async fn create_null_task(server: &TestServer) -> TaskResponseDto {
    let response = server
        .post("/v1/tasks")
        .json(&json!({
            "address": "localhost",
            "access_type": "null",
            "interval_minutes": 5,
            "notify_on_failure": true
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<TaskResponseDto>()
}

#[tokio::test(start_paused = true)]
async fn test_health_and_version() {
    let (server, _harness) = create_test_server();

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "OK");

    let response = server.get("/v1/version").await;
    assert_eq!(response.text(), env!("CARGO_PKG_VERSION"));
}

#[tokio::test(start_paused = true)]
async fn test_task_lifecycle_over_http() {
    let (server, harness) = create_test_server();

    let created = create_null_task(&server).await;
    assert_eq!(created.task.access_type, AccessType::Null);
    assert!(!created.task.running);
    assert!(created.next_run_at.is_none());

    let list = server.get("/v1/tasks").await.json::<Vec<TaskResponseDto>>();
    assert_eq!(list.len(), 1);

    let id = created.task.id;
    let started = server.post(&format!("/v1/tasks/{}/start", id)).await;
    assert_eq!(started.status_code(), StatusCode::OK);
    assert!(started.json::<TaskResponseDto>().task.running);

    settle().await;
    assert_eq!(harness.worker.executions(), 1);

    let details = server
        .get(&format!("/v1/tasks/{}", id))
        .await
        .json::<TaskResponseDto>();
    assert_eq!(
        details.next_run_at,
        Some(harness.clock.now() + chrono::Duration::minutes(5))
    );

    let logs = server
        .get(&format!("/v1/tasks/{}/logs", id))
        .add_query_param("limit", 10)
        .await
        .json::<LogResponseDto>();
    assert_eq!(logs.task_id, id);
    assert_eq!(logs.entries.len(), 1);
    assert!(logs.entries[0].success);

    let stopped = server
        .post(&format!("/v1/tasks/{}/stop", id))
        .await
        .json::<TaskResponseDto>();
    assert!(!stopped.task.running);
    assert!(stopped.next_run_at.is_none());

    let deleted = server.delete(&format!("/v1/tasks/{}", id)).await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);
    let missing = server.get(&format!("/v1/tasks/{}", id)).await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn test_update_replaces_definition_and_probe_parameters() {
    let (server, _harness) = create_test_server();
    let created = create_null_task(&server).await;

    let response = server
        .put(&format!("/v1/tasks/{}", created.task.id))
        .json(&json!({
            "address": "127.0.0.1",
            "port": 22,
            "access_type": "connect",
            "interval_minutes": 15,
            "access_type_data": { "connect_count": 3, "stop_on_success": true }
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let updated = response.json::<TaskResponseDto>();
    assert_eq!(updated.task.address, "127.0.0.1");
    assert_eq!(updated.task.port, 22);
    assert_eq!(updated.task.interval_minutes, 15);
    assert_eq!(updated.access_type_data.connect_count, 3);
    assert!(updated.access_type_data.stop_on_success);
    assert!(updated.task.generation_id > created.task.generation_id);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_requests_are_rejected() {
    let (server, _harness) = create_test_server();

    let zero_interval = server
        .post("/v1/tasks")
        .json(&json!({
            "address": "localhost",
            "access_type": "ping",
            "interval_minutes": 0
        }))
        .await;
    assert_eq!(zero_interval.status_code(), StatusCode::BAD_REQUEST);

    let missing_port = server
        .post("/v1/tasks")
        .json(&json!({
            "address": "localhost",
            "access_type": "connect",
            "interval_minutes": 5
        }))
        .await;
    assert_eq!(missing_port.status_code(), StatusCode::BAD_REQUEST);

    let too_many_pings = server
        .post("/v1/tasks")
        .json(&json!({
            "address": "localhost",
            "access_type": "ping",
            "interval_minutes": 5,
            "access_type_data": { "ping_count": 1000 }
        }))
        .await;
    assert_eq!(too_many_pings.status_code(), StatusCode::BAD_REQUEST);

    let unknown = server.post("/v1/tasks/4242/start").await;
    assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);

    let unknown_logs = server.get("/v1/tasks/4242/logs").await;
    assert_eq!(unknown_logs.status_code(), StatusCode::NOT_FOUND);

    let empty_interval = server
        .post("/v1/suspension/intervals")
        .json(&json!({ "start_minute": 60, "end_minute": 60 }))
        .await;
    assert_eq!(empty_interval.status_code(), StatusCode::BAD_REQUEST);

    let out_of_range = server
        .post("/v1/suspension/intervals")
        .json(&json!({ "start_minute": 60, "end_minute": 1440 }))
        .await;
    assert_eq!(out_of_range.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn test_suspension_endpoints() {
    let (server, _harness) = create_test_server();

    let status = server.get("/v1/suspension").await.json::<SuspensionStatusDto>();
    assert!(status.enabled);
    assert!(!status.running);
    assert!(status.intervals.is_empty());

    let response = server
        .post("/v1/suspension/intervals")
        .json(&json!({ "start_minute": 1380, "end_minute": 360 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let interval = response.json::<SuspensionInterval>();
    assert!(interval.does_overlap_midnight());

    let status = server.get("/v1/suspension").await.json::<SuspensionStatusDto>();
    assert_eq!(status.intervals.len(), 1);
    assert!(status.epoch > 0);

    let disabled = server
        .put("/v1/suspension")
        .json(&json!({ "enabled": false }))
        .await
        .json::<SuspensionStatusDto>();
    assert!(!disabled.enabled);

    let removed = server
        .delete(&format!("/v1/suspension/intervals/{}", interval.id))
        .await;
    assert_eq!(removed.status_code(), StatusCode::NO_CONTENT);
    let missing = server
        .delete(&format!("/v1/suspension/intervals/{}", interval.id))
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}
