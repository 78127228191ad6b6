// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use netwatch::config::settings::DatabaseSettings;
use netwatch::domain::models::access_type_data::AccessTypeData;
use netwatch::domain::models::log_entry::LogEntry;
use netwatch::domain::models::suspension::{SchedulerState, SuspensionInterval};
use netwatch::domain::models::task::{AccessType, Task};
use netwatch::domain::repositories::task_repository::RepositoryError;
use netwatch::domain::repositories::Repositories;
use netwatch::infrastructure::repositories::open_repositories;

fn database_settings(url: String) -> DatabaseSettings {
    DatabaseSettings {
        url,
        max_connections: Some(1),
        min_connections: Some(1),
        connect_timeout: Some(5),
        idle_timeout: Some(60),
        log_count_limit: 3,
    }
}

async fn sqlite_memory() -> Repositories {
    open_repositories(&database_settings("sqlite::memory:".to_string()))
        .await
        .expect("open in-memory sqlite")
}

fn connect_task() -> Task {
    let mut task = Task::new("example.com", AccessType::Connect, 5);
    task.port = 443;
    task
}

#[tokio::test]
async fn test_task_round_trip_and_generations() {
    let repos = sqlite_memory().await;
    let first = repos.tasks.insert(&connect_task()).await.unwrap();
    let second = repos.tasks.insert(&connect_task()).await.unwrap();
    assert!(first.id > 0);
    assert_ne!(first.id, second.id);
    assert_eq!(first.generation_id, 0);
    assert_eq!(first.last_scheduled, -1);

    let loaded = repos.tasks.find_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(loaded, first);

    // Generations come from one sequence shared by every task.
    let g1 = repos.tasks.update_running(first.id, true).await.unwrap();
    let g2 = repos.tasks.update_running(second.id, true).await.unwrap();
    let g3 = repos.tasks.update_running(first.id, false).await.unwrap();
    assert!(g1 < g2 && g2 < g3);
    assert!(repos.tasks.any_running().await.unwrap());

    let mut edited = repos.tasks.find_by_id(second.id).await.unwrap().unwrap();
    edited.address = "example.org".to_string();
    edited.interval_minutes = 30;
    let updated = repos.tasks.update(&edited).await.unwrap();
    assert_eq!(updated.address, "example.org");
    assert!(updated.running);
    assert!(updated.generation_id > g3);

    assert_eq!(repos.tasks.find_all().await.unwrap().len(), 2);
    repos.tasks.delete(first.id).await.unwrap();
    assert!(repos.tasks.find_by_id(first.id).await.unwrap().is_none());
    assert!(matches!(
        repos.tasks.delete(first.id).await,
        Err(RepositoryError::NotFound)
    ));
    assert!(matches!(
        repos.tasks.update_running(first.id, true).await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
async fn test_instance_counter_respects_limit() {
    let repos = sqlite_memory().await;
    let task = repos.tasks.insert(&connect_task()).await.unwrap();

    assert!(repos.tasks.try_acquire_instance(task.id, 2).await.unwrap());
    assert!(repos.tasks.try_acquire_instance(task.id, 2).await.unwrap());
    assert!(!repos.tasks.try_acquire_instance(task.id, 2).await.unwrap());
    assert_eq!(
        repos.tasks.find_by_id(task.id).await.unwrap().unwrap().active_instances,
        2
    );

    repos.tasks.release_instance(task.id).await.unwrap();
    repos.tasks.release_instance(task.id).await.unwrap();
    repos.tasks.release_instance(task.id).await.unwrap();
    assert_eq!(
        repos.tasks.find_by_id(task.id).await.unwrap().unwrap().active_instances,
        0
    );

    assert!(repos.tasks.try_acquire_instance(task.id, 1).await.unwrap());
    repos.tasks.reset_all_instances().await.unwrap();
    assert_eq!(
        repos.tasks.find_by_id(task.id).await.unwrap().unwrap().active_instances,
        0
    );
}

#[tokio::test]
async fn test_counters_are_reset_together() {
    let repos = sqlite_memory().await;
    let task = repos.tasks.insert(&connect_task()).await.unwrap();
    repos.tasks.update_failure_count(task.id, 4).await.unwrap();
    repos.tasks.update_last_scheduled(task.id, 123_456).await.unwrap();

    let loaded = repos.tasks.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(loaded.failure_count, 4);
    assert_eq!(loaded.last_scheduled, 123_456);

    repos.tasks.reset_counters(task.id).await.unwrap();
    let loaded = repos.tasks.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(loaded.failure_count, 0);
    assert_eq!(loaded.last_scheduled, -1);
}

#[tokio::test]
async fn test_failure_count_increments_and_resets_in_store() {
    let repos = sqlite_memory().await;
    let task = repos.tasks.insert(&connect_task()).await.unwrap();

    assert!(!repos.tasks.reset_failure_count(task.id).await.unwrap());
    assert_eq!(repos.tasks.increment_failure_count(task.id).await.unwrap(), 1);
    assert_eq!(repos.tasks.increment_failure_count(task.id).await.unwrap(), 2);
    assert_eq!(
        repos.tasks.find_by_id(task.id).await.unwrap().unwrap().failure_count,
        2
    );

    assert!(repos.tasks.reset_failure_count(task.id).await.unwrap());
    assert_eq!(
        repos.tasks.find_by_id(task.id).await.unwrap().unwrap().failure_count,
        0
    );

    assert!(matches!(
        repos.tasks.increment_failure_count(task.id + 100).await,
        Err(RepositoryError::NotFound)
    ));
    assert!(matches!(
        repos.tasks.reset_failure_count(task.id + 100).await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
async fn test_logs_are_trimmed_per_task() {
    let repos = sqlite_memory().await;
    let task = repos.tasks.insert(&connect_task()).await.unwrap();
    let other = repos.tasks.insert(&connect_task()).await.unwrap();

    for i in 0..5 {
        let entry = LogEntry::success(task.id, 1_000 + i, format!("run {}", i));
        repos.logs.insert_and_trim(&entry, 3).await.unwrap();
    }
    let foreign = LogEntry::failure(other.id, 500, "other task");
    repos.logs.insert_and_trim(&foreign, 3).await.unwrap();

    let logs = repos.logs.find_by_task(task.id, 10).await.unwrap();
    let messages: Vec<&str> = logs.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["run 4", "run 3", "run 2"]);
    assert_eq!(
        repos.logs.find_latest(task.id).await.unwrap().unwrap().message,
        "run 4"
    );
    assert_eq!(repos.logs.find_by_task(other.id, 10).await.unwrap().len(), 1);

    assert_eq!(repos.logs.delete_by_task(task.id).await.unwrap(), 3);
    assert!(repos.logs.find_by_task(task.id, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_access_type_data_upsert() {
    let repos = sqlite_memory().await;
    let task = repos.tasks.insert(&connect_task()).await.unwrap();
    assert!(repos.access_data.find_by_task(task.id).await.unwrap().is_none());

    let mut data = AccessTypeData::for_task(task.id);
    data.connect_count = 4;
    let stored = repos.access_data.upsert(&data).await.unwrap();
    assert!(stored.id > 0);

    data.connect_count = 7;
    data.stop_on_success = true;
    let updated = repos.access_data.upsert(&data).await.unwrap();
    assert_eq!(updated.id, stored.id);

    let loaded = repos.access_data.find_by_task(task.id).await.unwrap().unwrap();
    assert_eq!(loaded.connect_count, 7);
    assert!(loaded.stop_on_success);

    repos.access_data.delete_by_task(task.id).await.unwrap();
    assert!(repos.access_data.find_by_task(task.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_scheduler_state_and_intervals() {
    let repos = sqlite_memory().await;
    assert_eq!(
        repos.scheduler_state.read_state().await.unwrap(),
        SchedulerState::default()
    );

    let state = SchedulerState {
        suspended: true,
        timestamp: 42,
    };
    repos.scheduler_state.update_state(state).await.unwrap();
    repos.scheduler_state.update_state(state).await.unwrap();
    assert_eq!(repos.scheduler_state.read_state().await.unwrap(), state);

    let late = SuspensionInterval::from_minutes(0, 22 * 60, 6 * 60).unwrap();
    let early = SuspensionInterval::from_minutes(0, 60, 120).unwrap();
    let late = repos.scheduler_state.insert_interval(&late).await.unwrap();
    repos.scheduler_state.insert_interval(&early).await.unwrap();

    let intervals = repos.scheduler_state.read_intervals().await.unwrap();
    let starts: Vec<u32> = intervals.iter().map(|i| i.start_minute()).collect();
    assert_eq!(starts, vec![60, 22 * 60]);

    repos.scheduler_state.delete_interval(late.id).await.unwrap();
    assert_eq!(repos.scheduler_state.read_intervals().await.unwrap().len(), 1);
    assert!(matches!(
        repos.scheduler_state.delete_interval(late.id).await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
async fn test_file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("netwatch.db");
    let settings = database_settings(format!("sqlite://{}?mode=rwc", path.display()));

    let task_id = {
        let repos = open_repositories(&settings).await.unwrap();
        let task = repos.tasks.insert(&connect_task()).await.unwrap();
        repos.tasks.update_running(task.id, true).await.unwrap();
        task.id
    };

    let repos = open_repositories(&settings).await.unwrap();
    let task = repos.tasks.find_by_id(task_id).await.unwrap().unwrap();
    assert!(task.running);
    assert_eq!(task.port, 443);
}

#[tokio::test]
async fn test_memory_store_is_selected_by_url() {
    let repos = open_repositories(&database_settings("memory".to_string()))
        .await
        .unwrap();
    let task = repos.tasks.insert(&connect_task()).await.unwrap();
    assert!(repos.tasks.find_by_id(task.id).await.unwrap().is_some());
}
