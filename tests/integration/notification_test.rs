// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{settle, test_settings, Harness};
use netwatch::domain::services::network_state::{NetworkKind, NetworkState};
use netwatch::domain::services::notification_policy::NotificationMode;
use std::time::Duration;

/// 启动任务并让它按 1 分钟间隔执行 `runs` 次
async fn run_times(harness: &Harness, task_id: i64, runs: usize) {
    harness.context.scheduler.start(task_id).await.unwrap();
    settle().await;
    for _ in 1..runs {
        tokio::time::sleep(Duration::from_secs(60)).await;
        settle().await;
    }
    assert_eq!(harness.worker.executions(), runs);
}

#[tokio::test(start_paused = true)]
async fn test_failure_mode_notifies_every_nth_failure() {
    let mut settings = test_settings();
    settings.notification.mode = NotificationMode::Failure;
    settings.notification.failures_before_notification = 2;
    let harness = Harness::new(settings);
    let task = harness.create_task(1).await;
    harness.worker.push_outcomes(&[false, false, false, false]);

    run_times(&harness, task.id, 4).await;

    assert_eq!(harness.sink.failure_counts(), vec![2, 4]);
    assert_eq!(harness.task(task.id).await.failure_count, 4);
}

#[tokio::test(start_paused = true)]
async fn test_success_resets_failure_count() {
    let harness = Harness::new(test_settings());
    let task = harness.create_task(1).await;
    harness.worker.push_outcomes(&[false, false, true]);

    run_times(&harness, task.id, 3).await;

    assert_eq!(harness.task(task.id).await.failure_count, 0);
    // Failure mode with the default threshold notifies on each failure, never on success.
    assert_eq!(harness.sink.failure_counts(), vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_change_mode_notifies_on_transitions_only() {
    let mut settings = test_settings();
    settings.notification.mode = NotificationMode::Change;
    let harness = Harness::new(settings);
    let task = harness.create_task(1).await;
    harness.worker.push_outcomes(&[false, false, true, true, false]);

    run_times(&harness, task.id, 5).await;

    let transitions: Vec<bool> = harness
        .sink
        .failures()
        .iter()
        .map(|(_, entry)| entry.success)
        .collect();
    assert_eq!(transitions, vec![false, true, false]);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_notifications_still_count_failures() {
    let harness = Harness::new(test_settings());
    let mut task = netwatch::domain::models::task::Task::new(
        "localhost",
        netwatch::domain::models::task::AccessType::Null,
        1,
    );
    task.notify_on_failure = false;
    let task = harness.insert(task).await;
    harness.worker.push_outcomes(&[false]);

    run_times(&harness, task.id, 1).await;

    assert_eq!(harness.task(task.id).await.failure_count, 1);
    assert!(harness.sink.failures().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_high_priority_failure_raises_alarm() {
    let harness = Harness::new(test_settings());
    let mut task = netwatch::domain::models::task::Task::new(
        "localhost",
        netwatch::domain::models::task::AccessType::Null,
        1,
    );
    task.notify_on_failure = true;
    task.high_priority = true;
    let task = harness.insert(task).await;
    harness.worker.push_outcomes(&[false]);

    run_times(&harness, task.id, 1).await;

    assert_eq!(harness.sink.failures().len(), 1);
    assert_eq!(harness.sink.alarms(), vec![task.id]);
}

#[tokio::test(start_paused = true)]
async fn test_missing_network_is_logged_without_counting_failure() {
    let harness = Harness::new(test_settings());
    let task = harness.create_task(1).await;
    harness.network.set(NetworkState::disconnected());

    run_times_without_probe(&harness, task.id).await;

    let logs = harness.logs(task.id).await;
    assert_eq!(logs[0].message, "No active network connection");
    assert!(!logs[0].success);
    assert_eq!(harness.task(task.id).await.failure_count, 0);
    assert!(harness.sink.failures().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_network_counts_when_configured() {
    let mut settings = test_settings();
    settings.notification.notify_on_inactive_network = true;
    let harness = Harness::new(settings);
    let task = harness.create_task(1).await;
    harness.network.set(NetworkState::disconnected());

    run_times_without_probe(&harness, task.id).await;

    assert_eq!(harness.task(task.id).await.failure_count, 1);
    assert_eq!(harness.sink.failure_counts(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn test_preferred_network_requirement_skips_probe() {
    let harness = Harness::new(test_settings());
    let mut task = netwatch::domain::models::task::Task::new(
        "localhost",
        netwatch::domain::models::task::AccessType::Null,
        1,
    );
    task.only_when_preferred_network = true;
    let task = harness.insert(task).await;
    harness
        .network
        .set(NetworkState::connected(NetworkKind::Ethernet));

    run_times_without_probe(&harness, task.id).await;

    let logs = harness.logs(task.id).await;
    assert!(logs[0].message.starts_with("Skipped: not connected to the preferred network"));
    assert_eq!(harness.task(task.id).await.failure_count, 0);
}

/// 网络前置条件不满足时工作器不会被调用
async fn run_times_without_probe(harness: &Harness, task_id: i64) {
    harness.context.scheduler.start(task_id).await.unwrap();
    settle().await;
    assert_eq!(harness.worker.executions(), 0);
    assert_eq!(harness.logs(task_id).await.len(), 1);
    assert_eq!(harness.task(task_id).await.active_instances, 0);
}
