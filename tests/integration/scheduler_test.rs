// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{noon, settle, test_settings, Harness};
use netwatch::infrastructure::repositories::memory_store::InMemoryStore;
use netwatch::queue::alarm::{AlarmKey, Trigger};
use netwatch::utils::clock::Clock;
use std::sync::Arc;
use std::time::Duration;

/// 启动后立即执行一次，此后每个周期执行一次
#[tokio::test(start_paused = true)]
async fn test_started_task_runs_immediately_then_every_interval() {
    let harness = Harness::new(test_settings());
    let task = harness.create_task(1).await;

    let started = harness.context.scheduler.start(task.id).await.unwrap();
    assert!(started.running);
    assert!(started.generation_id > task.generation_id);

    settle().await;
    assert_eq!(harness.worker.executions(), 1);
    let key = AlarmKey::Task(task.id);
    assert_eq!(
        harness.context.alarms.scheduled_at(key),
        Some(harness.clock.now() + chrono::Duration::minutes(1))
    );
    assert_eq!(
        harness.context.alarms.pending_trigger(key),
        Some(Trigger::Execute {
            task_id: task.id,
            generation_id: started.generation_id,
        })
    );

    tokio::time::sleep(Duration::from_secs(58)).await;
    assert_eq!(harness.worker.executions(), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(harness.worker.executions(), 2);

    let started_at = harness.worker.started_at();
    let spacing = started_at[1].duration_since(started_at[0]);
    assert!(spacing >= Duration::from_secs(60) && spacing < Duration::from_secs(61));

    let logs = harness.logs(task.id).await;
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|entry| entry.success));
    assert_eq!(harness.task(task.id).await.active_instances, 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_leaves_no_alarms_or_pooled_executions() {
    let harness = Harness::new(test_settings());
    let task = harness.create_task(5).await;
    harness.worker.hold();

    harness.context.scheduler.start(task.id).await.unwrap();
    settle().await;
    assert_eq!(harness.worker.executions(), 1);
    assert!(harness.context.pool.has_active());
    assert_eq!(harness.task(task.id).await.active_instances, 1);
    assert_eq!(harness.context.dispatcher.wake_lock().held(), 1);

    let stopped = harness.context.scheduler.cancel(task.id).await.unwrap();
    assert!(!stopped.running);
    assert_eq!(harness.context.alarms.pending_count(), 0);
    assert!(!harness.context.pool.has_active());

    settle().await;
    // The interrupted execution must not re-arm the stopped task.
    assert_eq!(harness.context.alarms.pending_count(), 0);
    assert_eq!(harness.context.dispatcher.wake_lock().held(), 0);
    let task = harness.task(task.id).await;
    assert_eq!(task.active_instances, 0);
    assert_eq!(task.last_scheduled, -1);
}

#[tokio::test(start_paused = true)]
async fn test_interrupted_execution_keeps_failure_count() {
    let harness = Harness::new(test_settings());
    let task = harness.create_task(5).await;
    harness.worker.push_outcomes(&[false]);

    harness.context.scheduler.start(task.id).await.unwrap();
    settle().await;
    assert_eq!(harness.task(task.id).await.failure_count, 1);

    harness.worker.hold();
    tokio::time::sleep(Duration::from_secs(5 * 60)).await;
    settle().await;
    assert_eq!(harness.worker.executions(), 2);

    harness.context.scheduler.cancel(task.id).await.unwrap();
    settle().await;

    let logs = harness.logs(task.id).await;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].message, "Execution interrupted");
    assert!(!logs[0].success);
    assert_eq!(harness.task(task.id).await.failure_count, 1);
    assert!(harness.sink.failures().len() == 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_generation_trigger_is_ignored() {
    let harness = Harness::new(test_settings());
    let task = harness.create_task(10).await;
    let started = harness.context.scheduler.start(task.id).await.unwrap();
    settle().await;
    assert_eq!(harness.worker.executions(), 1);

    harness
        .context
        .dispatcher
        .dispatch(task.id, task.generation_id, false)
        .await
        .unwrap();

    assert_eq!(harness.worker.executions(), 1);
    assert_eq!(harness.logs(task.id).await.len(), 1);
    assert_eq!(
        harness.context.alarms.pending_trigger(AlarmKey::Task(task.id)),
        Some(Trigger::Execute {
            task_id: task.id,
            generation_id: started.generation_id,
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_update_restarts_running_task_with_new_generation() {
    let harness = Harness::new(test_settings());
    let task = harness.create_task(10).await;
    let started = harness.context.scheduler.start(task.id).await.unwrap();
    settle().await;

    let mut edited = harness.task(task.id).await;
    edited.interval_minutes = 2;
    let updated = harness.context.scheduler.update(&edited).await.unwrap();
    assert!(updated.generation_id > started.generation_id);
    assert!(updated.running);

    settle().await;
    assert_eq!(harness.worker.executions(), 2);
    assert_eq!(
        harness.context.alarms.scheduled_at(AlarmKey::Task(task.id)),
        Some(harness.clock.now() + chrono::Duration::minutes(2))
    );
    assert_eq!(
        harness
            .context
            .alarms
            .pending_trigger(AlarmKey::Task(task.id))
            .and_then(|trigger| trigger.generation_id()),
        Some(updated.generation_id)
    );
}

#[tokio::test(start_paused = true)]
async fn test_update_of_stopped_task_does_not_schedule() {
    let harness = Harness::new(test_settings());
    let task = harness.create_task(10).await;

    let mut edited = task.clone();
    edited.address = "127.0.0.1".to_string();
    let updated = harness.context.scheduler.update(&edited).await.unwrap();
    assert_eq!(updated.address, "127.0.0.1");
    assert!(!updated.running);

    settle().await;
    assert_eq!(harness.context.alarms.pending_count(), 0);
    assert_eq!(harness.worker.executions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_execution_is_rejected_at_max_instances() {
    let harness = Harness::new(test_settings());
    let task = harness.create_task(10).await;
    harness.worker.hold();
    harness.context.scheduler.start(task.id).await.unwrap();
    settle().await;

    let current = harness.task(task.id).await;
    harness
        .context
        .dispatcher
        .dispatch(task.id, current.generation_id, false)
        .await
        .unwrap();

    assert_eq!(harness.worker.executions(), 1);
    let logs = harness.logs(task.id).await;
    assert_eq!(logs.len(), 1);
    assert!(!logs[0].success);
    assert_eq!(
        logs[0].message,
        "Skipped: too many active instances (1 active, 1 allowed)"
    );
    assert_eq!(harness.task(task.id).await.failure_count, 0);

    harness.worker.release();
    settle().await;
    let logs = harness.logs(task.id).await;
    assert_eq!(logs.len(), 2);
    assert!(logs[0].success);
    assert_eq!(harness.task(task.id).await.active_instances, 0);
}

/// 两个并发执行同时失败时，两次失败都要计入
#[tokio::test(start_paused = true)]
async fn test_concurrent_failures_are_both_counted() {
    let mut settings = test_settings();
    settings.workers.max_instances.null = 2;
    let harness = Harness::new(settings);
    let task = harness.create_task(10).await;
    harness.worker.hold();
    harness.worker.push_outcomes(&[false, false]);

    harness.context.scheduler.start(task.id).await.unwrap();
    settle().await;
    let current = harness.task(task.id).await;
    let second = harness
        .context
        .dispatcher
        .dispatch(task.id, current.generation_id, false);
    settle().await;
    assert_eq!(harness.worker.executions(), 2);
    assert_eq!(harness.task(task.id).await.active_instances, 2);

    harness.worker.release();
    settle().await;
    second.await.unwrap();

    let task = harness.task(task.id).await;
    assert_eq!(task.failure_count, 2);
    assert_eq!(task.active_instances, 0);
    let logs = harness.logs(task.id).await;
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|entry| !entry.success));

    let mut notified = harness.sink.failure_counts();
    notified.sort_unstable();
    assert_eq!(notified, vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_restart_resumes_with_remaining_interval() {
    let store = Arc::new(InMemoryStore::new());
    let first = Harness::with_store(test_settings(), store.clone(), noon());
    let task = first.create_task(15).await;
    first.context.scheduler.start(task.id).await.unwrap();
    settle().await;
    assert_eq!(first.worker.executions(), 1);

    first.context.shutdown().await;
    assert_eq!(first.context.alarms.pending_count(), 0);
    assert!(first.task(task.id).await.running);

    let second = Harness::with_store(
        test_settings(),
        store,
        noon() + chrono::Duration::minutes(1),
    );
    second.context.launch().await.unwrap();
    assert_eq!(
        second.context.alarms.scheduled_at(AlarmKey::Task(task.id)),
        Some(second.clock.now() + chrono::Duration::minutes(14))
    );
    settle().await;
    assert_eq!(second.worker.executions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_launch_resets_counters_of_stopped_tasks() {
    let store = Arc::new(InMemoryStore::new());
    let harness = Harness::with_store(test_settings(), store, noon());
    let task = harness.create_task(5).await;
    let tasks = &harness.context.repositories.tasks;
    tasks.update_failure_count(task.id, 3).await.unwrap();
    tasks.update_last_scheduled(task.id, 1_000).await.unwrap();
    assert!(tasks.try_acquire_instance(task.id, 1).await.unwrap());

    harness.context.launch().await.unwrap();

    let task = harness.task(task.id).await;
    assert_eq!(task.failure_count, 0);
    assert_eq!(task.last_scheduled, -1);
    assert_eq!(task.active_instances, 0);
    assert_eq!(harness.context.alarms.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_delete_removes_task_logs_and_alarm() {
    let harness = Harness::new(test_settings());
    let task = harness.create_task(5).await;
    harness.context.scheduler.start(task.id).await.unwrap();
    settle().await;
    assert_eq!(harness.logs(task.id).await.len(), 1);

    harness.worker.hold();
    tokio::time::sleep(Duration::from_secs(5 * 60)).await;
    settle().await;
    assert_eq!(harness.worker.executions(), 2);

    harness.context.scheduler.delete(task.id).await.unwrap();
    settle().await;
    assert!(harness
        .context
        .repositories
        .tasks
        .find_by_id(task.id)
        .await
        .unwrap()
        .is_none());
    assert!(harness.logs(task.id).await.is_empty());
    assert_eq!(harness.context.alarms.pending_count(), 0);

    let err = harness.context.scheduler.start(task.id).await.unwrap_err();
    assert!(err.to_string().contains(&task.id.to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_sync_mode_waits_for_execution_before_next_trigger() {
    let mut settings = test_settings();
    settings.scheduler.execution_mode = netwatch::config::settings::ExecutionMode::Sync;
    let harness = Harness::new(settings);
    let task = harness.create_task(1).await;

    let started = harness.context.scheduler.start(task.id).await.unwrap();
    settle().await;
    assert_eq!(harness.worker.executions(), 1);

    harness
        .context
        .dispatcher
        .handle(task.id, started.generation_id)
        .await;
    // In sync mode the handler returns only after the execution is logged.
    assert_eq!(harness.logs(task.id).await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_foreground_notification_follows_running_tasks() {
    let mut settings = test_settings();
    settings.scheduler.foreground = true;
    let harness = Harness::new(settings);
    let first = harness.create_task(5).await;
    let second = harness.create_task(5).await;

    harness.context.scheduler.start(first.id).await.unwrap();
    harness.context.scheduler.start(second.id).await.unwrap();
    settle().await;
    assert_eq!(harness.sink.foreground_raised(), 1);

    harness.context.scheduler.cancel(first.id).await.unwrap();
    assert_eq!(harness.sink.foreground_cleared(), 0);
    harness.context.scheduler.cancel(second.id).await.unwrap();
    assert_eq!(harness.sink.foreground_cleared(), 1);
}
