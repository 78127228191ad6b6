// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{local, settle, test_settings, Harness};
use netwatch::domain::models::suspension::SuspensionInterval;
use netwatch::queue::alarm::{AlarmKey, SuspensionEvent, Trigger};

/// 23:00 到次日 06:00 的挂起窗口
fn night() -> SuspensionInterval {
    SuspensionInterval::from_minutes(0, 23 * 60, 6 * 60).unwrap()
}

async fn suspended_harness() -> (Harness, i64) {
    let harness = Harness::at(test_settings(), local(6, 10, 23, 30));
    harness
        .context
        .scheduler
        .add_suspension_interval(&night())
        .await
        .unwrap();
    let task = harness.create_task(5).await;
    harness.context.scheduler.start(task.id).await.unwrap();
    (harness, task.id)
}

#[tokio::test(start_paused = true)]
async fn test_starting_inside_interval_suspends_until_interval_end() {
    let (harness, task_id) = suspended_harness().await;
    let suspension = harness.context.scheduler.suspension();

    assert!(suspension.is_running());
    assert!(suspension.is_suspended());
    assert!(!harness.context.alarms.is_pending(AlarmKey::Task(task_id)));
    assert_eq!(
        harness.context.alarms.scheduled_at(AlarmKey::Suspension),
        Some(local(6, 11, 6, 0))
    );
    assert!(suspension.persisted_state().await.unwrap().suspended);

    settle().await;
    assert_eq!(harness.worker.executions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_up_trigger_resumes_and_arms_next_down() {
    let (harness, task_id) = suspended_harness().await;
    let suspension = harness.context.scheduler.suspension();

    harness.clock.set(local(6, 11, 12, 0));
    harness
        .context
        .scheduler
        .on_suspension_trigger(SuspensionEvent::Up, suspension.epoch())
        .await
        .unwrap();

    assert!(!suspension.is_suspended());
    assert!(!suspension.persisted_state().await.unwrap().suspended);
    assert_eq!(
        harness.context.alarms.scheduled_at(AlarmKey::Suspension),
        Some(local(6, 11, 23, 0))
    );
    assert!(matches!(
        harness.context.alarms.pending_trigger(AlarmKey::Suspension),
        Some(Trigger::Suspension {
            event: SuspensionEvent::Down,
            ..
        })
    ));

    settle().await;
    assert_eq!(harness.worker.executions(), 1);
    assert!(harness.context.alarms.is_pending(AlarmKey::Task(task_id)));
}

#[tokio::test(start_paused = true)]
async fn test_down_trigger_suspends_running_tasks() {
    let harness = Harness::at(test_settings(), local(6, 10, 12, 0));
    harness
        .context
        .scheduler
        .add_suspension_interval(&night())
        .await
        .unwrap();
    let task = harness.create_task(5).await;
    harness.context.scheduler.start(task.id).await.unwrap();
    settle().await;
    assert_eq!(harness.worker.executions(), 1);
    assert!(harness.context.alarms.is_pending(AlarmKey::Task(task.id)));

    let suspension = harness.context.scheduler.suspension();
    harness.clock.set(local(6, 10, 23, 0));
    harness
        .context
        .scheduler
        .on_suspension_trigger(SuspensionEvent::Down, suspension.epoch())
        .await
        .unwrap();

    assert!(suspension.is_suspended());
    assert!(!harness.context.alarms.is_pending(AlarmKey::Task(task.id)));
    assert_eq!(
        harness.context.alarms.scheduled_at(AlarmKey::Suspension),
        Some(local(6, 11, 6, 0))
    );

    // A trigger delivered for the suspended task is not re-armed.
    let current = harness.task(task.id).await;
    assert_eq!(
        harness
            .context
            .scheduler
            .reschedule(
                task.id,
                current.generation_id,
                netwatch::queue::scheduler::DelayKind::Interval
            )
            .await
            .unwrap(),
        None
    );
}

#[tokio::test(start_paused = true)]
async fn test_trigger_armed_before_restart_is_dropped() {
    let (harness, _) = suspended_harness().await;
    let suspension = harness.context.scheduler.suspension();
    let stale_epoch = suspension.epoch();

    let lunch = SuspensionInterval::from_minutes(0, 12 * 60, 13 * 60).unwrap();
    harness
        .context
        .scheduler
        .add_suspension_interval(&lunch)
        .await
        .unwrap();
    assert!(suspension.epoch() > stale_epoch);
    assert!(suspension.is_suspended());

    harness.clock.set(local(6, 11, 14, 0));
    harness
        .context
        .scheduler
        .on_suspension_trigger(SuspensionEvent::Up, stale_epoch)
        .await
        .unwrap();
    assert!(suspension.is_suspended());

    harness
        .context
        .scheduler
        .on_suspension_trigger(SuspensionEvent::Up, suspension.epoch())
        .await
        .unwrap();
    assert!(!suspension.is_suspended());
    assert_eq!(
        harness.context.alarms.scheduled_at(AlarmKey::Suspension),
        Some(local(6, 11, 23, 0))
    );
}

#[tokio::test(start_paused = true)]
async fn test_disabling_suspension_resumes_immediately() {
    let (harness, task_id) = suspended_harness().await;

    harness
        .context
        .scheduler
        .set_suspension_enabled(false)
        .await
        .unwrap();

    let suspension = harness.context.scheduler.suspension();
    assert!(!suspension.is_enabled());
    assert!(!suspension.is_suspended());
    assert!(!suspension.persisted_state().await.unwrap().suspended);
    assert!(!harness.context.alarms.is_pending(AlarmKey::Suspension));
    settle().await;
    assert_eq!(harness.worker.executions(), 1);
    assert!(harness.context.alarms.is_pending(AlarmKey::Task(task_id)));
}

#[tokio::test(start_paused = true)]
async fn test_removing_interval_resumes_tasks() {
    let (harness, _) = suspended_harness().await;
    let intervals = harness.context.scheduler.suspension().intervals().await.unwrap();
    assert_eq!(intervals.len(), 1);

    harness
        .context
        .scheduler
        .remove_suspension_interval(intervals[0].id)
        .await
        .unwrap();

    assert!(!harness.context.scheduler.suspension().is_suspended());
    settle().await;
    assert_eq!(harness.worker.executions(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stopping_last_task_stops_controller() {
    let (harness, task_id) = suspended_harness().await;

    harness.context.scheduler.cancel(task_id).await.unwrap();

    let suspension = harness.context.scheduler.suspension();
    assert!(!suspension.is_running());
    assert!(!suspension.is_suspended());
    assert_eq!(harness.context.alarms.pending_count(), 0);
    assert!(!suspension.persisted_state().await.unwrap().suspended);
}

#[tokio::test(start_paused = true)]
async fn test_task_started_while_suspended_waits_for_interval_end() {
    let (harness, _) = suspended_harness().await;
    let second = harness.create_task(5).await;

    harness.context.scheduler.start(second.id).await.unwrap();
    settle().await;

    assert!(harness.task(second.id).await.running);
    assert!(!harness.context.alarms.is_pending(AlarmKey::Task(second.id)));
    assert_eq!(harness.worker.executions(), 0);
}
