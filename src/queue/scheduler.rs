// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::domain::models::suspension::SuspensionInterval;
use crate::domain::models::task::{Task, NEVER_SCHEDULED};
use crate::domain::repositories::access_type_data_repository::AccessTypeDataRepository;
use crate::domain::repositories::log_repository::LogRepository;
use crate::domain::repositories::task_repository::TaskRepository;
use crate::domain::repositories::Repositories;
use crate::domain::services::notification_service::NotificationSink;
use crate::infrastructure::events::EventBus;
use crate::queue::alarm::{AlarmKey, AlarmService, SuspensionEvent, Trigger};
use crate::queue::process_pool::ProcessPool;
use crate::queue::suspension::SuspensionController;
use crate::utils::clock::Clock;
use crate::utils::errors::SchedulerError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// 重新调度时的延迟计算方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayKind {
    /// 立即执行
    Immediate,
    /// 间隔一个完整周期
    Interval,
    /// 从上次执行起算剩余的周期，用于进程重启或挂起恢复
    LastScheduled,
}

/// 计算重新调度的延迟
///
/// # 参数
///
/// * `kind` - 延迟计算方式
/// * `task` - 任务
/// * `now_millis` - 当前毫秒时间戳
///
/// # 返回值
///
/// 返回不小于 0、不大于一个周期的延迟
pub fn compute_delay(kind: DelayKind, task: &Task, now_millis: i64) -> Duration {
    let interval = task.interval_millis();
    let millis = match kind {
        DelayKind::Immediate => 0,
        DelayKind::Interval => interval,
        DelayKind::LastScheduled if !task.was_scheduled() => 0,
        DelayKind::LastScheduled => {
            let elapsed = now_millis - task.last_scheduled;
            (interval - elapsed).clamp(0, interval)
        }
    };
    Duration::from_millis(millis as u64)
}

/// 任务调度器
///
/// 保证每个任务最多只有一个有效闹钟，并在编辑、删除、停止任务时
/// 取消过期的闹钟和进行中的执行。公开方法都会获取同一把全局锁，
/// `*_locked` 方法假定调用方已持有该锁。
pub struct TaskScheduler {
    tasks: Arc<dyn TaskRepository>,
    logs: Arc<dyn LogRepository>,
    access_data: Arc<dyn AccessTypeDataRepository>,
    alarms: Arc<dyn AlarmService>,
    pool: Arc<ProcessPool>,
    suspension: SuspensionController,
    notifications: Arc<dyn NotificationSink>,
    events: EventBus,
    clock: Arc<dyn Clock>,
    foreground_enabled: bool,
    foreground_active: AtomicBool,
    lock: Mutex<()>,
}

impl TaskScheduler {
    /// 创建新的任务调度器实例
    ///
    /// # 参数
    ///
    /// * `repositories` - 仓库集合
    /// * `alarms` - 闹钟服务
    /// * `pool` - 进程池
    /// * `notifications` - 通知服务
    /// * `events` - 事件总线
    /// * `clock` - 时钟
    /// * `settings` - 应用配置
    ///
    /// # 返回值
    ///
    /// 返回新的任务调度器实例
    pub fn new(
        repositories: &Repositories,
        alarms: Arc<dyn AlarmService>,
        pool: Arc<ProcessPool>,
        notifications: Arc<dyn NotificationSink>,
        events: EventBus,
        clock: Arc<dyn Clock>,
        settings: &Settings,
    ) -> Self {
        let suspension = SuspensionController::new(
            repositories.scheduler_state.clone(),
            alarms.clone(),
            clock.clone(),
            settings.suspension.enabled,
            settings.suspension.threshold(),
        );
        Self {
            tasks: repositories.tasks.clone(),
            logs: repositories.logs.clone(),
            access_data: repositories.access_data.clone(),
            alarms,
            pool,
            suspension,
            notifications,
            events,
            clock,
            foreground_enabled: settings.scheduler.foreground,
            foreground_active: AtomicBool::new(false),
            lock: Mutex::new(()),
        }
    }

    pub fn suspension(&self) -> &SuspensionController {
        &self.suspension
    }

    /// 启动任务
    ///
    /// 标记为运行（分配新代号）、清零失败次数，然后由挂起控制器决定首次调度
    pub async fn start(&self, task_id: i64) -> Result<Task, SchedulerError> {
        let _guard = self.lock.lock().await;
        let task = self.require(task_id).await?;
        if task.running {
            self.terminate_task(&task);
        }

        self.tasks.update_running(task_id, true).await?;
        self.tasks.update_failure_count(task_id, 0).await?;
        self.tasks.update_last_scheduled(task_id, NEVER_SCHEDULED).await?;
        let task = self.require(task_id).await?;

        info!(task_id, generation_id = task.generation_id, "Starting task");
        self.suspension.start_task(self, &task).await?;
        self.events.task_changed(task_id);
        Ok(task)
    }

    /// 立即调度一次执行
    pub async fn schedule(&self, task: &Task) -> Result<(), SchedulerError> {
        let _guard = self.lock.lock().await;
        self.schedule_locked(task).await
    }

    /// 重新调度
    ///
    /// 任务不存在、未运行或代号不匹配时不做调度，并清理该过期代号的闹钟和执行
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(delay))` - 已设置闹钟
    /// * `Ok(None)` - 过期调用或处于挂起状态，未设置闹钟
    pub async fn reschedule(
        &self,
        task_id: i64,
        generation_id: i64,
        kind: DelayKind,
    ) -> Result<Option<Duration>, SchedulerError> {
        let _guard = self.lock.lock().await;
        self.reschedule_locked(task_id, generation_id, kind).await
    }

    /// 停止任务
    pub async fn cancel(&self, task_id: i64) -> Result<Task, SchedulerError> {
        let _guard = self.lock.lock().await;
        let task = self.require(task_id).await?;

        self.tasks.update_running(task_id, false).await?;
        self.tasks.update_last_scheduled(task_id, NEVER_SCHEDULED).await?;
        self.terminate_task(&task);
        info!(task_id, "Task stopped");

        self.stop_if_idle().await?;
        self.events.task_changed(task_id);
        self.require(task_id).await
    }

    /// 取消任务的闹钟和进行中的执行，不修改运行标志
    pub async fn terminate(&self, task: &Task) {
        let _guard = self.lock.lock().await;
        self.terminate_task(task);
    }

    /// 取消所有任务的闹钟和进行中的执行，不修改运行标志
    pub async fn terminate_all(&self) {
        let _guard = self.lock.lock().await;
        self.terminate_all_locked();
    }

    /// 为所有运行中的任务按 LastScheduled 重新设置闹钟
    pub async fn startup(&self) -> Result<(), SchedulerError> {
        let _guard = self.lock.lock().await;
        self.startup_locked().await
    }

    /// 进程启动入口
    pub async fn launch(&self) -> Result<(), SchedulerError> {
        let _guard = self.lock.lock().await;
        if self.tasks.any_running().await? {
            info!("Resuming running tasks after launch");
            self.suspension.start(self).await
        } else {
            self.startup_locked().await
        }
    }

    /// 进程退出时取消所有闹钟和执行，保留运行标志以便下次启动恢复
    pub async fn shutdown(&self) {
        let _guard = self.lock.lock().await;
        let alarms = self.alarms.cancel_all();
        let executions = self.pool.cancel_all();
        info!(alarms, executions, "Scheduler shut down");
    }

    /// 保存任务定义的修改
    ///
    /// 运行中的任务会终止旧代号的执行并按新代号重新进入启动决策
    pub async fn update(&self, task: &Task) -> Result<Task, SchedulerError> {
        task.validate()?;
        let _guard = self.lock.lock().await;
        let existing = self.require(task.id).await?;
        let updated = self.tasks.update(task).await?;

        if existing.running {
            self.terminate_task(&existing);
            self.suspension.start_task(self, &updated).await?;
        }
        debug!(task_id = task.id, generation_id = updated.generation_id, "Task updated");
        self.events.task_changed(task.id);
        Ok(updated)
    }

    /// 删除任务及其日志和探测参数
    pub async fn delete(&self, task_id: i64) -> Result<(), SchedulerError> {
        let _guard = self.lock.lock().await;
        let task = self.require(task_id).await?;
        self.terminate_task(&task);

        self.tasks.delete(task_id).await?;
        self.logs.delete_by_task(task_id).await?;
        self.access_data.delete_by_task(task_id).await?;
        info!(task_id, "Task deleted");

        self.stop_if_idle().await?;
        self.events.task_changed(task_id);
        Ok(())
    }

    /// 处理挂起闹钟
    pub async fn on_suspension_trigger(
        &self,
        event: SuspensionEvent,
        epoch: u64,
    ) -> Result<(), SchedulerError> {
        let _guard = self.lock.lock().await;
        self.suspension.handle(self, event, epoch).await
    }

    /// 新增挂起窗口并重启挂起控制器
    pub async fn add_suspension_interval(
        &self,
        interval: &SuspensionInterval,
    ) -> Result<SuspensionInterval, SchedulerError> {
        interval.validate()?;
        let _guard = self.lock.lock().await;
        let stored = self.suspension.insert_interval(interval).await?;
        self.suspension.restart(self).await?;
        Ok(stored)
    }

    /// 删除挂起窗口并重启挂起控制器
    pub async fn remove_suspension_interval(&self, id: i64) -> Result<(), SchedulerError> {
        let _guard = self.lock.lock().await;
        self.suspension.remove_interval(id).await?;
        self.suspension.restart(self).await
    }

    /// 开启或关闭基于时间的挂起
    pub async fn set_suspension_enabled(&self, enabled: bool) -> Result<(), SchedulerError> {
        let _guard = self.lock.lock().await;
        if self.suspension.is_enabled() == enabled {
            return Ok(());
        }
        self.suspension.set_enabled(enabled);
        self.suspension.restart(self).await
    }

    pub(crate) async fn schedule_locked(&self, task: &Task) -> Result<(), SchedulerError> {
        self.ensure_foreground().await;
        self.alarms.set_after(
            AlarmKey::Task(task.id),
            Duration::ZERO,
            Trigger::Execute {
                task_id: task.id,
                generation_id: task.generation_id,
            },
        );
        debug!(task_id = task.id, generation_id = task.generation_id, "Task scheduled");
        Ok(())
    }

    pub(crate) async fn reschedule_locked(
        &self,
        task_id: i64,
        generation_id: i64,
        kind: DelayKind,
    ) -> Result<Option<Duration>, SchedulerError> {
        let task = match self.tasks.find_by_id(task_id).await? {
            Some(task) if task.running && task.generation_id == generation_id => task,
            other => {
                debug!(
                    task_id,
                    generation_id,
                    current = ?other.map(|t| t.generation_id),
                    "Ignoring reschedule for stale generation"
                );
                self.alarms.cancel_stale(AlarmKey::Task(task_id), generation_id);
                self.pool.cancel(generation_id);
                return Ok(None);
            }
        };

        if self.suspension.is_suspended() {
            debug!(task_id, "Scheduler suspended, not re-arming");
            return Ok(None);
        }

        let delay = compute_delay(kind, &task, self.clock.now_millis());
        self.alarms.set_after(
            AlarmKey::Task(task_id),
            delay,
            Trigger::Execute {
                task_id,
                generation_id,
            },
        );
        debug!(task_id, generation_id, ?kind, delay_ms = delay.as_millis() as u64, "Task rescheduled");
        Ok(Some(delay))
    }

    pub(crate) async fn startup_locked(&self) -> Result<(), SchedulerError> {
        let tasks = self.tasks.find_all().await?;
        // Counters left behind by a previous process are only trustworthy
        // when nothing of ours is still executing.
        if !self.pool.has_active() {
            self.tasks.reset_all_instances().await?;
        }

        let mut armed = 0;
        for task in &tasks {
            if task.running {
                if self
                    .reschedule_locked(task.id, task.generation_id, DelayKind::LastScheduled)
                    .await?
                    .is_some()
                {
                    armed += 1;
                }
            } else {
                self.tasks.reset_counters(task.id).await?;
            }
        }
        if armed > 0 {
            self.ensure_foreground().await;
        }
        info!(armed, total = tasks.len(), "Scheduler startup complete");
        Ok(())
    }

    pub(crate) fn terminate_all_locked(&self) {
        let alarms = self.alarms.cancel_task_alarms();
        let executions = self.pool.cancel_all();
        debug!(alarms, executions, "Terminated all tasks");
    }

    fn terminate_task(&self, task: &Task) {
        self.alarms.cancel(AlarmKey::Task(task.id));
        self.pool.cancel(task.generation_id);
    }

    async fn stop_if_idle(&self) -> Result<(), SchedulerError> {
        if self.tasks.any_running().await? {
            return Ok(());
        }
        self.suspension.stop().await?;
        if self.foreground_active.swap(false, Ordering::SeqCst) {
            if let Err(e) = self.notifications.clear_foreground_status_notification().await {
                warn!("Failed to clear foreground notification: {}", e);
            }
        }
        Ok(())
    }

    async fn ensure_foreground(&self) {
        if !self.foreground_enabled || self.foreground_active.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.notifications.send_foreground_status_notification().await {
            warn!("Failed to raise foreground notification: {}", e);
        }
    }

    async fn require(&self, task_id: i64) -> Result<Task, SchedulerError> {
        self.tasks
            .find_by_id(task_id)
            .await?
            .ok_or(SchedulerError::TaskNotFound(task_id))
    }
}
