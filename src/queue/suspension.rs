// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::suspension::{SchedulerState, SuspensionInterval};
use crate::domain::models::task::Task;
use crate::domain::repositories::scheduler_state_repository::SchedulerStateRepository;
use crate::queue::alarm::{AlarmKey, AlarmService, SuspensionEvent, Trigger};
use crate::queue::scheduler::TaskScheduler;
use crate::utils::clock::Clock;
use crate::utils::errors::SchedulerError;
use chrono::{DateTime, Days, Local, NaiveDateTime, NaiveTime, TimeZone};
use metrics::gauge;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 查找包含给定时刻的挂起窗口
///
/// # 参数
///
/// * `intervals` - 全部挂起窗口
/// * `time` - 一天中的时刻
///
/// # 返回值
///
/// 返回第一个包含该时刻的窗口，没有则返回 `None`
pub fn find_current_suspend_interval(
    intervals: &[SuspensionInterval],
    time: NaiveTime,
) -> Option<SuspensionInterval> {
    intervals.iter().find(|interval| interval.contains(time)).copied()
}

/// 查找给定时刻之后最近开始的挂起窗口
///
/// 当天没有更晚的开始时间时回绕到次日最早开始的窗口
pub fn find_next_suspend_interval(
    intervals: &[SuspensionInterval],
    time: NaiveTime,
) -> Option<SuspensionInterval> {
    intervals
        .iter()
        .filter(|interval| interval.start > time)
        .min_by_key(|interval| interval.start)
        .or_else(|| intervals.iter().min_by_key(|interval| interval.start))
        .copied()
}

/// 计算 `time` 在 `after` 之后的下一次出现
pub fn next_occurrence(time: NaiveTime, after: DateTime<Local>) -> DateTime<Local> {
    let reference = after.naive_local();
    let today = reference.date().and_time(time);
    let target = if today > reference {
        today
    } else {
        today + Days::new(1)
    };
    resolve_local(target)
}

fn resolve_local(naive: NaiveDateTime) -> DateTime<Local> {
    first_valid(naive, |candidate| Local.from_local_datetime(candidate).earliest())
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

/// 本地时间落在夏令时跳过的空档里时，取空档之后一小时的同一时刻
fn first_valid<T>(
    naive: NaiveDateTime,
    resolve: impl Fn(&NaiveDateTime) -> Option<T>,
) -> Option<T> {
    resolve(&naive).or_else(|| resolve(&(naive + chrono::Duration::hours(1))))
}

#[derive(Debug, Default)]
struct ControllerState {
    running: bool,
    suspended: bool,
    epoch: u64,
    intervals: Option<Vec<SuspensionInterval>>,
}

/// 挂起控制器
///
/// 在每日挂起窗口内停止所有任务，窗口结束后以 LastScheduled 语义恢复。
/// 所有会改变状态的方法都要求调用方已持有 `TaskScheduler` 的全局锁，
/// 因此这里的内部互斥锁只保护字段读写，从不跨越 await。
pub struct SuspensionController {
    repository: Arc<dyn SchedulerStateRepository>,
    alarms: Arc<dyn AlarmService>,
    clock: Arc<dyn Clock>,
    enabled: AtomicBool,
    threshold: Duration,
    state: Mutex<ControllerState>,
}

impl SuspensionController {
    pub fn new(
        repository: Arc<dyn SchedulerStateRepository>,
        alarms: Arc<dyn AlarmService>,
        clock: Arc<dyn Clock>,
        enabled: bool,
        threshold: Duration,
    ) -> Self {
        Self {
            repository,
            alarms,
            clock,
            enabled: AtomicBool::new(enabled),
            threshold,
            state: Mutex::new(ControllerState::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    pub fn is_suspended(&self) -> bool {
        self.state.lock().suspended
    }

    /// 当前重启轮次
    pub fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    /// 读取挂起窗口，首次读取后缓存
    pub async fn intervals(&self) -> Result<Vec<SuspensionInterval>, SchedulerError> {
        if let Some(cached) = self.state.lock().intervals.clone() {
            return Ok(cached);
        }
        let intervals = self.repository.read_intervals().await?;
        self.state.lock().intervals = Some(intervals.clone());
        Ok(intervals)
    }

    pub(crate) async fn insert_interval(
        &self,
        interval: &SuspensionInterval,
    ) -> Result<SuspensionInterval, SchedulerError> {
        Ok(self.repository.insert_interval(interval).await?)
    }

    pub(crate) async fn remove_interval(&self, id: i64) -> Result<(), SchedulerError> {
        Ok(self.repository.delete_interval(id).await?)
    }

    /// 持久化的挂起状态
    pub async fn persisted_state(&self) -> Result<SchedulerState, SchedulerError> {
        Ok(self.repository.read_state().await?)
    }

    /// 以当前时间加阈值判断应处于哪种状态并据此启动
    pub(crate) async fn start(&self, scheduler: &TaskScheduler) -> Result<(), SchedulerError> {
        let intervals = self.intervals().await?;
        let previous = self.repository.read_state().await?;
        self.state.lock().running = true;

        if !self.is_enabled() || intervals.is_empty() {
            debug!("Time based suspension inactive, starting tasks directly");
            self.state.lock().suspended = false;
            if previous.suspended {
                self.persist(false).await?;
            }
            gauge!("scheduler_suspended").set(0.0);
            return scheduler.startup_locked().await;
        }

        let reference = self.reference_time();
        match find_current_suspend_interval(&intervals, reference.time()) {
            Some(interval) => {
                if !previous.suspended {
                    info!("Starting inside a suspension interval");
                }
                self.enter_suspension(scheduler, interval, reference).await
            }
            None => {
                if previous.suspended {
                    info!("Suspension interval ended while stopped, resuming");
                }
                self.resume(scheduler, &intervals, reference).await
            }
        }
    }

    /// 一个任务被启动时的首次调度决策
    pub(crate) async fn start_task(
        &self,
        scheduler: &TaskScheduler,
        task: &Task,
    ) -> Result<(), SchedulerError> {
        let (running, suspended) = {
            let state = self.state.lock();
            (state.running, state.suspended)
        };
        if !running {
            self.start(scheduler).await
        } else if !suspended {
            scheduler.schedule_locked(task).await
        } else {
            info!(task_id = task.id, "Scheduler is suspended, task starts when the interval ends");
            Ok(())
        }
    }

    /// 停止控制器，取消挂起闹钟并恢复为非挂起状态
    pub(crate) async fn stop(&self) -> Result<(), SchedulerError> {
        self.alarms.cancel(AlarmKey::Suspension);
        let was_suspended = {
            let mut state = self.state.lock();
            state.running = false;
            std::mem::replace(&mut state.suspended, false)
        };
        if was_suspended {
            self.persist(false).await?;
        }
        gauge!("scheduler_suspended").set(0.0);
        debug!("Suspension controller stopped");
        Ok(())
    }

    /// 配置变化后重启
    ///
    /// 递增重启轮次，之前设置的挂起闹钟即使已经触发也会被丢弃
    pub(crate) async fn restart(&self, scheduler: &TaskScheduler) -> Result<(), SchedulerError> {
        let running = {
            let mut state = self.state.lock();
            state.epoch += 1;
            state.intervals = None;
            state.running
        };
        self.alarms.cancel(AlarmKey::Suspension);
        if running {
            info!(epoch = self.epoch(), "Restarting suspension controller");
            self.start(scheduler).await
        } else {
            Ok(())
        }
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// 处理挂起闹钟
    pub(crate) async fn handle(
        &self,
        scheduler: &TaskScheduler,
        event: SuspensionEvent,
        epoch: u64,
    ) -> Result<(), SchedulerError> {
        {
            let state = self.state.lock();
            if epoch < state.epoch {
                debug!(?event, epoch, current = state.epoch, "Dropping trigger armed before restart");
                return Ok(());
            }
            if !state.running {
                debug!(?event, "Suspension controller not running, ignoring trigger");
                return Ok(());
            }
        }

        let intervals = self.intervals().await?;
        if !self.is_enabled() || intervals.is_empty() {
            return Ok(());
        }

        let reference = self.reference_time();
        let current = find_current_suspend_interval(&intervals, reference.time());
        match (event, current) {
            (_, Some(interval)) => self.enter_suspension(scheduler, interval, reference).await,
            (SuspensionEvent::Up, None) => self.resume(scheduler, &intervals, reference).await,
            (SuspensionEvent::Down, None) => {
                warn!("Suspension trigger arrived outside any interval, re-arming");
                self.arm_next_down(&intervals, reference);
                Ok(())
            }
        }
    }

    fn reference_time(&self) -> DateTime<Local> {
        self.clock.now()
            + chrono::Duration::from_std(self.threshold).unwrap_or_else(|_| chrono::Duration::zero())
    }

    async fn enter_suspension(
        &self,
        scheduler: &TaskScheduler,
        interval: SuspensionInterval,
        reference: DateTime<Local>,
    ) -> Result<(), SchedulerError> {
        let up_at = next_occurrence(interval.end, reference);
        self.alarms.set_at(
            AlarmKey::Suspension,
            up_at,
            Trigger::Suspension {
                event: SuspensionEvent::Up,
                epoch: self.epoch(),
            },
        );
        self.state.lock().suspended = true;
        self.persist(true).await?;
        scheduler.terminate_all_locked();
        gauge!("scheduler_suspended").set(1.0);
        info!(resume_at = %up_at, "Scheduler suspended");
        Ok(())
    }

    async fn resume(
        &self,
        scheduler: &TaskScheduler,
        intervals: &[SuspensionInterval],
        reference: DateTime<Local>,
    ) -> Result<(), SchedulerError> {
        self.arm_next_down(intervals, reference);
        self.state.lock().suspended = false;
        self.persist(false).await?;
        gauge!("scheduler_suspended").set(0.0);
        info!("Scheduler active");
        scheduler.startup_locked().await
    }

    fn arm_next_down(&self, intervals: &[SuspensionInterval], reference: DateTime<Local>) {
        if let Some(next) = find_next_suspend_interval(intervals, reference.time()) {
            let down_at = next_occurrence(next.start, reference);
            self.alarms.set_at(
                AlarmKey::Suspension,
                down_at,
                Trigger::Suspension {
                    event: SuspensionEvent::Down,
                    epoch: self.epoch(),
                },
            );
            debug!(suspend_at = %down_at, "Next suspension armed");
        }
    }

    async fn persist(&self, suspended: bool) -> Result<(), SchedulerError> {
        self.repository
            .update_state(SchedulerState {
                suspended,
                timestamp: self.clock.now_millis(),
            })
            .await?;
        Ok(())
    }
}
