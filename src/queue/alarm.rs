// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::clock::Clock;
use chrono::{DateTime, Local};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use metrics::counter;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// 闹钟标识
///
/// 每个任务最多只有一个闹钟，挂起控制器另有一个
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmKey {
    Task(i64),
    Suspension,
}

/// 挂起窗口事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspensionEvent {
    /// 挂起窗口结束，恢复执行
    Up,
    /// 挂起窗口开始，停止执行
    Down,
}

/// 闹钟触发时投递的消息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// 执行一次任务
    Execute { task_id: i64, generation_id: i64 },
    /// 挂起窗口事件，`epoch` 为设置闹钟时挂起控制器的重启轮次
    Suspension { event: SuspensionEvent, epoch: u64 },
}

impl Trigger {
    pub fn generation_id(&self) -> Option<i64> {
        match self {
            Trigger::Execute { generation_id, .. } => Some(*generation_id),
            Trigger::Suspension { .. } => None,
        }
    }
}

pub type TriggerSender = mpsc::UnboundedSender<Trigger>;
pub type TriggerReceiver = mpsc::UnboundedReceiver<Trigger>;

/// 精确闹钟服务
///
/// 同一个 `AlarmKey` 上设置新闹钟会原子地取消旧闹钟
pub trait AlarmService: Send + Sync {
    /// 在 `delay` 之后触发
    fn set_after(&self, key: AlarmKey, delay: Duration, trigger: Trigger);
    /// 在墙上时间 `at` 触发，已过去的时间立即触发
    fn set_at(&self, key: AlarmKey, at: DateTime<Local>, trigger: Trigger);
    /// 取消闹钟，返回是否存在
    fn cancel(&self, key: AlarmKey) -> bool;
    /// 仅当挂起的闹钟携带指定代号时取消
    fn cancel_stale(&self, key: AlarmKey, generation_id: i64) -> bool;
    /// 取消所有任务闹钟，保留挂起控制器的闹钟
    fn cancel_task_alarms(&self) -> usize;
    /// 取消全部闹钟
    fn cancel_all(&self) -> usize;
    fn is_pending(&self, key: AlarmKey) -> bool;
    /// 闹钟预计触发的墙上时间
    fn scheduled_at(&self, key: AlarmKey) -> Option<DateTime<Local>>;
    /// 挂起闹钟携带的消息
    fn pending_trigger(&self, key: AlarmKey) -> Option<Trigger>;
    fn pending_count(&self) -> usize;
}

struct PendingAlarm {
    token: u64,
    trigger: Trigger,
    fire_at: DateTime<Local>,
    handle: JoinHandle<()>,
}

/// 基于 tokio 定时器的闹钟服务
///
/// 每个闹钟是一个休眠的任务，到期后从表中移除自身，再把 `Trigger`
/// 发送到通道。被替换或取消的闹钟既会被 abort，也会因为令牌不匹配而不发送。
pub struct TokioAlarmService {
    alarms: Arc<DashMap<AlarmKey, PendingAlarm>>,
    sender: TriggerSender,
    clock: Arc<dyn Clock>,
    next_token: AtomicU64,
}

impl TokioAlarmService {
    /// 创建闹钟服务
    ///
    /// # 参数
    ///
    /// * `clock` - 计算绝对时间闹钟所用的时钟
    ///
    /// # 返回值
    ///
    /// 返回服务实例以及接收触发消息的通道
    pub fn new(clock: Arc<dyn Clock>) -> (Self, TriggerReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                alarms: Arc::new(DashMap::new()),
                sender,
                clock,
                next_token: AtomicU64::new(1),
            },
            receiver,
        )
    }

    fn arm(&self, key: AlarmKey, delay: Duration, trigger: Trigger) {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let fire_at = self.clock.now()
            + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());

        // The shard stays locked until the new alarm is stored, so the
        // spawned task cannot race its own registration.
        let entry = self.alarms.entry(key);
        let alarms = self.alarms.clone();
        let sender = self.sender.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if alarms.remove_if(&key, |_, alarm| alarm.token == token).is_some()
                && sender.send(trigger).is_err()
            {
                debug!(?key, "Trigger receiver closed, dropping alarm");
            }
        });

        let pending = PendingAlarm {
            token,
            trigger,
            fire_at,
            handle,
        };
        match entry {
            Entry::Occupied(mut occupied) => {
                let previous = occupied.insert(pending);
                previous.handle.abort();
                debug!(?key, "Replaced pending alarm");
            }
            Entry::Vacant(vacant) => {
                vacant.insert(pending);
            }
        }

        counter!("alarms_armed_total").increment(1);
        debug!(?key, ?trigger, delay_ms = delay.as_millis() as u64, "Alarm armed");
    }
}

impl AlarmService for TokioAlarmService {
    fn set_after(&self, key: AlarmKey, delay: Duration, trigger: Trigger) {
        self.arm(key, delay, trigger);
    }

    fn set_at(&self, key: AlarmKey, at: DateTime<Local>, trigger: Trigger) {
        let delay = (at - self.clock.now()).to_std().unwrap_or(Duration::ZERO);
        self.arm(key, delay, trigger);
    }

    fn cancel(&self, key: AlarmKey) -> bool {
        match self.alarms.remove(&key) {
            Some((_, alarm)) => {
                alarm.handle.abort();
                debug!(?key, "Alarm cancelled");
                true
            }
            None => false,
        }
    }

    fn cancel_stale(&self, key: AlarmKey, generation_id: i64) -> bool {
        match self
            .alarms
            .remove_if(&key, |_, alarm| alarm.trigger.generation_id() == Some(generation_id))
        {
            Some((_, alarm)) => {
                alarm.handle.abort();
                debug!(?key, generation_id, "Stale alarm cancelled");
                true
            }
            None => false,
        }
    }

    fn cancel_task_alarms(&self) -> usize {
        let mut cancelled = 0;
        self.alarms.retain(|key, alarm| match key {
            AlarmKey::Task(_) => {
                alarm.handle.abort();
                cancelled += 1;
                false
            }
            AlarmKey::Suspension => true,
        });
        cancelled
    }

    fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        self.alarms.retain(|_, alarm| {
            alarm.handle.abort();
            cancelled += 1;
            false
        });
        cancelled
    }

    fn is_pending(&self, key: AlarmKey) -> bool {
        self.alarms.contains_key(&key)
    }

    fn scheduled_at(&self, key: AlarmKey) -> Option<DateTime<Local>> {
        self.alarms.get(&key).map(|alarm| alarm.fire_at)
    }

    fn pending_trigger(&self, key: AlarmKey) -> Option<Trigger> {
        self.alarms.get(&key).map(|alarm| alarm.trigger)
    }

    fn pending_count(&self) -> usize {
        self.alarms.len()
    }
}

impl Drop for TokioAlarmService {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
