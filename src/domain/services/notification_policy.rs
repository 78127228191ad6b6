// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::NotificationSettings;
use crate::domain::models::task::Task;
use serde::{Deserialize, Serialize};

/// 通知策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMode {
    /// 成功与失败之间切换时通知
    Change,
    /// 每累计 N 次失败通知一次
    #[default]
    Failure,
}

/// 一次执行的分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success,
    /// 探测失败（超时、拒绝连接、DNS 失败等）
    Failure,
    /// 执行被取消或超出执行时限
    Interrupted,
    /// 没有可用网络
    NoNetwork,
    /// 不在首选网络上
    NotPreferredNetwork,
    /// 并发实例数已达上限
    TooManyInstances,
}

/// 失败计数与通知决策
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureDecision {
    /// 新的连续失败次数
    pub failure_count: u32,
    /// 是否发送失败状态通知
    pub notify: bool,
    /// 是否额外发送告警式通知
    pub alarm: bool,
}

/// 一次结果对连续失败次数的影响
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCountChange {
    /// 清零
    Reset,
    /// 加一
    Increment,
    /// 保持不变
    Unchanged,
}

/// 失败计数与通知规则
///
/// 成功清零；普通失败加一；前置条件失败、实例数超限和中断不改变计数。
/// 没有网络时，只有开启 `notify_on_inactive_network` 才按普通失败处理。
#[derive(Debug, Clone)]
pub struct NotificationPolicy {
    mode: NotificationMode,
    failures_before_notification: u32,
    notify_on_inactive_network: bool,
    high_priority_alarm: bool,
}

impl NotificationPolicy {
    pub fn new(
        mode: NotificationMode,
        failures_before_notification: u32,
        notify_on_inactive_network: bool,
        high_priority_alarm: bool,
    ) -> Self {
        Self {
            mode,
            failures_before_notification: failures_before_notification.max(1),
            notify_on_inactive_network,
            high_priority_alarm,
        }
    }

    pub fn from_settings(settings: &NotificationSettings) -> Self {
        Self::new(
            settings.mode,
            settings.failures_before_notification,
            settings.notify_on_inactive_network,
            settings.high_priority_alarm,
        )
    }

    /// 该结果是否计入连续失败次数
    pub fn counts_as_failure(&self, outcome: ExecutionOutcome) -> bool {
        match outcome {
            ExecutionOutcome::Failure => true,
            ExecutionOutcome::NoNetwork => self.notify_on_inactive_network,
            _ => false,
        }
    }

    /// 本次结果对连续失败次数的影响
    pub fn count_change(&self, outcome: ExecutionOutcome) -> FailureCountChange {
        match outcome {
            ExecutionOutcome::Success => FailureCountChange::Reset,
            _ if self.counts_as_failure(outcome) => FailureCountChange::Increment,
            _ => FailureCountChange::Unchanged,
        }
    }

    /// 根据任务当前的失败次数和本次结果作出决策
    ///
    /// # 参数
    ///
    /// * `task` - 执行前读取到的任务，`failure_count` 为之前的连续失败次数
    /// * `outcome` - 本次执行的分类结果
    ///
    /// # 返回值
    ///
    /// 返回新的失败次数以及是否需要通知
    pub fn evaluate(&self, task: &Task, outcome: ExecutionOutcome) -> FailureDecision {
        let previous = task.failure_count;
        let failure_count = match self.count_change(outcome) {
            FailureCountChange::Reset => 0,
            FailureCountChange::Increment => previous.saturating_add(1),
            FailureCountChange::Unchanged => previous,
        };
        self.decide(task, outcome, previous > 0, failure_count)
    }

    /// 在失败次数已经由存储更新之后作出通知决策
    ///
    /// # 参数
    ///
    /// * `task` - 执行的任务
    /// * `outcome` - 本次执行的分类结果
    /// * `was_failing` - 更新前连续失败次数是否大于零
    /// * `failure_count` - 更新后的连续失败次数
    pub fn decide(
        &self,
        task: &Task,
        outcome: ExecutionOutcome,
        was_failing: bool,
        failure_count: u32,
    ) -> FailureDecision {
        let failed = self.counts_as_failure(outcome);
        let notify = task.notify_on_failure
            && match self.mode {
                NotificationMode::Change => match outcome {
                    ExecutionOutcome::Success => was_failing,
                    _ => failed && !was_failing,
                },
                NotificationMode::Failure => {
                    failed && failure_count % self.failures_before_notification == 0
                }
            };

        FailureDecision {
            failure_count,
            notify,
            alarm: notify && failed && task.high_priority && self.high_priority_alarm,
        }
    }
}
