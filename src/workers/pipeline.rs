// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::registry::WorkerRegistry;
use super::worker::{ExecutionResult, NetworkTaskWorker};
use crate::domain::models::access_type_data::AccessTypeData;
use crate::domain::models::log_entry::LogEntry;
use crate::domain::models::task::Task;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::domain::repositories::Repositories;
use crate::domain::services::network_state::{NetworkKind, NetworkStateProvider};
use crate::domain::services::notification_policy::{
    ExecutionOutcome, FailureCountChange, FailureDecision, NotificationPolicy,
};
use crate::domain::services::notification_service::NotificationSink;
use crate::infrastructure::events::EventBus;
use crate::utils::clock::Clock;
use crate::utils::errors::WorkerError;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// 执行管线
///
/// 驱动一次完整的执行周期：过期检查、实例计数、网络前置条件、
/// 探测、写日志以及失败计数和通知
pub struct ExecutionPipeline {
    repositories: Repositories,
    registry: WorkerRegistry,
    network: Arc<dyn NetworkStateProvider>,
    notifications: Arc<dyn NotificationSink>,
    policy: NotificationPolicy,
    events: EventBus,
    clock: Arc<dyn Clock>,
    preferred_network: NetworkKind,
    log_count_limit: u64,
}

impl ExecutionPipeline {
    /// 创建执行管线
    ///
    /// # 参数
    ///
    /// * `repositories` - 仓库集合
    /// * `registry` - 工作器注册表
    /// * `network` - 网络状态
    /// * `notifications` - 通知服务
    /// * `policy` - 失败计数与通知规则
    /// * `events` - 事件总线
    /// * `clock` - 时钟
    /// * `preferred_network` - 首选网络类型
    /// * `log_count_limit` - 每个任务保留的日志条数
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repositories: Repositories,
        registry: WorkerRegistry,
        network: Arc<dyn NetworkStateProvider>,
        notifications: Arc<dyn NotificationSink>,
        policy: NotificationPolicy,
        events: EventBus,
        clock: Arc<dyn Clock>,
        preferred_network: NetworkKind,
        log_count_limit: u64,
    ) -> Self {
        Self {
            repositories,
            registry,
            network,
            notifications,
            policy,
            events,
            clock,
            preferred_network,
            log_count_limit,
        }
    }

    /// 执行一次任务
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(result))` - 已执行并写入日志
    /// * `Ok(None)` - 任务已删除、已停止或代号已过期，未执行
    /// * `Err(WorkerError)` - 仓库访问失败
    #[instrument(skip(self, cancel), fields(access_type = tracing::field::Empty))]
    pub async fn execute(
        &self,
        task_id: i64,
        generation_id: i64,
        cancel: CancellationToken,
    ) -> Result<Option<ExecutionResult>, WorkerError> {
        let tasks = &self.repositories.tasks;
        let task = match tasks.find_by_id(task_id).await? {
            Some(task) if task.running && task.generation_id == generation_id => task,
            _ => {
                debug!("Task deleted, stopped or edited since scheduling, skipping");
                return Ok(None);
            }
        };
        tracing::Span::current().record("access_type", task.access_type.to_string());

        let worker = self.registry.get(task.access_type).ok_or_else(|| {
            WorkerError::InternalError(format!("no worker for access type {}", task.access_type))
        })?;

        tasks.update_last_scheduled(task_id, self.clock.now_millis()).await?;

        let max_instances = worker.max_instances();
        if !tasks.try_acquire_instance(task_id, max_instances).await? {
            let active = tasks
                .find_by_id(task_id)
                .await?
                .map_or(task.active_instances, |current| current.active_instances);
            warn!(active, max_instances, "Too many active instances, rejecting execution");
            counter!("probe_rejections_total", "access_type" => task.access_type.to_string())
                .increment(1);
            let entry = LogEntry::failure(
                task_id,
                self.clock.now_millis(),
                worker.max_instances_error_message(active),
            );
            let result = ExecutionResult::completed(entry);
            self.finish(&task, &result, ExecutionOutcome::TooManyInstances)
                .await?;
            return Ok(Some(result));
        }
        self.events.task_changed(task_id);

        let (result, outcome) = self.run_acquired(&task, worker, cancel).await;
        if let Err(e) = tasks.release_instance(task_id).await {
            warn!("Failed to release instance: {}", e);
        }

        self.finish(&task, &result, outcome).await?;
        Ok(Some(result))
    }

    /// 在已占用实例的前提下检查网络并执行探测，不会提前返回错误，
    /// 保证调用方总能释放实例
    async fn run_acquired(
        &self,
        task: &Task,
        worker: Arc<dyn NetworkTaskWorker>,
        cancel: CancellationToken,
    ) -> (ExecutionResult, ExecutionOutcome) {
        let state = self.network.current();
        if !state.connected {
            let entry = LogEntry::failure(task.id, self.clock.now_millis(), "No active network connection");
            return (ExecutionResult::completed(entry), ExecutionOutcome::NoNetwork);
        }
        if task.only_when_preferred_network && state.kind != self.preferred_network {
            let entry = LogEntry::failure(
                task.id,
                self.clock.now_millis(),
                format!("Skipped: not connected to the preferred network ({:?})", self.preferred_network),
            );
            return (
                ExecutionResult::completed(entry),
                ExecutionOutcome::NotPreferredNetwork,
            );
        }

        let data = match self.repositories.access_data.find_by_task(task.id).await {
            Ok(Some(data)) => data,
            Ok(None) => AccessTypeData::for_task(task.id),
            Err(e) => {
                warn!("Failed to read access type data, using defaults: {}", e);
                AccessTypeData::for_task(task.id)
            }
        };

        let started = Instant::now();
        let probe_task = task.clone();
        let handle = tokio::spawn(async move {
            worker.execute(&probe_task, &data, &cancel).await
        });
        let result = match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => ExecutionResult::interrupted(LogEntry::failure(
                task.id,
                self.clock.now_millis(),
                "Execution interrupted",
            )),
            Err(e) => ExecutionResult::completed(LogEntry::failure(
                task.id,
                self.clock.now_millis(),
                format!("Execution failed: {}", e),
            )),
        };
        histogram!("probe_duration_seconds", "access_type" => task.access_type.to_string())
            .record(started.elapsed().as_secs_f64());

        let outcome = if result.interrupted {
            ExecutionOutcome::Interrupted
        } else if result.log_entry.success {
            ExecutionOutcome::Success
        } else {
            ExecutionOutcome::Failure
        };
        (result, outcome)
    }

    /// 写日志、更新失败次数并按规则通知
    async fn finish(
        &self,
        task: &Task,
        result: &ExecutionResult,
        outcome: ExecutionOutcome,
    ) -> Result<(), WorkerError> {
        // A task deleted while it was executing keeps no log behind.
        if self.repositories.tasks.find_by_id(task.id).await?.is_none() {
            debug!(
                interrupted = result.interrupted,
                "Task deleted during execution, dropping result"
            );
            return Ok(());
        }

        let access_type = task.access_type.to_string();
        let entry = self
            .repositories
            .logs
            .insert_and_trim(&result.log_entry, self.log_count_limit)
            .await?;
        self.events.log_changed(task.id);

        counter!("probe_executions_total", "access_type" => access_type.clone()).increment(1);
        match outcome {
            ExecutionOutcome::Success => {}
            ExecutionOutcome::Interrupted => {
                counter!("probe_interruptions_total", "access_type" => access_type).increment(1);
            }
            _ => {
                counter!("probe_failures_total", "access_type" => access_type).increment(1);
            }
        }

        let Some(decision) = self.record_failure_count(task, outcome).await? else {
            debug!("Task deleted during execution, skipping notification");
            return Ok(());
        };
        info!(
            success = entry.success,
            interrupted = result.interrupted,
            failure_count = decision.failure_count,
            "{}",
            entry.message
        );

        if decision.notify {
            let notified = Task {
                failure_count: decision.failure_count,
                ..task.clone()
            };
            if let Err(e) = self
                .notifications
                .send_failure_notification(&notified, &entry)
                .await
            {
                warn!("Failed to send notification: {}", e);
            }
            if decision.alarm {
                if let Err(e) = self
                    .notifications
                    .send_alarm_notification(&notified, &entry)
                    .await
                {
                    warn!("Failed to send alarm notification: {}", e);
                }
            }
        }

        self.events.task_changed(task.id);
        Ok(())
    }

    /// 在存储中更新连续失败次数，并以存储返回的次数作出通知决策
    ///
    /// # 返回值
    ///
    /// 任务已被删除时返回 `Ok(None)`
    async fn record_failure_count(
        &self,
        task: &Task,
        outcome: ExecutionOutcome,
    ) -> Result<Option<FailureDecision>, WorkerError> {
        let tasks = &self.repositories.tasks;
        let counted = match self.policy.count_change(outcome) {
            FailureCountChange::Reset => tasks
                .reset_failure_count(task.id)
                .await
                .map(|was_failing| (was_failing, 0)),
            FailureCountChange::Increment => tasks
                .increment_failure_count(task.id)
                .await
                .map(|count| (count > 1, count)),
            FailureCountChange::Unchanged => Ok((task.failure_count > 0, task.failure_count)),
        };
        match counted {
            Ok((was_failing, failure_count)) => Ok(Some(self.policy.decide(
                task,
                outcome,
                was_failing,
                failure_count,
            ))),
            Err(RepositoryError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
