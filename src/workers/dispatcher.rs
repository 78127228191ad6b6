// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::pipeline::ExecutionPipeline;
use crate::config::settings::ExecutionMode;
use crate::queue::process_pool::{ExecutionHandle, ProcessPool};
use crate::queue::scheduler::{DelayKind, TaskScheduler};
use crate::utils::wake_lock::WakeLock;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// 执行分发器
///
/// 为每次执行获取保持锁、创建取消令牌并登记到进程池。
/// 同步模式先执行再按完整周期重新调度，异步模式先重新调度再执行；
/// 无论执行结果如何（包括 panic）重新调度都会进行。
#[derive(Clone)]
pub struct ExecutionDispatcher {
    pipeline: Arc<ExecutionPipeline>,
    scheduler: Arc<TaskScheduler>,
    pool: Arc<ProcessPool>,
    wake_lock: WakeLock,
    mode: ExecutionMode,
}

impl ExecutionDispatcher {
    pub fn new(
        pipeline: Arc<ExecutionPipeline>,
        scheduler: Arc<TaskScheduler>,
        pool: Arc<ProcessPool>,
        wake_lock: WakeLock,
        mode: ExecutionMode,
    ) -> Self {
        Self {
            pipeline,
            scheduler,
            pool,
            wake_lock,
            mode,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn wake_lock(&self) -> &WakeLock {
        &self.wake_lock
    }

    /// 启动一次执行
    ///
    /// # 参数
    ///
    /// * `task_id` - 任务ID
    /// * `generation_id` - 闹钟携带的调度代号
    /// * `add_to_pool` - 是否登记到进程池以便被取消
    ///
    /// # 返回值
    ///
    /// 返回执行任务的句柄，执行和重新调度都完成后结束
    pub fn dispatch(&self, task_id: i64, generation_id: i64, add_to_pool: bool) -> JoinHandle<()> {
        let guard = self.wake_lock.acquire(format!("task-{}", task_id));
        let cancel = CancellationToken::new();
        let pipeline = self.pipeline.clone();
        let scheduler = self.scheduler.clone();
        let token = cancel.clone();
        let reschedule_first = self.mode == ExecutionMode::Async;

        let handle = tokio::spawn(async move {
            let _guard = guard;
            if reschedule_first {
                reschedule(&scheduler, task_id, generation_id).await;
            }
            let execution = tokio::spawn(async move {
                pipeline.execute(task_id, generation_id, token).await
            });
            match execution.await {
                Ok(Ok(Some(result))) => debug!(
                    task_id,
                    generation_id,
                    success = result.log_entry.success,
                    interrupted = result.interrupted,
                    "Execution finished"
                ),
                Ok(Ok(None)) => debug!(task_id, generation_id, "Stale trigger dropped"),
                Ok(Err(e)) => error!(task_id, generation_id, "Execution failed: {}", e),
                Err(e) => error!(task_id, generation_id, "Execution aborted: {}", e),
            }

            if !reschedule_first {
                reschedule(&scheduler, task_id, generation_id).await;
            }
        });

        if add_to_pool {
            self.pool
                .pool(generation_id, ExecutionHandle::new(cancel, handle.abort_handle()));
        }
        handle
    }

    /// 按分发模式处理一次执行触发
    ///
    /// 同步模式下等待执行结束，异步模式下立即返回
    pub async fn handle(&self, task_id: i64, generation_id: i64) {
        let handle = self.dispatch(task_id, generation_id, true);
        if self.mode == ExecutionMode::Sync {
            if let Err(e) = handle.await {
                error!(task_id, generation_id, "Dispatched execution failed: {}", e);
            }
        }
    }
}

async fn reschedule(scheduler: &TaskScheduler, task_id: i64, generation_id: i64) {
    if let Err(e) = scheduler
        .reschedule(task_id, generation_id, DelayKind::Interval)
        .await
    {
        error!(task_id, generation_id, "Failed to reschedule: {}", e);
    }
}
