// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::dispatcher::ExecutionDispatcher;
use crate::queue::alarm::{Trigger, TriggerReceiver};
use crate::queue::scheduler::TaskScheduler;
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// 工作管理器
///
/// 从闹钟通道接收触发消息：执行触发交给分发器，挂起触发交给调度器。
/// 接收循环本身从不执行探测。
pub struct WorkerManager {
    scheduler: Arc<TaskScheduler>,
    dispatcher: ExecutionDispatcher,
    receiver: Option<TriggerReceiver>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    pub fn new(
        scheduler: Arc<TaskScheduler>,
        dispatcher: ExecutionDispatcher,
        receiver: TriggerReceiver,
    ) -> Self {
        Self {
            scheduler,
            dispatcher,
            receiver: Some(receiver),
            handles: Vec::new(),
        }
    }

    /// 启动触发接收循环
    ///
    /// 重复调用不会启动第二个循环
    pub fn start(&mut self) {
        let Some(mut receiver) = self.receiver.take() else {
            debug!("Trigger loop already started");
            return;
        };
        let scheduler = self.scheduler.clone();
        let dispatcher = self.dispatcher.clone();

        let handle = tokio::spawn(async move {
            while let Some(trigger) = receiver.recv().await {
                process_trigger(&scheduler, &dispatcher, trigger).await;
            }
            debug!("Trigger channel closed");
        });
        self.handles.push(handle);
        info!(mode = ?self.dispatcher.mode(), "Trigger loop started");
    }

    /// 等待关闭信号并停止接收循环
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
        self.shutdown();
    }

    /// 停止接收循环
    pub fn shutdown(&mut self) {
        info!("Shutting down trigger loop...");
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

/// 处理一条触发消息
pub async fn process_trigger(
    scheduler: &TaskScheduler,
    dispatcher: &ExecutionDispatcher,
    trigger: Trigger,
) {
    match trigger {
        Trigger::Execute {
            task_id,
            generation_id,
        } => dispatcher.handle(task_id, generation_id).await,
        Trigger::Suspension { event, epoch } => {
            if let Err(e) = scheduler.on_suspension_trigger(event, epoch).await {
                error!(?event, epoch, "Failed to handle suspension trigger: {}", e);
            }
        }
    }
}
