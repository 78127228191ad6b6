// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::worker::{resolve_target, unfinished, ExecutionResult, NetworkTaskWorker};
use crate::config::settings::WorkerSettings;
use crate::domain::models::access_type_data::AccessTypeData;
use crate::domain::models::log_entry::LogEntry;
use crate::domain::models::task::{AccessType, Task};
use crate::engines::connect_engine::ConnectEngine;
use crate::engines::dns::DnsResolver;
use crate::engines::traits::run_bounded;
use crate::utils::clock::Clock;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// TCP 连接工作器
///
/// 按 `connect_count` 建立连接，至少一次成功即为成功
pub struct ConnectWorker {
    engine: ConnectEngine,
    resolver: DnsResolver,
    clock: Arc<dyn Clock>,
    settings: WorkerSettings,
}

impl ConnectWorker {
    pub fn new(resolver: DnsResolver, clock: Arc<dyn Clock>, settings: WorkerSettings) -> Self {
        Self {
            engine: ConnectEngine,
            resolver,
            clock,
            settings,
        }
    }
}

#[async_trait]
impl NetworkTaskWorker for ConnectWorker {
    fn access_type(&self) -> AccessType {
        AccessType::Connect
    }

    fn max_instances(&self) -> u32 {
        self.settings.max_instances.connect
    }

    async fn execute(
        &self,
        task: &Task,
        data: &AccessTypeData,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        let ip = match resolve_target(&self.resolver, self.clock.as_ref(), task, &task.address, cancel).await {
            Ok(ip) => ip,
            Err(result) => return result,
        };
        let target = SocketAddr::new(ip, task.port);

        let count = data.connect_count.max(1);
        let timeout = self.settings.connect_timeout();
        let mut connect_times: Vec<Duration> = Vec::new();
        let mut last_error = None;

        for attempt in 0..count {
            let engine = self.engine;
            let outcome = run_bounded(
                cancel,
                self.settings.bounded(timeout),
                async move { engine.connect(target, timeout).await },
            )
            .await;

            match unfinished(task, self.clock.now_millis(), "Connect", outcome) {
                Ok(Ok(elapsed)) => {
                    connect_times.push(elapsed);
                    if data.stop_on_success {
                        break;
                    }
                }
                Ok(Err(e)) => {
                    debug!(task_id = task.id, attempt, "Connect attempt failed: {}", e);
                    last_error = Some(e);
                }
                Err(result) => return result,
            }
        }

        let timestamp = self.clock.now_millis();
        if connect_times.is_empty() {
            let reason = last_error.map_or_else(|| "no attempt".to_string(), |e| e.to_string());
            return ExecutionResult::completed(LogEntry::failure(
                task.id,
                timestamp,
                format!("Connect to {} failed: {}", target, reason),
            ));
        }

        let average = connect_times.iter().sum::<Duration>() / connect_times.len() as u32;
        ExecutionResult::completed(LogEntry::success(
            task.id,
            timestamp,
            format!(
                "Connect to {}: {} of {} attempts successful, average {:.1} ms",
                target,
                connect_times.len(),
                count,
                average.as_secs_f64() * 1000.0
            ),
        ))
    }
}
