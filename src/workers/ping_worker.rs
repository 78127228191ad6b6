// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::worker::{resolve_target, unfinished, ExecutionResult, NetworkTaskWorker};
use crate::config::settings::WorkerSettings;
use crate::domain::models::access_type_data::AccessTypeData;
use crate::domain::models::log_entry::LogEntry;
use crate::domain::models::task::{AccessType, Task};
use crate::engines::dns::DnsResolver;
use crate::engines::ping_engine::PingEngine;
use crate::engines::traits::run_bounded;
use crate::utils::clock::Clock;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// ICMP echo 工作器
///
/// 按 `ping_count` 发送 echo 请求，至少收到一个回复即为成功
pub struct PingWorker {
    engine: PingEngine,
    resolver: DnsResolver,
    clock: Arc<dyn Clock>,
    settings: WorkerSettings,
}

impl PingWorker {
    pub fn new(resolver: DnsResolver, clock: Arc<dyn Clock>, settings: WorkerSettings) -> Self {
        Self {
            engine: PingEngine,
            resolver,
            clock,
            settings,
        }
    }
}

#[async_trait]
impl NetworkTaskWorker for PingWorker {
    fn access_type(&self) -> AccessType {
        AccessType::Ping
    }

    fn max_instances(&self) -> u32 {
        self.settings.max_instances.ping
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

        let count = data.ping_count.max(1);
        let timeout = self.settings.ping_timeout();
        let mut round_trips: Vec<Duration> = Vec::new();
        let mut last_error = None;

        for attempt in 0..count {
            let engine = self.engine;
            let sequence = u16::try_from(attempt).unwrap_or(u16::MAX);
            let payload_size = data.ping_package_size as usize;
            let outcome = run_bounded(
                cancel,
                self.settings.bounded(timeout),
                async move { engine.ping(ip, sequence, payload_size, timeout).await },
            )
            .await;

            match unfinished(task, self.clock.now_millis(), "Ping", outcome) {
                Ok(Ok(rtt)) => {
                    round_trips.push(rtt);
                    if data.stop_on_success {
                        break;
                    }
                }
                Ok(Err(e)) => {
                    debug!(task_id = task.id, attempt, "Ping attempt failed: {}", e);
                    last_error = Some(e);
                }
                Err(result) => return result,
            }
        }

        let timestamp = self.clock.now_millis();
        if round_trips.is_empty() {
            let reason = last_error.map_or_else(|| "no reply".to_string(), |e| e.to_string());
            return ExecutionResult::completed(LogEntry::failure(
                task.id,
                timestamp,
                format!("Ping to {} ({}) failed: {}", task.address, ip, reason),
            ));
        }

        let average = round_trips.iter().sum::<Duration>() / round_trips.len() as u32;
        ExecutionResult::completed(LogEntry::success(
            task.id,
            timestamp,
            format!(
                "Ping to {} ({}): {} of {} replies, average {:.1} ms",
                task.address,
                ip,
                round_trips.len(),
                count,
                average.as_secs_f64() * 1000.0
            ),
        ))
    }
}
