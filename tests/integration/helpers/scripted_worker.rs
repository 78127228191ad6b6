// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use netwatch::domain::models::access_type_data::AccessTypeData;
use netwatch::domain::models::log_entry::LogEntry;
use netwatch::domain::models::task::{AccessType, Task};
use netwatch::utils::clock::{Clock, ManualClock};
use netwatch::workers::worker::{ExecutionResult, NetworkTaskWorker};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// 代替 Null 工作器的可编排工作器
///
/// 按预设顺序返回成功或失败（预设用完后返回成功），
/// `hold` 之后的执行会一直阻塞到 `release` 或被取消
pub struct ScriptedWorker {
    clock: Arc<ManualClock>,
    max_instances: u32,
    outcomes: Mutex<VecDeque<bool>>,
    started: Mutex<Vec<Instant>>,
    gate: watch::Sender<bool>,
}

#[allow(dead_code)]
impl ScriptedWorker {
    pub fn new(clock: Arc<ManualClock>, max_instances: u32) -> Self {
        let (gate, _) = watch::channel(false);
        Self {
            clock,
            max_instances,
            outcomes: Mutex::new(VecDeque::new()),
            started: Mutex::new(Vec::new()),
            gate,
        }
    }

    pub fn push_outcomes(&self, outcomes: &[bool]) {
        self.outcomes.lock().extend(outcomes.iter().copied());
    }

    pub fn hold(&self) {
        self.gate.send_replace(true);
    }

    pub fn release(&self) {
        self.gate.send_replace(false);
    }

    pub fn executions(&self) -> usize {
        self.started.lock().len()
    }

    pub fn started_at(&self) -> Vec<Instant> {
        self.started.lock().clone()
    }
}

#[async_trait]
impl NetworkTaskWorker for ScriptedWorker {
    fn access_type(&self) -> AccessType {
        AccessType::Null
    }

    fn max_instances(&self) -> u32 {
        self.max_instances
    }

    async fn execute(
        &self,
        task: &Task,
        _data: &AccessTypeData,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        self.started.lock().push(Instant::now());

        let mut gate = self.gate.subscribe();
        while *gate.borrow_and_update() {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return ExecutionResult::interrupted(LogEntry::failure(
                        task.id,
                        self.clock.now_millis(),
                        "Execution interrupted",
                    ));
                }
                changed = gate.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        let success = self.outcomes.lock().pop_front().unwrap_or(true);
        let timestamp = self.clock.now_millis();
        if success {
            ExecutionResult::completed(LogEntry::success(task.id, timestamp, "Scripted success"))
        } else {
            ExecutionResult::completed(LogEntry::failure(task.id, timestamp, "Scripted failure"))
        }
    }
}
