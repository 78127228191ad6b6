// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::worker::{ExecutionResult, NetworkTaskWorker};
use crate::domain::models::access_type_data::AccessTypeData;
use crate::domain::models::log_entry::LogEntry;
use crate::domain::models::task::{AccessType, Task};
use crate::utils::clock::Clock;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 不访问网络的工作器，只记录一条成功日志
pub struct NullWorker {
    clock: Arc<dyn Clock>,
    max_instances: u32,
}

impl NullWorker {
    pub fn new(clock: Arc<dyn Clock>, max_instances: u32) -> Self {
        Self {
            clock,
            max_instances,
        }
    }
}

#[async_trait]
impl NetworkTaskWorker for NullWorker {
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
        let timestamp = self.clock.now_millis();
        if cancel.is_cancelled() {
            return ExecutionResult::interrupted(LogEntry::failure(
                task.id,
                timestamp,
                "Execution interrupted",
            ));
        }
        ExecutionResult::completed(LogEntry::success(task.id, timestamp, "Null execution"))
    }
}
