// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::access_type_data::AccessTypeData;
use crate::domain::models::log_entry::LogEntry;
use crate::domain::models::task::{AccessType, Task};
use crate::engines::dns::DnsResolver;
use crate::engines::traits::Bounded;
use crate::utils::clock::Clock;
use async_trait::async_trait;
use std::net::IpAddr;
use tokio_util::sync::CancellationToken;

/// 一次探测执行的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// 执行被取消或超出时限，结果不具结论性
    pub interrupted: bool,
    pub log_entry: LogEntry,
}

impl ExecutionResult {
    pub fn completed(log_entry: LogEntry) -> Self {
        Self {
            interrupted: false,
            log_entry,
        }
    }

    pub fn interrupted(log_entry: LogEntry) -> Self {
        Self {
            interrupted: true,
            log_entry,
        }
    }
}

/// 探测工作器特质
///
/// 每种访问类型一个实现。`execute` 只负责探测本身，实例计数、
/// 网络前置条件、日志和通知由执行管线处理
#[async_trait]
pub trait NetworkTaskWorker: Send + Sync {
    fn access_type(&self) -> AccessType;

    /// 单个任务允许的最大并发实例数
    fn max_instances(&self) -> u32;

    /// 实例数超限时写入日志的消息
    fn max_instances_error_message(&self, active: u32) -> String {
        format!(
            "Skipped: too many active instances ({} active, {} allowed)",
            active,
            self.max_instances()
        )
    }

    /// 执行一次探测
    ///
    /// # 参数
    ///
    /// * `task` - 任务
    /// * `data` - 探测参数
    /// * `cancel` - 取消令牌，取消后结果标记为中断
    async fn execute(
        &self,
        task: &Task,
        data: &AccessTypeData,
        cancel: &CancellationToken,
    ) -> ExecutionResult;
}

/// 受限步骤未正常完成时的执行结果
///
/// 超时和取消为中断，panic 为普通失败
pub(crate) fn unfinished<T>(
    task: &Task,
    timestamp: i64,
    step: &str,
    outcome: Bounded<T>,
) -> Result<T, ExecutionResult> {
    match outcome {
        Bounded::Completed(value) => Ok(value),
        Bounded::TimedOut => Err(ExecutionResult::interrupted(LogEntry::failure(
            task.id,
            timestamp,
            format!("{} timed out", step),
        ))),
        Bounded::Interrupted => Err(ExecutionResult::interrupted(LogEntry::failure(
            task.id,
            timestamp,
            format!("{} interrupted", step),
        ))),
        Bounded::Panicked(reason) => Err(ExecutionResult::completed(LogEntry::failure(
            task.id,
            timestamp,
            format!("{} failed unexpectedly: {}", step, reason),
        ))),
    }
}

/// 解析任务目标地址
pub(crate) async fn resolve_target(
    resolver: &DnsResolver,
    clock: &dyn Clock,
    task: &Task,
    host: &str,
    cancel: &CancellationToken,
) -> Result<IpAddr, ExecutionResult> {
    let outcome = resolver.resolve(host, cancel).await;
    match unfinished(task, clock.now_millis(), "DNS lookup", outcome)? {
        Ok(ip) => Ok(ip),
        Err(e) => Err(ExecutionResult::completed(LogEntry::failure(
            task.id,
            clock.now_millis(),
            e.to_string(),
        ))),
    }
}
