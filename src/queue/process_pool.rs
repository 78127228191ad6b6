// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// 一次进行中执行的句柄
///
/// 取消是协作式的：令牌被取消后，执行在下一个检查点把结果标记为中断
#[derive(Debug)]
pub struct ExecutionHandle {
    cancel: CancellationToken,
    abort: AbortHandle,
}

impl ExecutionHandle {
    pub fn new(cancel: CancellationToken, abort: AbortHandle) -> Self {
        Self { cancel, abort }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }

    fn is_active(&self) -> bool {
        !self.is_finished() && !self.is_cancelled()
    }
}

/// 进程池
///
/// 按调度代号登记进行中的执行，使编辑、删除或停止任务时能够中断它们
#[derive(Debug, Default)]
pub struct ProcessPool {
    pools: Mutex<HashMap<i64, Vec<ExecutionHandle>>>,
}

impl ProcessPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个执行句柄，登记前先清理已结束或已取消的句柄
    ///
    /// # 参数
    ///
    /// * `generation_id` - 任务的调度代号
    /// * `handle` - 执行句柄
    pub fn pool(&self, generation_id: i64, handle: ExecutionHandle) {
        let mut pools = self.pools.lock();
        Self::prune(&mut pools);
        pools.entry(generation_id).or_default().push(handle);
    }

    /// 中断某个代号下的所有执行
    ///
    /// # 返回值
    ///
    /// 返回被中断的执行数
    pub fn cancel(&self, generation_id: i64) -> usize {
        let handles = self.pools.lock().remove(&generation_id).unwrap_or_default();
        let cancelled = handles
            .iter()
            .filter(|handle| !handle.is_finished())
            .inspect(|handle| handle.cancel())
            .count();
        if cancelled > 0 {
            debug!(generation_id, cancelled, "Cancelled pooled executions");
        }
        cancelled
    }

    /// 中断所有执行
    pub fn cancel_all(&self) -> usize {
        let pools = std::mem::take(&mut *self.pools.lock());
        let cancelled = pools
            .values()
            .flatten()
            .filter(|handle| !handle.is_finished())
            .inspect(|handle| handle.cancel())
            .count();
        if cancelled > 0 {
            debug!(cancelled, "Cancelled all pooled executions");
        }
        cancelled
    }

    /// 是否存在未结束且未取消的执行
    pub fn has_active(&self) -> bool {
        self.pools
            .lock()
            .values()
            .flatten()
            .any(ExecutionHandle::is_active)
    }

    /// 某个代号下仍在登记的句柄数
    pub fn pooled(&self, generation_id: i64) -> usize {
        self.pools
            .lock()
            .get(&generation_id)
            .map_or(0, |handles| handles.iter().filter(|h| h.is_active()).count())
    }

    fn prune(pools: &mut HashMap<i64, Vec<ExecutionHandle>>) {
        pools.retain(|_, handles| {
            handles.retain(ExecutionHandle::is_active);
            !handles.is_empty()
        });
    }
}
