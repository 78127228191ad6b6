// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// 执行保持锁
///
/// 分发一次执行前获取，`WakeLockGuard` 被丢弃时释放。
/// 持有计数大于 0 时进程不应进入空闲关闭。
#[derive(Debug, Clone, Default)]
pub struct WakeLock {
    held: Arc<AtomicUsize>,
}

impl WakeLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取保持锁
    ///
    /// # 参数
    ///
    /// * `tag` - 用于日志的标识
    pub fn acquire(&self, tag: impl Into<String>) -> WakeLockGuard {
        let tag = tag.into();
        let held = self.held.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(tag = %tag, held, "Wake lock acquired");
        WakeLockGuard {
            held: self.held.clone(),
            tag,
        }
    }

    /// 当前持有数
    pub fn held(&self) -> usize {
        self.held.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct WakeLockGuard {
    held: Arc<AtomicUsize>,
    tag: String,
}

impl Drop for WakeLockGuard {
    fn drop(&mut self) {
        let held = self.held.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        debug!(tag = %self.tag, held, "Wake lock released");
    }
}
