// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// 探测错误类型
#[derive(Error, Debug)]
pub enum ProbeError {
    /// DNS 解析失败
    #[error("DNS lookup failed: {0}")]
    Dns(String),
    /// 解析结果中没有可用地址
    #[error("No address found for {0}")]
    NoAddress(String),
    /// HTTP 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 非成功的 HTTP 状态码
    #[error("HTTP status {0}")]
    Status(u16),
    /// 套接字错误
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// ICMP 错误
    #[error("Ping failed: {0}")]
    Ping(String),
    /// 协议层超时
    #[error("Timeout")]
    Timeout,
    /// 目标地址无效
    #[error("Invalid target: {0}")]
    InvalidTarget(String),
}

/// 受限执行的结果
#[derive(Debug)]
pub enum Bounded<T> {
    /// 在时限内完成
    Completed(T),
    /// 超出时限，已中止
    TimedOut,
    /// 被取消，已中止
    Interrupted,
    /// 执行体 panic
    Panicked(String),
}

impl<T> Bounded<T> {
    /// 超时和取消都视为中断
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Bounded::TimedOut | Bounded::Interrupted)
    }
}

/// 在独立任务上执行一个受限的步骤
///
/// 超时或取消令牌触发时中止该任务。
///
/// # 参数
///
/// * `cancel` - 取消令牌
/// * `timeout` - 时限
/// * `future` - 要执行的步骤
///
/// # 返回值
///
/// 返回 `Bounded` 描述的执行结果
pub async fn run_bounded<F, T>(cancel: &CancellationToken, timeout: Duration, future: F) -> Bounded<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    if cancel.is_cancelled() {
        return Bounded::Interrupted;
    }

    let mut handle = tokio::spawn(future);
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            handle.abort();
            Bounded::Interrupted
        }
        result = tokio::time::timeout(timeout, &mut handle) => match result {
            Ok(Ok(value)) => Bounded::Completed(value),
            Ok(Err(e)) if e.is_cancelled() => Bounded::Interrupted,
            Ok(Err(e)) => Bounded::Panicked(e.to_string()),
            Err(_) => {
                handle.abort();
                Bounded::TimedOut
            }
        }
    }
}
