// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::traits::ProbeError;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;

/// TCP 连接探测引擎
#[derive(Debug, Default, Clone, Copy)]
pub struct ConnectEngine;

impl ConnectEngine {
    /// 尝试建立一次连接，成功后立即关闭
    ///
    /// # 返回值
    ///
    /// * `Ok(Duration)` - 建立连接耗时
    /// * `Err(ProbeError)` - 连接失败或超时
    pub async fn connect(&self, addr: SocketAddr, timeout: Duration) -> Result<Duration, ProbeError> {
        let started = Instant::now();
        match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                Ok(started.elapsed())
            }
            Ok(Err(e)) => Err(ProbeError::Io(e)),
            Err(_) => Err(ProbeError::Timeout),
        }
    }
}
