// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::traits::ProbeError;
use rand::random;
use std::net::IpAddr;
use std::time::Duration;
use surge_ping::{Client, Config, PingIdentifier, PingSequence, ICMP};

/// ICMP echo 探测引擎
///
/// 需要原始套接字权限（root 或 CAP_NET_RAW），否则每次探测都会返回错误
#[derive(Debug, Default, Clone, Copy)]
pub struct PingEngine;

impl PingEngine {
    /// 发送一次 echo 请求
    ///
    /// # 参数
    ///
    /// * `ip` - 目标地址
    /// * `sequence` - 序号
    /// * `payload_size` - 负载字节数
    /// * `timeout` - 等待回复的时限
    ///
    /// # 返回值
    ///
    /// * `Ok(Duration)` - 往返时间
    /// * `Err(ProbeError)` - 发送失败或超时
    pub async fn ping(
        &self,
        ip: IpAddr,
        sequence: u16,
        payload_size: usize,
        timeout: Duration,
    ) -> Result<Duration, ProbeError> {
        let config = match ip {
            IpAddr::V4(_) => Config::default(),
            IpAddr::V6(_) => Config::builder().kind(ICMP::V6).build(),
        };
        let client = Client::new(&config)?;
        let mut pinger = client.pinger(ip, PingIdentifier(random())).await;
        pinger.timeout(timeout);

        let payload = vec![0u8; payload_size];
        match pinger.ping(PingSequence(sequence), &payload).await {
            Ok((_reply, rtt)) => Ok(rtt),
            Err(surge_ping::SurgeError::Timeout { .. }) => Err(ProbeError::Timeout),
            Err(e) => Err(ProbeError::Ping(e.to_string())),
        }
    }
}
