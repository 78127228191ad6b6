// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::traits::{run_bounded, Bounded, ProbeError};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// 解析时的地址族偏好
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IpPreference {
    /// 使用系统解析顺序中的第一个地址
    #[default]
    Auto,
    Ipv4,
    Ipv6,
}

/// 按偏好从解析结果中挑选地址，首选地址族不存在时退回另一族
pub fn select_address(addresses: &[IpAddr], preference: IpPreference) -> Option<IpAddr> {
    let preferred = match preference {
        IpPreference::Auto => None,
        IpPreference::Ipv4 => addresses.iter().find(|ip| ip.is_ipv4()),
        IpPreference::Ipv6 => addresses.iter().find(|ip| ip.is_ipv6()),
    };
    preferred.or_else(|| addresses.first()).copied()
}

/// DNS 解析器
///
/// 解析在单独的受限步骤中进行，超时或取消时结果为中断
#[derive(Debug, Clone)]
pub struct DnsResolver {
    preference: IpPreference,
    timeout: Duration,
}

impl DnsResolver {
    pub fn new(preference: IpPreference, timeout: Duration) -> Self {
        Self {
            preference,
            timeout,
        }
    }

    /// 解析主机名
    ///
    /// # 参数
    ///
    /// * `host` - 主机名或 IP 字面量
    /// * `cancel` - 取消令牌
    ///
    /// # 返回值
    ///
    /// 返回受限执行结果，完成时携带解析出的地址或错误
    pub async fn resolve(
        &self,
        host: &str,
        cancel: &CancellationToken,
    ) -> Bounded<Result<IpAddr, ProbeError>> {
        let host = host.trim().trim_start_matches('[').trim_end_matches(']').to_string();
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Bounded::Completed(Ok(ip));
        }
        if host.is_empty() {
            return Bounded::Completed(Err(ProbeError::InvalidTarget("empty host".to_string())));
        }

        let preference = self.preference;
        run_bounded(cancel, self.timeout, async move {
            let addresses: Vec<IpAddr> = tokio::net::lookup_host((host.as_str(), 0))
                .await
                .map_err(|e| ProbeError::Dns(e.to_string()))?
                .map(|addr| addr.ip())
                .collect();
            debug!(host = %host, resolved = addresses.len(), "DNS lookup finished");
            select_address(&addresses, preference).ok_or(ProbeError::NoAddress(host))
        })
        .await
    }
}
