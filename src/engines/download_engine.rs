// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::traits::ProbeError;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use url::Url;

/// 一次下载的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub status: u16,
    pub bytes: u64,
    pub elapsed: Duration,
}

/// HTTP(S) 下载探测引擎
///
/// 完整读取响应体但不保存
#[derive(Debug, Default, Clone, Copy)]
pub struct DownloadEngine;

impl DownloadEngine {
    /// 下载一次
    ///
    /// # 参数
    ///
    /// * `url` - 目标 URL
    /// * `pinned` - 预先解析出的地址，用于让请求遵循地址族偏好
    /// * `ignore_ssl_error` - 是否接受无效证书
    /// * `timeout` - 整个请求的时限
    ///
    /// # 返回值
    ///
    /// * `Ok(DownloadReport)` - 成功状态码下的下载结果
    /// * `Err(ProbeError)` - 请求失败或状态码非 2xx
    pub async fn download(
        &self,
        url: &Url,
        pinned: Option<IpAddr>,
        ignore_ssl_error: bool,
        timeout: Duration,
    ) -> Result<DownloadReport, ProbeError> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(ignore_ssl_error)
            .user_agent(concat!("netwatch/", env!("CARGO_PKG_VERSION")));
        if let (Some(ip), Some(host)) = (pinned, url.host_str()) {
            // Port 0 keeps the port from the URL.
            builder = builder.resolve(host, SocketAddr::new(ip, 0));
        }
        let client = builder.build()?;

        let started = Instant::now();
        let mut response = client.get(url.clone()).send().await?;
        let status = response.status();
        let mut bytes = 0u64;
        while let Some(chunk) = response.chunk().await? {
            bytes += chunk.len() as u64;
        }
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        Ok(DownloadReport {
            status: status.as_u16(),
            bytes,
            elapsed: started.elapsed(),
        })
    }
}
