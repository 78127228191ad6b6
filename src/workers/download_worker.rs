// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::worker::{resolve_target, unfinished, ExecutionResult, NetworkTaskWorker};
use crate::config::settings::WorkerSettings;
use crate::domain::models::access_type_data::AccessTypeData;
use crate::domain::models::log_entry::LogEntry;
use crate::domain::models::task::{AccessType, Task};
use crate::engines::dns::DnsResolver;
use crate::engines::download_engine::DownloadEngine;
use crate::engines::traits::run_bounded;
use crate::utils::clock::Clock;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// 把任务地址解析为下载 URL，没有协议时默认 http
pub fn parse_download_url(address: &str) -> Result<Url, url::ParseError> {
    let address = address.trim();
    if address.contains("://") {
        Url::parse(address)
    } else {
        Url::parse(&format!("http://{}", address))
    }
}

/// HTTP(S) 下载工作器
pub struct DownloadWorker {
    engine: DownloadEngine,
    resolver: DnsResolver,
    clock: Arc<dyn Clock>,
    settings: WorkerSettings,
}

impl DownloadWorker {
    pub fn new(resolver: DnsResolver, clock: Arc<dyn Clock>, settings: WorkerSettings) -> Self {
        Self {
            engine: DownloadEngine,
            resolver,
            clock,
            settings,
        }
    }
}

#[async_trait]
impl NetworkTaskWorker for DownloadWorker {
    fn access_type(&self) -> AccessType {
        AccessType::Download
    }

    fn max_instances(&self) -> u32 {
        self.settings.max_instances.download
    }

    async fn execute(
        &self,
        task: &Task,
        data: &AccessTypeData,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        let url = match parse_download_url(&task.address) {
            Ok(url) => url,
            Err(e) => {
                return ExecutionResult::completed(LogEntry::failure(
                    task.id,
                    self.clock.now_millis(),
                    format!("Invalid URL {}: {}", task.address, e),
                ))
            }
        };
        let Some(host) = url.host_str().map(str::to_string) else {
            return ExecutionResult::completed(LogEntry::failure(
                task.id,
                self.clock.now_millis(),
                format!("URL {} has no host", url),
            ));
        };

        let ip = match resolve_target(&self.resolver, self.clock.as_ref(), task, &host, cancel).await {
            Ok(ip) => ip,
            Err(result) => return result,
        };

        let engine = self.engine;
        let timeout = self.settings.download_timeout();
        let ignore_ssl_error = data.ignore_ssl_error;
        let target = url.clone();
        let outcome = run_bounded(
            cancel,
            self.settings.bounded(timeout),
            async move { engine.download(&target, Some(ip), ignore_ssl_error, timeout).await },
        )
        .await;

        let timestamp = self.clock.now_millis();
        match unfinished(task, timestamp, "Download", outcome) {
            Ok(Ok(report)) => ExecutionResult::completed(LogEntry::success(
                task.id,
                timestamp,
                format!(
                    "Downloaded {} bytes from {} ({}) in {} ms, HTTP {}",
                    report.bytes,
                    url,
                    ip,
                    report.elapsed.as_millis(),
                    report.status
                ),
            )),
            Ok(Err(e)) => ExecutionResult::completed(LogEntry::failure(
                task.id,
                timestamp,
                format!("Download from {} failed: {}", url, e),
            )),
            Err(result) => result,
        }
    }
}
