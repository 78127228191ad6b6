// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::connect_worker::ConnectWorker;
use super::download_worker::DownloadWorker;
use super::null_worker::NullWorker;
use super::ping_worker::PingWorker;
use super::worker::NetworkTaskWorker;
use crate::config::settings::Settings;
use crate::domain::models::task::AccessType;
use crate::engines::dns::DnsResolver;
use crate::utils::clock::Clock;
use std::collections::HashMap;
use std::sync::Arc;

/// 按访问类型查找工作器
#[derive(Clone, Default)]
pub struct WorkerRegistry {
    workers: HashMap<AccessType, Arc<dyn NetworkTaskWorker>>,
}

impl WorkerRegistry {
    /// 创建包含全部内置工作器的注册表
    pub fn from_settings(settings: &Settings, clock: Arc<dyn Clock>) -> Self {
        let workers = &settings.workers;
        let resolver = DnsResolver::new(settings.network.ip_preference, workers.dns_timeout());
        Self::default()
            .with(Arc::new(PingWorker::new(resolver.clone(), clock.clone(), workers.clone())))
            .with(Arc::new(ConnectWorker::new(resolver.clone(), clock.clone(), workers.clone())))
            .with(Arc::new(DownloadWorker::new(resolver, clock.clone(), workers.clone())))
            .with(Arc::new(NullWorker::new(clock, workers.max_instances.null)))
    }

    /// 注册或替换某个访问类型的工作器
    pub fn with(mut self, worker: Arc<dyn NetworkTaskWorker>) -> Self {
        self.workers.insert(worker.access_type(), worker);
        self
    }

    pub fn get(&self, access_type: AccessType) -> Option<Arc<dyn NetworkTaskWorker>> {
        self.workers.get(&access_type).cloned()
    }
}
