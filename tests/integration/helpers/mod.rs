// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

mod recording_sink;
mod scripted_worker;

pub use recording_sink::RecordingSink;
pub use scripted_worker::ScriptedWorker;

use chrono::{DateTime, Local, TimeZone};
use netwatch::application::context::SchedulerContext;
use netwatch::config::settings::Settings;
use netwatch::domain::models::log_entry::LogEntry;
use netwatch::domain::models::task::{AccessType, Task};
use netwatch::domain::services::network_state::{NetworkKind, NetworkState};
use netwatch::infrastructure::network::StaticNetworkState;
use netwatch::infrastructure::repositories::memory_repositories;
use netwatch::infrastructure::repositories::memory_store::InMemoryStore;
use netwatch::utils::clock::ManualClock;
use netwatch::workers::manager::WorkerManager;
use netwatch::workers::registry::WorkerRegistry;
use std::sync::Arc;
use std::time::Duration;

/// 测试用配置：内存存储，关闭指标导出
pub fn test_settings() -> Settings {
    let mut settings = Settings::default_settings().expect("default settings");
    settings.database.url = "memory".to_string();
    settings.metrics.enabled = false;
    settings
}

/// 固定的本地时间，避开夏令时切换
pub fn local(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2025, month, day, hour, minute, 0)
        .single()
        .expect("unambiguous local time")
}

pub fn noon() -> DateTime<Local> {
    local(6, 10, 12, 0)
}

/// 让已就绪的闹钟、接收循环和执行跑完
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// 装配好的调度上下文，网络、时钟、通知和 Null 工作器均可由测试控制
#[allow(dead_code)]
pub struct Harness {
    pub context: Arc<SchedulerContext>,
    pub manager: WorkerManager,
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<ManualClock>,
    pub network: Arc<StaticNetworkState>,
    pub sink: Arc<RecordingSink>,
    pub worker: Arc<ScriptedWorker>,
}

impl Harness {
    pub fn new(settings: Settings) -> Self {
        Self::with_store(settings, Arc::new(InMemoryStore::new()), noon())
    }

    pub fn at(settings: Settings, now: DateTime<Local>) -> Self {
        Self::with_store(settings, Arc::new(InMemoryStore::new()), now)
    }

    pub fn with_store(settings: Settings, store: Arc<InMemoryStore>, now: DateTime<Local>) -> Self {
        let clock = Arc::new(ManualClock::new(now));
        let network = Arc::new(StaticNetworkState::new(NetworkState::connected(
            NetworkKind::Wifi,
        )));
        let sink = Arc::new(RecordingSink::default());
        let worker = Arc::new(ScriptedWorker::new(
            clock.clone(),
            settings.workers.max_instances.null,
        ));
        let registry = WorkerRegistry::from_settings(&settings, clock.clone()).with(worker.clone());

        let (context, mut manager) =
            SchedulerContext::builder(settings, memory_repositories(store.clone()))
                .with_clock(clock.clone())
                .with_network(network.clone())
                .with_notifications(sink.clone())
                .with_registry(registry)
                .build();
        manager.start();

        Self {
            context,
            manager,
            store,
            clock,
            network,
            sink,
            worker,
        }
    }

    /// 插入一个通知开启的 Null 任务
    pub async fn create_task(&self, interval_minutes: u32) -> Task {
        let mut task = Task::new("localhost", AccessType::Null, interval_minutes);
        task.notify_on_failure = true;
        self.insert(task).await
    }

    pub async fn insert(&self, task: Task) -> Task {
        self.context
            .repositories
            .tasks
            .insert(&task)
            .await
            .expect("insert task")
    }

    pub async fn task(&self, id: i64) -> Task {
        self.context
            .repositories
            .tasks
            .find_by_id(id)
            .await
            .expect("read task")
            .expect("task exists")
    }

    /// 按时间倒序返回日志
    pub async fn logs(&self, id: i64) -> Vec<LogEntry> {
        self.context
            .repositories
            .logs
            .find_by_task(id, 100)
            .await
            .expect("read logs")
    }
}
