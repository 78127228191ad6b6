// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::domain::repositories::Repositories;
use crate::domain::services::network_state::NetworkStateProvider;
use crate::domain::services::notification_policy::NotificationPolicy;
use crate::domain::services::notification_service::NotificationSink;
use crate::infrastructure::events::EventBus;
use crate::infrastructure::network::NetdevNetworkState;
use crate::infrastructure::services::build_notification_sink;
use crate::queue::alarm::{AlarmService, TokioAlarmService};
use crate::queue::process_pool::ProcessPool;
use crate::queue::scheduler::TaskScheduler;
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::errors::SchedulerError;
use crate::utils::wake_lock::WakeLock;
use crate::workers::dispatcher::ExecutionDispatcher;
use crate::workers::manager::WorkerManager;
use crate::workers::pipeline::ExecutionPipeline;
use crate::workers::registry::WorkerRegistry;
use std::sync::Arc;
use tracing::info;

/// 调度上下文
///
/// 持有调度器、闹钟、进程池和执行分发器，是控制接口和进程入口共享的组合根
pub struct SchedulerContext {
    pub settings: Settings,
    pub repositories: Repositories,
    pub scheduler: Arc<TaskScheduler>,
    pub dispatcher: ExecutionDispatcher,
    pub alarms: Arc<dyn AlarmService>,
    pub pool: Arc<ProcessPool>,
    pub events: EventBus,
    pub clock: Arc<dyn Clock>,
}

impl SchedulerContext {
    pub fn builder(settings: Settings, repositories: Repositories) -> SchedulerContextBuilder {
        SchedulerContextBuilder {
            settings,
            repositories,
            network: None,
            notifications: None,
            clock: None,
            registry: None,
        }
    }

    /// 进程启动：恢复上次运行中的任务
    pub async fn launch(&self) -> Result<(), SchedulerError> {
        info!("Launching scheduler");
        self.scheduler.launch().await
    }

    /// 进程退出：取消全部闹钟和执行，保留运行标志
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }
}

/// 调度上下文构建器
///
/// 未指定的依赖使用默认实现：网络状态读取默认网卡，通知按配置写日志或投递 Webhook，
/// 时钟为系统时钟，工作器为全部内置工作器
pub struct SchedulerContextBuilder {
    settings: Settings,
    repositories: Repositories,
    network: Option<Arc<dyn NetworkStateProvider>>,
    notifications: Option<Arc<dyn NotificationSink>>,
    clock: Option<Arc<dyn Clock>>,
    registry: Option<WorkerRegistry>,
}

impl SchedulerContextBuilder {
    pub fn with_network(mut self, network: Arc<dyn NetworkStateProvider>) -> Self {
        self.network = Some(network);
        self
    }

    pub fn with_notifications(mut self, notifications: Arc<dyn NotificationSink>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_registry(mut self, registry: WorkerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// 组装上下文
    ///
    /// # 返回值
    ///
    /// 返回上下文以及尚未启动的触发接收循环
    pub fn build(self) -> (Arc<SchedulerContext>, WorkerManager) {
        let settings = self.settings;
        let repositories = self.repositories;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let network = self
            .network
            .unwrap_or_else(|| Arc::new(NetdevNetworkState));
        let notifications = self
            .notifications
            .unwrap_or_else(|| build_notification_sink(&settings.notification));
        let registry = self
            .registry
            .unwrap_or_else(|| WorkerRegistry::from_settings(&settings, clock.clone()));

        let (alarm_service, receiver) = TokioAlarmService::new(clock.clone());
        let alarms: Arc<dyn AlarmService> = Arc::new(alarm_service);
        let pool = Arc::new(ProcessPool::new());
        let events = EventBus::default();

        let scheduler = Arc::new(TaskScheduler::new(
            &repositories,
            alarms.clone(),
            pool.clone(),
            notifications.clone(),
            events.clone(),
            clock.clone(),
            &settings,
        ));
        let pipeline = Arc::new(ExecutionPipeline::new(
            repositories.clone(),
            registry,
            network,
            notifications,
            NotificationPolicy::from_settings(&settings.notification),
            events.clone(),
            clock.clone(),
            settings.network.preferred_network,
            settings.database.log_count_limit,
        ));
        let dispatcher = ExecutionDispatcher::new(
            pipeline,
            scheduler.clone(),
            pool.clone(),
            WakeLock::new(),
            settings.scheduler.execution_mode,
        );
        let manager = WorkerManager::new(scheduler.clone(), dispatcher.clone(), receiver);

        let context = Arc::new(SchedulerContext {
            settings,
            repositories,
            scheduler,
            dispatcher,
            alarms,
            pool,
            events,
            clock,
        });
        (context, manager)
    }
}
