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

use crate::domain::models::task::AccessType;
use crate::domain::services::network_state::NetworkKind;
use crate::domain::services::notification_policy::NotificationMode;
use crate::engines::dns::IpPreference;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含数据库、服务器、调度、挂起窗口、通知、网络与探测器等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 调度器配置
    pub scheduler: SchedulerSettings,
    /// 时间挂起配置
    pub suspension: SuspensionSettings,
    /// 通知配置
    pub notification: NotificationSettings,
    /// 网络配置
    pub network: NetworkSettings,
    /// 探测工作器配置
    pub workers: WorkerSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL，`memory` 表示使用内存存储
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
    /// 每个任务保留的日志条数
    pub log_count_limit: u64,
}

impl DatabaseSettings {
    /// 是否使用内存存储
    pub fn is_memory(&self) -> bool {
        self.url.eq_ignore_ascii_case("memory")
    }
}

/// 执行分发模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// 先执行探测，再重新调度
    Sync,
    /// 先重新调度，再在后台执行探测
    #[default]
    Async,
}

/// 调度器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// 执行分发模式
    pub execution_mode: ExecutionMode,
    /// 是否使用前台状态通知通道
    pub foreground: bool,
}

/// 时间挂起配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SuspensionSettings {
    /// 是否启用基于时间的挂起
    pub enabled: bool,
    /// 判断当前是否处于挂起窗口时向前偏移的毫秒数
    pub threshold_ms: u64,
}

impl SuspensionSettings {
    pub fn threshold(&self) -> Duration {
        Duration::from_millis(self.threshold_ms)
    }
}

/// 通知配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    /// 通知策略
    pub mode: NotificationMode,
    /// FAILURE 策略下每累计多少次失败通知一次
    pub failures_before_notification: u32,
    /// 无可用网络时是否按失败处理并通知
    pub notify_on_inactive_network: bool,
    /// 高优先级任务是否额外发出告警通知
    pub high_priority_alarm: bool,
    /// 可选的 Webhook 通知地址
    pub webhook_url: Option<String>,
    /// Webhook 签名密钥，未配置时不投递 Webhook
    pub webhook_secret: Option<String>,
}

/// 网络配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSettings {
    /// DNS 解析时的地址族偏好
    pub ip_preference: IpPreference,
    /// "仅首选网络" 任务要求的网络类型
    pub preferred_network: NetworkKind,
}

/// 每种访问类型允许的最大并发实例数
#[derive(Debug, Clone, Deserialize)]
pub struct MaxInstanceSettings {
    pub ping: u32,
    pub connect: u32,
    pub download: u32,
    pub null: u32,
}

impl MaxInstanceSettings {
    pub fn for_access_type(&self, access_type: AccessType) -> u32 {
        match access_type {
            AccessType::Ping => self.ping,
            AccessType::Connect => self.connect,
            AccessType::Download => self.download,
            AccessType::Null => self.null,
        }
    }
}

/// 探测工作器配置设置
///
/// 所有超时均为毫秒。`executor_grace_ms` 是在协议超时之外
/// 给单次受限执行留出的余量，超过后执行被视为中断。
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSettings {
    pub dns_timeout_ms: u64,
    pub ping_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub download_timeout_ms: u64,
    pub executor_grace_ms: u64,
    pub max_instances: MaxInstanceSettings,
}

impl WorkerSettings {
    pub fn dns_timeout(&self) -> Duration {
        Duration::from_millis(self.dns_timeout_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_millis(self.download_timeout_ms)
    }

    /// 在协议超时基础上加上执行余量
    pub fn bounded(&self, protocol_timeout: Duration) -> Duration {
        protocol_timeout + Duration::from_millis(self.executor_grace_ms)
    }
}

/// 指标导出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出
    pub enabled: bool,
    /// 导出监听地址
    pub listen: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`
    /// 以及 `NETWATCH__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("NETWATCH").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 仅由内置默认值构成的配置，测试和嵌入场景使用
    pub fn default_settings() -> Result<Self, ConfigError> {
        Self::defaults()?.build()?.try_deserialize()
    }

    fn defaults() -> Result<config::builder::ConfigBuilder<config::builder::DefaultState>, ConfigError>
    {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "sqlite://netwatch.db?mode=rwc")?
            .set_default("database.max_connections", 5)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default("database.log_count_limit", 100)?
            .set_default("scheduler.execution_mode", "async")?
            .set_default("scheduler.foreground", false)?
            .set_default("suspension.enabled", true)?
            .set_default("suspension.threshold_ms", 1000)?
            .set_default("notification.mode", "failure")?
            .set_default("notification.failures_before_notification", 1)?
            .set_default("notification.notify_on_inactive_network", false)?
            .set_default("notification.high_priority_alarm", true)?
            .set_default("network.ip_preference", "auto")?
            .set_default("network.preferred_network", "wifi")?
            .set_default("workers.dns_timeout_ms", 5000)?
            .set_default("workers.ping_timeout_ms", 5000)?
            .set_default("workers.connect_timeout_ms", 10000)?
            .set_default("workers.download_timeout_ms", 60000)?
            .set_default("workers.executor_grace_ms", 2000)?
            .set_default("workers.max_instances.ping", 1)?
            .set_default("workers.max_instances.connect", 1)?
            .set_default("workers.max_instances.download", 1)?
            .set_default("workers.max_instances.null", 1)?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen", "0.0.0.0:9000")
    }
}
