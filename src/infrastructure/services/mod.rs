// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 通知服务模块
///
/// 提供通知接口的日志、Webhook 以及组合实现
pub mod fanout_notification_sink;
pub mod log_notification_sink;
pub mod webhook_notification_sink;

use crate::config::settings::NotificationSettings;
use crate::domain::services::notification_service::NotificationSink;
use fanout_notification_sink::FanoutNotificationSink;
use log_notification_sink::LogNotificationSink;
use std::sync::Arc;
use tracing::warn;
use webhook_notification_sink::WebhookNotificationSink;

/// 按配置构建通知实现
///
/// 总是写日志，同时配置了 `webhook_url` 和 `webhook_secret` 时额外投递 Webhook
pub fn build_notification_sink(settings: &NotificationSettings) -> Arc<dyn NotificationSink> {
    let mut sink = FanoutNotificationSink::default().with(Arc::new(LogNotificationSink));
    if let Some((url, secret)) = webhook_target(settings) {
        sink = sink.with(Arc::new(WebhookNotificationSink::new(url, secret)));
    }
    Arc::new(sink)
}

/// Webhook 的地址和签名密钥，任一缺失时返回 `None`
fn webhook_target(settings: &NotificationSettings) -> Option<(&str, &str)> {
    let url = settings.webhook_url.as_deref().filter(|url| !url.is_empty())?;
    match settings.webhook_secret.as_deref().filter(|secret| !secret.is_empty()) {
        Some(secret) => Some((url, secret)),
        None => {
            warn!("webhook_url is set without webhook_secret, webhook notifications disabled");
            None
        }
    }
}
