// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::log_entry::LogEntry;
use crate::domain::models::task::Task;
use crate::domain::services::notification_service::NotificationSink;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::time::Duration;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum NotificationKind {
    Failure,
    Recovery,
    Alarm,
    Foreground,
    ForegroundCleared,
}

#[derive(Debug, Serialize)]
struct NotificationPayload<'a> {
    event: NotificationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<&'a Task>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entry: Option<&'a LogEntry>,
}

/// 通过 Webhook 投递通知
///
/// 负载以 `HMAC-SHA256(secret, "{timestamp}.{payload}")` 签名，
/// 签名、时间戳和投递 ID 放在 `X-Netwatch-*` 请求头中
pub struct WebhookNotificationSink {
    /// HTTP 客户端
    client: reqwest::Client,
    /// 接收地址
    url: String,
    /// 签名密钥
    secret: String,
}

impl WebhookNotificationSink {
    /// 创建新的 Webhook 通知实现
    pub fn new(url: impl Into<String>, secret: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            url: url.into(),
            secret: secret.into(),
        }
    }

    /// 为负载生成签名
    pub fn generate_signature(&self, payload: &str, timestamp: i64) -> Result<String> {
        let message = format!("{}.{}", timestamp, payload);
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| anyhow!("Invalid webhook secret: {}", e))?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    async fn deliver(&self, payload: &NotificationPayload<'_>) -> Result<()> {
        let timestamp = chrono::Utc::now().timestamp();
        let body = serde_json::to_string(payload)?;
        let signature = self.generate_signature(&body, timestamp)?;

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("X-Netwatch-Signature", signature)
            .header("X-Netwatch-Timestamp", timestamp.to_string())
            .header("X-Netwatch-Event-ID", Uuid::new_v4().to_string())
            .body(body)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(anyhow!(
                "Notification delivery failed with status {}: {}",
                status,
                body
            ))
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookNotificationSink {
    async fn send_failure_notification(&self, task: &Task, entry: &LogEntry) -> Result<()> {
        let event = if entry.success {
            NotificationKind::Recovery
        } else {
            NotificationKind::Failure
        };
        self.deliver(&NotificationPayload {
            event,
            task: Some(task),
            entry: Some(entry),
        })
        .await
    }

    async fn send_alarm_notification(&self, task: &Task, entry: &LogEntry) -> Result<()> {
        self.deliver(&NotificationPayload {
            event: NotificationKind::Alarm,
            task: Some(task),
            entry: Some(entry),
        })
        .await
    }

    async fn send_foreground_status_notification(&self) -> Result<()> {
        self.deliver(&NotificationPayload {
            event: NotificationKind::Foreground,
            task: None,
            entry: None,
        })
        .await
    }

    async fn clear_foreground_status_notification(&self) -> Result<()> {
        self.deliver(&NotificationPayload {
            event: NotificationKind::ForegroundCleared,
            task: None,
            entry: None,
        })
        .await
    }
}
