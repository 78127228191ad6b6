// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 初始化指标系统
///
/// 安装 Prometheus 导出器并注册调度与探测相关的指标
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics listen address {}: {}", settings.listen, e);
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_counter!("alarms_armed_total", "Total number of alarms armed");
    describe_counter!(
        "probe_executions_total",
        "Total number of probe executions by access type"
    );
    describe_counter!(
        "probe_failures_total",
        "Total number of unsuccessful probe executions by access type"
    );
    describe_counter!(
        "probe_rejections_total",
        "Executions rejected because the access type reached its instance limit"
    );
    describe_counter!(
        "probe_interruptions_total",
        "Executions interrupted by cancellation or executor timeout"
    );
    describe_histogram!(
        "probe_duration_seconds",
        "Wall time of a full probe execution in seconds"
    );
    describe_gauge!(
        "scheduler_suspended",
        "Whether the scheduler is inside a suspension interval (1) or active (0)"
    );

    info!("Metrics exporter listening on {}", addr);
}
