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

use netwatch::application::context::SchedulerContext;
use netwatch::application::use_cases::monitor_use_case::MonitorUseCase;
use netwatch::config::settings::Settings;
use netwatch::infrastructure::metrics;
use netwatch::infrastructure::repositories::open_repositories;
use netwatch::presentation::routes;
use netwatch::utils::telemetry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting netwatch...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    metrics::init_metrics(&settings.metrics);

    // 3. Open storage
    let repositories = open_repositories(&settings.database).await?;

    // 4. Assemble the scheduler and resume tasks left running
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let (context, mut manager) = SchedulerContext::builder(settings, repositories).build();
    manager.start();
    if let Err(e) = context.launch().await {
        error!("Failed to resume scheduled tasks: {}", e);
    }

    // 5. Start HTTP server
    let use_case = Arc::new(MonitorUseCase::new(context.clone()));
    let app = routes::routes(use_case);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            manager.wait_for_shutdown().await;
        })
        .await?;

    context.shutdown().await;
    info!("netwatch stopped");
    Ok(())
}
