// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 仓库接口定义了数据持久化的抽象契约，具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 任务仓库（task_repository）：任务定义与调度计数器
/// - 日志仓库（log_repository）：执行结果
/// - 探测参数仓库（access_type_data_repository）
/// - 挂起状态仓库（scheduler_state_repository）：挂起状态与挂起窗口
pub mod access_type_data_repository;
pub mod log_repository;
pub mod scheduler_state_repository;
pub mod task_repository;

use access_type_data_repository::AccessTypeDataRepository;
use log_repository::LogRepository;
use scheduler_state_repository::SchedulerStateRepository;
use std::sync::Arc;
use task_repository::TaskRepository;

/// 一组共享同一后端的仓库
#[derive(Clone)]
pub struct Repositories {
    pub tasks: Arc<dyn TaskRepository>,
    pub logs: Arc<dyn LogRepository>,
    pub access_data: Arc<dyn AccessTypeDataRepository>,
    pub scheduler_state: Arc<dyn SchedulerStateRepository>,
}
