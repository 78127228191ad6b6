// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，提供对领域层抽象接口的具体实现。
///
/// 包含的子模块：
/// - 数据库（database）：数据库连接、迁移和实体映射
/// - 事件（events）：进程内状态变化广播
/// - 指标（metrics）：Prometheus 指标导出
/// - 网络（network）：当前网络状态探测
/// - 仓库实现（repositories）：SeaORM 与内存仓库
/// - 服务（services）：通知投递实现
pub mod database;
pub mod events;
pub mod metrics;
pub mod network;
pub mod repositories;
pub mod services;
