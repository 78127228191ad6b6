// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 组合根和控制接口用例
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含监控任务、日志、挂起窗口等实体以及仓库和服务接口
pub mod domain;

/// 引擎模块
///
/// 实现 DNS 解析和 Ping、Connect、Download 三种探测
pub mod engines;

/// 基础设施模块
///
/// 提供数据库、通知投递、网络状态和指标等外部集成
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由和处理器
pub mod presentation;

/// 队列模块
///
/// 闹钟、进程池、挂起控制器和任务调度器
pub mod queue;

/// 工具模块
///
/// 提供时钟、唤醒锁、日志初始化和错误类型
pub mod utils;

/// 工作器模块
///
/// 实现探测工作器、执行流水线和触发分发
pub mod workers;
