// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 监控任务（task）：周期性执行的网络可达性检查
/// - 探测参数（access_type_data）：每个任务的探测细节
/// - 日志条目（log_entry）：每次执行的结果
/// - 挂起窗口与挂起状态（suspension）
pub mod access_type_data;
pub mod log_entry;
pub mod suspension;
pub mod task;
