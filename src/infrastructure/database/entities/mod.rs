// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库实体模块
///
/// 定义数据库表对应的实体结构
pub mod access_type_data;
pub mod log_entry;
pub mod network_task;
pub mod scheduler_state;
pub mod suspension_interval;
