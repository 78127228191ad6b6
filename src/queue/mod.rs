// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 调度模块
///
/// 负责闹钟、任务调度、挂起窗口控制以及进行中执行的登记
pub mod alarm;
pub mod process_pool;
pub mod scheduler;
pub mod suspension;
