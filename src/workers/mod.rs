// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 探测工作器、执行管线、分发器以及触发接收循环
pub mod connect_worker;
pub mod dispatcher;
pub mod download_worker;
pub mod manager;
pub mod null_worker;
pub mod pipeline;
pub mod ping_worker;
pub mod registry;
pub mod worker;
