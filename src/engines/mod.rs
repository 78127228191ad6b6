// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 探测引擎模块
///
/// DNS 解析、ICMP、TCP 连接和 HTTP 下载的协议实现，以及受限执行工具
pub mod connect_engine;
pub mod dns;
pub mod download_engine;
pub mod ping_engine;
pub mod traits;
