// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 网络状态（network_state）：连接状态与网络类型的抽象
/// - 通知策略（notification_policy）：失败计数与通知决策规则
/// - 通知服务（notification_service）：通知发送接口
pub mod network_state;
pub mod notification_policy;
pub mod notification_service;
