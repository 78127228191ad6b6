// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用层模块
///
/// 组合根、控制接口用例以及数据传输对象
pub mod context;
pub mod dto;
pub mod use_cases;
