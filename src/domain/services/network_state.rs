// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 网络类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    #[default]
    Wifi,
    Ethernet,
    Other,
}

/// 当前网络状态快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkState {
    pub connected: bool,
    pub kind: NetworkKind,
}

impl NetworkState {
    pub fn connected(kind: NetworkKind) -> Self {
        Self {
            connected: true,
            kind,
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            kind: NetworkKind::Other,
        }
    }
}

/// 网络状态提供者
pub trait NetworkStateProvider: Send + Sync {
    fn current(&self) -> NetworkState;
}
