// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::network_state::{NetworkKind, NetworkState, NetworkStateProvider};
use netdev::interface::InterfaceType;
use parking_lot::RwLock;
use tracing::debug;

/// 基于默认网络接口的网络状态
///
/// 默认接口存在且有地址即视为已连接，接口类型决定网络类型
#[derive(Debug, Default, Clone, Copy)]
pub struct NetdevNetworkState;

impl NetworkStateProvider for NetdevNetworkState {
    fn current(&self) -> NetworkState {
        match netdev::get_default_interface() {
            Ok(interface) => {
                if interface.ipv4.is_empty() && interface.ipv6.is_empty() {
                    return NetworkState::disconnected();
                }
                let kind = match interface.if_type {
                    InterfaceType::Wireless80211 => NetworkKind::Wifi,
                    InterfaceType::Ethernet
                    | InterfaceType::GigabitEthernet
                    | InterfaceType::FastEthernetT
                    | InterfaceType::FastEthernetFx => NetworkKind::Ethernet,
                    _ => NetworkKind::Other,
                };
                NetworkState::connected(kind)
            }
            Err(e) => {
                debug!("No default network interface: {}", e);
                NetworkState::disconnected()
            }
        }
    }
}

/// 固定的网络状态，可在运行时替换
#[derive(Debug)]
pub struct StaticNetworkState {
    state: RwLock<NetworkState>,
}

impl StaticNetworkState {
    pub fn new(state: NetworkState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    pub fn set(&self, state: NetworkState) {
        *self.state.write() = state;
    }
}

impl NetworkStateProvider for StaticNetworkState {
    fn current(&self) -> NetworkState {
        *self.state.read()
    }
}
