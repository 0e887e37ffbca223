// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Connected centrals and the registry that tracks them.

use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::info;

use super::uuids::config::DEFAULT_MTU;

/// One remote peer connected to this peripheral.
///
/// Owned by the [`CentralRegistry`]; services only ever receive a clone
/// of the snapshot, never ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Central {
    /// Stable link address, unique per peer for the registry's lifetime.
    pub address: String,
    pub name: Option<String>,
    /// Negotiated ATT MTU, updated on renegotiation.
    pub mtu: usize,
}

impl Central {
    fn new(address: String, name: Option<String>) -> Self {
        Self {
            address,
            name,
            mtu: DEFAULT_MTU,
        }
    }

    /// Display name falling back to the link address.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }
}

/// The single source of truth for "who is this peer".
#[derive(Default)]
pub struct CentralRegistry {
    centrals: RwLock<HashMap<String, Central>>,
}

impl CentralRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the central for a known link identity, constructing and
    /// registering a new one on first reference.
    pub fn resolve(&self, address: &str, name_hint: Option<&str>) -> Central {
        let mut centrals = self.centrals.write();
        centrals
            .entry(address.to_string())
            .or_insert_with(|| {
                info!("central '{}' registered", name_hint.unwrap_or(address));
                Central::new(address.to_string(), name_hint.map(str::to_string))
            })
            .clone()
    }

    /// Look up a central without registering it.
    pub fn get(&self, address: &str) -> Option<Central> {
        self.centrals.read().get(address).cloned()
    }

    /// Remove a central after its link dropped.
    pub fn remove(&self, address: &str) -> Option<Central> {
        self.centrals.write().remove(address)
    }

    pub fn update_mtu(&self, address: &str, mtu: usize) {
        if let Some(central) = self.centrals.write().get_mut(address) {
            info!("central '{}' MTU: {} -> {}", central.display_name(), central.mtu, mtu);
            central.mtu = mtu;
        }
    }

    pub fn connected_count(&self) -> usize {
        self.centrals.read().len()
    }

    pub fn connected_centrals(&self) -> Vec<Central> {
        self.centrals.read().values().cloned().collect()
    }

    /// Smallest negotiated MTU across connected centrals, so that one
    /// notification fits every link. Defaults to [`DEFAULT_MTU`] when no
    /// central is connected.
    pub fn minimal_mtu(&self) -> usize {
        self.centrals
            .read()
            .values()
            .map(|c| c.mtu)
            .min()
            .unwrap_or(DEFAULT_MTU)
    }
}
