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

//! Per-central subscription state driven by CCC descriptor writes.

use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::attributes::CharacteristicProperties;
use super::status::GattStatus;
use super::uuids::ccc;

/// Subscription state of one (central, characteristic) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubscriptionState {
    #[default]
    Disabled,
    Notify,
    Indicate,
}

impl SubscriptionState {
    /// The state a canonical CCC value selects. `None` for any other value.
    pub fn from_ccc(value: &[u8]) -> Option<Self> {
        if value == ccc::DISABLE {
            Some(SubscriptionState::Disabled)
        } else if value == ccc::ENABLE_NOTIFICATION {
            Some(SubscriptionState::Notify)
        } else if value == ccc::ENABLE_INDICATION {
            Some(SubscriptionState::Indicate)
        } else {
            None
        }
    }

    /// Whether the characteristic is live for this subscriber.
    pub fn is_active(&self) -> bool {
        !matches!(self, SubscriptionState::Disabled)
    }
}

/// Validate a CCC descriptor write against the characteristic's properties.
///
/// The value is checked before the owning service is asked to authorize
/// the write; the stored state is only committed after both succeed.
pub fn check_ccc_value(value: &[u8], properties: &CharacteristicProperties) -> GattStatus {
    if value.len() != 2 {
        return GattStatus::InvalidAttributeValueLength;
    }
    let Some(state) = SubscriptionState::from_ccc(value) else {
        return GattStatus::RequestNotSupported;
    };
    match state {
        SubscriptionState::Notify if !properties.notify => GattStatus::RequestNotSupported,
        SubscriptionState::Indicate if !properties.indicate => GattStatus::RequestNotSupported,
        _ => GattStatus::Success,
    }
}

/// Subscription state per (central address, characteristic).
#[derive(Default)]
pub struct SubscriptionTable {
    states: RwLock<HashMap<(String, Uuid), SubscriptionState>>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, address: &str, characteristic: Uuid) -> SubscriptionState {
        self.states
            .read()
            .get(&(address.to_string(), characteristic))
            .copied()
            .unwrap_or_default()
    }

    pub fn set(&self, address: &str, characteristic: Uuid, state: SubscriptionState) {
        self.states
            .write()
            .insert((address.to_string(), characteristic), state);
    }

    /// Drop all subscriptions of a disconnected central.
    pub fn remove_central(&self, address: &str) {
        self.states.write().retain(|(addr, _), _| addr != address);
    }

    /// The confirm flag used by Notify operations for this subscriber:
    /// set only when the characteristic supports Indicate and the
    /// subscriber asked for it.
    pub fn confirm_for(
        &self,
        address: &str,
        characteristic: Uuid,
        properties: &CharacteristicProperties,
    ) -> bool {
        properties.indicate && self.state(address, characteristic) == SubscriptionState::Indicate
    }
}
