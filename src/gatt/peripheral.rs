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

//! The peripheral manager: shared state services act on.
//!
//! Owns the command queue, the central registry, the subscription table
//! and the attribute store. Services hold an `Arc` of this and use it to
//! emit notifications; the dispatch router mutates it from the event loop.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::attributes::{AttributeStore, ServiceDef};
use super::central::CentralRegistry;
use super::queue::{CommandQueue, Operation};
use super::subscriptions::SubscriptionTable;
use super::transport::GattTransport;
use super::uuids::config;
use crate::segmentation::segment;

pub struct PeripheralManager {
    queue: CommandQueue,
    registry: CentralRegistry,
    subscriptions: SubscriptionTable,
    attributes: AttributeStore,
}

impl PeripheralManager {
    pub fn new(transport: Arc<dyn GattTransport>) -> Self {
        Self {
            queue: CommandQueue::new(transport),
            registry: CentralRegistry::new(),
            subscriptions: SubscriptionTable::new(),
            attributes: AttributeStore::new(),
        }
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn registry(&self) -> &CentralRegistry {
        &self.registry
    }

    pub fn subscriptions(&self) -> &SubscriptionTable {
        &self.subscriptions
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    /// Register a service's attributes and enqueue its registration with
    /// the host stack.
    pub fn add_service(&self, def: &ServiceDef) -> bool {
        info!("adding service <{}>", def.uuid);
        self.attributes.register(def);
        self.queue.submit(Operation::AddService(def.clone()))
    }

    /// Enqueue a characteristic-changed push to every subscribed central.
    ///
    /// Returns false when the characteristic is unknown or supports
    /// neither notify nor indicate.
    pub fn notify_characteristic_changed(&self, value: &[u8], characteristic: Uuid) -> bool {
        let Some(def) = self.attributes.characteristic(characteristic) else {
            warn!("notify for unknown characteristic <{}>", characteristic);
            return false;
        };
        if def.properties.does_not_support_notifying() {
            warn!("characteristic <{}> does not support notifying", characteristic);
            return false;
        }

        self.attributes
            .set_characteristic_value(characteristic, value.to_vec());

        let mut all_submitted = true;
        for central in self.registry.connected_centrals() {
            if !self
                .subscriptions
                .state(&central.address, characteristic)
                .is_active()
            {
                continue;
            }
            let confirm =
                self.subscriptions
                    .confirm_for(&central.address, characteristic, &def.properties);
            all_submitted &= self.queue.submit(Operation::Notify {
                central: central.address,
                characteristic,
                value: value.to_vec(),
                confirm,
            });
        }
        all_submitted
    }

    /// Fan a payload out into MTU-sized segments and submit them, in
    /// order, as one sequential batch of notification operations.
    ///
    /// Ordering across segments is guaranteed by the command queue's FIFO
    /// discipline; no delivery confirmation is awaited in between.
    pub fn send_segmented(&self, payload: &[u8], characteristic: Uuid) -> bool {
        let unit_size = config::segment_unit_size(self.minimal_mtu());
        if unit_size == 0 {
            warn!("MTU too small to carry any segment payload");
            return false;
        }
        let mut all_submitted = true;
        for seg in segment(payload, unit_size) {
            all_submitted &= self.notify_characteristic_changed(&seg.to_bytes(), characteristic);
        }
        all_submitted
    }

    /// Smallest negotiated MTU across connected centrals.
    pub fn minimal_mtu(&self) -> usize {
        self.registry.minimal_mtu()
    }

    pub fn connected_count(&self) -> usize {
        self.registry.connected_count()
    }
}
