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

//! The local attribute table: services, characteristics, descriptors and
//! their current values, all keyed by UUID rather than any native handle.

use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::uuids;

/// Properties a characteristic advertises to centrals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharacteristicProperties {
    pub read: bool,
    pub write: bool,
    pub notify: bool,
    pub indicate: bool,
}

impl CharacteristicProperties {
    /// True when the characteristic supports neither notify nor indicate.
    pub fn does_not_support_notifying(&self) -> bool {
        !(self.notify || self.indicate)
    }
}

/// A descriptor attached to a characteristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorDef {
    pub uuid: Uuid,
    pub initial_value: Vec<u8>,
}

impl DescriptorDef {
    /// A Client Characteristic Configuration descriptor, initially disabled.
    pub fn ccc() -> Self {
        Self {
            uuid: uuids::CCC_DESCRIPTOR_UUID,
            initial_value: uuids::ccc::DISABLE.to_vec(),
        }
    }

    /// A Characteristic User Description descriptor.
    pub fn cud(description: &str) -> Self {
        Self {
            uuid: uuids::CUD_DESCRIPTOR_UUID,
            initial_value: description.as_bytes().to_vec(),
        }
    }
}

/// A characteristic within a service definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicDef {
    pub uuid: Uuid,
    pub properties: CharacteristicProperties,
    pub descriptors: Vec<DescriptorDef>,
    pub initial_value: Vec<u8>,
}

/// A complete service definition handed to the transport for registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDef {
    pub uuid: Uuid,
    pub primary: bool,
    pub characteristics: Vec<CharacteristicDef>,
}

impl ServiceDef {
    pub fn characteristic(&self, uuid: Uuid) -> Option<&CharacteristicDef> {
        self.characteristics.iter().find(|c| c.uuid == uuid)
    }
}

/// Current values of all registered attributes plus the routing index
/// from characteristic UUID to owning service UUID.
#[derive(Default)]
pub struct AttributeStore {
    services: RwLock<HashMap<Uuid, ServiceDef>>,
    char_owner: RwLock<HashMap<Uuid, Uuid>>,
    char_values: RwLock<HashMap<Uuid, Vec<u8>>>,
    descriptor_values: RwLock<HashMap<(Uuid, Uuid), Vec<u8>>>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service definition and seed all attribute values.
    pub fn register(&self, def: &ServiceDef) {
        let mut owners = self.char_owner.write();
        let mut char_values = self.char_values.write();
        let mut descriptor_values = self.descriptor_values.write();
        for characteristic in &def.characteristics {
            owners.insert(characteristic.uuid, def.uuid);
            char_values.insert(characteristic.uuid, characteristic.initial_value.clone());
            for descriptor in &characteristic.descriptors {
                descriptor_values.insert(
                    (characteristic.uuid, descriptor.uuid),
                    descriptor.initial_value.clone(),
                );
            }
        }
        self.services.write().insert(def.uuid, def.clone());
    }

    /// The service owning `characteristic`, if any.
    pub fn owner_of(&self, characteristic: Uuid) -> Option<Uuid> {
        self.char_owner.read().get(&characteristic).copied()
    }

    /// Look up a characteristic definition by UUID.
    pub fn characteristic(&self, uuid: Uuid) -> Option<CharacteristicDef> {
        let owner = self.owner_of(uuid)?;
        self.services
            .read()
            .get(&owner)
            .and_then(|s| s.characteristic(uuid))
            .cloned()
    }

    pub fn characteristic_value(&self, uuid: Uuid) -> Vec<u8> {
        self.char_values.read().get(&uuid).cloned().unwrap_or_default()
    }

    pub fn set_characteristic_value(&self, uuid: Uuid, value: Vec<u8>) {
        self.char_values.write().insert(uuid, value);
    }

    pub fn descriptor_value(&self, characteristic: Uuid, descriptor: Uuid) -> Vec<u8> {
        self.descriptor_values
            .read()
            .get(&(characteristic, descriptor))
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_descriptor_value(&self, characteristic: Uuid, descriptor: Uuid, value: Vec<u8>) {
        self.descriptor_values
            .write()
            .insert((characteristic, descriptor), value);
    }
}
