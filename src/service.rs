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

//! The contract between the GATT dispatch router and service
//! implementations.

use uuid::Uuid;

use crate::gatt::{Central, GattStatus, ServiceDef};

/// A local GATT service implementation.
///
/// The router calls these hooks on its event loop; implementations decide
/// what value to report and when to emit observations, and call back into
/// the peripheral manager to do so. All hooks default to no-ops that
/// accept the request.
pub trait Service: Send + Sync {
    /// The attribute-table definition registered with the transport.
    fn definition(&self) -> ServiceDef;

    /// A central read this characteristic. The router responds with the
    /// stored value afterwards regardless; use this hook to refresh it.
    fn on_characteristic_read(&self, _central: &Central, _characteristic: Uuid) {}

    /// A central wrote this characteristic. The stored value is only
    /// updated when the returned status is success.
    fn on_characteristic_write(
        &self,
        _central: &Central,
        _characteristic: Uuid,
        _value: &[u8],
    ) -> GattStatus {
        GattStatus::Success
    }

    fn on_descriptor_read(&self, _central: &Central, _characteristic: Uuid, _descriptor: Uuid) {}

    /// A central wrote a descriptor. For CCC descriptors this is the
    /// domain-level authorization step: the subscription only commits
    /// when this returns success.
    fn on_descriptor_write(
        &self,
        _central: &Central,
        _characteristic: Uuid,
        _descriptor: Uuid,
        _value: &[u8],
    ) -> GattStatus {
        GattStatus::Success
    }

    /// The characteristic became live for at least this subscriber.
    fn on_notifying_enabled(&self, _central: &Central, _characteristic: Uuid) {}

    /// This subscriber disabled the characteristic.
    fn on_notifying_disabled(&self, _central: &Central, _characteristic: Uuid) {}

    fn on_central_connected(&self, _central: &Central) {}

    fn on_central_disconnected(&self, _central: &Central) {}
}
