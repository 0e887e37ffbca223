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

//! GATT peripheral role: attribute bookkeeping, the operation serializer,
//! subscription tracking and the event dispatch router.

pub mod attributes;
pub mod central;
pub mod peripheral;
pub mod queue;
pub mod server;
pub mod status;
pub mod subscriptions;
pub mod transport;
pub mod uuids;

pub use attributes::{
    AttributeStore, CharacteristicDef, CharacteristicProperties, DescriptorDef, ServiceDef,
};
pub use central::{Central, CentralRegistry};
pub use peripheral::PeripheralManager;
pub use queue::{CommandQueue, Operation};
pub use server::GattServer;
pub use status::GattStatus;
pub use subscriptions::{check_ccc_value, SubscriptionState, SubscriptionTable};
pub use transport::{GattTransport, TransportEvent};
