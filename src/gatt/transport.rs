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

//! The boundary to the host BLE stack.
//!
//! Every transport primitive is fire-and-continue: the call only starts
//! the operation, completion arrives later as a [`TransportEvent`] on the
//! server's event channel.

use anyhow::Result;
use uuid::Uuid;

use super::attributes::ServiceDef;
use super::status::GattStatus;

/// What the host stack must provide to this peripheral.
pub trait GattTransport: Send + Sync {
    /// Start registering a service. Completion is reported via
    /// [`TransportEvent::ServiceAdded`].
    fn add_service(&self, service: &ServiceDef) -> Result<()>;

    /// Start a characteristic-changed push to one central. Completion is
    /// reported via [`TransportEvent::NotificationSent`]. `confirm`
    /// selects indication over notification.
    fn notify(&self, central: &str, characteristic: Uuid, value: &[u8], confirm: bool)
        -> Result<()>;

    /// Answer a read/write request. Each request handle is usable for
    /// exactly one response.
    fn respond(&self, central: &str, request_id: u32, status: GattStatus, value: &[u8]);
}

/// Inbound events delivered by the host stack, processed one at a time
/// on the server's event loop.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    CentralConnected {
        address: String,
        name: Option<String>,
    },
    CentralDisconnected {
        address: String,
    },
    /// Completion callback for [`GattTransport::add_service`].
    ServiceAdded {
        service: Uuid,
        status: GattStatus,
    },
    ReadRequest {
        request_id: u32,
        address: String,
        characteristic: Uuid,
        offset: usize,
    },
    WriteRequest {
        request_id: u32,
        address: String,
        characteristic: Uuid,
        value: Vec<u8>,
        response_needed: bool,
    },
    DescriptorReadRequest {
        request_id: u32,
        address: String,
        characteristic: Uuid,
        descriptor: Uuid,
    },
    DescriptorWriteRequest {
        request_id: u32,
        address: String,
        characteristic: Uuid,
        descriptor: Uuid,
        value: Vec<u8>,
        response_needed: bool,
    },
    /// Completion callback for [`GattTransport::notify`].
    NotificationSent {
        address: String,
        status: GattStatus,
    },
    MtuChanged {
        address: String,
        mtu: usize,
    },
}
