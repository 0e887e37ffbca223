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

//! An in-process host stack.
//!
//! Implements [`GattTransport`] against the server's event channel:
//! outbound operations are recorded and their completion callbacks fed
//! straight back as events, and a scripted central can be driven through
//! the same channel. Stands in for a real radio stack in the demo binary
//! and the test suite.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::gatt::{GattStatus, GattTransport, ServiceDef, TransportEvent};

/// One notification as it would leave the radio.
#[derive(Debug, Clone)]
pub struct SentNotification {
    pub central: String,
    pub characteristic: Uuid,
    pub value: Vec<u8>,
    pub confirm: bool,
}

/// One response to a central's request.
#[derive(Debug, Clone)]
pub struct SentResponse {
    pub central: String,
    pub request_id: u32,
    pub status: GattStatus,
    pub value: Vec<u8>,
}

pub struct SimulatedTransport {
    events: mpsc::UnboundedSender<TransportEvent>,
    notifications: Mutex<Vec<SentNotification>>,
    responses: Mutex<Vec<SentResponse>>,
    fail_notifications: AtomicBool,
    next_request_id: AtomicU32,
}

impl SimulatedTransport {
    /// Create the transport plus the event channel the server consumes.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            events: tx,
            notifications: Mutex::new(Vec::new()),
            responses: Mutex::new(Vec::new()),
            fail_notifications: AtomicBool::new(false),
            next_request_id: AtomicU32::new(1),
        });
        (transport, rx)
    }

    /// Make subsequent notify calls fail synchronously.
    pub fn set_fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }

    pub fn sent_notifications(&self) -> Vec<SentNotification> {
        self.notifications.lock().clone()
    }

    pub fn sent_responses(&self) -> Vec<SentResponse> {
        self.responses.lock().clone()
    }

    pub fn clear_sent(&self) {
        self.notifications.lock().clear();
        self.responses.lock().clear();
    }

    fn send(&self, event: TransportEvent) {
        // The receiver living shorter than the transport is fine; events
        // after shutdown are dropped.
        let _ = self.events.send(event);
    }

    fn fresh_request_id(&self) -> u32 {
        self.next_request_id.fetch_add(1, Ordering::SeqCst)
    }

    // Scripted-central helpers.

    pub fn central_connects(&self, address: &str, name: Option<&str>) {
        self.send(TransportEvent::CentralConnected {
            address: address.to_string(),
            name: name.map(str::to_string),
        });
    }

    pub fn central_disconnects(&self, address: &str) {
        self.send(TransportEvent::CentralDisconnected {
            address: address.to_string(),
        });
    }

    pub fn central_negotiates_mtu(&self, address: &str, mtu: usize) {
        self.send(TransportEvent::MtuChanged {
            address: address.to_string(),
            mtu,
        });
    }

    /// Write a CCC descriptor value on behalf of the central.
    pub fn central_writes_ccc(&self, address: &str, characteristic: Uuid, value: &[u8]) -> u32 {
        let request_id = self.fresh_request_id();
        self.send(TransportEvent::DescriptorWriteRequest {
            request_id,
            address: address.to_string(),
            characteristic,
            descriptor: crate::gatt::uuids::CCC_DESCRIPTOR_UUID,
            value: value.to_vec(),
            response_needed: true,
        });
        request_id
    }

    pub fn central_reads(&self, address: &str, characteristic: Uuid, offset: usize) -> u32 {
        let request_id = self.fresh_request_id();
        self.send(TransportEvent::ReadRequest {
            request_id,
            address: address.to_string(),
            characteristic,
            offset,
        });
        request_id
    }

    pub fn central_writes(&self, address: &str, characteristic: Uuid, value: &[u8]) -> u32 {
        let request_id = self.fresh_request_id();
        self.send(TransportEvent::WriteRequest {
            request_id,
            address: address.to_string(),
            characteristic,
            value: value.to_vec(),
            response_needed: true,
        });
        request_id
    }
}

impl GattTransport for SimulatedTransport {
    fn add_service(&self, service: &ServiceDef) -> anyhow::Result<()> {
        debug!("simulated stack registered service <{}>", service.uuid);
        self.send(TransportEvent::ServiceAdded {
            service: service.uuid,
            status: GattStatus::Success,
        });
        Ok(())
    }

    fn notify(
        &self,
        central: &str,
        characteristic: Uuid,
        value: &[u8],
        confirm: bool,
    ) -> anyhow::Result<()> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            anyhow::bail!("simulated radio rejected the notification");
        }
        self.notifications.lock().push(SentNotification {
            central: central.to_string(),
            characteristic,
            value: value.to_vec(),
            confirm,
        });
        self.send(TransportEvent::NotificationSent {
            address: central.to_string(),
            status: GattStatus::Success,
        });
        Ok(())
    }

    fn respond(&self, central: &str, request_id: u32, status: GattStatus, value: &[u8]) {
        self.responses.lock().push(SentResponse {
            central: central.to_string(),
            request_id,
            status,
            value: value.to_vec(),
        });
    }
}
