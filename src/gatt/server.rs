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

//! The GATT dispatch router.
//!
//! Routes inbound transport events to the service owning the referenced
//! characteristic and advances the command queue on completion callbacks.
//! All dispatch runs on one logical event-loop task; producers only touch
//! the command queue, whose submit path is its own atomic section.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::central::Central;
use super::peripheral::PeripheralManager;
use super::status::GattStatus;
use super::subscriptions::{check_ccc_value, SubscriptionState};
use super::transport::{GattTransport, TransportEvent};
use super::uuids;
use crate::service::Service;

pub struct GattServer {
    manager: Arc<PeripheralManager>,
    transport: Arc<dyn GattTransport>,
    services: RwLock<HashMap<Uuid, Arc<dyn Service>>>,
}

impl GattServer {
    /// Construct a server over the given transport. The caller owns the
    /// instance and its lifecycle; there is no global singleton.
    pub fn new(transport: Arc<dyn GattTransport>) -> Arc<Self> {
        Arc::new(Self {
            manager: Arc::new(PeripheralManager::new(transport.clone())),
            transport,
            services: RwLock::new(HashMap::new()),
        })
    }

    pub fn manager(&self) -> Arc<PeripheralManager> {
        self.manager.clone()
    }

    /// Register a service implementation and enqueue its registration
    /// with the host stack.
    pub fn register_service(&self, service: Arc<dyn Service>) -> bool {
        let def = service.definition();
        self.services.write().insert(def.uuid, service);
        self.manager.add_service(&def)
    }

    /// Drive the event loop until the transport closes its channel.
    pub async fn run(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<TransportEvent>) {
        info!("GATT server event loop started");
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        info!("GATT server event loop stopped");
    }

    /// Shut the server down: services are dropped, which cancels any
    /// emission they scheduled.
    pub fn close(&self) {
        info!("closing GATT server");
        self.services.write().clear();
    }

    fn service_for_characteristic(&self, characteristic: Uuid) -> Option<Arc<dyn Service>> {
        let owner = self.manager.attributes().owner_of(characteristic)?;
        self.services.read().get(&owner).cloned()
    }

    /// Process one inbound transport event.
    pub fn handle_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::CentralConnected { address, name } => {
                let central = self.manager.registry().resolve(&address, name.as_deref());
                info!("central '{}' connected", central.display_name());
                for service in self.services.read().values() {
                    service.on_central_connected(&central);
                }
            }
            TransportEvent::CentralDisconnected { address } => {
                // Guard against double disconnect events.
                let Some(central) = self.manager.registry().get(&address) else {
                    return;
                };
                info!("central '{}' disconnected", central.display_name());
                self.manager.registry().remove(&address);
                self.manager.subscriptions().remove_central(&address);
                for service in self.services.read().values() {
                    service.on_central_disconnected(&central);
                }
            }
            TransportEvent::ServiceAdded { service, status } => {
                if status.is_success() {
                    info!("service <{}> added", service);
                } else {
                    error!("adding service <{}> failed: {:?}", service, status);
                }
                self.manager.queue().completed();
            }
            TransportEvent::NotificationSent { address, status } => {
                if !status.is_success() {
                    debug!("notification to {} failed: {:?}", address, status);
                }
                self.manager.queue().completed();
            }
            TransportEvent::MtuChanged { address, mtu } => {
                self.manager.registry().update_mtu(&address, mtu);
            }
            TransportEvent::ReadRequest {
                request_id,
                address,
                characteristic,
                offset,
            } => {
                self.handle_read(request_id, &address, characteristic, offset);
            }
            TransportEvent::WriteRequest {
                request_id,
                address,
                characteristic,
                value,
                response_needed,
            } => {
                self.handle_write(request_id, &address, characteristic, &value, response_needed);
            }
            TransportEvent::DescriptorReadRequest {
                request_id,
                address,
                characteristic,
                descriptor,
            } => {
                self.handle_descriptor_read(request_id, &address, characteristic, descriptor);
            }
            TransportEvent::DescriptorWriteRequest {
                request_id,
                address,
                characteristic,
                descriptor,
                value,
                response_needed,
            } => {
                self.handle_descriptor_write(
                    request_id,
                    &address,
                    characteristic,
                    descriptor,
                    &value,
                    response_needed,
                );
            }
        }
    }

    fn resolve(&self, address: &str) -> Central {
        self.manager.registry().resolve(address, None)
    }

    fn handle_read(&self, request_id: u32, address: &str, characteristic: Uuid, offset: usize) {
        debug!("read request for <{}> offset {}", characteristic, offset);
        let central = self.resolve(address);
        let Some(service) = self.service_for_characteristic(characteristic) else {
            warn!("read for unmapped characteristic <{}>", characteristic);
            self.transport
                .respond(address, request_id, GattStatus::RequestNotSupported, &[]);
            return;
        };

        if offset == 0 {
            service.on_characteristic_read(&central, characteristic);
        }

        let value = self.manager.attributes().characteristic_value(characteristic);
        if offset > value.len() {
            self.transport
                .respond(address, request_id, GattStatus::InvalidOffset, &[]);
            return;
        }
        // Long reads carry at most MTU - 1 bytes per response.
        let end = value.len().min(offset + central.mtu - 1);
        self.transport
            .respond(address, request_id, GattStatus::Success, &value[offset..end]);
    }

    fn handle_write(
        &self,
        request_id: u32,
        address: &str,
        characteristic: Uuid,
        value: &[u8],
        response_needed: bool,
    ) {
        debug!(
            "write request for <{}>, {} bytes{}",
            characteristic,
            value.len(),
            if response_needed { "" } else { " (no response)" }
        );
        let central = self.resolve(address);
        let Some(service) = self.service_for_characteristic(characteristic) else {
            warn!("write for unmapped characteristic <{}>", characteristic);
            if response_needed {
                self.transport
                    .respond(address, request_id, GattStatus::RequestNotSupported, &[]);
            }
            return;
        };

        let status = service.on_characteristic_write(&central, characteristic, value);
        if status.is_success() {
            self.manager
                .attributes()
                .set_characteristic_value(characteristic, value.to_vec());
        }
        if response_needed {
            self.transport.respond(address, request_id, status, value);
        }
    }

    fn handle_descriptor_read(
        &self,
        request_id: u32,
        address: &str,
        characteristic: Uuid,
        descriptor: Uuid,
    ) {
        debug!("read request for descriptor <{}>", descriptor);
        let central = self.resolve(address);
        let Some(service) = self.service_for_characteristic(characteristic) else {
            self.transport
                .respond(address, request_id, GattStatus::RequestNotSupported, &[]);
            return;
        };
        service.on_descriptor_read(&central, characteristic, descriptor);
        let value = self
            .manager
            .attributes()
            .descriptor_value(characteristic, descriptor);
        self.transport
            .respond(address, request_id, GattStatus::Success, &value);
    }

    fn handle_descriptor_write(
        &self,
        request_id: u32,
        address: &str,
        characteristic: Uuid,
        descriptor: Uuid,
        value: &[u8],
        response_needed: bool,
    ) {
        let central = self.resolve(address);
        let Some(service) = self.service_for_characteristic(characteristic) else {
            warn!("descriptor write for unmapped characteristic <{}>", characteristic);
            if response_needed {
                self.transport
                    .respond(address, request_id, GattStatus::RequestNotSupported, &[]);
            }
            return;
        };

        if descriptor == uuids::CCC_DESCRIPTOR_UUID {
            self.handle_ccc_write(
                request_id,
                &central,
                &service,
                characteristic,
                value,
                response_needed,
            );
            return;
        }

        debug!("write request for descriptor <{}>", descriptor);
        let status = service.on_descriptor_write(&central, characteristic, descriptor, value);
        if status.is_success() {
            self.manager
                .attributes()
                .set_descriptor_value(characteristic, descriptor, value.to_vec());
        }
        if response_needed {
            self.transport.respond(&central.address, request_id, status, &[]);
        }
    }

    /// Apply a CCC descriptor write: validate, authorize, commit, then
    /// fire the enable/disable transition. The stored value is updated
    /// only after authorization succeeds, and the service hook fires only
    /// after the value is committed.
    fn handle_ccc_write(
        &self,
        request_id: u32,
        central: &Central,
        service: &Arc<dyn Service>,
        characteristic: Uuid,
        value: &[u8],
        response_needed: bool,
    ) {
        let mut status = match self.manager.attributes().characteristic(characteristic) {
            Some(def) => check_ccc_value(value, &def.properties),
            None => GattStatus::RequestNotSupported,
        };

        if status.is_success() {
            status =
                service.on_descriptor_write(central, characteristic, uuids::CCC_DESCRIPTOR_UUID, value);
        }

        let mut committed = None;
        if status.is_success() {
            // from_ccc cannot fail here: check_ccc_value accepted the value.
            if let Some(state) = SubscriptionState::from_ccc(value) {
                self.manager.attributes().set_descriptor_value(
                    characteristic,
                    uuids::CCC_DESCRIPTOR_UUID,
                    value.to_vec(),
                );
                self.manager
                    .subscriptions()
                    .set(&central.address, characteristic, state);
                committed = Some(state);
            }
        }

        if response_needed {
            self.transport
                .respond(&central.address, request_id, status, &[]);
        }

        match committed {
            Some(state) if state.is_active() => {
                info!("notifying enabled for <{}>", characteristic);
                service.on_notifying_enabled(central, characteristic);
            }
            Some(_) => {
                info!("notifying disabled for <{}>", characteristic);
                service.on_notifying_disabled(central, characteristic);
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatt::attributes::{
        CharacteristicDef, CharacteristicProperties, DescriptorDef, ServiceDef,
    };
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestTransport {
        responses: Mutex<Vec<(u32, GattStatus, Vec<u8>)>>,
        notified: Mutex<Vec<Vec<u8>>>,
    }

    impl TestTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(Vec::new()),
                notified: Mutex::new(Vec::new()),
            })
        }

        fn last_response(&self) -> (u32, GattStatus, Vec<u8>) {
            self.responses.lock().last().cloned().expect("no response sent")
        }
    }

    impl GattTransport for TestTransport {
        fn add_service(&self, _service: &ServiceDef) -> anyhow::Result<()> {
            Ok(())
        }

        fn notify(
            &self,
            _central: &str,
            _characteristic: Uuid,
            value: &[u8],
            _confirm: bool,
        ) -> anyhow::Result<()> {
            self.notified.lock().push(value.to_vec());
            Ok(())
        }

        fn respond(&self, _central: &str, request_id: u32, status: GattStatus, value: &[u8]) {
            self.responses.lock().push((request_id, status, value.to_vec()));
        }
    }

    #[derive(Default)]
    struct TestService {
        reject_writes: bool,
        enabled_count: AtomicUsize,
        disabled_count: AtomicUsize,
        disconnects: AtomicUsize,
    }

    impl Service for TestService {
        fn definition(&self) -> ServiceDef {
            ServiceDef {
                uuid: uuids::GHS_SERVICE_UUID,
                primary: true,
                characteristics: vec![
                    CharacteristicDef {
                        uuid: uuids::OBSERVATION_CHARACTERISTIC_UUID,
                        properties: CharacteristicProperties {
                            notify: true,
                            ..Default::default()
                        },
                        descriptors: vec![DescriptorDef::ccc()],
                        initial_value: vec![0x00],
                    },
                    CharacteristicDef {
                        uuid: uuids::CONTROL_POINT_CHARACTERISTIC_UUID,
                        properties: CharacteristicProperties {
                            write: true,
                            indicate: true,
                            ..Default::default()
                        },
                        descriptors: vec![DescriptorDef::ccc()],
                        initial_value: vec![0x00],
                    },
                ],
            }
        }

        fn on_characteristic_write(
            &self,
            _central: &Central,
            _characteristic: Uuid,
            _value: &[u8],
        ) -> GattStatus {
            if self.reject_writes {
                GattStatus::RequestNotSupported
            } else {
                GattStatus::Success
            }
        }

        fn on_notifying_enabled(&self, _central: &Central, _characteristic: Uuid) {
            self.enabled_count.fetch_add(1, Ordering::SeqCst);
        }

        fn on_notifying_disabled(&self, _central: &Central, _characteristic: Uuid) {
            self.disabled_count.fetch_add(1, Ordering::SeqCst);
        }

        fn on_central_disconnected(&self, _central: &Central) {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn setup(service: Arc<TestService>) -> (Arc<TestTransport>, Arc<GattServer>) {
        let transport = TestTransport::new();
        let server = GattServer::new(transport.clone());
        server.register_service(service);
        server.handle_event(TransportEvent::ServiceAdded {
            service: uuids::GHS_SERVICE_UUID,
            status: GattStatus::Success,
        });
        server.handle_event(TransportEvent::CentralConnected {
            address: "aa".to_string(),
            name: Some("watch".to_string()),
        });
        (transport, server)
    }

    fn ccc_write(value: &[u8]) -> TransportEvent {
        TransportEvent::DescriptorWriteRequest {
            request_id: 1,
            address: "aa".to_string(),
            characteristic: uuids::OBSERVATION_CHARACTERISTIC_UUID,
            descriptor: uuids::CCC_DESCRIPTOR_UUID,
            value: value.to_vec(),
            response_needed: true,
        }
    }

    #[test]
    fn test_ccc_enable_commits_and_fires_transition() {
        let service = Arc::new(TestService::default());
        let (transport, server) = setup(service.clone());

        server.handle_event(ccc_write(&uuids::ccc::ENABLE_NOTIFICATION));

        assert_eq!(transport.last_response().1, GattStatus::Success);
        assert_eq!(service.enabled_count.load(Ordering::SeqCst), 1);
        assert_eq!(
            server
                .manager()
                .subscriptions()
                .state("aa", uuids::OBSERVATION_CHARACTERISTIC_UUID),
            SubscriptionState::Notify
        );
        assert_eq!(
            server.manager().attributes().descriptor_value(
                uuids::OBSERVATION_CHARACTERISTIC_UUID,
                uuids::CCC_DESCRIPTOR_UUID
            ),
            uuids::ccc::ENABLE_NOTIFICATION.to_vec()
        );
    }

    #[test]
    fn test_ccc_write_is_idempotent_but_not_deduplicated() {
        let service = Arc::new(TestService::default());
        let (_, server) = setup(service.clone());

        server.handle_event(ccc_write(&uuids::ccc::ENABLE_NOTIFICATION));
        server.handle_event(ccc_write(&uuids::ccc::ENABLE_NOTIFICATION));
        assert_eq!(service.enabled_count.load(Ordering::SeqCst), 2);

        server.handle_event(ccc_write(&uuids::ccc::DISABLE));
        server.handle_event(ccc_write(&uuids::ccc::DISABLE));
        assert_eq!(service.disabled_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_ccc_invalid_length_leaves_state_unchanged() {
        let service = Arc::new(TestService::default());
        let (transport, server) = setup(service.clone());

        for bad in [&[0x01u8] as &[u8], &[0x01, 0x00, 0x00]] {
            server.handle_event(ccc_write(bad));
            assert_eq!(
                transport.last_response().1,
                GattStatus::InvalidAttributeValueLength
            );
        }
        assert_eq!(service.enabled_count.load(Ordering::SeqCst), 0);
        assert_eq!(
            server
                .manager()
                .subscriptions()
                .state("aa", uuids::OBSERVATION_CHARACTERISTIC_UUID),
            SubscriptionState::Disabled
        );
    }

    #[test]
    fn test_ccc_unsupported_value_rejected() {
        let service = Arc::new(TestService::default());
        let (transport, server) = setup(service);

        server.handle_event(ccc_write(&[0x07, 0x00]));
        assert_eq!(transport.last_response().1, GattStatus::RequestNotSupported);

        // Indicate on the notify-only observation characteristic.
        server.handle_event(ccc_write(&uuids::ccc::ENABLE_INDICATION));
        assert_eq!(transport.last_response().1, GattStatus::RequestNotSupported);
    }

    #[test]
    fn test_read_always_succeeds_with_stored_value() {
        let service = Arc::new(TestService::default());
        let (transport, server) = setup(service);

        server.handle_event(TransportEvent::ReadRequest {
            request_id: 9,
            address: "aa".to_string(),
            characteristic: uuids::OBSERVATION_CHARACTERISTIC_UUID,
            offset: 0,
        });

        let (request_id, status, value) = transport.last_response();
        assert_eq!(request_id, 9);
        assert_eq!(status, GattStatus::Success);
        assert_eq!(value, vec![0x00]);
    }

    #[test]
    fn test_read_unmapped_characteristic_is_unsupported() {
        let service = Arc::new(TestService::default());
        let (transport, server) = setup(service);

        server.handle_event(TransportEvent::ReadRequest {
            request_id: 2,
            address: "aa".to_string(),
            characteristic: uuids::CURRENT_TIME_CHARACTERISTIC_UUID,
            offset: 0,
        });
        assert_eq!(transport.last_response().1, GattStatus::RequestNotSupported);
    }

    #[test]
    fn test_write_commits_only_on_authorized_status() {
        let accepting = Arc::new(TestService::default());
        let (transport, server) = setup(accepting);

        server.handle_event(TransportEvent::WriteRequest {
            request_id: 3,
            address: "aa".to_string(),
            characteristic: uuids::CONTROL_POINT_CHARACTERISTIC_UUID,
            value: vec![0x01, 0x02],
            response_needed: true,
        });
        assert_eq!(transport.last_response().1, GattStatus::Success);
        assert_eq!(
            server
                .manager()
                .attributes()
                .characteristic_value(uuids::CONTROL_POINT_CHARACTERISTIC_UUID),
            vec![0x01, 0x02]
        );

        let rejecting = Arc::new(TestService {
            reject_writes: true,
            ..Default::default()
        });
        let (transport, server) = setup(rejecting);
        server.handle_event(TransportEvent::WriteRequest {
            request_id: 4,
            address: "aa".to_string(),
            characteristic: uuids::CONTROL_POINT_CHARACTERISTIC_UUID,
            value: vec![0xBA, 0xD0],
            response_needed: true,
        });
        assert_eq!(transport.last_response().1, GattStatus::RequestNotSupported);
        assert_eq!(
            server
                .manager()
                .attributes()
                .characteristic_value(uuids::CONTROL_POINT_CHARACTERISTIC_UUID),
            vec![0x00]
        );
    }

    #[test]
    fn test_disconnect_clears_registry_and_subscriptions() {
        let service = Arc::new(TestService::default());
        let (_, server) = setup(service.clone());

        server.handle_event(ccc_write(&uuids::ccc::ENABLE_NOTIFICATION));
        server.handle_event(TransportEvent::CentralDisconnected {
            address: "aa".to_string(),
        });
        // A second disconnect for the same address is ignored.
        server.handle_event(TransportEvent::CentralDisconnected {
            address: "aa".to_string(),
        });

        assert_eq!(service.disconnects.load(Ordering::SeqCst), 1);
        assert_eq!(server.manager().connected_count(), 0);
        assert_eq!(
            server
                .manager()
                .subscriptions()
                .state("aa", uuids::OBSERVATION_CHARACTERISTIC_UUID),
            SubscriptionState::Disabled
        );
    }

    #[test]
    fn test_completion_events_advance_queue() {
        let service = Arc::new(TestService::default());
        let (transport, server) = setup(service);
        server.handle_event(ccc_write(&uuids::ccc::ENABLE_NOTIFICATION));

        let manager = server.manager();
        manager.notify_characteristic_changed(&[0x01], uuids::OBSERVATION_CHARACTERISTIC_UUID);
        manager.notify_characteristic_changed(&[0x02], uuids::OBSERVATION_CHARACTERISTIC_UUID);
        assert_eq!(transport.notified.lock().len(), 1);

        server.handle_event(TransportEvent::NotificationSent {
            address: "aa".to_string(),
            status: GattStatus::Success,
        });
        assert_eq!(transport.notified.lock().len(), 2);

        server.handle_event(TransportEvent::NotificationSent {
            address: "aa".to_string(),
            status: GattStatus::Success,
        });
        assert!(manager.queue().is_empty());
        assert!(!manager.queue().is_busy());
    }

    #[test]
    fn test_mtu_change_updates_registry() {
        let service = Arc::new(TestService::default());
        let (_, server) = setup(service);
        server.handle_event(TransportEvent::MtuChanged {
            address: "aa".to_string(),
            mtu: 185,
        });
        assert_eq!(server.manager().minimal_mtu(), 185);
    }
}
