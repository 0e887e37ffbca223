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

//! Generic Health Sensor service: segmented observation notifications and
//! a periodic emitter that simulates a vital-signs source.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::gatt::{
    Central, CharacteristicDef, CharacteristicProperties, DescriptorDef, GattStatus,
    PeripheralManager, ServiceDef,
};
use crate::gatt::uuids;
use crate::observations::{ObservationType, SimpleNumericObservation, UnitCode};
use crate::service::Service;

/// What the emitter sends and how often.
#[derive(Debug, Clone)]
pub struct EmitterSettings {
    pub observation_type: ObservationType,
    pub unit: UnitCode,
    pub precision: u8,
    /// Center of the simulated value range.
    pub base_value: f32,
    /// Maximum deviation from `base_value`.
    pub spread: f32,
    pub interval: Duration,
}

impl Default for EmitterSettings {
    fn default() -> Self {
        Self {
            observation_type: ObservationType::PulseRate,
            unit: UnitCode::Bpm,
            precision: 1,
            base_value: 85.0,
            spread: 4.0,
            interval: Duration::from_secs(5),
        }
    }
}

pub struct GenericHealthSensorService {
    manager: Arc<PeripheralManager>,
    settings: EmitterSettings,
    emitter: Mutex<Option<JoinHandle<()>>>,
    next_id: Arc<AtomicU16>,
}

impl GenericHealthSensorService {
    pub fn new(manager: Arc<PeripheralManager>, settings: EmitterSettings) -> Arc<Self> {
        Arc::new(Self {
            manager,
            settings,
            emitter: Mutex::new(None),
            next_id: Arc::new(AtomicU16::new(1)),
        })
    }

    /// Serialize an observation and push it out as ordered segments.
    pub fn send_observation(&self, observation: &SimpleNumericObservation) -> bool {
        debug!(
            "sending {:?} observation #{}: {} {:?}",
            observation.observation_type, observation.id, observation.value, observation.unit
        );
        self.manager
            .send_segmented(&observation.serialize(), uuids::OBSERVATION_CHARACTERISTIC_UUID)
    }

    fn start_emitter(&self) {
        let mut emitter = self.emitter.lock();
        if emitter.is_some() {
            return;
        }
        info!(
            "starting observation emitter ({:?} every {:?})",
            self.settings.observation_type, self.settings.interval
        );

        let manager = self.manager.clone();
        let settings = self.settings.clone();
        let next_id = self.next_id.clone();
        *emitter = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(settings.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut tick: u32 = 0;
            loop {
                ticker.tick().await;
                let observation = simulated_observation(&settings, &next_id, tick);
                debug!(
                    "emitting {:?} observation #{}: {}",
                    observation.observation_type, observation.id, observation.value
                );
                manager.send_segmented(
                    &observation.serialize(),
                    uuids::OBSERVATION_CHARACTERISTIC_UUID,
                );
                tick = tick.wrapping_add(1);
            }
        }));
    }

    fn stop_emitter(&self) {
        if let Some(handle) = self.emitter.lock().take() {
            info!("stopping observation emitter");
            handle.abort();
        }
    }
}

/// Build the next simulated observation. The value walks a triangle wave
/// through `base_value ± spread` so consecutive readings differ.
fn simulated_observation(
    settings: &EmitterSettings,
    next_id: &AtomicU16,
    tick: u32,
) -> SimpleNumericObservation {
    let phase = (tick % 8) as f32;
    let offset = if phase < 4.0 { phase } else { 8.0 - phase };
    let value = settings.base_value - settings.spread + offset * settings.spread / 2.0;
    SimpleNumericObservation::new(
        next_id.fetch_add(1, Ordering::SeqCst),
        settings.observation_type,
        value,
        settings.precision,
        settings.unit,
        SimpleNumericObservation::now_millis(),
    )
}

impl Service for GenericHealthSensorService {
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
                    descriptors: vec![
                        DescriptorDef::ccc(),
                        DescriptorDef::cud("Segmented health observations"),
                    ],
                    initial_value: Vec::new(),
                },
                CharacteristicDef {
                    uuid: uuids::CONTROL_POINT_CHARACTERISTIC_UUID,
                    properties: CharacteristicProperties {
                        write: true,
                        indicate: true,
                        ..Default::default()
                    },
                    descriptors: vec![
                        DescriptorDef::ccc(),
                        DescriptorDef::cud("Observation control point"),
                    ],
                    initial_value: Vec::new(),
                },
            ],
        }
    }

    fn on_characteristic_write(
        &self,
        central: &Central,
        characteristic: Uuid,
        value: &[u8],
    ) -> GattStatus {
        if characteristic != uuids::CONTROL_POINT_CHARACTERISTIC_UUID {
            return GattStatus::RequestNotSupported;
        }
        if value.is_empty() {
            return GattStatus::InvalidAttributeValueLength;
        }
        info!(
            "control point command {:02X?} from '{}'",
            value,
            central.display_name()
        );
        GattStatus::Success
    }

    fn on_notifying_enabled(&self, _central: &Central, characteristic: Uuid) {
        if characteristic == uuids::OBSERVATION_CHARACTERISTIC_UUID {
            self.start_emitter();
        }
    }

    fn on_notifying_disabled(&self, _central: &Central, characteristic: Uuid) {
        if characteristic == uuids::OBSERVATION_CHARACTERISTIC_UUID {
            self.stop_emitter();
        }
    }

    fn on_central_disconnected(&self, _central: &Central) {
        if self.manager.connected_count() == 0 {
            self.stop_emitter();
        }
    }
}

impl Drop for GenericHealthSensorService {
    fn drop(&mut self) {
        self.stop_emitter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatt::{GattTransport, SubscriptionState};
    use crate::segmentation::Segment;

    struct CollectingTransport {
        notifications: Mutex<Vec<Vec<u8>>>,
    }

    impl CollectingTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                notifications: Mutex::new(Vec::new()),
            })
        }
    }

    impl GattTransport for CollectingTransport {
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
            self.notifications.lock().push(value.to_vec());
            Ok(())
        }

        fn respond(&self, _central: &str, _request_id: u32, _status: GattStatus, _value: &[u8]) {}
    }

    fn subscribed_manager(transport: Arc<CollectingTransport>) -> Arc<PeripheralManager> {
        let manager = Arc::new(PeripheralManager::new(transport));
        manager.registry().resolve("aa", None);
        manager.subscriptions().set(
            "aa",
            uuids::OBSERVATION_CHARACTERISTIC_UUID,
            SubscriptionState::Notify,
        );
        manager
    }

    fn reassemble(segments: &[Vec<u8>]) -> Vec<u8> {
        let mut payload = Vec::new();
        for bytes in segments {
            payload.extend_from_slice(Segment::parse(bytes).unwrap().body());
        }
        payload
    }

    #[tokio::test]
    async fn test_emitter_sends_decodable_observations() {
        let transport = CollectingTransport::new();
        let manager = subscribed_manager(transport.clone());
        let service = GenericHealthSensorService::new(
            manager.clone(),
            EmitterSettings {
                interval: Duration::from_millis(5),
                ..Default::default()
            },
        );
        manager.add_service(&service.definition());
        manager.queue().completed();

        let central = manager.registry().resolve("aa", None);
        service.on_notifying_enabled(&central, uuids::OBSERVATION_CHARACTERISTIC_UUID);

        tokio::time::sleep(Duration::from_millis(30)).await;
        while !manager.queue().is_empty() {
            manager.queue().completed();
        }
        service.stop_emitter();

        // A 52-byte observation at the default MTU splits into 3 segments.
        let notifications = transport.notifications.lock();
        assert!(notifications.len() >= 3, "emitter produced no full observation");
        let payload = reassemble(&notifications[..3]);
        let observation = SimpleNumericObservation::deserialize(&payload).unwrap();
        assert_eq!(observation.observation_type, ObservationType::PulseRate);
        assert_eq!(observation.unit, UnitCode::Bpm);
        assert_eq!(observation.id, 1);
    }

    #[tokio::test]
    async fn test_emitter_stops_when_notifying_disabled() {
        let transport = CollectingTransport::new();
        let manager = subscribed_manager(transport.clone());
        let service = GenericHealthSensorService::new(
            manager.clone(),
            EmitterSettings {
                interval: Duration::from_millis(5),
                ..Default::default()
            },
        );
        manager.add_service(&service.definition());
        manager.queue().completed();
        let central = manager.registry().resolve("aa", None);

        service.on_notifying_enabled(&central, uuids::OBSERVATION_CHARACTERISTIC_UUID);
        assert!(service.emitter.lock().is_some());
        service.on_notifying_disabled(&central, uuids::OBSERVATION_CHARACTERISTIC_UUID);
        assert!(service.emitter.lock().is_none());

        tokio::time::sleep(Duration::from_millis(20)).await;
        while !manager.queue().is_empty() {
            manager.queue().completed();
        }
        let sent = transport.notifications.lock().len();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(transport.notifications.lock().len(), sent);
    }

    #[tokio::test]
    async fn test_emitter_stops_when_last_central_disconnects() {
        let transport = CollectingTransport::new();
        let manager = subscribed_manager(transport.clone());
        let service =
            GenericHealthSensorService::new(manager.clone(), EmitterSettings::default());
        let central = manager.registry().resolve("aa", None);

        service.on_notifying_enabled(&central, uuids::OBSERVATION_CHARACTERISTIC_UUID);
        manager.registry().remove("aa");
        service.on_central_disconnected(&central);
        assert!(service.emitter.lock().is_none());
    }

    #[test]
    fn test_control_point_rejects_empty_write() {
        let transport = CollectingTransport::new();
        let manager = subscribed_manager(transport);
        let service =
            GenericHealthSensorService::new(manager.clone(), EmitterSettings::default());
        let central = manager.registry().resolve("aa", None);

        assert_eq!(
            service.on_characteristic_write(
                &central,
                uuids::CONTROL_POINT_CHARACTERISTIC_UUID,
                &[]
            ),
            GattStatus::InvalidAttributeValueLength
        );
        assert_eq!(
            service.on_characteristic_write(
                &central,
                uuids::CONTROL_POINT_CHARACTERISTIC_UUID,
                &[0x01]
            ),
            GattStatus::Success
        );
    }
}
