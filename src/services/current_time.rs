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

//! Current Time service (0x1805).

use chrono::{DateTime, Datelike, Local, Timelike};
use std::sync::Arc;
use uuid::Uuid;

use crate::gatt::{
    Central, CharacteristicDef, CharacteristicProperties, DescriptorDef, PeripheralManager,
    ServiceDef,
};
use crate::gatt::uuids;
use crate::service::Service;

pub struct CurrentTimeService {
    manager: Arc<PeripheralManager>,
}

impl CurrentTimeService {
    pub fn new(manager: Arc<PeripheralManager>) -> Arc<Self> {
        Arc::new(Self { manager })
    }
}

impl Service for CurrentTimeService {
    fn definition(&self) -> ServiceDef {
        ServiceDef {
            uuid: uuids::CURRENT_TIME_SERVICE_UUID,
            primary: true,
            characteristics: vec![CharacteristicDef {
                uuid: uuids::CURRENT_TIME_CHARACTERISTIC_UUID,
                properties: CharacteristicProperties {
                    read: true,
                    notify: true,
                    ..Default::default()
                },
                descriptors: vec![DescriptorDef::ccc()],
                initial_value: encode_current_time(&Local::now()).to_vec(),
            }],
        }
    }

    /// Refresh the stored value so the router's response carries the
    /// time of the read, not of service registration.
    fn on_characteristic_read(&self, _central: &Central, characteristic: Uuid) {
        if characteristic == uuids::CURRENT_TIME_CHARACTERISTIC_UUID {
            self.manager.attributes().set_characteristic_value(
                characteristic,
                encode_current_time(&Local::now()).to_vec(),
            );
        }
    }

    fn on_notifying_enabled(&self, _central: &Central, characteristic: Uuid) {
        if characteristic == uuids::CURRENT_TIME_CHARACTERISTIC_UUID {
            self.manager.notify_characteristic_changed(
                &encode_current_time(&Local::now()),
                characteristic,
            );
        }
    }
}

/// BLE Current Time characteristic layout: year (u16 LE), month, day,
/// hours, minutes, seconds, day-of-week (1 = Monday), 1/256 fractions,
/// adjust reason.
fn encode_current_time(time: &DateTime<Local>) -> [u8; 10] {
    let year = time.year() as u16;
    let fractions = (u64::from(time.nanosecond()) * 256 / 1_000_000_000) as u8;
    [
        (year & 0xFF) as u8,
        (year >> 8) as u8,
        time.month() as u8,
        time.day() as u8,
        time.hour() as u8,
        time.minute() as u8,
        time.second() as u8,
        time.weekday().number_from_monday() as u8,
        fractions,
        0x00,
    ]
}
