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

//! Device Information service (0x180A): static read-only strings.

use crate::gatt::{CharacteristicDef, CharacteristicProperties, ServiceDef};
use crate::gatt::uuids;
use crate::service::Service;

pub struct DeviceInformationService {
    manufacturer: String,
    model: String,
}

impl DeviceInformationService {
    pub fn new(manufacturer: impl Into<String>, model: impl Into<String>) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            manufacturer: manufacturer.into(),
            model: model.into(),
        })
    }
}

impl Service for DeviceInformationService {
    fn definition(&self) -> ServiceDef {
        let read_only = CharacteristicProperties {
            read: true,
            ..Default::default()
        };
        ServiceDef {
            uuid: uuids::DEVICE_INFORMATION_SERVICE_UUID,
            primary: true,
            characteristics: vec![
                CharacteristicDef {
                    uuid: uuids::MANUFACTURER_NAME_CHARACTERISTIC_UUID,
                    properties: read_only,
                    descriptors: Vec::new(),
                    initial_value: self.manufacturer.as_bytes().to_vec(),
                },
                CharacteristicDef {
                    uuid: uuids::MODEL_NUMBER_CHARACTERISTIC_UUID,
                    properties: read_only,
                    descriptors: Vec::new(),
                    initial_value: self.model.as_bytes().to_vec(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_carries_strings() {
        let service = DeviceInformationService::new("Acme Medical", "GHS-1");
        let def = service.definition();
        let manufacturer = def
            .characteristic(uuids::MANUFACTURER_NAME_CHARACTERISTIC_UUID)
            .unwrap();
        assert_eq!(manufacturer.initial_value, b"Acme Medical".to_vec());
        assert!(manufacturer.properties.read);
        assert!(manufacturer.properties.does_not_support_notifying());
        let model = def
            .characteristic(uuids::MODEL_NUMBER_CHARACTERISTIC_UUID)
            .unwrap();
        assert_eq!(model.initial_value, b"GHS-1".to_vec());
    }
}
