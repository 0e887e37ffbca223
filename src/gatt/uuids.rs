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

//! Service, characteristic and descriptor UUIDs plus protocol constants.

use uuid::Uuid;

/// Generic Health Sensor service UUID.
pub const GHS_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000183D_0000_1000_8000_00805f9b34fb);

/// Observation characteristic UUID (segmented observation notifications).
/// Properties: Notify
pub const OBSERVATION_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x00002AC4_0000_1000_8000_00805f9b34fb);

/// Control point characteristic UUID.
/// Properties: Write, Indicate
pub const CONTROL_POINT_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x00002AC6_0000_1000_8000_00805f9b34fb);

/// Current Time service UUID.
pub const CURRENT_TIME_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x00001805_0000_1000_8000_00805f9b34fb);

/// Current Time characteristic UUID.
/// Properties: Read, Notify
pub const CURRENT_TIME_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x00002A2B_0000_1000_8000_00805f9b34fb);

/// Device Information service UUID.
pub const DEVICE_INFORMATION_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x0000180A_0000_1000_8000_00805f9b34fb);

/// Manufacturer Name String characteristic UUID. Properties: Read
pub const MANUFACTURER_NAME_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x00002A29_0000_1000_8000_00805f9b34fb);

/// Model Number String characteristic UUID. Properties: Read
pub const MODEL_NUMBER_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x00002A24_0000_1000_8000_00805f9b34fb);

/// Client Characteristic Configuration descriptor UUID.
pub const CCC_DESCRIPTOR_UUID: Uuid = Uuid::from_u128(0x00002902_0000_1000_8000_00805f9b34fb);

/// Characteristic User Description descriptor UUID.
pub const CUD_DESCRIPTOR_UUID: Uuid = Uuid::from_u128(0x00002901_0000_1000_8000_00805f9b34fb);

/// The three canonical CCC descriptor values. Everything else is rejected.
pub mod ccc {
    pub const DISABLE: [u8; 2] = [0x00, 0x00];
    pub const ENABLE_NOTIFICATION: [u8; 2] = [0x01, 0x00];
    pub const ENABLE_INDICATION: [u8; 2] = [0x02, 0x00];
}

/// Protocol configuration constants.
pub mod config {
    /// Default ATT MTU, the minimum every BLE link starts with.
    pub const DEFAULT_MTU: usize = 23;

    /// Bytes reserved per notification for the segment header and ATT
    /// overhead in the observation delivery path.
    pub const SEGMENT_OVERHEAD: usize = 4;

    /// Maximum payload bytes per segment for a given negotiated MTU.
    pub fn segment_unit_size(mtu: usize) -> usize {
        mtu.saturating_sub(SEGMENT_OVERHEAD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_format() {
        assert_eq!(
            GHS_SERVICE_UUID.to_string().to_lowercase(),
            "0000183d-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            CCC_DESCRIPTOR_UUID.to_string().to_lowercase(),
            "00002902-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_segment_unit_size() {
        assert_eq!(config::segment_unit_size(23), 19);
        assert_eq!(config::segment_unit_size(185), 181);
        assert_eq!(config::segment_unit_size(3), 0);
    }
}
