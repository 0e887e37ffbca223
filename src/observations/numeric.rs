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

//! Simple numeric observations and their wire encoding.
//!
//! An observation serializes to a fixed, ordered sequence of TLV records:
//! handle, type, value, unit, timestamp. The order is a wire contract;
//! remote decoders depend on it.

use anyhow::{bail, Result};
use std::time::{SystemTime, UNIX_EPOCH};

use super::records::BinaryRecord;
use super::types::{ObservationType, UnitCode};

const HANDLE_CODE: u32 = 0x0001_0921;
const TYPE_CODE: u32 = 0x0001_092F;
const VALUE_CODE: u32 = 0x0001_0A56;
const UNIT_CODE: u32 = 0x0001_0996;
const TIMESTAMP_CODE: u32 = 0x0001_0990;

/// One numeric measurement, immutable once serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleNumericObservation {
    /// Handle identifying this observation stream.
    pub id: u16,
    pub observation_type: ObservationType,
    /// Measured value; encoded fixed-point with `precision` fractional digits.
    pub value: f32,
    pub precision: u8,
    pub unit: UnitCode,
    /// Absolute timestamp, milliseconds since the Unix epoch.
    pub timestamp_millis: u64,
}

impl SimpleNumericObservation {
    pub fn new(
        id: u16,
        observation_type: ObservationType,
        value: f32,
        precision: u8,
        unit: UnitCode,
        timestamp_millis: u64,
    ) -> Self {
        Self {
            id,
            observation_type,
            value,
            precision,
            unit,
            timestamp_millis,
        }
    }

    /// Current time in epoch milliseconds, for freshly built observations.
    pub fn now_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn records(&self) -> [BinaryRecord; 5] {
        [
            BinaryRecord::new(HANDLE_CODE, self.id.to_be_bytes().to_vec()),
            BinaryRecord::new(TYPE_CODE, self.observation_type.code().to_be_bytes().to_vec()),
            BinaryRecord::new(
                VALUE_CODE,
                encode_float(self.value, self.precision).to_vec(),
            ),
            BinaryRecord::new(UNIT_CODE, self.unit.code().to_be_bytes().to_vec()),
            BinaryRecord::new(TIMESTAMP_CODE, self.timestamp_millis.to_be_bytes().to_vec()),
        ]
    }

    /// Serialize to the wire format handed to the segmenter.
    pub fn serialize(&self) -> Vec<u8> {
        let records = self.records();
        let mut bytes = Vec::with_capacity(records.iter().map(BinaryRecord::encoded_len).sum());
        for record in &records {
            record.encode_into(&mut bytes);
        }
        bytes
    }

    /// Parse an observation back from its wire encoding.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let mut offset = 0;
        let mut next = |expected_code: u32, expected_len: usize| -> Result<Vec<u8>> {
            let (record, consumed) = BinaryRecord::decode(&bytes[offset..])?;
            offset += consumed;
            if record.code != expected_code {
                bail!(
                    "expected record code {:#010X} but got {:#010X}",
                    expected_code,
                    record.code
                );
            }
            if record.value.len() != expected_len {
                bail!(
                    "record {:#010X}: expected {} value bytes, got {}",
                    expected_code,
                    expected_len,
                    record.value.len()
                );
            }
            Ok(record.value)
        };

        let handle = next(HANDLE_CODE, 2)?;
        let id = u16::from_be_bytes([handle[0], handle[1]]);

        let type_value = next(TYPE_CODE, 4)?;
        let type_code = u32::from_be_bytes([type_value[0], type_value[1], type_value[2], type_value[3]]);
        let observation_type = match ObservationType::from_code(type_code) {
            Some(ty) => ty,
            None => bail!("unknown observation type code {:#010X}", type_code),
        };

        let value_bytes = next(VALUE_CODE, 4)?;
        let (value, precision) =
            decode_float([value_bytes[0], value_bytes[1], value_bytes[2], value_bytes[3]]);

        let unit_value = next(UNIT_CODE, 4)?;
        let unit_code = u32::from_be_bytes([unit_value[0], unit_value[1], unit_value[2], unit_value[3]]);
        let unit = match UnitCode::from_code(unit_code) {
            Some(unit) => unit,
            None => bail!("unknown unit code {:#010X}", unit_code),
        };

        let ts = next(TIMESTAMP_CODE, 8)?;
        let timestamp_millis =
            u64::from_be_bytes([ts[0], ts[1], ts[2], ts[3], ts[4], ts[5], ts[6], ts[7]]);

        Ok(Self {
            id,
            observation_type,
            value,
            precision,
            unit,
            timestamp_millis,
        })
    }
}

/// Encode a value as a 32-bit medical-device FLOAT: one exponent byte
/// (base 10, here always `-precision`) followed by a 24-bit big-endian
/// mantissa.
fn encode_float(value: f32, precision: u8) -> [u8; 4] {
    let mantissa = (value as f64 * 10f64.powi(precision as i32)).round() as i32;
    let exponent = -(precision as i32) as i8;
    [
        exponent as u8,
        (mantissa >> 16) as u8,
        (mantissa >> 8) as u8,
        mantissa as u8,
    ]
}

/// Decode a 32-bit FLOAT back into (value, precision).
fn decode_float(bytes: [u8; 4]) -> (f32, u8) {
    let exponent = bytes[0] as i8;
    // Sign-extend the 24-bit mantissa.
    let mantissa = (i32::from_be_bytes([0, bytes[1], bytes[2], bytes[3]]) << 8) >> 8;
    let value = (mantissa as f64 * 10f64.powi(exponent as i32)) as f32;
    (value, exponent.unsigned_abs())
}
