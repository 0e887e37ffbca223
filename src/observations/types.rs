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

//! Observation type and unit codes (IEEE 11073-10101 nomenclature).

use serde::{Deserialize, Serialize};

/// What an observation measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationType {
    Spo2,
    OralTemperature,
    PulseRate,
}

impl ObservationType {
    /// The nomenclature code sent on the wire.
    pub fn code(&self) -> u32 {
        match self {
            ObservationType::Spo2 => 0x0002_4BB8,
            ObservationType::OralTemperature => 0x0002_E008,
            ObservationType::PulseRate => 0x0002_481A,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0x0002_4BB8 => Some(ObservationType::Spo2),
            0x0002_E008 => Some(ObservationType::OralTemperature),
            0x0002_481A => Some(ObservationType::PulseRate),
            _ => None,
        }
    }
}

/// Unit of the measured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitCode {
    Bpm,
    Celsius,
    Mmhg,
    Percent,
}

impl UnitCode {
    /// The nomenclature code sent on the wire.
    pub fn code(&self) -> u32 {
        match self {
            UnitCode::Bpm => 0x0004_0AA0,
            UnitCode::Celsius => 0x0004_17A0,
            UnitCode::Mmhg => 0x0004_0F20,
            UnitCode::Percent => 0x0004_0220,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0x0004_0AA0 => Some(UnitCode::Bpm),
            0x0004_17A0 => Some(UnitCode::Celsius),
            0x0004_0F20 => Some(UnitCode::Mmhg),
            0x0004_0220 => Some(UnitCode::Percent),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for ty in [
            ObservationType::Spo2,
            ObservationType::OralTemperature,
            ObservationType::PulseRate,
        ] {
            assert_eq!(ObservationType::from_code(ty.code()), Some(ty));
        }
        for unit in [UnitCode::Bpm, UnitCode::Celsius, UnitCode::Mmhg, UnitCode::Percent] {
            assert_eq!(UnitCode::from_code(unit.code()), Some(unit));
        }
        assert_eq!(ObservationType::from_code(0), None);
        assert_eq!(UnitCode::from_code(0), None);
    }
}
