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

//! ATT status codes returned to remote centrals.
//!
//! These are surfaced synchronously on the response path, never raised
//! as Rust errors.

/// Status of a GATT request, as seen by the remote peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GattStatus {
    Success = 0x00,
    RequestNotSupported = 0x06,
    InvalidOffset = 0x07,
    InvalidAttributeValueLength = 0x0D,
    Failure = 0x80,
}

impl GattStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, GattStatus::Success)
    }

    pub fn value(&self) -> u8 {
        *self as u8
    }
}
