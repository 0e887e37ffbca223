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

//! Binary TLV records: code (u32) + length (u16) + value, all big-endian.

use anyhow::{bail, Result};

/// Bytes taken by the code and length fields of every record.
pub const RECORD_OVERHEAD: usize = 6;

/// One type-length-value field of an observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryRecord {
    pub code: u32,
    pub value: Vec<u8>,
}

impl BinaryRecord {
    pub fn new(code: u32, value: Vec<u8>) -> Self {
        Self { code, value }
    }

    /// Total encoded size of this record.
    pub fn encoded_len(&self) -> usize {
        RECORD_OVERHEAD + self.value.len()
    }

    /// Append the wire encoding of this record to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.code.to_be_bytes());
        buf.extend_from_slice(&(self.value.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.value);
    }

    /// Decode one record from the front of `bytes`.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn decode(bytes: &[u8]) -> Result<(BinaryRecord, usize)> {
        if bytes.len() < RECORD_OVERHEAD {
            bail!(
                "record truncated: {} bytes, need at least {}",
                bytes.len(),
                RECORD_OVERHEAD
            );
        }
        let code = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let length = u16::from_be_bytes([bytes[4], bytes[5]]) as usize;
        let end = RECORD_OVERHEAD + length;
        if bytes.len() < end {
            bail!("record value truncated: need {} bytes, have {}", end, bytes.len());
        }
        let value = bytes[RECORD_OVERHEAD..end].to_vec();
        Ok((BinaryRecord { code, value }, end))
    }
}
