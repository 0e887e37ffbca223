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

//! Segmentation of observation payloads into MTU-sized notification packets.

/// Size of the segment header in bytes.
pub const SEGMENT_HEADER_LEN: usize = 1;

/// Largest segment number that fits the 6-bit header field.
/// Numbers past this wrap around; reassemblers on the other side
/// share this limitation.
pub const MAX_SEGMENT_NUMBER: u8 = 63;

mod header {
    pub const FIRST: u8 = 0x01;
    pub const LAST: u8 = 0x02;
    pub const NUMBER_SHIFT: u8 = 2;
}

/// One framing unit of the segmentation protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    number: u8,
    first: bool,
    last: bool,
    body: Vec<u8>,
}

impl Segment {
    /// The 1-based segment number (wrapped to 6 bits).
    pub fn number(&self) -> u8 {
        self.number
    }

    /// Whether this is the first segment of the payload.
    pub fn is_first(&self) -> bool {
        self.first
    }

    /// Whether this is the last segment of the payload.
    pub fn is_last(&self) -> bool {
        self.last
    }

    /// The payload bytes carried by this segment (header excluded).
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Encode the 1-byte segment header.
    ///
    /// Bits [7:2] carry the segment number, bit 1 the last flag and
    /// bit 0 the first flag. A single-segment payload sets both flags.
    pub fn header(&self) -> u8 {
        let mut byte = (self.number & MAX_SEGMENT_NUMBER) << header::NUMBER_SHIFT;
        if self.first {
            byte |= header::FIRST;
        }
        if self.last {
            byte |= header::LAST;
        }
        byte
    }

    /// Serialize the segment as it goes onto the wire: header then body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(SEGMENT_HEADER_LEN + self.body.len());
        bytes.push(self.header());
        bytes.extend_from_slice(&self.body);
        bytes
    }

    /// Parse a wire packet back into a segment.
    ///
    /// Sender-side verification helper; the remote reassembler is out of
    /// scope and has its own implementation of this format.
    pub fn parse(bytes: &[u8]) -> Option<Segment> {
        let (&head, body) = bytes.split_first()?;
        Some(Segment {
            number: head >> header::NUMBER_SHIFT,
            first: head & header::FIRST != 0,
            last: head & header::LAST != 0,
            body: body.to_vec(),
        })
    }
}

/// Split `payload` into segments of at most `unit_size` body bytes each.
///
/// The returned iterator is lazy, finite and one-shot; re-segmenting
/// requires a fresh call. A zero-length payload yields exactly one
/// segment carrying only the header.
///
/// # Panics
///
/// Panics if `unit_size` is zero.
pub fn segment(payload: &[u8], unit_size: usize) -> Segments<'_> {
    assert!(unit_size > 0, "segment unit size must be positive");
    Segments {
        payload,
        unit_size,
        total: payload.len().div_ceil(unit_size).max(1),
        index: 0,
    }
}

/// Iterator over the segments of one payload. Created by [`segment`].
pub struct Segments<'a> {
    payload: &'a [u8],
    unit_size: usize,
    total: usize,
    index: usize,
}

impl Iterator for Segments<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        if self.index >= self.total {
            return None;
        }
        let start = self.index * self.unit_size;
        let end = (start + self.unit_size).min(self.payload.len());
        // 1-based, wrapping past 63 like the header field itself.
        let number = ((self.index + 1) & MAX_SEGMENT_NUMBER as usize) as u8;
        let segment = Segment {
            number,
            first: self.index == 0,
            last: self.index == self.total - 1,
            body: self.payload[start..end].to_vec(),
        };
        self.index += 1;
        Some(segment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Segments<'_> {}
