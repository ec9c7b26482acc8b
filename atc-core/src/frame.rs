//! Fixed-format radar contact frames.
//!
//! Layout (39 bytes, little-endian integers):
//!
//! ```text
//! offset  size  field
//! 0       4     header sentinel A5 A5 A5 A5
//! 4       1     type_id
//! 5       1     src_airport_id
//! 6       1     dst_airport_id
//! 7       4     latitude_raw      (u32)
//! 11      2     latitude_factor   (u16)
//! 13      4     longitude_raw     (u32)
//! 17      2     longitude_factor  (u16)
//! 19      4     altitude          (u32)
//! 23      4     flight_id         (u32)
//! 27      8     reserved
//! 35      4     footer sentinel 55 55 55 55
//! ```
//!
//! Decoding is pure field extraction and never fails on a correctly sized
//! block. Header and footer checks belong to the framer.

use crate::types::{hex_decode, hex_encode, AtcError, FlightRecord, Result};

pub const FRAME_LEN: usize = 39;

pub const HEADER: [u8; 4] = [0xA5; 4];
pub const FOOTER: [u8; 4] = [0x55; 4];

pub const FOOTER_OFFSET: usize = 35;

const TYPE_ID: usize = 4;
const SRC_AIRPORT: usize = 5;
const DST_AIRPORT: usize = 6;
const LAT_RAW: usize = 7;
const LAT_FACTOR: usize = 11;
const LON_RAW: usize = 13;
const LON_FACTOR: usize = 17;
const ALTITUDE: usize = 19;
const FLIGHT_ID: usize = 23;

/// A decoded block: the candidate record and whether the footer matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame {
    pub record: FlightRecord,
    pub footer_ok: bool,
}

pub fn has_footer(block: &[u8; FRAME_LEN]) -> bool {
    block[FOOTER_OFFSET..] == FOOTER
}

/// Extract all fields from a frame-sized block.
pub fn decode_frame(block: &[u8; FRAME_LEN]) -> DecodedFrame {
    let record = FlightRecord {
        type_id: block[TYPE_ID],
        src_airport_id: block[SRC_AIRPORT],
        dst_airport_id: block[DST_AIRPORT],
        latitude_raw: read_u32(block, LAT_RAW),
        latitude_factor: read_u16(block, LAT_FACTOR),
        longitude_raw: read_u32(block, LON_RAW),
        longitude_factor: read_u16(block, LON_FACTOR),
        altitude: read_u32(block, ALTITUDE),
        flight_id: read_u32(block, FLIGHT_ID),
    };
    DecodedFrame {
        record,
        footer_ok: has_footer(block),
    }
}

/// Build a wire frame for a record. Reserved bytes are zero.
pub fn encode_frame(record: &FlightRecord) -> [u8; FRAME_LEN] {
    let mut block = [0u8; FRAME_LEN];
    block[..4].copy_from_slice(&HEADER);
    block[TYPE_ID] = record.type_id;
    block[SRC_AIRPORT] = record.src_airport_id;
    block[DST_AIRPORT] = record.dst_airport_id;
    block[LAT_RAW..LAT_RAW + 4].copy_from_slice(&record.latitude_raw.to_le_bytes());
    block[LAT_FACTOR..LAT_FACTOR + 2].copy_from_slice(&record.latitude_factor.to_le_bytes());
    block[LON_RAW..LON_RAW + 4].copy_from_slice(&record.longitude_raw.to_le_bytes());
    block[LON_FACTOR..LON_FACTOR + 2].copy_from_slice(&record.longitude_factor.to_le_bytes());
    block[ALTITUDE..ALTITUDE + 4].copy_from_slice(&record.altitude.to_le_bytes());
    block[FLIGHT_ID..FLIGHT_ID + 4].copy_from_slice(&record.flight_id.to_le_bytes());
    block[FOOTER_OFFSET..].copy_from_slice(&FOOTER);
    block
}

/// Parse a 78-character hex line into a frame block.
pub fn frame_from_hex(hex: &str) -> Result<[u8; FRAME_LEN]> {
    let bytes = hex_decode(hex).ok_or_else(|| AtcError::InvalidHex(hex.trim().to_string()))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| AtcError::InvalidLength {
        expected: FRAME_LEN,
        actual: len,
    })
}

pub fn frame_to_hex(block: &[u8; FRAME_LEN]) -> String {
    hex_encode(block)
}

/// Parse one line of a hex capture file.
///
/// Blank lines and `#` comments yield `None`. Whitespace between digits is
/// ignored, so space-separated byte dumps are accepted.
pub fn parse_hex_line(line: &str) -> Option<Result<[u8; FRAME_LEN]>> {
    let line = match line.split_once('#') {
        Some((data, _)) => data,
        None => line,
    };
    let hex: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    if hex.is_empty() {
        return None;
    }
    Some(frame_from_hex(&hex))
}

/// Scale degrees into the raw/factor pair carried on the wire.
///
/// The wire fields are unsigned, so negative coordinates cannot be encoded;
/// this returns `None` for them and for values that overflow `u32`.
pub fn encode_degrees(deg: f64, factor: u16) -> Option<u32> {
    if factor == 0 || !deg.is_finite() || deg < 0.0 {
        return None;
    }
    let raw = (deg * factor as f64).round();
    if raw > u32::MAX as f64 {
        return None;
    }
    Some(raw as u32)
}

fn read_u32(block: &[u8; FRAME_LEN], at: usize) -> u32 {
    u32::from_le_bytes([block[at], block[at + 1], block[at + 2], block[at + 3]])
}

fn read_u16(block: &[u8; FRAME_LEN], at: usize) -> u16 {
    u16::from_le_bytes([block[at], block[at + 1]])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
