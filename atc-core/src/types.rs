//! Shared types, error enum, diagnostics, and the decoded flight record.

use serde::Serialize;
use thiserror::Error;

use crate::validate::Rejection;

/// All errors produced by atc-core.
#[derive(Debug, Error)]
pub enum AtcError {
    #[error("stream desynchronized: {buffered} bytes buffered, cap is {cap}")]
    Desync { buffered: usize, cap: usize },
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    #[error("invalid frame length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("catalog error: {0}")]
    Catalog(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AtcError>;

// ---------------------------------------------------------------------------
// Flight record
// ---------------------------------------------------------------------------

/// One radar contact as carried by a wire frame. Immutable once decoded.
///
/// Coordinates travel as a raw integer plus a divisor; use [`latitude`] and
/// [`longitude`] for degrees.
///
/// [`latitude`]: FlightRecord::latitude
/// [`longitude`]: FlightRecord::longitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FlightRecord {
    pub type_id: u8,
    pub src_airport_id: u8,
    pub dst_airport_id: u8,
    pub latitude_raw: u32,
    pub latitude_factor: u16,
    pub longitude_raw: u32,
    pub longitude_factor: u16,
    /// Altitude in feed units (the feed does not declare meters vs feet).
    pub altitude: u32,
    pub flight_id: u32,
}

impl FlightRecord {
    /// Latitude in degrees, 0.0 when the factor is zero.
    pub fn latitude(&self) -> f64 {
        scaled(self.latitude_raw, self.latitude_factor)
    }

    /// Longitude in degrees, 0.0 when the factor is zero.
    pub fn longitude(&self) -> f64 {
        scaled(self.longitude_raw, self.longitude_factor)
    }

    /// `(lat, lon)` in degrees.
    pub fn position(&self) -> (f64, f64) {
        (self.latitude(), self.longitude())
    }
}

impl Default for FlightRecord {
    fn default() -> Self {
        FlightRecord {
            type_id: 0,
            src_airport_id: 0,
            dst_airport_id: 0,
            latitude_raw: 0,
            latitude_factor: 1,
            longitude_raw: 0,
            longitude_factor: 1,
            altitude: 0,
            flight_id: 0,
        }
    }
}

fn scaled(raw: u32, factor: u16) -> f64 {
    if factor == 0 {
        0.0
    } else {
        raw as f64 / factor as f64
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Recoverable conditions observed while framing or tracking.
///
/// These never surface as errors; they are returned next to the normal
/// result and logged, so callers can count or assert on them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Bytes dropped because no header sentinel was present.
    BytesDiscarded { count: usize },
    /// Header found but the footer did not match; the scan moved one byte past it.
    MalformedFrame { offset: usize },
    /// Frame decoded but failed validation.
    InvalidRecord { flight_id: u32, rejection: Rejection },
    /// Update implied an impossible speed and was not applied.
    Teleport {
        flight_id: u32,
        dt_secs: f64,
        distance_m: f64,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::BytesDiscarded { count } => write!(f, "discarded {count} bytes without header"),
            Diagnostic::MalformedFrame { offset } => {
                write!(f, "footer mismatch for header at offset {offset}")
            }
            Diagnostic::InvalidRecord {
                flight_id,
                rejection,
            } => write!(f, "invalid record {flight_id}: {rejection}"),
            Diagnostic::Teleport {
                flight_id,
                dt_secs,
                distance_m,
            } => write!(
                f,
                "dropped teleport for {flight_id}: {distance_m:.0} m in {dt_secs:.3} s"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Hex utilities
// ---------------------------------------------------------------------------

/// Decode a hex string into bytes. Case-insensitive, must be even length.
pub fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if !hex.len().is_multiple_of(2) {
        return None;
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for chunk in hex.as_bytes().chunks(2) {
        let high = hex_digit(chunk[0])?;
        let low = hex_digit(chunk[1])?;
        bytes.push((high << 4) | low);
    }
    Some(bytes)
}

/// Encode bytes as uppercase hex string.
pub fn hex_encode(data: &[u8]) -> String {
    let mut s = String::with_capacity(data.len() * 2);
    for &b in data {
        s.push(HEX_CHARS[(b >> 4) as usize] as char);
        s.push(HEX_CHARS[(b & 0x0F) as usize] as char);
    }
    s
}

const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
