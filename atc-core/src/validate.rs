//! Domain validation for decoded flight records.
//!
//! Rules run in a fixed order and stop at the first failure, so the reported
//! [`Rejection`] is deterministic when several rules would fire.

use serde::Serialize;
use tracing::warn;

use crate::catalog::Catalogs;
use crate::types::FlightRecord;

pub const MAX_ALTITUDE: u32 = 60_000;

/// Which rule rejected a record, with the offending values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rejection {
    ZeroFactor {
        latitude_factor: u16,
        longitude_factor: u16,
    },
    LatitudeOutOfRange { latitude: f64 },
    LongitudeOutOfRange { longitude: f64 },
    AltitudeTooHigh { altitude: u32 },
    AltitudeZero,
    ZeroFlightId,
    UnknownType { type_id: u8 },
    UnknownSrcAirport { airport_id: u8 },
    UnknownDstAirport { airport_id: u8 },
    SameAirport { airport_id: u8 },
}

impl Rejection {
    /// Stable rule name, for counters and log fields.
    pub fn rule(&self) -> &'static str {
        match self {
            Rejection::ZeroFactor { .. } => "zero_factor",
            Rejection::LatitudeOutOfRange { .. } => "latitude_out_of_range",
            Rejection::LongitudeOutOfRange { .. } => "longitude_out_of_range",
            Rejection::AltitudeTooHigh { .. } => "altitude_too_high",
            Rejection::AltitudeZero => "altitude_zero",
            Rejection::ZeroFlightId => "zero_flight_id",
            Rejection::UnknownType { .. } => "unknown_type",
            Rejection::UnknownSrcAirport { .. } => "unknown_src_airport",
            Rejection::UnknownDstAirport { .. } => "unknown_dst_airport",
            Rejection::SameAirport { .. } => "same_airport",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::ZeroFactor {
                latitude_factor,
                longitude_factor,
            } => write!(
                f,
                "zero lat/lon factor (lat factor {latitude_factor}, lon factor {longitude_factor})"
            ),
            Rejection::LatitudeOutOfRange { latitude } => {
                write!(f, "latitude out of range ({latitude})")
            }
            Rejection::LongitudeOutOfRange { longitude } => {
                write!(f, "longitude out of range ({longitude})")
            }
            Rejection::AltitudeTooHigh { altitude } => {
                write!(f, "altitude out of range ({altitude})")
            }
            Rejection::AltitudeZero => write!(f, "altitude is 0"),
            Rejection::ZeroFlightId => write!(f, "flight id is 0"),
            Rejection::UnknownType { type_id } => write!(f, "unknown type id 0x{type_id:02x}"),
            Rejection::UnknownSrcAirport { airport_id } => {
                write!(f, "unknown source airport 0x{airport_id:02x}")
            }
            Rejection::UnknownDstAirport { airport_id } => {
                write!(f, "unknown destination airport 0x{airport_id:02x}")
            }
            Rejection::SameAirport { airport_id } => {
                write!(f, "source and destination are both 0x{airport_id:02x}")
            }
        }
    }
}

/// Check every rule, returning the first that fails.
pub fn check(rec: &FlightRecord, catalogs: &Catalogs) -> Result<(), Rejection> {
    if rec.latitude_factor == 0 || rec.longitude_factor == 0 {
        return Err(Rejection::ZeroFactor {
            latitude_factor: rec.latitude_factor,
            longitude_factor: rec.longitude_factor,
        });
    }

    let latitude = rec.latitude();
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(Rejection::LatitudeOutOfRange { latitude });
    }

    let longitude = rec.longitude();
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(Rejection::LongitudeOutOfRange { longitude });
    }

    if rec.altitude > MAX_ALTITUDE {
        return Err(Rejection::AltitudeTooHigh {
            altitude: rec.altitude,
        });
    }
    if rec.altitude == 0 {
        return Err(Rejection::AltitudeZero);
    }

    if rec.flight_id == 0 {
        return Err(Rejection::ZeroFlightId);
    }

    if !catalogs.aircraft.contains(rec.type_id) {
        return Err(Rejection::UnknownType {
            type_id: rec.type_id,
        });
    }
    if !catalogs.airports.contains(rec.src_airport_id) {
        return Err(Rejection::UnknownSrcAirport {
            airport_id: rec.src_airport_id,
        });
    }
    if !catalogs.airports.contains(rec.dst_airport_id) {
        return Err(Rejection::UnknownDstAirport {
            airport_id: rec.dst_airport_id,
        });
    }
    if rec.src_airport_id == rec.dst_airport_id {
        return Err(Rejection::SameAirport {
            airport_id: rec.src_airport_id,
        });
    }

    Ok(())
}

/// Boolean form of [`check`]; logs the failing rule.
pub fn is_valid(rec: &FlightRecord, catalogs: &Catalogs) -> bool {
    match check(rec, catalogs) {
        Ok(()) => true,
        Err(rejection) => {
            warn!(
                flight_id = rec.flight_id,
                rule = rejection.rule(),
                "invalid record: {rejection}"
            );
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
