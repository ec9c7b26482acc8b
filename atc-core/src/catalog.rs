//! Static aircraft-type and airport catalogs.
//!
//! Both catalogs are keyed by the single-byte ids carried in radar frames.
//! They are built once at startup (built-in tables or a TOML file) and shared
//! read-only with the validator and the tracker.
//!
//! Catalog file layout:
//!
//! ```toml
//! [[aircraft]]
//! id = 0xa1
//! name = "Boeing 747-8"
//! class = "Commercial Airplane"
//! capacity = 660
//! range_nm = 8000
//!
//! [[airport]]
//! id = 0x1a
//! name = "Imam Khomeini"
//! country = "Iran"
//! latitude = 35.416167
//! longitude = 51.152211
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{AtcError, Result};

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Descriptor for an aircraft type id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AircraftInfo {
    pub name: String,
    pub class: String,
    pub capacity: u32,
    pub range_nm: u32,
}

/// Descriptor for an airport id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportInfo {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Read-only id → descriptor lookup.
#[derive(Debug, Clone)]
pub struct Catalog<T> {
    entries: HashMap<u8, T>,
}

impl<T> Catalog<T> {
    /// Build from `(id, entry)` pairs. Fails on a repeated id.
    pub fn from_entries(kind: &str, entries: impl IntoIterator<Item = (u8, T)>) -> Result<Self> {
        let mut map = HashMap::new();
        for (id, entry) in entries {
            if map.insert(id, entry).is_some() {
                return Err(AtcError::Catalog(format!("duplicate {kind} id 0x{id:02x}")));
            }
        }
        Ok(Catalog { entries: map })
    }

    pub fn get(&self, id: u8) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: u8) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by id.
    pub fn sorted(&self) -> Vec<(u8, &T)> {
        let mut out: Vec<_> = self.entries.iter().map(|(id, e)| (*id, e)).collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Catalog {
            entries: HashMap::new(),
        }
    }
}

/// The pair of catalogs the validator and tracker consult.
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    pub aircraft: Catalog<AircraftInfo>,
    pub airports: Catalog<AirportInfo>,
}

impl Catalogs {
    pub fn new(aircraft: Catalog<AircraftInfo>, airports: Catalog<AirportInfo>) -> Self {
        Catalogs { aircraft, airports }
    }

    /// Built-in tables for the regional radar deployment.
    pub fn builtin() -> Self {
        let aircraft = AIRCRAFT_TYPES.iter().map(|(id, name, class, capacity, range_nm)| {
            (
                *id,
                AircraftInfo {
                    name: (*name).into(),
                    class: (*class).into(),
                    capacity: *capacity,
                    range_nm: *range_nm,
                },
            )
        });
        let airports = AIRPORTS.iter().map(|(id, name, country, lat, lon)| {
            (
                *id,
                AirportInfo {
                    name: (*name).into(),
                    country: (*country).into(),
                    latitude: *lat,
                    longitude: *lon,
                },
            )
        });
        // ids in the built-in tables are unique
        Catalogs {
            aircraft: Catalog {
                entries: aircraft.collect(),
            },
            airports: Catalog {
                entries: airports.collect(),
            },
        }
    }

    /// Parse a catalog file.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(text).map_err(|e| AtcError::Catalog(e.to_string()))?;

        let aircraft = Catalog::from_entries(
            "aircraft",
            file.aircraft.into_iter().map(|e| {
                (
                    e.id,
                    AircraftInfo {
                        name: e.name,
                        class: e.class,
                        capacity: e.capacity,
                        range_nm: e.range_nm,
                    },
                )
            }),
        )?;
        let airports = Catalog::from_entries(
            "airport",
            file.airport.into_iter().map(|e| {
                (
                    e.id,
                    AirportInfo {
                        name: e.name,
                        country: e.country,
                        latitude: e.latitude,
                        longitude: e.longitude,
                    },
                )
            }),
        )?;
        Ok(Catalogs { aircraft, airports })
    }

    /// Load a catalog file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    aircraft: Vec<AircraftEntry>,
    #[serde(default)]
    airport: Vec<AirportEntry>,
}

#[derive(Deserialize)]
struct AircraftEntry {
    id: u8,
    name: String,
    class: String,
    #[serde(default)]
    capacity: u32,
    #[serde(default)]
    range_nm: u32,
}

#[derive(Deserialize)]
struct AirportEntry {
    id: u8,
    name: String,
    country: String,
    latitude: f64,
    longitude: f64,
}

// ---------------------------------------------------------------------------
// Built-in tables
// ---------------------------------------------------------------------------

const COMMERCIAL: &str = "Commercial Airplane";
const HELICOPTER: &str = "Helicopter";
const MILITARY: &str = "Military Jet";

/// (id, name, class, capacity, range_nm)
const AIRCRAFT_TYPES: &[(u8, &str, &str, u32, u32)] = &[
    (0xa1, "Boeing 747-8", COMMERCIAL, 660, 8000),
    (0xa2, "Airbus A380", COMMERCIAL, 853, 8000),
    (0xb1, "Bell 206", HELICOPTER, 6, 374),
    (0xb2, "Lockheed Martin F-35 Lightning II", MILITARY, 1, 1188),
    (0xb3, "Airbus A320neo", COMMERCIAL, 194, 4000),
    (0xb4, "Boeing 737 MAX", COMMERCIAL, 204, 3850),
    (0xb5, "Airbus A220", COMMERCIAL, 150, 3400),
    (0xb6, "Airbus A321XLR", COMMERCIAL, 220, 4700),
    (0xb7, "Boeing 787 Dreamliner", COMMERCIAL, 330, 7530),
    (0xc1, "Airbus A350", COMMERCIAL, 410, 8700),
    (0xd1, "Boeing 777", COMMERCIAL, 396, 7250),
    (0xd2, "Boeing 777X", COMMERCIAL, 426, 7285),
    (0xd5, "Airbus A380", COMMERCIAL, 615, 8000),
    (0xe1, "Robinson R44", HELICOPTER, 4, 300),
    (0xe2, "Bell 407", HELICOPTER, 7, 324),
    (0xe8, "Airbus H125", HELICOPTER, 6, 320),
    (0xf0, "Lockheed Martin F-22 Raptor", MILITARY, 1, 1600),
    (0xf1, "Chengdu J-20 Mighty Dragon", MILITARY, 1, 1100),
    (0xf2, "Sukhoi Su-57 Felon", MILITARY, 1, 2000),
    (0xf5, "Leonardo AW139", HELICOPTER, 17, 540),
];

/// (id, name, country, lat, lon)
const AIRPORTS: &[(u8, &str, &str, f64, f64)] = &[
    (0x10, "Kuwait", "Kuwait", 29.240433, 47.971028),
    (0x1a, "Imam Khomeini", "Iran", 35.416167, 51.152211),
    (0x1b, "Shahid Beheshti", "Iran", 32.750831, 51.881112),
    (0x1c, "Muscat", "Oman", 23.600678, 58.282744),
    (0x1d, "Istanbul", "Turkey", 41.276878, 28.730144),
    (0x1e, "Shiraz", "Iran", 29.539147, 52.589939),
    (0x1f, "King Fahd", "Saudi Arabia", 26.470060, 49.798450),
    (0x2b, "Erbil", "Iraq", 36.233569, 43.955458),
    (0x3a, "Dubai", "UAE", 25.251578, 55.368344),
    (0x3c, "Luxor", "Egypt", 25.669628, 32.706644),
    (0xa2, "Hamad", "Qatar", 25.269956, 51.602756),
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
