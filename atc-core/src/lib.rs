//! atc-core: Pure decode + tracking library for radar contact feeds.
//!
//! No async, no sockets. Just framing, validation and the flight table.
//! This crate is the shared core used by both `atc-feeder` (frame encoder and
//! replay server) and `atc-tower` (feed client and CLI).

pub mod catalog;
pub mod clock;
pub mod config;
pub mod frame;
pub mod framer;
pub mod geo;
pub mod session;
pub mod tracker;
pub mod types;
pub mod validate;

// Re-export commonly used types at crate root
pub use catalog::{AircraftInfo, AirportInfo, Catalog, Catalogs};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, TrackerConfig};
pub use frame::{decode_frame, encode_frame, DecodedFrame, FRAME_LEN};
pub use framer::{FramerStats, StreamFramer};
pub use geo::{GreatCircle, Haversine};
pub use session::{IngestSummary, Session};
pub use tracker::{
    ChangeSet, FlightSnapshot, FlightTracker, TrackEvent, TrackedFlight, TrackerStats,
    UpsertOutcome,
};
pub use types::*;
pub use validate::{check, is_valid, Rejection};
