//! Per-flight state table with derived heading and arrival status.
//!
//! Pure logic, no I/O. Entries live in first-seen order in a `Vec`, with an
//! id → row map alongside. Observers get a [`TrackEvent`] for every insert,
//! change and removal, scoped to the row index.
//!
//! Tracks per-flight: latest record, first/last seen, heading from
//! successive positions, and whether the flight reached its destination.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::Catalogs;
use crate::clock::{Clock, SystemClock};
use crate::config::TrackerConfig;
use crate::geo::{normalize_deg, GreatCircle, Haversine};
use crate::types::{Diagnostic, FlightRecord};

/// Positions closer than this (degrees) count as unchanged.
const POSITION_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Events (output)
// ---------------------------------------------------------------------------

/// Which presentation fields an update touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub latitude: bool,
    pub longitude: bool,
    pub heading: bool,
    pub destination: bool,
    pub arrival: bool,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        !(self.latitude || self.longitude || self.heading || self.destination || self.arrival)
    }

    /// Field names as exposed to views.
    pub fn names(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.latitude {
            out.push("latitude");
        }
        if self.longitude {
            out.push("longitude");
        }
        if self.heading {
            out.push("heading");
        }
        if self.destination {
            out.push("dstAirportId");
        }
        if self.arrival {
            out.push("arrived");
        }
        out
    }
}

/// Notifications delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackEvent {
    /// A new flight was appended at `row`.
    Inserted { row: usize, flight_id: u32 },
    /// An accepted update. `changes` may be empty when only freshness or
    /// altitude moved.
    Changed {
        row: usize,
        flight_id: u32,
        changes: ChangeSet,
    },
    /// The flight at `row` was expired. One prune pass reports rows highest
    /// first, so each row is current when applied in order.
    Removed { row: usize, flight_id: u32 },
}

/// What [`FlightTracker::upsert`] did with a record.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Inserted { row: usize },
    Updated { row: usize, changes: ChangeSet },
    /// Implausible jump; only freshness was refreshed.
    Rejected { row: usize, diagnostic: Diagnostic },
}

// ---------------------------------------------------------------------------
// Flight state
// ---------------------------------------------------------------------------

/// Mutable state for a single tracked flight.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedFlight {
    pub record: FlightRecord,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Degrees in `[0, 360)`; 0 until the flight has moved.
    pub heading_deg: f64,
    /// Set once, never cleared.
    pub arrived: bool,
    pub updates: u64,
}

impl TrackedFlight {
    pub fn flight_id(&self) -> u32 {
        self.record.flight_id
    }

    /// Seconds since the last record, clamped at zero.
    pub fn age_secs(&self, now: DateTime<Utc>) -> f64 {
        secs_between(self.last_seen, now)
    }
}

/// Read-only view of a tracked flight with catalog names resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightSnapshot {
    pub row: usize,
    pub flight_id: u32,
    pub type_id: u8,
    pub aircraft_name: Option<String>,
    pub aircraft_class: Option<String>,
    pub capacity: Option<u32>,
    pub range_nm: Option<u32>,
    pub src_airport_id: u8,
    pub dst_airport_id: u8,
    pub src_airport_name: Option<String>,
    pub dst_airport_name: Option<String>,
    pub src_country: Option<String>,
    pub dst_country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: u32,
    pub first_seen: String,
    /// ISO-8601, UTC, second precision.
    pub last_seen: String,
    pub heading_deg: f64,
    pub arrived: bool,
    pub updates: u64,
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackerStats {
    pub inserted: u64,
    pub updated: u64,
    pub teleports_rejected: u64,
    pub arrivals: u64,
    pub removed: u64,
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

type Observer = Box<dyn FnMut(&TrackEvent) + Send>;

/// Flight table keyed by flight id.
pub struct FlightTracker {
    config: TrackerConfig,
    catalogs: Arc<Catalogs>,
    clock: Arc<dyn Clock>,
    geo: Arc<dyn GreatCircle>,
    flights: Vec<TrackedFlight>,
    index: HashMap<u32, usize>,
    observers: Vec<Observer>,
    stats: TrackerStats,
}

impl FlightTracker {
    /// Tracker on the system clock with haversine geometry.
    pub fn new(config: TrackerConfig, catalogs: Arc<Catalogs>) -> Self {
        FlightTracker {
            config,
            catalogs,
            clock: Arc::new(SystemClock),
            geo: Arc::new(Haversine),
            flights: Vec::new(),
            index: HashMap::new(),
            observers: Vec::new(),
            stats: TrackerStats::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_geo(mut self, geo: Arc<dyn GreatCircle>) -> Self {
        self.geo = geo;
        self
    }

    /// Register a callback for every [`TrackEvent`].
    pub fn subscribe(&mut self, observer: impl FnMut(&TrackEvent) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Fold a validated record into the table.
    pub fn upsert(&mut self, record: FlightRecord) -> UpsertOutcome {
        let now = self.clock.now();
        match self.index.get(&record.flight_id).copied() {
            None => self.insert(record, now),
            Some(row) => self.update(row, record, now),
        }
    }

    fn insert(&mut self, record: FlightRecord, now: DateTime<Utc>) -> UpsertOutcome {
        let row = self.flights.len();
        let flight_id = record.flight_id;
        let arrived = reaches_destination(
            &self.catalogs,
            self.geo.as_ref(),
            self.config.arrival_radius_m,
            &record,
        );

        self.flights.push(TrackedFlight {
            record,
            first_seen: now,
            last_seen: now,
            heading_deg: 0.0,
            arrived,
            updates: 1,
        });
        self.index.insert(flight_id, row);
        self.stats.inserted += 1;
        debug!(flight_id, row, "new flight");
        if arrived {
            self.stats.arrivals += 1;
            info!(flight_id, dst = record.dst_airport_id, "flight arrived");
        }

        self.emit(&TrackEvent::Inserted { row, flight_id });
        UpsertOutcome::Inserted { row }
    }

    fn update(&mut self, row: usize, record: FlightRecord, now: DateTime<Utc>) -> UpsertOutcome {
        let flight_id = record.flight_id;
        let flight = &mut self.flights[row];

        let dt_secs = secs_between(flight.last_seen, now);
        let old = flight.record.position();
        let new = record.position();
        let distance_m = self.geo.distance_m(old, new);

        if dt_secs <= self.config.teleport_window_secs
            && distance_m >= self.config.teleport_distance_m
        {
            flight.last_seen = now;
            self.stats.teleports_rejected += 1;
            warn!(flight_id, dt_secs, distance_m, "implausible jump, update dropped");
            return UpsertOutcome::Rejected {
                row,
                diagnostic: Diagnostic::Teleport {
                    flight_id,
                    dt_secs,
                    distance_m,
                },
            };
        }

        let mut changes = ChangeSet {
            latitude: (old.0 - new.0).abs() > POSITION_EPSILON,
            longitude: (old.1 - new.1).abs() > POSITION_EPSILON,
            destination: flight.record.dst_airport_id != record.dst_airport_id,
            ..ChangeSet::default()
        };

        if changes.latitude || changes.longitude {
            let bearing = self.geo.initial_bearing_deg(old, new);
            // degenerate geometry keeps the previous heading
            if !bearing.is_nan() {
                let heading = normalize_deg(bearing);
                if heading != flight.heading_deg {
                    flight.heading_deg = heading;
                    changes.heading = true;
                }
            }
        }

        flight.record = record;
        flight.last_seen = now;
        flight.updates += 1;

        if !flight.arrived
            && reaches_destination(
                &self.catalogs,
                self.geo.as_ref(),
                self.config.arrival_radius_m,
                &record,
            )
        {
            flight.arrived = true;
            changes.arrival = true;
            self.stats.arrivals += 1;
            info!(flight_id, dst = record.dst_airport_id, "flight arrived");
        }

        self.stats.updated += 1;
        self.emit(&TrackEvent::Changed {
            row,
            flight_id,
            changes,
        });
        UpsertOutcome::Updated { row, changes }
    }

    /// Remove flights older than `stale_after_secs`. No-op when expiry is
    /// disabled. Returns the number removed.
    pub fn prune_stale(&mut self, now: DateTime<Utc>) -> usize {
        let Some(stale_after) = self.config.stale_after_secs else {
            return 0;
        };

        let removed: Vec<(usize, u32)> = self
            .flights
            .iter()
            .enumerate()
            .filter(|(_, f)| f.age_secs(now) > stale_after)
            .map(|(row, f)| (row, f.flight_id()))
            .collect();
        if removed.is_empty() {
            return 0;
        }

        self.flights.retain(|f| f.age_secs(now) <= stale_after);
        self.index = self
            .flights
            .iter()
            .enumerate()
            .map(|(row, f)| (f.flight_id(), row))
            .collect();
        self.stats.removed += removed.len() as u64;

        for &(row, flight_id) in removed.iter().rev() {
            debug!(flight_id, row, "expired stale flight");
            self.emit(&TrackEvent::Removed { row, flight_id });
        }
        removed.len()
    }

    /// Snapshot of the flight at `row`, or `None` when out of range.
    pub fn get(&self, row: usize) -> Option<FlightSnapshot> {
        self.flights.get(row).map(|f| self.snapshot(row, f))
    }

    pub fn find(&self, flight_id: u32) -> Option<&TrackedFlight> {
        self.row_of(flight_id).map(|row| &self.flights[row])
    }

    pub fn row_of(&self, flight_id: u32) -> Option<usize> {
        self.index.get(&flight_id).copied()
    }

    /// Flights in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackedFlight> {
        self.flights.iter()
    }

    pub fn snapshots(&self) -> Vec<FlightSnapshot> {
        self.flights
            .iter()
            .enumerate()
            .map(|(row, f)| self.snapshot(row, f))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    pub fn stats(&self) -> TrackerStats {
        self.stats
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn snapshot(&self, row: usize, f: &TrackedFlight) -> FlightSnapshot {
        let rec = &f.record;
        let aircraft = self.catalogs.aircraft.get(rec.type_id);
        let src = self.catalogs.airports.get(rec.src_airport_id);
        let dst = self.catalogs.airports.get(rec.dst_airport_id);
        FlightSnapshot {
            row,
            flight_id: rec.flight_id,
            type_id: rec.type_id,
            aircraft_name: aircraft.map(|a| a.name.clone()),
            aircraft_class: aircraft.map(|a| a.class.clone()),
            capacity: aircraft.map(|a| a.capacity),
            range_nm: aircraft.map(|a| a.range_nm),
            src_airport_id: rec.src_airport_id,
            dst_airport_id: rec.dst_airport_id,
            src_airport_name: src.map(|a| a.name.clone()),
            dst_airport_name: dst.map(|a| a.name.clone()),
            src_country: src.map(|a| a.country.clone()),
            dst_country: dst.map(|a| a.country.clone()),
            latitude: rec.latitude(),
            longitude: rec.longitude(),
            altitude: rec.altitude,
            first_seen: iso8601(f.first_seen),
            last_seen: iso8601(f.last_seen),
            heading_deg: f.heading_deg,
            arrived: f.arrived,
            updates: f.updates,
        }
    }

    fn emit(&mut self, event: &TrackEvent) {
        for observer in &mut self.observers {
            observer(event);
        }
    }
}

/// Whether the record lies within `radius_m` of its (known) destination.
fn reaches_destination(
    catalogs: &Catalogs,
    geo: &dyn GreatCircle,
    radius_m: f64,
    rec: &FlightRecord,
) -> bool {
    match catalogs.airports.get(rec.dst_airport_id) {
        Some(dst) => geo.distance_m(rec.position(), (dst.latitude, dst.longitude)) <= radius_m,
        None => false,
    }
}

fn secs_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    let delta = later - earlier;
    let secs = match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_seconds() as f64,
    };
    secs.max(0.0)
}

fn iso8601(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::clock::ManualClock;

    const FACTOR: u16 = 10_000;

    fn record(flight_id: u32, lat: f64, lon: f64) -> FlightRecord {
        FlightRecord {
            type_id: 0xa1,
            src_airport_id: 0x1a,
            dst_airport_id: 0x3a,
            latitude_raw: (lat * FACTOR as f64).round() as u32,
            latitude_factor: FACTOR,
            longitude_raw: (lon * FACTOR as f64).round() as u32,
            longitude_factor: FACTOR,
            altitude: 35_000,
            flight_id,
        }
    }

    fn make_tracker(config: TrackerConfig) -> (FlightTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let tracker = FlightTracker::new(config, Arc::new(Catalogs::builtin()))
            .with_clock(clock.clone());
        (tracker, clock)
    }

    fn recorded_events(tracker: &mut FlightTracker) -> Arc<Mutex<Vec<TrackEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        tracker.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
        events
    }

    #[test]
    fn test_insert_new_flight() {
        let (mut t, _) = make_tracker(TrackerConfig::default());
        let outcome = t.upsert(record(100, 30.0, 50.0));
        assert_eq!(outcome, UpsertOutcome::Inserted { row: 0 });

        let f = t.find(100).unwrap();
        assert_eq!(f.heading_deg, 0.0);
        assert!(!f.arrived);
        assert_eq!(f.updates, 1);
        assert_eq!(t.stats().inserted, 1);
    }

    #[test]
    fn test_teleport_rejected_within_window() {
        let (mut t, clock) = make_tracker(TrackerConfig::default());
        t.upsert(record(1, 30.0, 50.0));
        clock.advance_secs(1.0);

        // ~100 km north
        let outcome = t.upsert(record(1, 30.9, 50.0));
        let UpsertOutcome::Rejected { row, diagnostic } = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(row, 0);
        let Diagnostic::Teleport {
            dt_secs,
            distance_m,
            ..
        } = diagnostic
        else {
            panic!("expected teleport diagnostic");
        };
        assert!((dt_secs - 1.0).abs() < 1e-9);
        assert!(distance_m > 99_000.0 && distance_m < 101_000.0);

        let f = t.find(1).unwrap();
        assert_eq!(f.record, record(1, 30.0, 50.0));
        assert_eq!(f.last_seen, clock.now());
        assert_eq!(f.updates, 1);
        assert_eq!(t.stats().teleports_rejected, 1);
    }

    #[test]
    fn test_same_jump_accepted_after_window() {
        let (mut t, clock) = make_tracker(TrackerConfig::default());
        t.upsert(record(1, 30.0, 50.0));
        clock.advance_secs(10.0);

        let outcome = t.upsert(record(1, 30.9, 50.0));
        assert!(matches!(outcome, UpsertOutcome::Updated { row: 0, .. }));
        assert_eq!(t.find(1).unwrap().record, record(1, 30.9, 50.0));
    }

    #[test]
    fn test_teleport_at_zero_dt() {
        let (mut t, _) = make_tracker(TrackerConfig::default());
        t.upsert(record(1, 30.0, 50.0));
        assert!(matches!(
            t.upsert(record(1, 31.0, 50.0)),
            UpsertOutcome::Rejected { .. }
        ));
    }

    #[test]
    fn test_short_hop_inside_window_is_fine() {
        let (mut t, clock) = make_tracker(TrackerConfig::default());
        t.upsert(record(1, 30.0, 50.0));
        clock.advance_secs(1.0);
        assert!(matches!(
            t.upsert(record(1, 30.01, 50.0)),
            UpsertOutcome::Updated { .. }
        ));
    }

    #[test]
    fn test_heading_north_and_east() {
        let (mut t, clock) = make_tracker(TrackerConfig::default());
        t.upsert(record(1, 30.0, 50.0));
        clock.advance_secs(10.0);
        t.upsert(record(1, 30.01, 50.0));
        let h = t.find(1).unwrap().heading_deg;
        assert!(h.abs() < 1e-6 || (360.0 - h) < 1e-6, "h={h}");

        clock.advance_secs(10.0);
        t.upsert(record(1, 30.01, 50.01));
        let h = t.find(1).unwrap().heading_deg;
        assert!((h - 90.0).abs() < 0.1, "h={h}");
    }

    #[test]
    fn test_stationary_update_keeps_heading() {
        let (mut t, clock) = make_tracker(TrackerConfig::default());
        t.upsert(record(1, 30.0, 50.0));
        clock.advance_secs(10.0);
        t.upsert(record(1, 30.0, 50.01));
        let before = t.find(1).unwrap().heading_deg;

        clock.advance_secs(10.0);
        let outcome = t.upsert(FlightRecord {
            altitude: 20_000,
            ..record(1, 30.0, 50.01)
        });
        let UpsertOutcome::Updated { changes, .. } = outcome else {
            panic!("expected update");
        };
        assert!(changes.is_empty());
        assert_eq!(t.find(1).unwrap().heading_deg, before);
        assert_eq!(t.find(1).unwrap().record.altitude, 20_000);
    }

    #[test]
    fn test_nan_bearing_keeps_heading() {
        struct NanBearing;
        impl GreatCircle for NanBearing {
            fn distance_m(&self, from: (f64, f64), to: (f64, f64)) -> f64 {
                Haversine.distance_m(from, to)
            }
            fn initial_bearing_deg(&self, _: (f64, f64), _: (f64, f64)) -> f64 {
                f64::NAN
            }
        }

        let (t, clock) = make_tracker(TrackerConfig::default());
        let mut t = t.with_geo(Arc::new(NanBearing));
        t.upsert(record(1, 30.0, 50.0));
        clock.advance_secs(10.0);
        let UpsertOutcome::Updated { changes, .. } = t.upsert(record(1, 30.01, 50.0)) else {
            panic!("expected update");
        };
        assert!(changes.latitude);
        assert!(!changes.heading);
        assert_eq!(t.find(1).unwrap().heading_deg, 0.0);
    }

    #[test]
    fn test_arrival_is_sticky() {
        let (mut t, clock) = make_tracker(TrackerConfig::default());
        let events = recorded_events(&mut t);

        // far from Dubai
        t.upsert(record(7, 26.0, 55.0));
        assert!(!t.find(7).unwrap().arrived);

        // ~100 km south, inside 5 km of Dubai
        clock.advance_secs(60.0);
        let UpsertOutcome::Updated { changes, .. } = t.upsert(record(7, 25.25, 55.37)) else {
            panic!("expected update");
        };
        assert!(changes.arrival);
        assert!(t.find(7).unwrap().arrived);

        // leaving again does not clear it, and no second arrival is reported
        clock.advance_secs(60.0);
        let UpsertOutcome::Updated { changes, .. } = t.upsert(record(7, 26.0, 55.0)) else {
            panic!("expected update");
        };
        assert!(!changes.arrival);
        assert!(t.find(7).unwrap().arrived);
        assert_eq!(t.stats().arrivals, 1);

        let ev = events.lock().unwrap();
        assert_eq!(ev.len(), 3);
        assert!(matches!(
            ev[1],
            TrackEvent::Changed {
                row: 0,
                flight_id: 7,
                changes: ChangeSet { arrival: true, .. }
            }
        ));
    }

    #[test]
    fn test_arrived_on_first_sighting() {
        let (mut t, _) = make_tracker(TrackerConfig::default());
        t.upsert(record(8, 25.25, 55.37));
        assert!(t.find(8).unwrap().arrived);
    }

    #[test]
    fn test_unknown_destination_never_arrives() {
        let (mut t, _) = make_tracker(TrackerConfig::default());
        t.upsert(FlightRecord {
            dst_airport_id: 0xee,
            ..record(9, 25.25, 55.37)
        });
        assert!(!t.find(9).unwrap().arrived);
    }

    #[test]
    fn test_change_names() {
        let (mut t, clock) = make_tracker(TrackerConfig::default());
        t.upsert(record(1, 30.0, 50.0));
        clock.advance_secs(10.0);
        let UpsertOutcome::Updated { changes, .. } = t.upsert(FlightRecord {
            dst_airport_id: 0xa2,
            ..record(1, 30.0, 50.02)
        }) else {
            panic!("expected update");
        };
        assert_eq!(changes.names(), vec!["longitude", "heading", "dstAirportId"]);
    }

    #[test]
    fn test_insertion_order_and_rows() {
        let (mut t, _) = make_tracker(TrackerConfig::default());
        for id in [30, 10, 20] {
            t.upsert(record(id, 30.0, 50.0));
        }
        let ids: Vec<u32> = t.iter().map(|f| f.flight_id()).collect();
        assert_eq!(ids, vec![30, 10, 20]);
        assert_eq!(t.row_of(10), Some(1));
        assert_eq!(t.get(2).unwrap().flight_id, 20);
        assert!(t.get(3).is_none());
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn test_snapshot_fields() {
        let (mut t, clock) = make_tracker(TrackerConfig::default());
        clock.advance_secs(90.0);
        t.upsert(record(42, 30.0, 50.0));

        let s = t.get(0).unwrap();
        assert_eq!(s.aircraft_name.as_deref(), Some("Boeing 747-8"));
        assert_eq!(s.aircraft_class.as_deref(), Some("Commercial Airplane"));
        assert_eq!(s.capacity, Some(660));
        assert_eq!(s.src_airport_name.as_deref(), Some("Imam Khomeini"));
        assert_eq!(s.dst_airport_name.as_deref(), Some("Dubai"));
        assert_eq!(s.dst_country.as_deref(), Some("UAE"));
        assert_eq!(s.last_seen, "1970-01-01T00:01:30Z");
        assert!((s.latitude - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_expiry_disabled_by_default() {
        let (mut t, clock) = make_tracker(TrackerConfig::default());
        t.upsert(record(1, 30.0, 50.0));
        clock.advance_secs(1e6);
        assert_eq!(t.prune_stale(clock.now()), 0);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_prune_compacts_rows() {
        let config = TrackerConfig {
            stale_after_secs: Some(60.0),
            ..TrackerConfig::default()
        };
        let (mut t, clock) = make_tracker(config);
        for id in [1, 2, 3] {
            t.upsert(record(id, 30.0, 50.0));
        }
        clock.advance_secs(50.0);
        t.upsert(record(2, 30.0, 50.01));
        clock.advance_secs(20.0);

        let events = recorded_events(&mut t);
        assert_eq!(t.prune_stale(clock.now()), 2);
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                TrackEvent::Removed {
                    row: 2,
                    flight_id: 3
                },
                TrackEvent::Removed {
                    row: 0,
                    flight_id: 1
                },
            ]
        );

        assert_eq!(t.len(), 1);
        assert_eq!(t.row_of(2), Some(0));
        assert_eq!(t.row_of(1), None);
        assert_eq!(t.get(0).unwrap().flight_id, 2);

        // a returning flight is a fresh insert at the end
        assert_eq!(
            t.upsert(record(1, 30.0, 50.0)),
            UpsertOutcome::Inserted { row: 1 }
        );
        assert_eq!(t.stats().removed, 2);
    }

    #[test]
    fn test_row_events_keep_a_view_in_step() {
        let config = TrackerConfig {
            stale_after_secs: Some(60.0),
            ..TrackerConfig::default()
        };
        let (mut t, clock) = make_tracker(config);

        // a row-indexed list maintained purely from events
        let view = Arc::new(Mutex::new(Vec::<u32>::new()));
        let sink = view.clone();
        t.subscribe(move |event| {
            let mut rows = sink.lock().unwrap();
            match *event {
                TrackEvent::Inserted { row, flight_id } => rows.insert(row, flight_id),
                TrackEvent::Removed { row, flight_id } => {
                    assert_eq!(rows.remove(row), flight_id);
                }
                TrackEvent::Changed { row, flight_id, .. } => assert_eq!(rows[row], flight_id),
            }
        });

        for id in [1, 2, 3, 4] {
            t.upsert(record(id, 30.0, 50.0));
        }
        clock.advance_secs(50.0);
        t.upsert(record(2, 30.0, 50.01));
        t.upsert(record(4, 30.0, 50.01));
        clock.advance_secs(20.0);
        assert_eq!(t.prune_stale(clock.now()), 2);

        let ids: Vec<u32> = t.iter().map(|f| f.flight_id()).collect();
        assert_eq!(ids, vec![2, 4]);
        assert_eq!(*view.lock().unwrap(), ids);
    }
}
