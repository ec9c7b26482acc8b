//! One feed connection's processing pipeline: framer into tracker.

use std::sync::Arc;

use serde::Serialize;

use crate::catalog::Catalogs;
use crate::clock::Clock;
use crate::config::Config;
use crate::framer::{FramerStats, StreamFramer};
use crate::tracker::{FlightTracker, UpsertOutcome};
use crate::types::{Diagnostic, Result};

/// What one call to [`Session::ingest`] produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestSummary {
    /// Valid records handed to the tracker.
    pub records: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Records the tracker refused (teleports).
    pub rejected: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl IngestSummary {
    pub fn merge(&mut self, other: IngestSummary) {
        self.records += other.records;
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.rejected += other.rejected;
        self.diagnostics.extend(other.diagnostics);
    }
}

pub struct Session {
    framer: StreamFramer,
    tracker: FlightTracker,
}

impl Session {
    /// Build a session from config, on the system clock.
    pub fn new(config: &Config, catalogs: Arc<Catalogs>) -> Self {
        let framer = StreamFramer::new(catalogs.clone(), config.feed.max_buffer_bytes);
        let tracker = FlightTracker::new(config.tracker.clone(), catalogs);
        Session { framer, tracker }
    }

    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Session {
            framer: self.framer,
            tracker: self.tracker.with_clock(clock),
        }
    }

    /// Process one inbound chunk to completion.
    ///
    /// A desync error leaves the framer empty and the tracker untouched;
    /// the caller should reconnect.
    pub fn ingest(&mut self, chunk: &[u8]) -> Result<IngestSummary> {
        self.framer.feed(chunk)?;
        let (records, diagnostics) = self.framer.poll_frames();

        let mut summary = IngestSummary {
            records: records.len(),
            diagnostics,
            ..IngestSummary::default()
        };
        for record in records {
            match self.tracker.upsert(record) {
                UpsertOutcome::Inserted { .. } => summary.inserted += 1,
                UpsertOutcome::Updated { .. } => summary.updated += 1,
                UpsertOutcome::Rejected { diagnostic, .. } => {
                    summary.rejected += 1;
                    summary.diagnostics.push(diagnostic);
                }
            }
        }
        Ok(summary)
    }

    /// Forget partial input, e.g. after a reconnect. Tracked flights stay.
    pub fn reset_feed(&mut self) {
        self.framer.reset();
    }

    /// Expire stale flights against the tracker's clock.
    pub fn prune_stale(&mut self) -> usize {
        let now = self.tracker.now();
        self.tracker.prune_stale(now)
    }

    pub fn tracker(&self) -> &FlightTracker {
        &self.tracker
    }

    pub fn framer(&self) -> &StreamFramer {
        &self.framer
    }

    pub fn framer_stats(&self) -> FramerStats {
        self.framer.stats()
    }
}
