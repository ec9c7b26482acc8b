//! Receive buffer that turns an unbounded byte stream into validated records.
//!
//! The stream carries no length prefix, so boundaries are recovered by
//! scanning for the header sentinel and checking the footer at the fixed
//! offset. Any bytes that cannot belong to a frame are dropped.
//!
//! Every pass through the scan loop stops, extracts a frame, or drops at least
//! one byte, so [`StreamFramer::poll_frames`] always terminates.

use std::sync::Arc;

use bytes::{Buf, BytesMut};
use memchr::memmem;
use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::Catalogs;
use crate::frame::{decode_frame, FRAME_LEN, HEADER};
use crate::types::{AtcError, Diagnostic, FlightRecord, Result};
use crate::validate;

/// Default receive buffer cap (1 MiB).
pub const DEFAULT_MAX_BUFFER: usize = 1 << 20;

/// Running counters across the framer's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FramerStats {
    pub frames_decoded: u64,
    pub frames_valid: u64,
    pub frames_invalid: u64,
    pub frames_malformed: u64,
    /// Bytes dropped without becoming a frame, including the byte skipped
    /// past each false header.
    pub bytes_discarded: u64,
    pub desyncs: u64,
}

/// Stateful frame extractor for one feed connection.
pub struct StreamFramer {
    buf: BytesMut,
    max_buffer: usize,
    catalogs: Arc<Catalogs>,
    finder: memmem::Finder<'static>,
    stats: FramerStats,
}

impl StreamFramer {
    pub fn new(catalogs: Arc<Catalogs>, max_buffer: usize) -> Self {
        StreamFramer {
            buf: BytesMut::with_capacity(FRAME_LEN * 64),
            max_buffer,
            catalogs,
            finder: memmem::Finder::new(&HEADER),
            stats: FramerStats::default(),
        }
    }

    /// Append inbound bytes.
    ///
    /// Exceeding the cap clears the buffer and returns [`AtcError::Desync`];
    /// the caller should drop the connection.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(bytes);
        if self.buf.len() > self.max_buffer {
            let buffered = self.buf.len();
            self.buf.clear();
            self.stats.desyncs += 1;
            warn!(
                buffered,
                cap = self.max_buffer,
                "receive buffer over cap, stream desynchronized"
            );
            return Err(AtcError::Desync {
                buffered,
                cap: self.max_buffer,
            });
        }
        Ok(())
    }

    /// Extract every complete frame currently buffered.
    ///
    /// Returns the valid records in stream order and the diagnostics raised
    /// on the way. Incomplete trailing data stays buffered for the next call.
    pub fn poll_frames(&mut self) -> (Vec<FlightRecord>, Vec<Diagnostic>) {
        let mut records = Vec::new();
        let mut diagnostics = Vec::new();

        loop {
            let Some(p) = self.finder.find(&self.buf) else {
                // no full header anywhere: nothing here can start a frame
                if !self.buf.is_empty() {
                    self.discard(self.buf.len(), &mut diagnostics);
                }
                break;
            };

            if self.buf.len() < p + FRAME_LEN {
                break;
            }

            let mut block = [0u8; FRAME_LEN];
            block.copy_from_slice(&self.buf[p..p + FRAME_LEN]);
            let decoded = decode_frame(&block);

            if !decoded.footer_ok {
                self.stats.frames_malformed += 1;
                warn!(offset = p, "footer mismatch, resyncing");
                diagnostics.push(Diagnostic::MalformedFrame { offset: p });
                self.buf.advance(p + 1);
                self.stats.bytes_discarded += (p + 1) as u64;
                continue;
            }

            if p > 0 {
                self.discard(p, &mut diagnostics);
            }
            self.buf.advance(FRAME_LEN);
            self.stats.frames_decoded += 1;

            let record = decoded.record;
            match validate::check(&record, &self.catalogs) {
                Ok(()) => {
                    self.stats.frames_valid += 1;
                    records.push(record);
                }
                Err(rejection) => {
                    self.stats.frames_invalid += 1;
                    warn!(
                        flight_id = record.flight_id,
                        rule = rejection.rule(),
                        "invalid record: {rejection}"
                    );
                    diagnostics.push(Diagnostic::InvalidRecord {
                        flight_id: record.flight_id,
                        rejection,
                    });
                }
            }
        }

        (records, diagnostics)
    }

    /// Drop all buffered bytes, e.g. for a new connection. Counters are kept.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Number of bytes waiting for more input.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn stats(&self) -> FramerStats {
        self.stats
    }

    fn discard(&mut self, count: usize, diagnostics: &mut Vec<Diagnostic>) {
        self.buf.advance(count);
        self.stats.bytes_discarded += count as u64;
        debug!(count, "discarded bytes without header");
        diagnostics.push(Diagnostic::BytesDiscarded { count });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
