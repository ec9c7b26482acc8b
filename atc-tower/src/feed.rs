//! TCP feed client with reconnect.
//!
//! One connection at a time. Each read is handed to the session and fully
//! processed before the next read. A disconnect or desync drops the
//! connection and reconnects with exponential backoff; Ctrl-C stops the loop.

use std::cmp::min;
use std::time::Duration;

use anyhow::Result;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use atc_core::config::FeedConfig;
use atc_core::{Session, FRAME_LEN};

/// How a single connection attempt ended.
enum ConnectionResult {
    /// Peer closed the stream cleanly.
    Closed,
    /// Could not connect at all.
    ConnectionFailed(anyhow::Error),
    /// Connected, then a read error or desync.
    OperationFailed(anyhow::Error),
}

/// Run the feed until Ctrl-C.
pub async fn run(config: &FeedConfig, session: &mut Session, status_every: Duration) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut current_delay = config.reconnect_delay_secs;

    loop {
        let result = tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping feed client");
                return Ok(());
            }
            result = connect_and_process(config, session, status_every) => result,
        };

        // never carry a partial frame into the next connection
        session.reset_feed();

        let wait = match result {
            ConnectionResult::Closed => {
                info!("Feed closed by peer, reconnecting");
                current_delay = config.reconnect_delay_secs;
                current_delay
            }
            ConnectionResult::ConnectionFailed(e) => {
                warn!(
                    "Failed to connect to feed {}:{}: {e} - retrying in {current_delay}s",
                    config.host, config.port
                );
                let wait = current_delay;
                current_delay = min(
                    current_delay.saturating_mul(2).max(1),
                    config.max_reconnect_delay_secs,
                );
                wait
            }
            ConnectionResult::OperationFailed(e) => {
                error!(
                    "Feed connection to {}:{} failed: {e} - reconnecting",
                    config.host, config.port
                );
                current_delay = config.reconnect_delay_secs;
                current_delay
            }
        };

        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping feed client");
                return Ok(());
            }
            _ = sleep(Duration::from_secs(wait)) => {}
        }
    }
}

async fn connect_and_process(
    config: &FeedConfig,
    session: &mut Session,
    status_every: Duration,
) -> ConnectionResult {
    let address = format!("{}:{}", config.host, config.port);
    info!("Connecting to feed at {address}");

    let mut stream = match TcpStream::connect(&address).await {
        Ok(stream) => stream,
        Err(e) => return ConnectionResult::ConnectionFailed(e.into()),
    };
    info!("Connected to feed at {address}");

    let mut buf = vec![0u8; config.read_chunk_bytes.max(FRAME_LEN)];
    let mut status = interval(status_every);
    status.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick completes immediately
    status.tick().await;

    loop {
        tokio::select! {
            read = stream.read(&mut buf) => {
                let n = match read {
                    Ok(0) => return ConnectionResult::Closed,
                    Ok(n) => n,
                    Err(e) => return ConnectionResult::OperationFailed(e.into()),
                };
                match session.ingest(&buf[..n]) {
                    Ok(summary) => {
                        if summary.records > 0 {
                            debug!(
                                records = summary.records,
                                inserted = summary.inserted,
                                rejected = summary.rejected,
                                "chunk processed"
                            );
                        }
                    }
                    Err(e) => return ConnectionResult::OperationFailed(e.into()),
                }
            }
            _ = status.tick() => log_status(session),
        }
    }
}

fn log_status(session: &mut Session) {
    let expired = session.prune_stale();
    let framer = session.framer_stats();
    let tracker = session.tracker().stats();
    info!(
        flights = session.tracker().len(),
        frames = framer.frames_decoded,
        valid = framer.frames_valid,
        invalid = framer.frames_invalid,
        malformed = framer.frames_malformed,
        teleports = tracker.teleports_rejected,
        arrivals = tracker.arrivals,
        expired,
        "feed status"
    );
}
