//! atc-feeder: radar frame encoder and TCP replay feed.
//!
//! Supports:
//! - Encoding a single contact into a hex frame line
//! - Serving a hex capture file to every client that connects

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use atc_core::frame::{encode_degrees, encode_frame, frame_to_hex, FRAME_LEN};
use atc_core::{check, Catalogs, FlightRecord};

mod replay;

#[derive(Parser)]
#[command(name = "atc-feeder", version, about = "Radar frame encoder and replay feed")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one frame as a hex line
    Encode {
        /// Aircraft type id (decimal or 0x-prefixed hex)
        #[arg(long = "type", value_parser = parse_id)]
        type_id: u8,

        /// Source airport id
        #[arg(long, value_parser = parse_id)]
        src: u8,

        /// Destination airport id
        #[arg(long, value_parser = parse_id)]
        dst: u8,

        /// Latitude in degrees
        #[arg(long)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long)]
        lon: f64,

        #[arg(long)]
        alt: u32,

        /// Flight id
        #[arg(long)]
        id: u32,

        /// Coordinate divisor carried in the frame
        #[arg(long, default_value = "10000")]
        factor: u16,
    },

    /// Replay a hex capture file to connecting clients
    Serve {
        /// Path to file containing hex frames (one per line)
        file: PathBuf,

        /// Port to listen on
        #[arg(long, default_value = "9000")]
        port: u16,

        /// Delay between frames in milliseconds
        #[arg(long, default_value = "100")]
        interval_ms: u64,

        /// Loop the capture until the client disconnects
        #[arg(long)]
        repeat: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode {
            type_id,
            src,
            dst,
            lat,
            lon,
            alt,
            id,
            factor,
        } => {
            let record = build_record(type_id, src, dst, lat, lon, alt, id, factor)?;
            if let Err(rejection) = check(&record, &Catalogs::builtin()) {
                warn!("frame will be rejected by the tower: {rejection}");
            }
            println!("{}", frame_to_hex(&encode_frame(&record)));
            Ok(())
        }
        Commands::Serve {
            file,
            port,
            interval_ms,
            repeat,
        } => cmd_serve(file, port, interval_ms, repeat).await,
    }
}

#[allow(clippy::too_many_arguments)]
fn build_record(
    type_id: u8,
    src: u8,
    dst: u8,
    lat: f64,
    lon: f64,
    alt: u32,
    id: u32,
    factor: u16,
) -> Result<FlightRecord> {
    let latitude_raw = encode_degrees(lat, factor)
        .ok_or_else(|| anyhow!("latitude {lat} cannot be encoded with factor {factor}"))?;
    let longitude_raw = encode_degrees(lon, factor)
        .ok_or_else(|| anyhow!("longitude {lon} cannot be encoded with factor {factor}"))?;
    Ok(FlightRecord {
        type_id,
        src_airport_id: src,
        dst_airport_id: dst,
        latitude_raw,
        latitude_factor: factor,
        longitude_raw,
        longitude_factor: factor,
        altitude: alt,
        flight_id: id,
    })
}

fn parse_id(s: &str) -> std::result::Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|e| format!("invalid id {s:?}: {e}"))
}

async fn cmd_serve(file: PathBuf, port: u16, interval_ms: u64, repeat: bool) -> Result<()> {
    let frames = replay::FrameReader::new(&file).read_all()?;
    if frames.is_empty() {
        warn!(file = %file.display(), "capture contains no frames");
    }
    let frames = Arc::new(frames);

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("binding port {port}"))?;
    info!(
        "Serving {} frames from {} on port {port}",
        frames.len(),
        file.display()
    );

    let interval = Duration::from_millis(interval_ms);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping feeder");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (socket, peer) = accepted.context("accepting connection")?;
                info!(%peer, "client connected");
                let frames = frames.clone();
                tokio::spawn(async move {
                    match stream_frames(socket, &frames, interval, repeat).await {
                        Ok(sent) => info!(%peer, sent, "replay finished"),
                        Err(e) => info!(%peer, "client dropped: {e}"),
                    }
                });
            }
        }
    }
}

/// Write frames to one client. Returns the number of frames sent.
async fn stream_frames(
    mut socket: TcpStream,
    frames: &[[u8; FRAME_LEN]],
    interval: Duration,
    repeat: bool,
) -> std::io::Result<u64> {
    let mut sent = 0u64;
    loop {
        for frame in frames {
            socket.write_all(frame).await?;
            sent += 1;
            if !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
        }
        if !repeat || frames.is_empty() {
            break;
        }
    }
    socket.shutdown().await?;
    Ok(sent)
}
