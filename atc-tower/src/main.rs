//! atc-tower: radar feed client and flight table CLI.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use atc_core::config::{self, Config};
use atc_core::frame::parse_hex_line;
use atc_core::{Catalogs, Session};

mod feed;
mod table;

#[derive(Parser)]
#[command(name = "atc-tower", version, about = "Radar contact feed decoder and flight tracker")]
struct Cli {
    /// Config file (default: ~/.atc-tower/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to a live feed and track flights until Ctrl-C
    Track {
        /// Feed host (overrides config)
        #[arg(long, env = "ATC_FEED_HOST")]
        host: Option<String>,

        /// Feed port (overrides config)
        #[arg(long, env = "ATC_FEED_PORT")]
        port: Option<u16>,

        /// Print the final table as JSON snapshots
        #[arg(long)]
        json: bool,

        /// Seconds between status log lines
        #[arg(long, default_value = "10")]
        status_interval: u64,
    },

    /// Run a recorded capture through the decoder and print the flight table
    Decode {
        /// Capture file, or `-` for stdin
        file: PathBuf,

        /// Input is hex lines (one frame per line) instead of raw bytes
        #[arg(long)]
        hex: bool,

        /// Print JSON snapshots instead of a table
        #[arg(long)]
        json: bool,

        /// Bytes per simulated network read. A header cut by a read is
        /// lost, so the default is a whole number of frames.
        #[arg(long, default_value = "4095")]
        chunk: usize,
    },

    /// Print the aircraft and airport catalogs in use
    Catalog,

    /// Print the effective config as TOML
    Config {
        /// Also write it to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_err) = match &cli.config {
        Some(path) => {
            let config = config::load_config_from(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            (config, None)
        }
        // the level comes from the file, so report a bad one once logging is up
        None => match config::load_config() {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        },
    };

    init_logging(&config.log.level);
    if let Some(e) = config_err {
        warn!("ignoring config file {}: {e}", config::config_file().display());
    }

    match cli.command {
        Commands::Track {
            host,
            port,
            json,
            status_interval,
        } => {
            let mut config = config;
            if let Some(host) = host {
                config.feed.host = host;
            }
            if let Some(port) = port {
                config.feed.port = port;
            }
            cmd_track(&config, json, status_interval).await
        }
        Commands::Decode {
            file,
            hex,
            json,
            chunk,
        } => cmd_decode(&config, &file, hex, json, chunk),
        Commands::Catalog => cmd_catalog(&config),
        Commands::Config { save } => cmd_config(&config, cli.config.as_deref(), save),
    }
}

/// `RUST_LOG` wins; otherwise the configured level. Logs go to stderr so
/// table and JSON output stay clean on stdout.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_catalogs(config: &Config) -> Result<Arc<Catalogs>> {
    let catalogs = config.catalogs().with_context(|| match &config.catalog.path {
        Some(path) => format!("loading catalog {}", path.display()),
        None => "building catalogs".to_string(),
    })?;
    info!(
        aircraft = catalogs.aircraft.len(),
        airports = catalogs.airports.len(),
        "catalogs loaded"
    );
    Ok(Arc::new(catalogs))
}

async fn cmd_track(config: &Config, json: bool, status_interval: u64) -> Result<()> {
    let catalogs = load_catalogs(config)?;
    let mut session = Session::new(config, catalogs);

    let status_every = Duration::from_secs(status_interval.max(1));
    feed::run(&config.feed, &mut session, status_every).await?;

    print_result(&session, json)
}

fn cmd_decode(config: &Config, file: &Path, hex: bool, json: bool, chunk: usize) -> Result<()> {
    if chunk == 0 {
        bail!("--chunk must be at least 1");
    }
    let catalogs = load_catalogs(config)?;
    let mut session = Session::new(config, catalogs);

    let input = read_input(file)?;
    let stream = if hex { hex_to_stream(&input)? } else { input };

    let mut desyncs = 0;
    for piece in stream.chunks(chunk) {
        if let Err(e) = session.ingest(piece) {
            desyncs += 1;
            warn!("{e}; continuing with an empty buffer");
        }
    }
    if desyncs > 0 {
        warn!(desyncs, "capture overflowed the receive buffer");
    }

    print_result(&session, json)
}

fn cmd_catalog(config: &Config) -> Result<()> {
    let catalogs = load_catalogs(config)?;
    println!();
    println!("Aircraft types: {}", catalogs.aircraft.len());
    println!("{}", table::aircraft_table(&catalogs));
    println!();
    println!("Airports: {}", catalogs.airports.len());
    println!("{}", table::airports_table(&catalogs));
    Ok(())
}

fn cmd_config(config: &Config, path: Option<&Path>, save: bool) -> Result<()> {
    print!("{}", config::serialize_config(config)?);
    if save {
        let written = save_config(config, path)?;
        eprintln!("Saved config to {}", written.display());
    }
    Ok(())
}

/// Write to `path`, or to the default location when none was given.
fn save_config(config: &Config, path: Option<&Path>) -> Result<PathBuf> {
    let written = match path {
        Some(path) => {
            config::save_config_to(config, path)?;
            path.to_path_buf()
        }
        None => config::save_config(config)?,
    };
    info!(path = %written.display(), "config saved");
    Ok(written)
}

fn print_result(session: &Session, json: bool) -> Result<()> {
    if json {
        let snapshots = session.tracker().snapshots();
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
    } else {
        table::print_summary(session);
    }
    Ok(())
}

fn read_input(file: &Path) -> Result<Vec<u8>> {
    let mut input = Vec::new();
    if file.to_str() == Some("-") {
        io::stdin()
            .lock()
            .read_to_end(&mut input)
            .context("reading stdin")?;
    } else {
        input = std::fs::read(file).with_context(|| format!("opening {}", file.display()))?;
    }
    Ok(input)
}

/// Concatenate the frames of a hex capture into one byte stream.
fn hex_to_stream(input: &[u8]) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(input).context("hex capture is not UTF-8")?;
    let mut stream = Vec::new();
    for (i, line) in text.lines().enumerate() {
        match parse_hex_line(line) {
            None => {}
            Some(Ok(frame)) => stream.extend_from_slice(&frame),
            Some(Err(e)) => warn!(line = i + 1, "skipping line: {e}"),
        }
    }
    Ok(stream)
}
