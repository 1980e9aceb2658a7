//! CLI entry point for biosignal-daq.
//!
//! Provides a command-line interface for:
//! - Running a recording session against the mock transport (real hardware
//!   transports plug in through the same `FrameSource` seam)
//! - Checking a configuration file
//!
//! # Usage
//!
//! Record with the default configuration until Ctrl-C:
//! ```bash
//! biosignal_daq record
//! ```
//!
//! Validate a configuration file:
//! ```bash
//! biosignal_daq check-config --config config/biosignal.toml
//! ```

use anyhow::{anyhow, Context, Result};
use biosignal_daq::config::AcqConfig;
use biosignal_daq::pipeline::writer::CsvAppender;
use biosignal_daq::session::RecordingSession;
use biosignal_daq::tracing_setup;
use biosignal_daq::transport::MockFrameSource;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "biosignal-daq")]
#[command(about = "Physiological-signal recorder with rotating CSV output", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recording session (mock transport; Ctrl-C to stop)
    Record {
        /// Stream ID to record; defaults to the first configured stream
        #[arg(long)]
        stream: Option<String>,

        /// Stop automatically after this many seconds
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Synthetic frame rate of the mock device
        #[arg(long, default_value = "25.0")]
        rate_hz: f64,
    },

    /// Load and validate the configuration, then print the resolved values
    CheckConfig,
}

fn load_config(path: &Option<PathBuf>) -> Result<AcqConfig> {
    match path {
        Some(path) => AcqConfig::load_from(path),
        None => AcqConfig::load(),
    }
    .context("failed to load configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Record {
            stream,
            duration_secs,
            rate_hz,
        } => {
            let config = load_config(&cli.config)?;
            tracing_setup::init_from_config(&config).map_err(|e| anyhow!(e))?;
            record(config, stream, duration_secs, rate_hz).await
        }
        Commands::CheckConfig => {
            let config = load_config(&cli.config)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            println!("Configuration OK");
            Ok(())
        }
    }
}

async fn record(
    config: AcqConfig,
    stream_id: Option<String>,
    duration_secs: Option<u64>,
    rate_hz: f64,
) -> Result<()> {
    let stream = match &stream_id {
        Some(id) => config
            .streams
            .iter()
            .find(|s| &s.id == id)
            .ok_or_else(|| anyhow!("no stream with id '{id}' in configuration"))?,
        None => config
            .streams
            .first()
            .ok_or_else(|| anyhow!("no streams configured"))?,
    }
    .clone();

    info!(
        stream = %stream.id,
        output_dir = %config.storage.output_dir.display(),
        "starting recording session"
    );

    let source = Box::new(MockFrameSource::generator(stream.layout, rate_hz));
    let sink = Box::new(CsvAppender::new(config.storage.output_dir.clone()));
    let session = RecordingSession::start(
        stream,
        Duration::from_millis(config.storage.batch_interval_ms),
        source,
        sink,
    );

    // Surface connection state independently of the log path.
    let mut state_rx = session.connection_state();
    tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let state = state_rx.borrow().clone();
            info!(state = ?state, "connection");
        }
    });

    match duration_secs {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => {
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for Ctrl-C")?;
            info!("interrupt received, stopping");
        }
    }

    let stats = session.stop().await;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
