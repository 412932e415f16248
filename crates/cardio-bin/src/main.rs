//! Command-line entry point for the cardiac monitoring system.
//!
//! Wires argument parsing, logging (console plus file sink), SIGINT/SIGTERM
//! handling and data-source selection, then hands over to the coordinator.
//! Hardware builds (`--features hardware`) default to the ADS1115 source
//! and start the end-of-run file server; `--simulate` or a non-hardware
//! build replays a recorded binary file instead.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardio_bin::Application;
use cardio_core::{AcquisitionConfig, DataSource};
use cardio_server::TcpFileServer;
use cardio_storage::FileSource;

const LOG_FILE: &str = "cardiac_monitor.log";

#[derive(Parser, Debug)]
#[command(name = "cardio", about = "Real-time cardiac monitoring pipeline")]
struct Cli {
    /// Binary record file to replay as the data source
    replay: Option<PathBuf>,

    /// Force file replay even on hardware builds
    #[arg(short, long)]
    simulate: bool,

    /// Acquisition duration in seconds
    #[arg(short, long, default_value_t = 60)]
    duration: u64,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            match error.kind() {
                ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                    std::process::exit(0)
                }
                _ => std::process::exit(1),
            }
        }
    };

    if let Err(error) = init_logging() {
        eprintln!("ERROR: failed to initialize logging: {error:#}");
        std::process::exit(1);
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        if let Err(error) = signal_hook::flag::register(signal, Arc::clone(&shutdown)) {
            eprintln!("ERROR: failed to install signal handler: {error}");
            std::process::exit(1);
        }
    }

    if let Err(error) = run(cli, shutdown) {
        eprintln!("ERROR: {error:#}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE)
        .with_context(|| format!("cannot open {LOG_FILE}"))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
        .init();
    Ok(())
}

fn run(cli: Cli, shutdown: Arc<AtomicBool>) -> Result<()> {
    let config = AcquisitionConfig::builder()
        .duration(Duration::from_secs(cli.duration))
        .build()?;

    info!(
        rate = config.sample_rate.hz(),
        duration_s = cli.duration,
        simulate = cli.simulate,
        "cardiac monitoring system starting"
    );

    let source = build_source(&cli, &config)?;
    let server = build_server(&cli, &config)?;

    Application::new(config, source, server, shutdown).run()
}

fn replay_source(cli: &Cli, config: &AcquisitionConfig) -> Result<Box<dyn DataSource>> {
    let path = cli
        .replay
        .as_deref()
        .context("a replay file path is required when no hardware source is used")?;
    let source = FileSource::load(path, config.voltage_range, true)?;
    Ok(Box::new(source))
}

#[cfg(feature = "hardware")]
fn build_source(cli: &Cli, config: &AcquisitionConfig) -> Result<Box<dyn DataSource>> {
    if cli.simulate {
        return replay_source(cli, config);
    }

    use cardio_driver_ads1115::{Address, Ads1115};
    use linux_embedded_hal::I2cdev;

    let bus = I2cdev::new("/dev/i2c-1").context("failed to open I2C bus /dev/i2c-1")?;
    let mut adc = Ads1115::new(bus, Address::Gnd, config.sample_rate, config.voltage_range);
    adc.init().context("failed to initialize ADS1115")?;
    Ok(Box::new(adc))
}

#[cfg(not(feature = "hardware"))]
fn build_source(cli: &Cli, config: &AcquisitionConfig) -> Result<Box<dyn DataSource>> {
    replay_source(cli, config)
}

#[cfg(feature = "hardware")]
fn build_server(cli: &Cli, config: &AcquisitionConfig) -> Result<Option<TcpFileServer>> {
    if cli.simulate {
        return Ok(None);
    }
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            config.output_dir.display()
        )
    })?;
    let server = TcpFileServer::bind(config.server_port, &config.output_dir)?;
    Ok(Some(server))
}

#[cfg(not(feature = "hardware"))]
fn build_server(_cli: &Cli, _config: &AcquisitionConfig) -> Result<Option<TcpFileServer>> {
    Ok(None)
}
