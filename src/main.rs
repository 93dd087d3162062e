use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use padpilot::cli::Cli;
use padpilot::config::Config;
use padpilot::controller::controller_handle::{ControllerHandle, LoopExit};
use padpilot::controller::device_discovery::{find_hidraw, DEV_ROOT, SYSFS_HIDRAW_ROOT};
use padpilot::display;

// How long exit waits for the sampler thread before leaving it behind
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup(cli.verbose)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(cli));

    // The sampler may be parked in a read on a pad that stopped reporting
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load_or_default(cli.config.as_deref()).await?;
    cli.apply_to(&mut config);
    debug!("Effective config: {:?}", config);

    let device_path = resolve_device(&config)?;
    println!("Found:\t{}", config.device.id());
    println!("\t{}\n", device_path.display());

    // The adapter needs a moment after enumeration before it reports sticks
    tokio::time::sleep(Duration::from_millis(config.sampling.startup_delay_ms)).await;

    let handle = ControllerHandle::open(
        &device_path,
        Some(config.sampling.sampler_settings()),
    )
    .map_err(|e| eyre!("Failed to start sampling {}: {}", device_path.display(), e))?;
    info!("Reading {}", device_path.display());

    let mut samples = handle.subscribe();
    let mut stdout = std::io::stdout();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                handle.shutdown();
                return Ok(());
            }
            changed = samples.changed() => {
                if changed.is_err() {
                    debug!("Sampler closed its channel");
                    break;
                }
                let sample = samples.borrow_and_update().clone();
                if let Some(sample) = sample {
                    let text = display::render(&sample, &config.display);
                    if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
                        warn!("Failed to write to console: {}", e);
                    }
                }
            }
        }
    }

    match handle.join().await {
        Ok(LoopExit::EndOfStream) => {
            info!("Gamepad stream ended");
            Ok(())
        }
        Ok(LoopExit::Cancelled) => Ok(()),
        Err(e) => {
            error!("Sampling stopped: {}", e);
            Err(eyre!("Sampling stopped: {}", e))
        }
    }
}

fn resolve_device(config: &Config) -> Result<PathBuf> {
    if let Some(path) = &config.device.path {
        info!("Using configured device {}", path.display());
        return Ok(path.clone());
    }

    let id = config.device.id();
    find_hidraw(Path::new(SYSFS_HIDRAW_ROOT), Path::new(DEV_ROOT), id)
        .map_err(|e| eyre!("Gamepad lookup failed: {}", e))
}

fn setup(verbose: bool) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    setup_logging_env(if verbose { Level::DEBUG } else { Level::INFO });
    Ok(())
}

fn setup_logging_env(level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    // Logs go to stderr so they do not interleave with the readout
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
