//! Sound Radar headless consumer
//!
//! Runs the capture loop on the configured input device and prints the
//! indicator position whenever it moves. A graphical overlay would poll the
//! same observer on its own refresh cadence.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sound_radar::{
    audio::CpalFrameSource,
    config::AppConfig,
    constants::RENDER_INTERVAL_MS,
    pipeline::{CaptureLoop, LoopSettings, LoopState},
    radar::PublishedState,
};

const USAGE: &str = "\
Usage: soundradar [OPTIONS]

Options:
  --device <NAME>     Input device name (default: host default input)
  --channels <N>      Channel count: 2, 6 or 8
  --config <PATH>     Config file (default: platform config dir)
  --save              Write the effective settings back to the config file
  --json              Print positions as JSON lines
  -h, --help          Show this help";

#[derive(Debug, Default)]
struct Args {
    device: Option<String>,
    channels: Option<u16>,
    config: Option<PathBuf>,
    save: bool,
    json: bool,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Option<Self>> {
        let mut parsed = Args::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--device" => {
                    parsed.device = Some(args.next().context("--device needs a value")?);
                }
                "--channels" => {
                    let value = args.next().context("--channels needs a value")?;
                    parsed.channels = Some(
                        value
                            .parse()
                            .with_context(|| format!("invalid channel count: {}", value))?,
                    );
                }
                "--config" => {
                    parsed.config = Some(args.next().context("--config needs a path")?.into());
                }
                "--save" => parsed.save = true,
                "--json" => parsed.json = true,
                "-h" | "--help" => return Ok(None),
                other => bail!("unknown argument: {}\n\n{}", other, USAGE),
            }
        }

        Ok(Some(parsed))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(args) = Args::parse(std::env::args().skip(1))? else {
        println!("{}", USAGE);
        return Ok(());
    };

    tracing::info!("Starting Sound Radar");

    // Load or create config
    let config_path = args.config.clone().or_else(AppConfig::default_path);
    let mut config = match &config_path {
        Some(path) => AppConfig::load_or_default(path)?,
        None => AppConfig::default(),
    };

    if let Some(device) = args.device {
        config.device.name = Some(device);
    }
    if let Some(channels) = args.channels {
        config.device.channels = channels;
    }
    config.validate()?;

    if args.save {
        match &config_path {
            Some(path) => config.save(path)?,
            None => tracing::warn!("No config directory available, settings not saved"),
        }
    }

    let stream_config = config.stream_config()?;
    let device_name = config.device.name.clone();
    let capture_config = config.capture.clone();

    tracing::info!(
        "Opening {} with {} channels",
        device_name.as_deref().unwrap_or("default input"),
        stream_config.channels()
    );

    // Spawning waits for the device to open
    let settings = LoopSettings::from(&config);
    let mut capture = tokio::task::spawn_blocking(move || {
        CaptureLoop::spawn(
            move || CpalFrameSource::open(device_name.as_deref(), stream_config, &capture_config),
            settings,
        )
    })
    .await??;

    let mut observer = capture.observer();
    let mut ticker = tokio::time::interval(Duration::from_millis(RENDER_INTERVAL_MS));
    let mut last_drawn: Option<PublishedState> = None;
    let mut last_stats = Instant::now();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    tracing::info!("Radar running - press Ctrl+C to stop");

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Shutting down");
                break;
            }
            _ = ticker.tick() => {
                if let Some(state) = observer.poll_changed() {
                    let moved = last_drawn.map_or(true, |last| {
                        last.position != state.position || last.active != state.active
                    });
                    if moved {
                        draw(&state, args.json)?;
                        last_drawn = Some(state);
                    }
                }

                if capture.state() == LoopState::Stopped {
                    tracing::error!("Capture loop ended unexpectedly");
                    break;
                }

                // Periodic stats logging
                if last_stats.elapsed() >= Duration::from_secs(10) {
                    let stats = capture.stats();
                    tracing::info!(
                        "Stats: {} frames, {} detections, {} read errors, {} overruns, {} restarts",
                        stats.frames_processed,
                        stats.detections,
                        stats.read_errors,
                        stats.overruns,
                        stats.restarts
                    );
                    last_stats = Instant::now();
                }
            }
        }
    }

    tokio::task::spawn_blocking(move || capture.stop()).await??;
    Ok(())
}

fn draw(state: &PublishedState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(state)?);
    } else if state.active {
        println!(
            "#{:<8} source at ({:6.1}, {:6.1})",
            state.sequence, state.position.x, state.position.y
        );
    } else {
        println!("#{:<8} quiet", state.sequence);
    }
    Ok(())
}
