//! Signallock - a puzzle prop that hides a recording under noise
//!
//! Two potentiometers tune the noise away; hold both on target long enough
//! and the clean audio locks in and the prop reports completion.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossbeam::channel::{bounded, Receiver};
use parking_lot::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use signallock::audio::{
    bounce, supervise, RenderEngine, SignalBuffers, SolvedNotice, StreamFormat,
};
use signallock::bus::MqttBus;
use signallock::cli::Args;
use signallock::gateway::{run_status_loop, Gateway};
use signallock::params::PropConfig;
use signallock::session::SharedState;

/// Pending solve notices between the render and status threads
const NOTICE_CAPACITY: usize = 4;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log)),
        )
        .with_target(false)
        .init();

    info!("Signallock starting");

    let config = args.prop_config().context("Invalid command-line value")?;
    config.validate().context("Invalid configuration")?;

    let buffers = Arc::new(
        SignalBuffers::load(&config.asset, &config.noise).context("Could not load audio asset")?,
    );
    let format = StreamFormat::for_buffers(&buffers, &config.stream);

    let shared = Arc::new(SharedState::new());
    let (notice_tx, notice_rx) = bounded(NOTICE_CAPACITY);
    let mut engine = RenderEngine::new(
        Arc::clone(&buffers),
        Arc::clone(&shared),
        &config.puzzle,
        notice_tx,
    )
    .context("Invalid puzzle configuration")?;

    if let Some(path) = &args.bounce {
        shared.store_reading(args.bounce_reading(&config)?);
        shared.start();
        let summary = bounce(&mut engine, format, args.bounce_secs, path)?;
        match summary.solved_at_secs {
            Some(at) => info!("Solved at {:.2}s", at),
            None => info!("Not solved within {:.1}s", args.bounce_secs),
        }
        return Ok(());
    }

    run_live(config, shared, engine, format, notice_rx)
}

/// Connect to the broker and keep the output stream in step with the session
fn run_live(
    config: PropConfig,
    shared: Arc<SharedState>,
    engine: RenderEngine,
    format: StreamFormat,
    notice_rx: Receiver<SolvedNotice>,
) -> anyhow::Result<()> {
    let (bus, mut connection) = MqttBus::connect(&config.bus);
    let gateway = Gateway::new(
        Arc::clone(&shared),
        config.bus.topics.clone(),
        config.puzzle.full_scale,
    );
    let reconnect_delay = Duration::from_millis(config.bus.reconnect_delay_ms);

    let event_bus = bus.clone();
    thread::Builder::new()
        .name("mqtt".to_string())
        .spawn(move || event_bus.run(&mut connection, &gateway, reconnect_delay))
        .context("Could not spawn MQTT thread")?;

    let status_shared = Arc::clone(&shared);
    thread::Builder::new()
        .name("status".to_string())
        .spawn(move || {
            run_status_loop(&status_shared, notice_rx, &bus);
            error!("Status channel closed");
        })
        .context("Could not spawn status thread")?;

    info!("Waiting for start command");
    supervise(
        &shared,
        Arc::new(Mutex::new(engine)),
        format,
        Duration::from_millis(config.stream.supervise_interval_ms),
    );

    Ok(())
}
