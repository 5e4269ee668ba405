// In src/main.rs

// Declare modules
pub mod applier;
pub mod color;
pub mod config;
pub mod display;
pub mod error;
pub mod layout;
pub mod orchestrator;
pub mod pixel_buffer;
pub mod rasterizer;
pub mod settings;
pub mod stream;
pub mod surface;
pub mod topology;

use crate::{
    config::{SourceConfig, CONFIG},
    display::DisplayManager,
    error::VisualizerError,
    orchestrator::{AppOrchestrator, OrchestratorStatus},
    settings::fetch_settings,
    stream::{StreamActor, StreamSettings},
    surface::RenderContext,
    topology::Topology,
};

use anyhow::Context;
use log::{error, info};

/// Main entry point for the `led-visualizer` application.
fn main() -> anyhow::Result<()> {
    // Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting led-visualizer...");
    let config = &*CONFIG;

    let display =
        DisplayManager::from_config(&config.display).context("Failed to initialize display")?;
    let context = RenderContext::new(display, config.display.background);

    // Nothing is drawn and no stream is opened until the topology is known.
    let stream_settings = StreamSettings {
        addr: config.source.stream_addr.clone(),
        max_frame_bytes: config.source.max_frame_bytes,
        reconnect_delay: config.source.reconnect_delay(),
    };
    let (mut orchestrator, _stream_actor) = AppOrchestrator::start(
        context,
        load_topology(&config.source),
        config,
        |stream_tx| StreamActor::spawn(stream_settings, stream_tx),
    )?;

    info!("Starting main event loop...");
    loop {
        match orchestrator.process_event_cycle() {
            Ok(OrchestratorStatus::Running) => {}
            Ok(OrchestratorStatus::Shutdown) => {
                info!("Orchestrator requested shutdown.");
                break;
            }
            Err(e) => {
                error!("Error in event cycle: {:#}", e);
                return Err(e);
            }
        }
    }

    let stats = orchestrator.stats();
    info!(
        "led-visualizer exiting: {} frames applied, {} dropped, {} repaints",
        stats.applied,
        stats.dropped,
        orchestrator.context().presented_frames()
    );
    Ok(())
}

fn load_topology(source: &SourceConfig) -> Result<Topology, VisualizerError> {
    let settings = fetch_settings(&source.settings_url, source.fetch_timeout())?;
    let topology = topology::resolve(&settings.device_config)?;
    info!(
        "Resolved {} lights with {} LEDs: {:?}",
        topology.group_count(),
        topology.total_led_count(),
        topology.led_counts()
    );
    Ok(topology)
}
