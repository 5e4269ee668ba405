// src/orchestrator.rs
//! Orchestrates the visualization: window events, stream frames and repaints
//! all run on the one thread that owns the pixel buffer and the render
//! context, so the buffer is never shared and needs no locking.

use crate::applier::{StreamApplier, StreamStats};
use crate::config::Config;
use crate::display::DisplayEvent;
use crate::error::VisualizerError;
use crate::layout::compute_layouts;
use crate::pixel_buffer::PixelBuffer;
use crate::stream::StreamEvent;
use crate::surface::{RenderContext, RenderSurface};
use crate::topology::Topology;
use anyhow::{Context, Result};
use log::*;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::{Duration, Instant};

/// Represents the status of the orchestrator after one cycle.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OrchestratorStatus {
    /// Keep cycling.
    Running,
    /// The window was closed; the application should exit.
    Shutdown,
}

pub struct AppOrchestrator {
    context: RenderContext,
    applier: StreamApplier,
    stream_rx: Option<Receiver<StreamEvent>>,
    poll_interval: Duration,
}

impl AppOrchestrator {
    /// Startup once the topology fetch has finished.
    ///
    /// A failed fetch or resolution paints the error state, lingers, and
    /// returns the error: no geometry is built and no stream is started. An
    /// empty topology runs without a stream. Otherwise `spawn_stream` gets the
    /// sending half of the frame channel and its handle is returned alongside
    /// the orchestrator.
    pub fn start<S>(
        mut context: RenderContext,
        topology: Result<Topology, VisualizerError>,
        config: &Config,
        spawn_stream: impl FnOnce(Sender<StreamEvent>) -> Result<S>,
    ) -> Result<(Self, Option<S>)> {
        let topology = match topology {
            Ok(topology) => topology,
            Err(e) => {
                error!("Orchestrator: Startup aborted: {}", e);
                if let Err(paint_err) =
                    context.show_error(&e.to_string(), config.display.error_background)
                {
                    warn!("Orchestrator: Could not paint the error state: {:#}", paint_err);
                }
                std::thread::sleep(Duration::from_millis(config.display.error_linger_ms));
                return Err(e).context("Failed to load the device topology");
            }
        };

        let mut orchestrator = Self::build(context, &topology, config)?;
        if topology.is_empty() {
            warn!("Orchestrator: Topology has no LEDs; not subscribing to the pixel stream");
            return Ok((orchestrator, None));
        }

        let (stream_tx, stream_rx) = channel();
        let stream = spawn_stream(stream_tx).context("Failed to start the pixel stream")?;
        orchestrator.attach_stream(stream_rx);
        Ok((orchestrator, Some(stream)))
    }

    /// Sizes the pixel buffer and the geometry for `topology`, then paints
    /// the initial all-off frame. No stream is attached yet.
    pub fn build(mut context: RenderContext, topology: &Topology, config: &Config) -> Result<Self> {
        let layouts = compute_layouts(topology, &config.layout);
        info!(
            "Orchestrator: {} lights, {} LEDs, {} rectangles",
            topology.group_count(),
            topology.total_led_count(),
            layouts.len()
        );
        context.set_layouts(layouts);

        let title = format!(
            "{} - {} lights / {} LEDs",
            config.display.title,
            topology.group_count(),
            topology.total_led_count()
        );
        if let Err(e) = context.set_title(&title) {
            warn!("Orchestrator: Could not set window title: {:#}", e);
        }

        let buffer = PixelBuffer::new(topology.total_led_count())?;
        let applier = StreamApplier::new(buffer, config.source.frame_format);
        context
            .repaint(applier.buffer())
            .context("Failed to paint the initial frame")?;

        Ok(Self {
            context,
            applier,
            stream_rx: None,
            poll_interval: config.performance.poll_interval(),
        })
    }

    /// Starts consuming `stream_rx`. Subscribed once; never detached while
    /// the sender side is alive.
    pub fn attach_stream(&mut self, stream_rx: Receiver<StreamEvent>) {
        info!(
            "Orchestrator: Stream attached, expecting {}-byte frames",
            self.applier.expected_frame_len()
        );
        self.stream_rx = Some(stream_rx);
    }

    pub fn is_streaming(&self) -> bool {
        self.stream_rx.is_some()
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn pixels(&self) -> &PixelBuffer {
        self.applier.buffer()
    }

    pub fn stats(&self) -> StreamStats {
        self.applier.stats()
    }

    /// One turn of the event loop.
    ///
    /// Polls window events, waits up to the poll interval for a stream event,
    /// then drains whatever else is queued for at most another poll interval.
    /// Every frame is applied in receipt order; the surface is repainted at
    /// most once per cycle. Frames still queued wait for the next cycle.
    pub fn process_event_cycle(&mut self) -> Result<OrchestratorStatus> {
        for event in self.context.poll_events()? {
            if self.handle_display_event(event) == OrchestratorStatus::Shutdown {
                return Ok(OrchestratorStatus::Shutdown);
            }
        }

        if let Some(stream_rx) = self.stream_rx.take() {
            let keep = self.drain_stream(&stream_rx);
            if keep {
                self.stream_rx = Some(stream_rx);
            }
        } else {
            std::thread::sleep(self.poll_interval);
        }

        self.context.flush(self.applier.buffer())?;
        Ok(OrchestratorStatus::Running)
    }

    fn handle_display_event(&mut self, event: DisplayEvent) -> OrchestratorStatus {
        match event {
            DisplayEvent::CloseRequested => {
                info!("Orchestrator: Close requested");
                return OrchestratorStatus::Shutdown;
            }
            DisplayEvent::Resize {
                width_px,
                height_px,
            } => self.context.resize(width_px, height_px),
            DisplayEvent::Exposed => self.context.request_repaint(),
        }
        OrchestratorStatus::Running
    }

    /// Returns `false` once the stream's sender side is gone.
    fn drain_stream(&mut self, stream_rx: &Receiver<StreamEvent>) -> bool {
        match stream_rx.recv_timeout(self.poll_interval) {
            Ok(event) => self.handle_stream_event(event),
            Err(RecvTimeoutError::Timeout) => return true,
            Err(RecvTimeoutError::Disconnected) => {
                info!("Orchestrator: Stream closed, keeping last frame on screen");
                return false;
            }
        }

        // A producer that keeps the channel full must not starve window
        // events and repaints.
        let deadline = Instant::now() + self.poll_interval;
        while Instant::now() < deadline {
            match stream_rx.try_recv() {
                Ok(event) => self.handle_stream_event(event),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => {
                    info!("Orchestrator: Stream closed, keeping last frame on screen");
                    return false;
                }
            }
        }
        trace!("Orchestrator: Drain deadline reached with frames still queued");
        true
    }

    fn handle_stream_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Frame(frame) => {
                if let Err(e) = self.applier.on_frame(&frame, &mut self.context) {
                    let stats = self.applier.stats();
                    warn!(
                        "Orchestrator: Dropped frame: {} ({} dropped / {} applied)",
                        e, stats.dropped, stats.applied
                    );
                } else {
                    trace!("Orchestrator: Applied {}-byte frame", frame.len());
                }
            }
            StreamEvent::Connected(peer) => info!("Orchestrator: Streaming from {}", peer),
            StreamEvent::Disconnected(reason) => {
                warn!("Orchestrator: Stream interrupted ({}), display holds last frame", reason)
            }
        }
    }
}
