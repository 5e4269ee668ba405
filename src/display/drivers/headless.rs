//! Headless display driver: no window, frames are accepted and handed back.
//!
//! Used when no window system is available and as the scripted surface in
//! tests.

use crate::display::driver::DisplayDriver;
use crate::display::messages::{DisplayError, DisplayEvent, DriverRequest, DriverResponse};
use anyhow::Result;
use log::{info, trace};
use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct HeadlessDisplayDriver {
    width_px: u32,
    height_px: u32,
    pending_events: VecDeque<DisplayEvent>,
    presented_frames: u64,
}

impl HeadlessDisplayDriver {
    /// Driver that reports `events` on the next `PollEvents`.
    pub fn with_events(events: impl IntoIterator<Item = DisplayEvent>) -> Self {
        Self {
            pending_events: events.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl DisplayDriver for HeadlessDisplayDriver {
    fn new() -> Result<Self> {
        info!("HeadlessDisplayDriver::new()");
        Ok(Self::default())
    }

    fn handle_request(&mut self, request: DriverRequest) -> Result<DriverResponse, DisplayError> {
        match request {
            DriverRequest::Init(config) => {
                info!(
                    "HeadlessDisplayDriver: Init {}x{} '{}'",
                    config.width_px, config.height_px, config.title
                );
                self.width_px = config.width_px;
                self.height_px = config.height_px;
                Ok(DriverResponse::InitComplete {
                    width_px: self.width_px,
                    height_px: self.height_px,
                })
            }
            DriverRequest::PollEvents => {
                let events: Vec<DisplayEvent> = self.pending_events.drain(..).collect();
                for event in &events {
                    if let DisplayEvent::Resize {
                        width_px,
                        height_px,
                    } = event
                    {
                        self.width_px = *width_px;
                        self.height_px = *height_px;
                    }
                }
                Ok(DriverResponse::Events(events))
            }
            DriverRequest::Present(snapshot) => {
                self.presented_frames += 1;
                trace!(
                    "HeadlessDisplayDriver: Present #{} ({}x{})",
                    self.presented_frames,
                    snapshot.width_px,
                    snapshot.height_px
                );
                Ok(DriverResponse::PresentComplete(snapshot))
            }
            DriverRequest::SetTitle(title) => {
                info!("HeadlessDisplayDriver: SetTitle '{}'", title);
                Ok(DriverResponse::TitleSet)
            }
        }
    }
}
