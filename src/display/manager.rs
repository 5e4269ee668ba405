// src/display/manager.rs
//! DisplayManager - Synchronous wrapper around DisplayDriver.

use crate::config::{DisplayConfig, DriverKind};
use crate::display::driver::DisplayDriver;
use crate::display::drivers::HeadlessDisplayDriver;
use crate::display::messages::{
    DisplayError, DisplayEvent, DriverConfig, DriverRequest, DriverResponse, RenderSnapshot,
};
use anyhow::{Context, Result};
use log::{info, warn};

/// Window size as last reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMetrics {
    pub width_px: u32,
    pub height_px: u32,
}

pub struct DisplayManager {
    driver: Box<dyn DisplayDriver>,
    metrics: DisplayMetrics,
}

impl DisplayManager {
    /// Picks the driver named by `config.driver` and initializes it.
    pub fn from_config(config: &DisplayConfig) -> Result<Self> {
        let driver = Self::create_driver(config.driver)?;
        Self::new(
            driver,
            DriverConfig {
                width_px: config.width_px,
                height_px: config.height_px,
                title: config.title.clone(),
            },
        )
    }

    fn create_driver(kind: DriverKind) -> Result<Box<dyn DisplayDriver>> {
        match kind {
            DriverKind::Headless => {
                info!("DisplayManager: Creating HeadlessDisplayDriver...");
                Ok(Box::new(HeadlessDisplayDriver::new()?))
            }
            #[cfg(feature = "x11")]
            DriverKind::X11 => {
                use crate::display::drivers::X11DisplayDriver;

                info!("DisplayManager: Creating X11DisplayDriver...");
                Ok(Box::new(X11DisplayDriver::new()?))
            }
            #[cfg(not(feature = "x11"))]
            DriverKind::X11 => Err(anyhow::anyhow!(
                "X11 display requested but this build has no `x11` feature"
            )),
            DriverKind::Auto => {
                let has_x11 = cfg!(feature = "x11");
                let kind = resolve_auto(has_x11, std::env::var_os("DISPLAY").is_some());
                if kind == DriverKind::Headless {
                    if has_x11 {
                        warn!("DisplayManager: DISPLAY is not set, running headless; nothing will appear on screen");
                    } else {
                        warn!("DisplayManager: Built without the `x11` feature, running headless; rebuild with `--features x11` for a window");
                    }
                }
                Self::create_driver(kind)
            }
        }
    }

    /// Runs the `Init` handshake on an already constructed driver.
    pub fn new(mut driver: Box<dyn DisplayDriver>, config: DriverConfig) -> Result<Self> {
        info!("DisplayManager: Initializing driver...");
        let response = driver
            .handle_request(DriverRequest::Init(config))
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to initialize display driver")?;

        let metrics = match response {
            DriverResponse::InitComplete {
                width_px,
                height_px,
            } => {
                info!("DisplayManager: Initialized - {}x{} px", width_px, height_px);
                DisplayMetrics {
                    width_px,
                    height_px,
                }
            }
            other => {
                return Err(anyhow::anyhow!(
                    "Expected InitComplete response, got {:?}",
                    other
                ));
            }
        };

        Ok(Self { driver, metrics })
    }

    /// Pending window events. Resize events also update the tracked metrics.
    pub fn poll_events(&mut self) -> Result<Vec<DisplayEvent>> {
        match self.request(DriverRequest::PollEvents)? {
            DriverResponse::Events(events) => {
                for event in &events {
                    if let DisplayEvent::Resize {
                        width_px,
                        height_px,
                    } = *event
                    {
                        self.metrics = DisplayMetrics {
                            width_px,
                            height_px,
                        };
                    }
                }
                Ok(events)
            }
            other => Err(anyhow::anyhow!("Expected Events response, got {:?}", other)),
        }
    }

    /// Presents a frame. The snapshot comes back on success and inside
    /// `DisplayError::PresentationFailed` on failure.
    pub fn present(&mut self, snapshot: RenderSnapshot) -> Result<RenderSnapshot, DisplayError> {
        match self.driver.handle_request(DriverRequest::Present(snapshot))? {
            DriverResponse::PresentComplete(snapshot) => Ok(snapshot),
            other => Err(DisplayError::Driver(anyhow::anyhow!(
                "Expected PresentComplete response, got {:?}",
                other
            ))),
        }
    }

    pub fn set_title(&mut self, title: &str) -> Result<()> {
        match self.request(DriverRequest::SetTitle(title.to_string()))? {
            DriverResponse::TitleSet => Ok(()),
            other => Err(anyhow::anyhow!("Expected TitleSet response, got {:?}", other)),
        }
    }

    fn request(&mut self, request: DriverRequest) -> Result<DriverResponse> {
        self.driver
            .handle_request(request)
            .map_err(|e| anyhow::anyhow!(e))
    }

    pub fn metrics(&self) -> DisplayMetrics {
        self.metrics
    }
}

/// Driver `Auto` stands for, given the build and the environment.
fn resolve_auto(has_x11: bool, has_display: bool) -> DriverKind {
    if has_x11 && has_display {
        DriverKind::X11
    } else {
        DriverKind::Headless
    }
}
