// src/display/messages.rs
//! Message types for communication between DisplayManager and DisplayDriver.
//!
//! All communication happens via ownership transfer: the framebuffer travels
//! to the driver inside `Present` and comes back inside `PresentComplete`
//! (or inside `DisplayError::PresentationFailed`).

use std::fmt;

/// Window parameters handed to the driver at `Init`.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    pub width_px: u32,
    pub height_px: u32,
    pub title: String,
}

/// A rasterized frame in BGRX byte order, `width_px * height_px * 4` bytes.
#[derive(Debug)]
pub struct RenderSnapshot {
    pub framebuffer: Box<[u8]>,
    pub width_px: u32,
    pub height_px: u32,
}

/// Requests sent from DisplayManager to DisplayDriver.
#[derive(Debug)]
pub enum DriverRequest {
    /// Create the window and report its actual size.
    Init(DriverConfig),

    /// Fetch pending native events.
    PollEvents,

    /// Display the snapshot and hand it back.
    Present(RenderSnapshot),

    /// Set the window title.
    SetTitle(String),
}

/// Responses sent from DisplayDriver to DisplayManager.
#[derive(Debug)]
pub enum DriverResponse {
    InitComplete { width_px: u32, height_px: u32 },

    Events(Vec<DisplayEvent>),

    /// Presentation done, snapshot returned for reuse.
    PresentComplete(RenderSnapshot),

    TitleSet,
}

/// Platform-agnostic display events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    /// Window size changed.
    Resize { width_px: u32, height_px: u32 },

    /// Window content was damaged and must be redrawn.
    Exposed,

    /// User asked to close the window.
    CloseRequested,
}

#[derive(Debug)]
pub enum DisplayError {
    /// Presentation failed; the snapshot is returned so its buffer is not lost.
    PresentationFailed(RenderSnapshot, String),

    /// Any other driver failure.
    Driver(anyhow::Error),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::PresentationFailed(_, reason) => {
                write!(f, "presentation failed: {}", reason)
            }
            DisplayError::Driver(e) => write!(f, "display driver error: {:#}", e),
        }
    }
}

impl std::error::Error for DisplayError {}

impl From<anyhow::Error> for DisplayError {
    fn from(e: anyhow::Error) -> Self {
        DisplayError::Driver(e)
    }
}
