// src/display/mod.rs
//! Message-based display system.
//!
//! - DisplayDriver: Platform-specific primitives (X11, headless)
//! - DisplayManager: Driver selection, init handshake and size tracking
//! - Messages: Request/Response protocol for communication

pub mod driver;
pub mod drivers;
pub mod manager;
pub mod messages;

pub use driver::DisplayDriver;
pub use manager::{DisplayManager, DisplayMetrics};
pub use messages::{
    DisplayError, DisplayEvent, DriverConfig, DriverRequest, DriverResponse, RenderSnapshot,
};
