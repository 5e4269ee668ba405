// src/display/driver.rs
//! DisplayDriver trait - minimal interface for platform-specific display primitives.
//!
//! This trait defines the minimal set of platform-specific operations required
//! to put the visualization on screen. Layout and rasterization live above it.
//!
//! ## Lifecycle
//! 1. `new()` - Connect to the window system, nothing visible yet
//! 2. `handle_request(Init)` - Create/map the window, report its size
//! 3. Request/response loop - All operations via messages
//! 4. `Drop` - Cleanup (no explicit shutdown message)

use crate::display::messages::{DisplayError, DriverRequest, DriverResponse};
use anyhow::Result;

pub trait DisplayDriver {
    fn new() -> Result<Self>
    where
        Self: Sized;

    /// Handle a request from DisplayManager, returning a response.
    ///
    /// ## Request/Response Pairs
    /// - `Init(config)` → `InitComplete`
    /// - `PollEvents` → `Events`
    /// - `Present(snapshot)` → `PresentComplete(snapshot)`
    /// - `SetTitle(s)` → `TitleSet`
    ///
    /// A failed `Present` returns the snapshot through
    /// `DisplayError::PresentationFailed`.
    fn handle_request(&mut self, request: DriverRequest) -> Result<DriverResponse, DisplayError>;
}
