// src/surface.rs

//! The rendering surface: owns the display, the group layouts and the
//! framebuffer, and turns the pixel buffer into a presented frame.
//!
//! Repaints happen on demand only. `request_repaint` just marks the surface
//! dirty, so any number of requests between two flushes cost one redraw.

use crate::color::Rgba;
use crate::display::{DisplayError, DisplayEvent, DisplayManager, RenderSnapshot};
use crate::layout::GroupLayout;
use crate::pixel_buffer::PixelBuffer;
use crate::rasterizer;
use anyhow::Result;
use log::*;

/// What the stream pipeline needs from whatever draws the LEDs.
pub trait RenderSurface {
    /// Ask for a redraw. Idempotent and cheap.
    fn request_repaint(&mut self);

    /// Viewport size changed.
    fn resize(&mut self, width_px: u32, height_px: u32);
}

pub struct RenderContext {
    display: DisplayManager,
    layouts: Vec<GroupLayout>,
    snapshot: Option<RenderSnapshot>,
    background: Rgba,
    needs_repaint: bool,
    presented_frames: u64,
}

impl RenderContext {
    pub fn new(display: DisplayManager, background: Rgba) -> Self {
        Self {
            display,
            layouts: Vec::new(),
            snapshot: None,
            background,
            needs_repaint: true,
            presented_frames: 0,
        }
    }

    pub fn set_layouts(&mut self, layouts: Vec<GroupLayout>) {
        self.layouts = layouts;
        self.needs_repaint = true;
    }

    pub fn layouts(&self) -> &[GroupLayout] {
        &self.layouts
    }

    pub fn set_title(&mut self, title: &str) -> Result<()> {
        self.display.set_title(title)
    }

    pub fn poll_events(&mut self) -> Result<Vec<DisplayEvent>> {
        self.display.poll_events()
    }

    pub fn needs_repaint(&self) -> bool {
        self.needs_repaint
    }

    /// Redraws only if something asked for it since the last flush.
    pub fn flush(&mut self, pixels: &PixelBuffer) -> Result<bool> {
        if !self.needs_repaint {
            return Ok(false);
        }
        self.repaint(pixels)?;
        Ok(true)
    }

    /// Rasterizes `pixels` through the layouts and presents the result.
    pub fn repaint(&mut self, pixels: &PixelBuffer) -> Result<()> {
        let mut snapshot = self.take_snapshot();
        rasterizer::rasterize(
            &self.layouts,
            pixels,
            self.background,
            &mut snapshot.framebuffer,
            snapshot.width_px,
            snapshot.height_px,
        );
        self.present(snapshot)
    }

    /// Fills the window with `color` and shows `message` as its title.
    pub fn show_error(&mut self, message: &str, color: Rgba) -> Result<()> {
        if let Err(e) = self.display.set_title(message) {
            warn!("RenderContext: Could not set error title: {:#}", e);
        }
        let mut snapshot = self.take_snapshot();
        rasterizer::clear(&mut snapshot.framebuffer, color);
        self.present(snapshot)
    }

    /// Last presented framebuffer (BGRX) and its size.
    pub fn framebuffer(&self) -> Option<(&[u8], u32, u32)> {
        self.snapshot
            .as_ref()
            .map(|s| (&s.framebuffer[..], s.width_px, s.height_px))
    }

    pub fn presented_frames(&self) -> u64 {
        self.presented_frames
    }

    /// Reuses the previous framebuffer when the window size still matches.
    fn take_snapshot(&mut self) -> RenderSnapshot {
        let metrics = self.display.metrics();
        match self.snapshot.take() {
            Some(snapshot)
                if snapshot.width_px == metrics.width_px
                    && snapshot.height_px == metrics.height_px =>
            {
                snapshot
            }
            _ => {
                debug!(
                    "RenderContext: Allocating {}x{} framebuffer",
                    metrics.width_px, metrics.height_px
                );
                let len = rasterizer::framebuffer_len(metrics.width_px, metrics.height_px);
                RenderSnapshot {
                    framebuffer: vec![0u8; len].into_boxed_slice(),
                    width_px: metrics.width_px,
                    height_px: metrics.height_px,
                }
            }
        }
    }

    fn present(&mut self, snapshot: RenderSnapshot) -> Result<()> {
        self.needs_repaint = false;
        match self.display.present(snapshot) {
            Ok(snapshot) => {
                self.presented_frames += 1;
                self.snapshot = Some(snapshot);
                Ok(())
            }
            Err(DisplayError::PresentationFailed(snapshot, reason)) => {
                warn!("RenderContext: Presentation failed: {}", reason);
                self.snapshot = Some(snapshot);
                Ok(())
            }
            Err(e) => Err(anyhow::anyhow!(e)),
        }
    }
}

impl RenderSurface for RenderContext {
    fn request_repaint(&mut self) {
        self.needs_repaint = true;
    }

    fn resize(&mut self, width_px: u32, height_px: u32) {
        debug!("RenderContext: Resize to {}x{}", width_px, height_px);
        // The display manager already tracks the new size; the framebuffer
        // is reallocated on the next repaint.
        self.needs_repaint = true;
    }
}
