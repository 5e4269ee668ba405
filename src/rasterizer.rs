// src/rasterizer.rs

//! Software rasterizer: light-group rectangles into a BGRX framebuffer.
//!
//! Normalized device coordinates map onto the framebuffer with y up:
//! `x_px = (x + 1) / 2 * width`, `y_px = (1 - y) / 2 * height`. A pixel is
//! covered when its center lies inside the rectangle.
//!
//! Inside a rectangle the top edge samples `u_start` and the bottom edge
//! samples `u_end`, so LED index grows downwards. Sampling is
//! nearest-neighbour and clamped to the group's own LED range, which keeps a
//! group from ever bleeding into its neighbour's pixels.

use crate::color::{Rgba, FRAMEBUFFER_BYTES_PER_PIXEL};
use crate::layout::{GroupLayout, NdcRect};
use crate::pixel_buffer::PixelBuffer;
use std::ops::Range;

pub fn framebuffer_len(width_px: u32, height_px: u32) -> usize {
    width_px as usize * height_px as usize * FRAMEBUFFER_BYTES_PER_PIXEL
}

/// Fills the whole framebuffer with one color.
pub fn clear(framebuffer: &mut [u8], color: Rgba) {
    let bgrx = color.to_bgrx();
    for pixel in framebuffer.chunks_exact_mut(FRAMEBUFFER_BYTES_PER_PIXEL) {
        pixel.copy_from_slice(&bgrx);
    }
}

/// Clears to `background`, then draws every group in order; later groups
/// cover earlier ones where rectangles overlap.
pub fn rasterize(
    layouts: &[GroupLayout],
    pixels: &PixelBuffer,
    background: Rgba,
    framebuffer: &mut [u8],
    width_px: u32,
    height_px: u32,
) {
    debug_assert_eq!(framebuffer.len(), framebuffer_len(width_px, height_px));
    clear(framebuffer, background);

    for layout in layouts {
        draw_group(layout, pixels, framebuffer, width_px, height_px);
    }
}

fn draw_group(
    layout: &GroupLayout,
    pixels: &PixelBuffer,
    framebuffer: &mut [u8],
    width_px: u32,
    height_px: u32,
) {
    if layout.led_count == 0 {
        return;
    }

    let (columns, rows, top_px, height_span_px) = pixel_bounds(&layout.rect, width_px, height_px);
    if columns.is_empty() || rows.is_empty() || height_span_px <= 0.0 {
        return;
    }

    let stride = width_px as usize * FRAMEBUFFER_BYTES_PER_PIXEL;
    for y in rows {
        let t = ((y as f64 + 0.5) - top_px) / height_span_px;
        let led = led_for_row(layout, t);
        let color = pixels.pixel(led).unwrap_or(Rgba::BLACK).to_bgrx();

        let row_start = y * stride;
        let span = &mut framebuffer[row_start + columns.start * FRAMEBUFFER_BYTES_PER_PIXEL
            ..row_start + columns.end * FRAMEBUFFER_BYTES_PER_PIXEL];
        for pixel in span.chunks_exact_mut(FRAMEBUFFER_BYTES_PER_PIXEL) {
            pixel.copy_from_slice(&color);
        }
    }
}

/// LED sampled at fraction `t` (0 = top edge, 1 = bottom edge) of a group.
pub fn led_for_row(layout: &GroupLayout, t: f64) -> usize {
    let last = layout.led_count.saturating_sub(1);
    let local = (t.clamp(0.0, 1.0) * layout.led_count as f64).floor() as usize;
    layout.pixel_offset + local.min(last)
}

/// Covered columns and rows, plus the rectangle's top edge and height in
/// pixel units.
fn pixel_bounds(
    rect: &NdcRect,
    width_px: u32,
    height_px: u32,
) -> (Range<usize>, Range<usize>, f64, f64) {
    let to_x = |x: f64| (x + 1.0) / 2.0 * width_px as f64;
    let to_y = |y: f64| (1.0 - y) / 2.0 * height_px as f64;

    let left_px = to_x(rect.left());
    let right_px = to_x(rect.right());
    let top_px = to_y(rect.top());
    let bottom_px = to_y(rect.bottom());

    let columns = covered(left_px, right_px, width_px);
    let rows = covered(top_px, bottom_px, height_px);
    (columns, rows, top_px, bottom_px - top_px)
}

/// Pixel indices whose centers fall in `[from, to)`, clipped to `[0, limit)`.
fn covered(from: f64, to: f64, limit: u32) -> Range<usize> {
    let clip = |v: f64| (v - 0.5).ceil().clamp(0.0, limit as f64) as usize;
    clip(from)..clip(to)
}

/// Color of the framebuffer pixel at `(x, y)`.
pub fn sample(framebuffer: &[u8], width_px: u32, x: u32, y: u32) -> Option<Rgba> {
    let start = (y as usize * width_px as usize + x as usize) * FRAMEBUFFER_BYTES_PER_PIXEL;
    let bytes = framebuffer.get(start..start + FRAMEBUFFER_BYTES_PER_PIXEL)?;
    Some(Rgba::from_bgrx([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
