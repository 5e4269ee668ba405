// src/layout.rs

//! Screen placement of the light-group rectangles.
//!
//! Every group gets one rectangle in normalized device coordinates
//! ([-1, 1] on both axes, y up) and the slice of the shared pixel buffer it
//! samples, expressed both as a half-open LED range and as the equivalent
//! normalized UV range. Rectangles are spread evenly left to right in
//! topology order.

use crate::config::LayoutConfig;
use crate::topology::Topology;
use std::ops::Range;

/// Axis-aligned rectangle in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NdcRect {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

impl NdcRect {
    pub fn left(&self) -> f64 {
        self.center_x - self.width / 2.0
    }

    pub fn right(&self) -> f64 {
        self.center_x + self.width / 2.0
    }

    pub fn top(&self) -> f64 {
        self.center_y + self.height / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.center_y - self.height / 2.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupLayout {
    /// First LED of the group in the pixel buffer.
    pub pixel_offset: usize,
    pub led_count: usize,
    /// `pixel_offset / total`.
    pub u_start: f64,
    /// `(pixel_offset + led_count) / total`.
    pub u_end: f64,
    pub rect: NdcRect,
}

impl GroupLayout {
    pub fn pixel_range(&self) -> Range<usize> {
        self.pixel_offset..self.pixel_offset + self.led_count
    }
}

/// `num` evenly spaced values from `start` to `end` inclusive.
///
/// A single point yields the midpoint, so a lone rectangle sits centered.
pub fn linspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![(start + end) / 2.0],
        _ => {
            let step = (end - start) / (num - 1) as f64;
            (0..num).map(|i| start + i as f64 * step).collect()
        }
    }
}

/// One layout per group. An empty topology (no LEDs at all) yields nothing.
pub fn compute_layouts(topology: &Topology, config: &LayoutConfig) -> Vec<GroupLayout> {
    let total = topology.total_led_count();
    if total == 0 {
        return Vec::new();
    }

    let group_count = topology.group_count();
    let width = config.packing / group_count as f64;
    let spread = config.span - width / 2.0 - config.margin;
    let centers = linspace(-spread, spread, group_count);

    topology
        .pixel_ranges()
        .zip(centers)
        .map(|(range, center_x)| GroupLayout {
            pixel_offset: range.start,
            led_count: range.len(),
            u_start: range.start as f64 / total as f64,
            u_end: range.end as f64 / total as f64,
            rect: NdcRect {
                center_x,
                center_y: 0.0,
                width,
                height: config.rect_height,
            },
        })
        .collect()
}
