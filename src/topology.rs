// src/topology.rs

//! Resolves the device configuration into a flat list of light groups.
//!
//! A device entry stands for `n_lights` identical strips of `n_leds` LEDs
//! each. Resolution expands every entry into one group per strip, keeping
//! declaration order: that order fixes both the left-to-right screen slot and
//! the pixel offset of each group.

use crate::error::VisualizerError;
use crate::pixel_buffer::MAX_LED_COUNT;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Range;

/// One `device_config` entry as sent by the settings endpoint.
///
/// The counts are kept as raw JSON values so that negative or fractional
/// numbers can be reported as an invalid topology instead of a parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub n_lights: Value,
    pub n_leds: Value,
}

impl DeviceEntry {
    pub fn new(n_lights: u64, n_leds: u64) -> Self {
        DeviceEntry {
            n_lights: Value::from(n_lights),
            n_leds: Value::from(n_leds),
        }
    }
}

/// Ordered LED counts, one per light group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    led_counts: Vec<usize>,
    total_led_count: usize,
}

const NOT_A_COUNT: &str = "is not a non-negative integer";
const TOO_LARGE: &str = "makes the topology too large to allocate";

impl Topology {
    #[cfg(test)]
    pub fn from_led_counts(led_counts: Vec<usize>) -> Self {
        let total_led_count = led_counts.iter().sum();
        Topology {
            led_counts,
            total_led_count,
        }
    }

    pub fn led_counts(&self) -> &[usize] {
        &self.led_counts
    }

    pub fn group_count(&self) -> usize {
        self.led_counts.len()
    }

    pub fn total_led_count(&self) -> usize {
        self.total_led_count
    }

    /// Nothing to render: no groups, or only zero-LED groups.
    pub fn is_empty(&self) -> bool {
        self.total_led_count == 0
    }

    /// Half-open pixel index range of every group, in topology order.
    pub fn pixel_ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.led_counts.iter().scan(0usize, |offset, &count| {
            let start = *offset;
            *offset += count;
            Some(start..*offset)
        })
    }
}

/// Expands device entries into one group per light.
///
/// Totals are checked before any group is allocated: a configuration whose
/// LEDs would not fit in a pixel buffer is rejected as invalid.
pub fn resolve(device_config: &[DeviceEntry]) -> Result<Topology, VisualizerError> {
    let mut counts = Vec::with_capacity(device_config.len());
    let mut group_count: usize = 0;
    let mut total_led_count: usize = 0;
    for (index, entry) in device_config.iter().enumerate() {
        let n_lights = count_field(index, "n_lights", &entry.n_lights)?;
        let n_leds = count_field(index, "n_leds", &entry.n_leds)?;

        group_count = group_count
            .checked_add(n_lights)
            .ok_or_else(|| invalid(index, "n_lights", &entry.n_lights, TOO_LARGE))?;
        total_led_count = n_lights
            .checked_mul(n_leds)
            .and_then(|leds| total_led_count.checked_add(leds))
            .filter(|&total| total <= MAX_LED_COUNT)
            .ok_or_else(|| invalid(index, "n_leds", &entry.n_leds, TOO_LARGE))?;
        counts.push((n_lights, n_leds));
    }

    let mut led_counts: Vec<usize> = Vec::new();
    for (index, (n_lights, n_leds)) in counts.into_iter().enumerate() {
        led_counts
            .try_reserve(n_lights)
            .map_err(|_| invalid(index, "n_lights", &device_config[index].n_lights, TOO_LARGE))?;
        led_counts.extend(std::iter::repeat(n_leds).take(n_lights));
    }
    Ok(Topology {
        led_counts,
        total_led_count,
    })
}

fn invalid(entry: usize, field: &'static str, value: &Value, reason: &'static str) -> VisualizerError {
    VisualizerError::InvalidTopology {
        entry,
        field,
        value: value.to_string(),
        reason,
    }
}

/// Accepts non-negative integers, including integral floats such as `3.0`.
fn count_field(entry: usize, field: &'static str, value: &Value) -> Result<usize, VisualizerError> {
    let not_a_count = || invalid(entry, field, value, NOT_A_COUNT);

    let number = match value {
        Value::Number(number) => number,
        _ => return Err(not_a_count()),
    };
    if let Some(n) = number.as_u64() {
        return usize::try_from(n).map_err(|_| invalid(entry, field, value, TOO_LARGE));
    }
    match number.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => {
            if f < usize::MAX as f64 {
                Ok(f as usize)
            } else {
                Err(invalid(entry, field, value, TOO_LARGE))
            }
        }
        _ => Err(not_a_count()),
    }
}

#[cfg(test)]
mod tests;
