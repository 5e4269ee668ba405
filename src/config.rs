// src/config.rs

//! Defines the configuration structures for the LED visualizer.
//!
//! The configuration is a JSON document whose path is given by the
//! `LEDVIZ_CONFIG` environment variable. Every section falls back to its
//! defaults when missing, so an empty object (or no file at all) is a valid
//! configuration.

use crate::color::Rgba;
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the path of the JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "LEDVIZ_CONFIG";
/// Overrides `source.settings_url`.
pub const SETTINGS_URL_ENV: &str = "LEDVIZ_SETTINGS_URL";
/// Overrides `source.stream_addr`.
pub const STREAM_ADDR_ENV: &str = "LEDVIZ_STREAM_ADDR";

/// Process-wide configuration, loaded on first access.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::load_or_default);

// --- Top-Level Configuration Structure ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Where the topology and the pixel stream come from.
    pub source: SourceConfig,
    /// Geometry of the light-group rectangles.
    pub layout: LayoutConfig,
    /// Window and colors.
    pub display: DisplayConfig,
    /// Event loop timing.
    pub performance: PerformanceConfig,
}

impl Config {
    /// Reads the file named by `LEDVIZ_CONFIG`, then applies the endpoint
    /// overrides. Any failure falls back to defaults with a warning.
    pub fn load_or_default() -> Self {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => match Self::from_file(Path::new(&path)) {
                Ok(config) => {
                    info!("Configuration loaded from {}", path);
                    config
                }
                Err(e) => {
                    warn!("Ignoring configuration file {}: {:#}", path, e);
                    Config::default()
                }
            },
            Err(_) => {
                info!("{} not set, using default configuration", CONFIG_PATH_ENV);
                Config::default()
            }
        };

        if let Ok(url) = std::env::var(SETTINGS_URL_ENV) {
            config.source.settings_url = url;
        }
        if let Ok(addr) = std::env::var(STREAM_ADDR_ENV) {
            config.source.stream_addr = addr;
        }
        config
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        use anyhow::Context;

        serde_json::from_str(text).context("Failed to parse configuration JSON")
    }
}

// --- Source Configuration ---

/// Byte layout of incoming stream frames.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    /// 4 bytes per LED, copied verbatim into the pixel buffer.
    #[default]
    Rgba,
    /// 3 bytes per LED, expanded to RGBA with opaque alpha.
    Rgb,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// Settings endpoint answering with a JSON body holding `device_config`.
    pub settings_url: String,
    /// `host:port` of the length-prefixed frame stream.
    pub stream_addr: String,
    /// Global timeout for the settings request.
    pub fetch_timeout_ms: u64,
    /// Delay before reconnecting a dropped stream. 0 disables reconnects.
    pub reconnect_delay_ms: u64,
    /// Upper bound on a single frame's declared length.
    pub max_frame_bytes: usize,
    pub frame_format: FrameFormat,
}

impl SourceConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn reconnect_delay(&self) -> Option<Duration> {
        (self.reconnect_delay_ms > 0).then(|| Duration::from_millis(self.reconnect_delay_ms))
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            settings_url: "http://127.0.0.1:5000/rest/settings".to_string(),
            stream_addr: "127.0.0.1:5001".to_string(),
            fetch_timeout_ms: 5000,
            reconnect_delay_ms: 1000,
            max_frame_bytes: 16 * 1024 * 1024,
            frame_format: FrameFormat::Rgba,
        }
    }
}

// --- Layout Configuration ---

/// Rectangle placement in normalized device coordinates ([-1, 1] on both axes).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width multiplier `k`: rectangle width is `k / groupCount`.
    /// Values above 1 let neighbours overlap slightly, below 1 leaves gaps.
    pub packing: f64,
    /// Rectangle height.
    pub rect_height: f64,
    /// Gap kept between the outermost rectangles and the viewport edge.
    pub margin: f64,
    /// Half-width of the visible span.
    pub span: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            packing: 1.3,
            rect_height: 1.8,
            margin: 0.07,
            span: 1.0,
        }
    }
}

// --- Display Configuration ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// X11 when compiled in and `DISPLAY` is set, headless otherwise.
    #[default]
    Auto,
    Headless,
    X11,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub driver: DriverKind,
    /// Initial window width.
    pub width_px: u32,
    /// Initial window height.
    pub height_px: u32,
    /// Window title prefix; the topology summary is appended.
    pub title: String,
    /// Clear color behind the rectangles.
    pub background: Rgba,
    /// Clear color of the error screen shown when startup fails.
    pub error_background: Rgba,
    /// How long the error screen stays up before the process exits.
    pub error_linger_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            driver: DriverKind::Auto,
            width_px: 1200,
            height_px: 800,
            title: "led-visualizer".to_string(),
            background: Rgba::BLACK,
            error_background: Rgba::rgb(96, 0, 0),
            error_linger_ms: 3000,
        }
    }
}

// --- Performance Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerformanceConfig {
    /// How long one event-loop cycle waits for a frame before polling
    /// window events again.
    pub poll_interval_ms: u64,
}

impl PerformanceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        PerformanceConfig {
            poll_interval_ms: 16,
        }
    }
}
