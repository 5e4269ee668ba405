// src/color.rs

//! Pixel color types shared by the LED buffer and the framebuffer.

use serde::{Deserialize, Serialize};

/// Bytes per LED in the pixel buffer (RGBA).
pub const RGBA_BYTES: usize = 4;

/// Bytes per LED in an RGB stream frame.
pub const RGB_BYTES: usize = 3;

/// Bytes per pixel in the display framebuffer (BGRX).
pub const FRAMEBUFFER_BYTES_PER_PIXEL: usize = 4;

/// One LED color as stored in the pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);

    /// Opaque color from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 0xFF }
    }

    pub fn from_bytes(bytes: [u8; RGBA_BYTES]) -> Self {
        Rgba {
            r: bytes[0],
            g: bytes[1],
            b: bytes[2],
            a: bytes[3],
        }
    }

    pub fn to_bytes(self) -> [u8; RGBA_BYTES] {
        [self.r, self.g, self.b, self.a]
    }

    /// Framebuffer byte order. Alpha is not composited; the X byte is 0xFF.
    pub fn to_bgrx(self) -> [u8; FRAMEBUFFER_BYTES_PER_PIXEL] {
        [self.b, self.g, self.r, 0xFF]
    }

    /// Inverse of [`Rgba::to_bgrx`]; alpha comes back opaque.
    pub fn from_bgrx(bytes: [u8; FRAMEBUFFER_BYTES_PER_PIXEL]) -> Self {
        Rgba::rgb(bytes[2], bytes[1], bytes[0])
    }
}
