// src/pixel_buffer.rs

//! Concatenated RGBA state of every LED, in topology order.
//!
//! Pixel `p` is the `p`-th LED when all groups are laid end to end. The
//! buffer is allocated once and never resized; frames replace its content
//! wholesale.

use crate::color::{Rgba, RGBA_BYTES, RGB_BYTES};
use crate::error::VisualizerError;

/// Most LEDs a buffer can address: its byte length must fit in `isize`.
pub const MAX_LED_COUNT: usize = isize::MAX as usize / RGBA_BYTES;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    bytes: Box<[u8]>,
}

impl PixelBuffer {
    /// All LEDs start off (zeroed).
    pub fn new(led_count: usize) -> Result<Self, VisualizerError> {
        let len = led_count
            .checked_mul(RGBA_BYTES)
            .filter(|_| led_count <= MAX_LED_COUNT)
            .ok_or(VisualizerError::BufferTooLarge { led_count })?;
        Ok(PixelBuffer {
            bytes: vec![0u8; len].into_boxed_slice(),
        })
    }

    pub fn led_count(&self) -> usize {
        self.bytes.len() / RGBA_BYTES
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Replaces the whole content with `frame`. A frame of any other length
    /// is rejected and the buffer is left untouched.
    pub fn apply(&mut self, frame: &[u8]) -> Result<(), VisualizerError> {
        if frame.len() != self.bytes.len() {
            return Err(VisualizerError::FrameSizeMismatch {
                expected: self.bytes.len(),
                actual: frame.len(),
            });
        }
        self.bytes.copy_from_slice(frame);
        Ok(())
    }

    /// Like [`PixelBuffer::apply`] for 3-byte RGB frames; alpha is set opaque.
    pub fn apply_rgb(&mut self, frame: &[u8]) -> Result<(), VisualizerError> {
        let expected = self.led_count() * RGB_BYTES;
        if frame.len() != expected {
            return Err(VisualizerError::FrameSizeMismatch {
                expected,
                actual: frame.len(),
            });
        }
        for (dst, src) in self
            .bytes
            .chunks_exact_mut(RGBA_BYTES)
            .zip(frame.chunks_exact(RGB_BYTES))
        {
            dst[..RGB_BYTES].copy_from_slice(src);
            dst[RGB_BYTES] = 0xFF;
        }
        Ok(())
    }

    pub fn pixel(&self, index: usize) -> Option<Rgba> {
        let range = Self::byte_range(index)?;
        let bytes = self.bytes.get(range)?;
        Some(Rgba::from_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Returns `false` when `index` is out of range.
    pub fn set_pixel(&mut self, index: usize, color: Rgba) -> bool {
        let Some(range) = Self::byte_range(index) else {
            return false;
        };
        match self.bytes.get_mut(range) {
            Some(slot) => {
                slot.copy_from_slice(&color.to_bytes());
                true
            }
            None => false,
        }
    }

    fn byte_range(index: usize) -> Option<std::ops::Range<usize>> {
        let start = index.checked_mul(RGBA_BYTES)?;
        Some(start..start.checked_add(RGBA_BYTES)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn it_should_start_zeroed() {
        let buffer = PixelBuffer::new(6).unwrap();
        assert_eq!(buffer.len(), 24);
        assert_eq!(buffer.led_count(), 6);
        assert!(buffer.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn it_should_allocate_nothing_for_zero_leds() {
        let buffer = PixelBuffer::new(0).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.pixel(0), None);
    }

    #[test]
    fn it_should_copy_a_correctly_sized_frame() -> Result<(), VisualizerError> {
        let mut buffer = PixelBuffer::new(3)?;
        let frame: Vec<u8> = (0..12).collect();
        buffer.apply(&frame)?;
        assert_eq!(buffer.as_bytes(), frame.as_slice());
        assert_eq!(
            buffer.pixel(1),
            Some(Rgba {
                r: 4,
                g: 5,
                b: 6,
                a: 7
            })
        );
        Ok(())
    }

    #[test]
    fn it_should_leave_the_buffer_unchanged_on_size_mismatch() -> Result<(), VisualizerError> {
        let mut buffer = PixelBuffer::new(2)?;
        buffer.apply(&[7u8; 8])?;

        for bad_len in [0, 7, 9, 16] {
            let result = buffer.apply(&vec![1u8; bad_len]);
            assert_eq!(
                result,
                Err(VisualizerError::FrameSizeMismatch {
                    expected: 8,
                    actual: bad_len
                })
            );
            assert_eq!(buffer.as_bytes(), &[7u8; 8]);
        }
        Ok(())
    }

    #[test]
    fn it_should_expand_rgb_frames_with_opaque_alpha() -> Result<(), VisualizerError> {
        let mut buffer = PixelBuffer::new(2)?;
        buffer.apply_rgb(&[1, 2, 3, 4, 5, 6])?;
        assert_eq!(buffer.as_bytes(), &[1, 2, 3, 0xFF, 4, 5, 6, 0xFF]);

        assert!(buffer.apply_rgb(&[0; 8]).is_err());
        assert_eq!(buffer.as_bytes(), &[1, 2, 3, 0xFF, 4, 5, 6, 0xFF]);
        Ok(())
    }

    #[test]
    fn it_should_refuse_a_buffer_larger_than_memory_can_address() {
        assert_eq!(
            PixelBuffer::new(usize::MAX),
            Err(VisualizerError::BufferTooLarge {
                led_count: usize::MAX
            })
        );
        assert!(PixelBuffer::new(MAX_LED_COUNT + 1).is_err());
    }

    #[test]
    fn it_should_bounds_check_pixel_access() {
        let mut buffer = PixelBuffer::new(2).unwrap();
        assert!(buffer.set_pixel(1, Rgba::rgb(9, 8, 7)));
        assert!(!buffer.set_pixel(2, Rgba::rgb(9, 8, 7)));
        assert_eq!(buffer.pixel(1), Some(Rgba::rgb(9, 8, 7)));
        assert_eq!(buffer.pixel(2), None);
        assert_eq!(buffer.pixel(usize::MAX), None);
    }
}
