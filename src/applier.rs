// src/applier.rs

//! Applies incoming stream frames to the pixel buffer.

use crate::color::{RGBA_BYTES, RGB_BYTES};
use crate::config::FrameFormat;
use crate::error::VisualizerError;
use crate::pixel_buffer::PixelBuffer;
use crate::surface::RenderSurface;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub applied: u64,
    pub dropped: u64,
}

/// Sole owner of the pixel buffer once streaming starts.
#[derive(Debug)]
pub struct StreamApplier {
    buffer: PixelBuffer,
    format: FrameFormat,
    stats: StreamStats,
}

impl StreamApplier {
    pub fn new(buffer: PixelBuffer, format: FrameFormat) -> Self {
        Self {
            buffer,
            format,
            stats: StreamStats::default(),
        }
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Frame length the configured format expects.
    pub fn expected_frame_len(&self) -> usize {
        let bytes_per_led = match self.format {
            FrameFormat::Rgba => RGBA_BYTES,
            FrameFormat::Rgb => RGB_BYTES,
        };
        self.buffer.led_count() * bytes_per_led
    }

    /// Copies `frame` into the buffer and asks `surface` for a repaint.
    ///
    /// A frame of the wrong size is dropped: the buffer keeps its previous
    /// content, no repaint is requested, and the mismatch is returned.
    pub fn on_frame(
        &mut self,
        frame: &[u8],
        surface: &mut impl RenderSurface,
    ) -> Result<(), VisualizerError> {
        let result = match self.format {
            FrameFormat::Rgba => self.buffer.apply(frame),
            FrameFormat::Rgb => self.buffer.apply_rgb(frame),
        };
        match result {
            Ok(()) => {
                self.stats.applied += 1;
                surface.request_repaint();
                Ok(())
            }
            Err(e) => {
                self.stats.dropped += 1;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[derive(Default)]
    struct CountingSurface {
        repaints: usize,
    }

    impl RenderSurface for CountingSurface {
        fn request_repaint(&mut self) {
            self.repaints += 1;
        }

        fn resize(&mut self, _width_px: u32, _height_px: u32) {}
    }

    #[test]
    fn it_should_apply_a_frame_and_request_a_repaint() -> Result<(), VisualizerError> {
        let mut applier = StreamApplier::new(PixelBuffer::new(2)?, FrameFormat::Rgba);
        let mut surface = CountingSurface::default();

        applier.on_frame(&[9u8; 8], &mut surface)?;
        assert_eq!(applier.buffer().as_bytes(), &[9u8; 8]);
        assert_eq!(surface.repaints, 1);
        assert_eq!(
            applier.stats(),
            StreamStats {
                applied: 1,
                dropped: 0
            }
        );
        Ok(())
    }

    #[test]
    fn it_should_drop_a_mismatched_frame_without_repainting() -> Result<(), VisualizerError> {
        let mut applier = StreamApplier::new(PixelBuffer::new(2)?, FrameFormat::Rgba);
        let mut surface = CountingSurface::default();
        applier.on_frame(&[5u8; 8], &mut surface)?;

        let result = applier.on_frame(&[1u8; 12], &mut surface);
        assert_eq!(
            result,
            Err(VisualizerError::FrameSizeMismatch {
                expected: 8,
                actual: 12
            })
        );
        assert_eq!(applier.buffer().as_bytes(), &[5u8; 8]);
        assert_eq!(surface.repaints, 1);
        assert_eq!(applier.stats().dropped, 1);
        Ok(())
    }

    #[test]
    fn it_should_apply_frames_in_receipt_order() -> Result<(), VisualizerError> {
        let mut applier = StreamApplier::new(PixelBuffer::new(1)?, FrameFormat::Rgba);
        let mut surface = CountingSurface::default();
        for value in 1..=5u8 {
            applier.on_frame(&[value; 4], &mut surface)?;
        }
        assert_eq!(applier.buffer().as_bytes(), &[5u8; 4]);
        assert_eq!(applier.stats().applied, 5);
        Ok(())
    }

    #[test]
    fn it_should_expect_three_bytes_per_led_for_rgb_streams() -> Result<(), VisualizerError> {
        let mut applier = StreamApplier::new(PixelBuffer::new(2)?, FrameFormat::Rgb);
        let mut surface = CountingSurface::default();
        assert_eq!(applier.expected_frame_len(), 6);

        applier.on_frame(&[1, 2, 3, 4, 5, 6], &mut surface)?;
        assert_eq!(applier.buffer().as_bytes(), &[1, 2, 3, 255, 4, 5, 6, 255]);
        assert!(applier.on_frame(&[0u8; 8], &mut surface).is_err());
        Ok(())
    }
}
