//! Borrowed view of a single video frame.

use crate::error::TrackError;

/// Number of interleaved channels expected in the pixel buffer (BGR).
const CHANNELS: usize = 3;

/// A single frame of interleaved 8-bit BGR pixel data, borrowed from the
/// caller for the duration of one tracking call.
///
/// Most strategies only read the dimensions for coordinate conversion; the
/// correlation-filter strategy also samples pixel intensities.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> Frame<'a> {
    /// Wrap a raw pixel buffer, checking that the dimensions are nonzero and
    /// that the buffer length matches them.
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Result<Self, TrackError> {
        if width == 0 || height == 0 {
            return Err(TrackError::EmptyFrame { width, height });
        }
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(TrackError::BadFrame {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Grayscale intensity at (x, y), clamped to the frame borders.
    pub(crate) fn luma(&self, x: i64, y: i64) -> f32 {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let base = (y * self.width as usize + x) * CHANNELS;
        let px = &self.data[base..base + CHANNELS];
        (px[0] as f32 + px[1] as f32 + px[2] as f32) / 3.0
    }
}
