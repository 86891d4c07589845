//! Pixel buffers produced by camera streams.

use crate::error::{DeviceError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Memory layout of a frame's pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// 8-bit red, green, blue, alpha (canvas `ImageData` layout).
    Rgba8,

    /// 8-bit red, green, blue.
    Rgb8,

    /// 8-bit luminance.
    Luma8,
}

impl PixelFormat {
    /// Number of bytes used by one pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Rgb8 => 3,
            Self::Luma8 => 1,
        }
    }
}

/// A single captured frame.
///
/// A frame with zero width or height means the device has not produced an
/// image yet; callers skip it and ask again on the next tick.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Row-major pixel data, no padding between rows.
    pub data: Vec<u8>,

    pub width: u32,

    pub height: u32,

    pub format: PixelFormat,

    /// When the frame was taken from the device.
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    /// Create a frame, checking the buffer against its geometry.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::InvalidFrame`] if `data.len()` is not
    /// `width * height * bytes_per_pixel`.
    ///
    /// # Examples
    ///
    /// ```
    /// use shelfscan_camera::frame::{Frame, PixelFormat};
    ///
    /// let frame = Frame::new(vec![0u8; 4 * 2 * 2], 2, 2, PixelFormat::Rgba8).unwrap();
    /// assert!(frame.is_ready());
    ///
    /// assert!(Frame::new(vec![0u8; 3], 2, 2, PixelFormat::Rgba8).is_err());
    /// ```
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let frame = Self {
            data,
            width,
            height,
            format,
            captured_at: Utc::now(),
        };

        if !frame.is_consistent() {
            return Err(DeviceError::invalid_frame(format!(
                "{}x{} {:?} needs {} bytes, got {}",
                width,
                height,
                format,
                frame.expected_len(),
                frame.data.len()
            )));
        }

        Ok(frame)
    }

    /// The "no image yet" frame.
    pub fn not_ready() -> Self {
        Self {
            data: Vec::new(),
            width: 0,
            height: 0,
            format: PixelFormat::Rgba8,
            captured_at: Utc::now(),
        }
    }

    /// Whether the frame carries an image.
    pub fn is_ready(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Buffer length implied by the frame's geometry and format.
    pub fn expected_len(&self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(self.format.bytes_per_pixel())
    }

    /// Whether `data` matches the declared geometry.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.expected_len()
    }

    /// Luminance of the pixel at (`x`, `y`) using BT.601 weights.
    ///
    /// Out-of-range coordinates read as white, which is what a quiet zone
    /// around a symbol looks like.
    pub fn luma_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return u8::MAX;
        }

        let bpp = self.format.bytes_per_pixel();
        let offset = (y as usize * self.width as usize + x as usize) * bpp;
        let Some(px) = self.data.get(offset..offset + bpp) else {
            return u8::MAX;
        };

        match self.format {
            PixelFormat::Luma8 => px[0],
            PixelFormat::Rgb8 | PixelFormat::Rgba8 => {
                let (r, g, b) = (px[0] as u32, px[1] as u32, px[2] as u32);
                ((r * 299 + g * 587 + b * 114) / 1000) as u8
            }
        }
    }

    /// Build an RGBA frame from a decoded still image.
    #[cfg(feature = "replay")]
    pub fn from_image(image: &image::DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();

        Self {
            data: rgba.into_raw(),
            width,
            height,
            format: PixelFormat::Rgba8,
            captured_at: Utc::now(),
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes", &self.data.len())
            .field("captured_at", &self.captured_at)
            .finish()
    }
}
