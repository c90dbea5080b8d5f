// SPDX-License-Identifier: GPL-3.0-only

//! Image handles passed to detection engines

use super::orientation::Orientation;
use crate::errors::FrameError;
use image::{DynamicImage, RgbaImage};
use std::sync::Arc;

/// Pixel layout of a [`Frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    Rgba,
    /// BGRA - 32-bit with alpha, blue first
    Bgra,
    /// RGB24 - 24-bit RGB without alpha
    Rgb24,
    /// Gray8 - 8-bit grayscale
    Gray8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Self::Rgba | Self::Bgra => 4,
            Self::Rgb24 => 3,
            Self::Gray8 => 1,
        }
    }
}

/// A raster image handed to the detector
///
/// Pixel data is reference counted so engines running on other threads can
/// hold the frame for the duration of one request without copying it.
#[derive(Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// Bytes per row, may include padding
    pub stride: u32,
}

impl Frame {
    /// Wrap a pixel buffer with an explicit stride
    pub fn new(
        width: u32,
        height: u32,
        stride: u32,
        format: PixelFormat,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            width,
            height,
            data: data.into(),
            format,
            stride,
        }
    }

    /// Tightly packed RGBA pixels
    pub fn from_rgba(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Self {
        Self::new(width, height, width.saturating_mul(4), PixelFormat::Rgba, data)
    }

    /// Tightly packed 8-bit grayscale pixels
    pub fn from_gray(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Self {
        Self::new(width, height, width, PixelFormat::Gray8, data)
    }

    /// Convert a decoded image into an RGBA frame
    pub fn from_dynamic_image(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.into_raw())
    }

    /// Check that the buffer can hold `height` rows of `stride` bytes
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::ZeroExtent {
                width: self.width,
                height: self.height,
            });
        }

        let too_large = FrameError::TooLarge {
            width: self.width,
            height: self.height,
            stride: self.stride,
        };

        let min_stride = self
            .width
            .checked_mul(self.format.bytes_per_pixel())
            .ok_or_else(|| too_large.clone())?;
        if self.stride < min_stride {
            return Err(FrameError::StrideTooSmall {
                stride: self.stride,
                min_stride,
            });
        }

        // The last row does not need its padding
        let required = (self.stride as usize)
            .checked_mul(self.height as usize - 1)
            .and_then(|rows| rows.checked_add(min_stride as usize))
            .ok_or(too_large)?;
        if self.data.len() < required {
            return Err(FrameError::BufferTooShort {
                len: self.data.len(),
                required,
            });
        }

        Ok(())
    }

    /// Copy pixels into a tightly packed RGBA image
    ///
    /// Returns `None` if the frame does not pass [`Frame::validate`].
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        self.validate().ok()?;

        let width = self.width as usize;
        let height = self.height as usize;
        let stride = self.stride as usize;
        let bpp = self.format.bytes_per_pixel() as usize;

        let mut result = Vec::with_capacity(width * height * 4);

        for y in 0..height {
            let row = &self.data[y * stride..y * stride + width * bpp];
            match self.format {
                PixelFormat::Rgba => result.extend_from_slice(row),
                PixelFormat::Bgra => {
                    for px in row.chunks_exact(4) {
                        result.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                    }
                }
                PixelFormat::Rgb24 => {
                    for px in row.chunks_exact(3) {
                        result.extend_from_slice(&[px[0], px[1], px[2], 255]);
                    }
                }
                PixelFormat::Gray8 => {
                    for &v in row {
                        result.extend_from_slice(&[v, v, v, 255]);
                    }
                }
            }
        }

        RgbaImage::from_raw(self.width, self.height, result)
    }

    /// Upright RGBA image with `orientation` applied
    pub fn to_oriented_image(&self, orientation: Option<Orientation>) -> Option<DynamicImage> {
        let mut image = DynamicImage::ImageRgba8(self.to_rgba_image()?);
        if let Some(orientation) = orientation {
            image.apply_orientation(orientation.into());
        }
        Some(image)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("stride", &self.stride)
            .field("data", &format_args!("{} bytes", self.data.len()))
            .finish()
    }
}

/// Shrink `image` so neither side exceeds `max_dimension`
///
/// Returns the image unchanged when it already fits. Aspect ratio is kept,
/// so normalized coordinates found on the result are valid for the original.
pub fn downscale_to_fit(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    if max_dimension == 0 || (width <= max_dimension && height <= max_dimension) {
        return image;
    }

    let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
    let new_width = ((width as f32 / scale) as u32).max(1);
    let new_height = ((height as f32 / scale) as u32).max(1);

    image.resize_exact(new_width, new_height, image::imageops::FilterType::Triangle)
}
