// SPDX-License-Identifier: GPL-3.0-only

//! Image orientation tags
//!
//! Describes how raw pixel data must be reinterpreted before geometric
//! analysis. Values follow the EXIF orientation tag (1 through 8).

use crate::errors::ParseOrientationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Orientation applied to raw pixels before detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Pixels are already upright (EXIF 1)
    #[default]
    #[serde(rename = "identity")]
    Identity,
    /// Mirrored left to right (EXIF 2)
    #[serde(rename = "flip-horizontal")]
    FlipHorizontal,
    /// Upside down (EXIF 3)
    #[serde(rename = "rotate-180")]
    Rotate180,
    /// Mirrored top to bottom (EXIF 4)
    #[serde(rename = "flip-vertical")]
    FlipVertical,
    /// Rotated 90° clockwise, then mirrored left to right (EXIF 5, transpose)
    #[serde(rename = "transpose")]
    Rotate90FlipHorizontal,
    /// Rotated 90° clockwise (EXIF 6)
    #[serde(rename = "rotate-90")]
    Rotate90,
    /// Rotated 270° clockwise, then mirrored left to right (EXIF 7, transverse)
    #[serde(rename = "transverse")]
    Rotate270FlipHorizontal,
    /// Rotated 270° clockwise (EXIF 8)
    #[serde(rename = "rotate-270")]
    Rotate270,
}

impl Orientation {
    pub const ALL: [Orientation; 8] = [
        Orientation::Identity,
        Orientation::FlipHorizontal,
        Orientation::Rotate180,
        Orientation::FlipVertical,
        Orientation::Rotate90FlipHorizontal,
        Orientation::Rotate90,
        Orientation::Rotate270FlipHorizontal,
        Orientation::Rotate270,
    ];

    /// Create an orientation from an EXIF tag value
    pub fn from_exif(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Identity),
            2 => Some(Self::FlipHorizontal),
            3 => Some(Self::Rotate180),
            4 => Some(Self::FlipVertical),
            5 => Some(Self::Rotate90FlipHorizontal),
            6 => Some(Self::Rotate90),
            7 => Some(Self::Rotate270FlipHorizontal),
            8 => Some(Self::Rotate270),
            _ => None,
        }
    }

    /// EXIF tag value for this orientation
    pub fn to_exif(self) -> u8 {
        match self {
            Self::Identity => 1,
            Self::FlipHorizontal => 2,
            Self::Rotate180 => 3,
            Self::FlipVertical => 4,
            Self::Rotate90FlipHorizontal => 5,
            Self::Rotate90 => 6,
            Self::Rotate270FlipHorizontal => 7,
            Self::Rotate270 => 8,
        }
    }

    /// Check if this orientation swaps width and height
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Self::Rotate90
                | Self::Rotate270
                | Self::Rotate90FlipHorizontal
                | Self::Rotate270FlipHorizontal
        )
    }

    /// Extent of a `width` x `height` buffer after applying this orientation
    pub fn oriented_extent(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Short name used on the command line and in logs
    pub fn name(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::FlipHorizontal => "flip-horizontal",
            Self::Rotate180 => "rotate-180",
            Self::FlipVertical => "flip-vertical",
            Self::Rotate90FlipHorizontal => "transpose",
            Self::Rotate90 => "rotate-90",
            Self::Rotate270FlipHorizontal => "transverse",
            Self::Rotate270 => "rotate-270",
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Orientation {
    type Err = ParseOrientationError;

    /// Accepts the names from [`Orientation::name`], a few aliases, or a bare
    /// EXIF value ("1" through "8")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");

        if let Ok(value) = normalized.parse::<u8>() {
            return Self::from_exif(value).ok_or_else(|| ParseOrientationError(s.to_string()));
        }

        match normalized.as_str() {
            "identity" | "up" | "none" | "rotate-0" => Ok(Self::Identity),
            "flip-horizontal" | "mirror" => Ok(Self::FlipHorizontal),
            "rotate-180" | "down" => Ok(Self::Rotate180),
            "flip-vertical" => Ok(Self::FlipVertical),
            "transpose" | "rotate-90-flip-horizontal" => Ok(Self::Rotate90FlipHorizontal),
            "rotate-90" | "right" => Ok(Self::Rotate90),
            "transverse" | "rotate-270-flip-horizontal" => Ok(Self::Rotate270FlipHorizontal),
            "rotate-270" | "left" => Ok(Self::Rotate270),
            _ => Err(ParseOrientationError(s.to_string())),
        }
    }
}

impl From<image::metadata::Orientation> for Orientation {
    fn from(orientation: image::metadata::Orientation) -> Self {
        use image::metadata::Orientation as Image;
        match orientation {
            Image::NoTransforms => Self::Identity,
            Image::FlipHorizontal => Self::FlipHorizontal,
            Image::Rotate180 => Self::Rotate180,
            Image::FlipVertical => Self::FlipVertical,
            Image::Rotate90FlipH => Self::Rotate90FlipHorizontal,
            Image::Rotate90 => Self::Rotate90,
            Image::Rotate270FlipH => Self::Rotate270FlipHorizontal,
            Image::Rotate270 => Self::Rotate270,
        }
    }
}

impl From<Orientation> for image::metadata::Orientation {
    fn from(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Identity => Self::NoTransforms,
            Orientation::FlipHorizontal => Self::FlipHorizontal,
            Orientation::Rotate180 => Self::Rotate180,
            Orientation::FlipVertical => Self::FlipVertical,
            Orientation::Rotate90FlipHorizontal => Self::Rotate90FlipH,
            Orientation::Rotate90 => Self::Rotate90,
            Orientation::Rotate270FlipHorizontal => Self::Rotate270FlipH,
            Orientation::Rotate270 => Self::Rotate270,
        }
    }
}
