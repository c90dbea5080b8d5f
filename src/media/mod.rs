// SPDX-License-Identifier: GPL-3.0-only

//! Image handles and orientation
//!
//! # Modules
//!
//! - [`frame`]: reference-counted pixel buffers and conversion to `image` types
//! - [`orientation`]: EXIF orientation tags and oriented extents

pub mod frame;
pub mod orientation;

pub use frame::{Frame, PixelFormat, downscale_to_fit};
pub use orientation::Orientation;
