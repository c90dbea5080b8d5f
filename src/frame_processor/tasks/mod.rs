// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks

pub mod rectangle_detector;

pub use rectangle_detector::{CancelHandle, RectangleDetector};
