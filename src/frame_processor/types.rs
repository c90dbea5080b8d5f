// SPDX-License-Identifier: GPL-3.0-only

//! Inputs and results of rectangle detection

use crate::errors::EngineError;
use crate::geometry::Quadrilateral;
use crate::media::{Frame, Orientation};
use image::DynamicImage;
use std::sync::Arc;

/// An image handle plus the orientation to analyze it in
#[derive(Debug, Clone)]
pub struct DetectionInput {
    pub frame: Arc<Frame>,
    pub orientation: Option<Orientation>,
}

impl DetectionInput {
    /// Raw pixel buffer, analyzed as stored
    pub fn pixel_buffer(frame: impl Into<Arc<Frame>>) -> Self {
        Self {
            frame: frame.into(),
            orientation: None,
        }
    }

    /// Decoded image, analyzed as stored
    pub fn image(image: &DynamicImage) -> Self {
        Self::pixel_buffer(Frame::from_dynamic_image(image))
    }

    /// Pixel buffer reinterpreted through `orientation` before analysis
    pub fn oriented(frame: impl Into<Arc<Frame>>, orientation: Orientation) -> Self {
        Self {
            frame: frame.into(),
            orientation: Some(orientation),
        }
    }

    /// Decoded image reinterpreted through `orientation` before analysis
    pub fn oriented_image(image: &DynamicImage, orientation: Orientation) -> Self {
        Self::oriented(Frame::from_dynamic_image(image), orientation)
    }

    /// Pixel extent used to scale results
    ///
    /// This is the extent of the oriented image, not of the raw buffer.
    pub fn extent(&self) -> (u32, u32) {
        self.orientation
            .unwrap_or_default()
            .oriented_extent(self.frame.width, self.frame.height)
    }
}

/// Why a detection produced no quadrilateral
#[derive(Debug, Clone, PartialEq)]
pub enum NotFoundReason {
    /// Input or request rejected before the engine ran
    Rejected(EngineError),
    /// Engine reported a failure (including timeouts)
    EngineFailed(EngineError),
    /// Engine completed without candidates
    NoCandidates,
    /// Caller cancelled the request
    Cancelled,
    /// Request was dropped before it completed (engine panic, runtime shutdown)
    Abandoned,
}

impl std::fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFoundReason::Rejected(e) => write!(f, "rejected: {}", e),
            NotFoundReason::EngineFailed(e) => write!(f, "engine failed: {}", e),
            NotFoundReason::NoCandidates => write!(f, "no candidates"),
            NotFoundReason::Cancelled => write!(f, "cancelled"),
            NotFoundReason::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// Result of one detection, with the reason kept for diagnostics
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionOutcome {
    /// Largest candidate, in pixel coordinates of the oriented image
    Found(Quadrilateral),
    NotFound(NotFoundReason),
}

impl DetectionOutcome {
    /// Collapse to the caller-facing two-outcome form
    pub fn into_quadrilateral(self) -> Option<Quadrilateral> {
        match self {
            DetectionOutcome::Found(quad) => Some(quad),
            DetectionOutcome::NotFound(_) => None,
        }
    }

    pub fn quadrilateral(&self) -> Option<&Quadrilateral> {
        match self {
            DetectionOutcome::Found(quad) => Some(quad),
            DetectionOutcome::NotFound(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, DetectionOutcome::Found(_))
    }

    pub fn reason(&self) -> Option<&NotFoundReason> {
        match self {
            DetectionOutcome::Found(_) => None,
            DetectionOutcome::NotFound(reason) => Some(reason),
        }
    }
}
