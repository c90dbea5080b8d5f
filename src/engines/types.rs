// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for detection engines

use crate::errors::EngineResult;
use crate::geometry::Quadrilateral;
use crate::media::{Frame, Orientation};
use futures::future::BoxFuture;
use std::sync::Arc;
use uuid::Uuid;

/// Pending engine work, resolving to candidates in normalized coordinates
pub type CandidateFuture = BoxFuture<'static, EngineResult<Vec<Quadrilateral>>>;

/// One detection request bound to one image
///
/// Created per `detect` call and consumed by the engine on submission.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    /// Identifier used to correlate log events
    pub id: Uuid,
    pub frame: Arc<Frame>,
    /// Orientation the engine must apply before analysis
    pub orientation: Option<Orientation>,
}

impl DetectionRequest {
    pub fn new(frame: Arc<Frame>, orientation: Option<Orientation>) -> Self {
        Self {
            id: Uuid::new_v4(),
            frame,
            orientation,
        }
    }

    /// Width and height of the image after orientation is applied
    pub fn oriented_extent(&self) -> (u32, u32) {
        let orientation = self.orientation.unwrap_or_default();
        orientation.oriented_extent(self.frame.width, self.frame.height)
    }
}
