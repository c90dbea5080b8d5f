// SPDX-License-Identifier: GPL-3.0-only

//! Detection engine abstraction
//!
//! The rectangle finding itself is done by an external engine. This module
//! defines the capability the detector needs from it and ships two
//! implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │   RectangleDetector      │  ← Largest-candidate selection, scaling, delivery
//! └────────────┬─────────────┘
//!              │
//!              ▼
//! ┌──────────────────────────┐
//! │ RectangleDetectionEngine │  ← Common interface
//! └────────────┬─────────────┘
//!              │
//!       ┌──────┴───────┐
//!       ▼              ▼
//! ┌──────────┐  ┌──────────────┐
//! │ Scripted │  │ Blocking<A>  │  ← Replayed output / synchronous analyzer on the blocking pool
//! └──────────┘  └──────────────┘
//! ```

pub mod blocking;
pub mod scripted;
pub mod types;

pub use blocking::{AnalysisImage, BlockingEngine, BlockingOptions, FrameAnalyzer};
pub use scripted::{EngineScript, ScriptedEngine, ScriptedResponse, SeenRequest};
pub use types::{CandidateFuture, DetectionRequest};

use crate::errors::EngineResult;
use std::sync::Arc;

/// Rectangle detection capability
///
/// Engines report candidates in normalized coordinates of the oriented image
/// (unit square, origin top-left). Candidate order is preserved by the
/// detector when breaking area ties.
pub trait RectangleDetectionEngine: Send + Sync {
    /// Engine name for logs
    fn name(&self) -> &str;

    /// Submit one request
    ///
    /// Must return quickly: heavy work belongs in the returned future.
    ///
    /// # Returns
    /// * `Ok(CandidateFuture)` - Request accepted, resolves to the candidates or a failure
    /// * `Err(EngineError)` - Request rejected synchronously
    fn submit(&self, request: DetectionRequest) -> EngineResult<CandidateFuture>;
}

impl<E: RectangleDetectionEngine + ?Sized> RectangleDetectionEngine for Arc<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn submit(&self, request: DetectionRequest) -> EngineResult<CandidateFuture> {
        (**self).submit(request)
    }
}

impl<E: RectangleDetectionEngine + ?Sized> RectangleDetectionEngine for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn submit(&self, request: DetectionRequest) -> EngineResult<CandidateFuture> {
        (**self).submit(request)
    }
}
