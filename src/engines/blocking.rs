// SPDX-License-Identifier: GPL-3.0-only

//! Blocking analyzer adapter
//!
//! Wraps a synchronous, CPU-bound rectangle analyzer (for example a binding
//! to a native vision library) so it satisfies [`RectangleDetectionEngine`].
//! Analysis runs on tokio's blocking pool so the async runtime is never
//! stalled.

use super::types::{CandidateFuture, DetectionRequest};
use super::RectangleDetectionEngine;
use crate::config::Config;
use crate::errors::{EngineError, EngineResult};
use crate::geometry::Quadrilateral;
use crate::media::{Frame, Orientation, downscale_to_fit};
use futures::FutureExt;
use image::DynamicImage;
use std::sync::Arc;
use tracing::{trace, warn};

/// Image handed to a [`FrameAnalyzer`]
#[derive(Debug, Clone)]
pub struct AnalysisImage {
    pub image: DynamicImage,
    /// Orientation still to be applied by the analyzer
    ///
    /// `None` when the pixels are already upright.
    pub orientation: Option<Orientation>,
}

/// Synchronous rectangle analyzer
///
/// Implementations return candidates in normalized coordinates of the
/// upright image.
pub trait FrameAnalyzer: Send + Sync + 'static {
    fn analyze(&self, input: &AnalysisImage) -> EngineResult<Vec<Quadrilateral>>;
}

impl<F> FrameAnalyzer for F
where
    F: Fn(&AnalysisImage) -> EngineResult<Vec<Quadrilateral>> + Send + Sync + 'static,
{
    fn analyze(&self, input: &AnalysisImage) -> EngineResult<Vec<Quadrilateral>> {
        self(input)
    }
}

/// Preparation applied before calling the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockingOptions {
    /// Longest side of the analyzed image (None = full size)
    pub max_dimension: Option<u32>,
    /// Rotate/flip pixels upright before analysis
    pub apply_orientation: bool,
}

impl Default for BlockingOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for BlockingOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_dimension: config.max_dimension,
            apply_orientation: config.apply_orientation,
        }
    }
}

/// Engine running a [`FrameAnalyzer`] on the blocking pool
pub struct BlockingEngine<A> {
    name: String,
    analyzer: Arc<A>,
    options: BlockingOptions,
}

impl<A: FrameAnalyzer> BlockingEngine<A> {
    pub fn new(name: impl Into<String>, analyzer: A) -> Self {
        Self::with_options(name, analyzer, BlockingOptions::default())
    }

    pub fn with_options(name: impl Into<String>, analyzer: A, options: BlockingOptions) -> Self {
        Self {
            name: name.into(),
            analyzer: Arc::new(analyzer),
            options,
        }
    }

    pub fn options(&self) -> BlockingOptions {
        self.options
    }
}

impl<A: FrameAnalyzer> RectangleDetectionEngine for BlockingEngine<A> {
    fn name(&self) -> &str {
        &self.name
    }

    fn submit(&self, request: DetectionRequest) -> EngineResult<CandidateFuture> {
        request.frame.validate()?;

        let analyzer = Arc::clone(&self.analyzer);
        let options = self.options;
        let id = request.id;

        Ok(async move {
            // Run analysis in a blocking task to avoid blocking the async runtime
            tokio::task::spawn_blocking(move || {
                analyze_sync(analyzer.as_ref(), &request.frame, request.orientation, options)
            })
            .await
            .unwrap_or_else(|e| {
                warn!(request = %id, error = %e, "Analyzer task panicked");
                Err(EngineError::Failed(format!("analyzer task panicked: {}", e)))
            })
        }
        .boxed())
    }
}

/// Synchronous preparation and analysis (runs in blocking task)
fn analyze_sync<A: FrameAnalyzer + ?Sized>(
    analyzer: &A,
    frame: &Frame,
    orientation: Option<Orientation>,
    options: BlockingOptions,
) -> EngineResult<Vec<Quadrilateral>> {
    let start = std::time::Instant::now();

    let (image, remaining_orientation) = if options.apply_orientation {
        (frame.to_oriented_image(orientation), None)
    } else {
        (frame.to_oriented_image(None), orientation)
    };
    let image = image.ok_or_else(|| {
        EngineError::Unsupported(format!("cannot convert {:?} frame", frame.format))
    })?;

    let image = match options.max_dimension {
        Some(max_dimension) => downscale_to_fit(image, max_dimension),
        None => image,
    };

    let conversion_time = start.elapsed();
    trace!(
        width = image.width(),
        height = image.height(),
        conversion_ms = conversion_time.as_millis(),
        "Prepared image for analysis"
    );

    let input = AnalysisImage {
        image,
        orientation: remaining_orientation,
    };
    let candidates = analyzer.analyze(&input)?;

    trace!(
        count = candidates.len(),
        analysis_ms = (start.elapsed() - conversion_time).as_millis(),
        "Analysis complete"
    );

    Ok(candidates)
}
