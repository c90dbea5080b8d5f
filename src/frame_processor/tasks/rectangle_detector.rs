// SPDX-License-Identifier: GPL-3.0-only

//! Largest-rectangle detection task
//!
//! Hands a frame to a [`RectangleDetectionEngine`], keeps the candidate with
//! the largest area and maps it from normalized coordinates into pixel
//! coordinates of the oriented image.
//!
//! Every entry point returns without waiting for the engine. The callback
//! variants invoke their completion exactly once: with the quadrilateral, or
//! with "none" on rejection, engine failure, empty results, cancellation or
//! an engine panic.

use crate::config::Config;
use crate::engines::{CandidateFuture, DetectionRequest, RectangleDetectionEngine};
use crate::errors::EngineError;
use crate::frame_processor::dispatch::{CompletionContext, OutcomeDelivery};
use crate::frame_processor::types::{DetectionInput, DetectionOutcome, NotFoundReason};
use crate::geometry::{Biggest, Quadrilateral};
use crate::media::Orientation;
use futures::future::{AbortHandle, Abortable};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Handle to cancel one in-flight detection
///
/// Cancelling a request that already completed has no effect.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    abort: AbortHandle,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.abort.is_aborted()
    }
}

/// A submitted (or synchronously rejected) request
struct Pending {
    id: Uuid,
    extent: (u32, u32),
    orientation: Option<Orientation>,
    state: PendingState,
}

enum PendingState {
    Submitted(CandidateFuture),
    Rejected(EngineError),
}

/// Largest-rectangle detector
///
/// Stateless apart from its configuration; clones share the engine and can
/// be used from any thread. Concurrent requests are independent and may
/// complete in any order.
pub struct RectangleDetector<E: ?Sized> {
    runtime: Handle,
    completion: CompletionContext,
    timeout: Option<Duration>,
    engine: Arc<E>,
}

impl<E: ?Sized> Clone for RectangleDetector<E> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime.clone(),
            completion: self.completion.clone(),
            timeout: self.timeout,
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<E: RectangleDetectionEngine + 'static> RectangleDetector<E> {
    /// Create a detector that runs requests on `runtime`
    pub fn new(engine: E, runtime: Handle) -> Self {
        Self::from_shared(Arc::new(engine), runtime)
    }

    /// Create a detector on the runtime of the calling task
    ///
    /// # Panics
    /// Panics when called outside of a tokio runtime.
    pub fn current(engine: E) -> Self {
        Self::new(engine, Handle::current())
    }
}

impl<E: RectangleDetectionEngine + ?Sized + 'static> RectangleDetector<E> {
    /// Create a detector around an engine shared with other owners
    pub fn from_shared(engine: Arc<E>, runtime: Handle) -> Self {
        Self {
            runtime,
            completion: CompletionContext::default(),
            timeout: None,
            engine,
        }
    }

    /// Apply completion thread and timeout from configuration
    pub fn configured(self, config: &Config) -> Self {
        self.with_completion_context(config.completion_context.into())
            .with_timeout(config.engine_timeout())
    }

    /// Choose where completion callbacks run
    pub fn with_completion_context(mut self, context: CompletionContext) -> Self {
        self.completion = context;
        self
    }

    /// Give up on requests that take longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Detect the largest quadrilateral
    ///
    /// Returns immediately. `completion` receives the quadrilateral in pixel
    /// coordinates of the oriented image, or `None`, exactly once.
    ///
    /// If the detector's runtime has already shut down, the request is
    /// dropped at once and `completion` gets `None` through the completion
    /// context ([`NotFoundReason::Abandoned`]); with the default worker
    /// context that happens inline on the calling thread.
    pub fn detect<F>(&self, input: DetectionInput, completion: F)
    where
        F: FnOnce(Option<Quadrilateral>) + Send + 'static,
    {
        self.detect_with_outcome(input, move |outcome| {
            completion(outcome.into_quadrilateral())
        });
    }

    /// Like [`RectangleDetector::detect`], keeping the reason for "none"
    pub fn detect_with_outcome<F>(&self, input: DetectionInput, completion: F)
    where
        F: FnOnce(DetectionOutcome) + Send + 'static,
    {
        let pending = self.begin(input);
        let delivery = OutcomeDelivery::new(pending.id, self.completion.clone(), completion);
        let timeout = self.timeout;

        self.runtime.spawn(async move {
            let outcome = finish(pending, timeout).await;
            delivery.deliver(outcome);
        });
    }

    /// Like [`RectangleDetector::detect`], returning a handle to cancel the request
    ///
    /// A cancelled request delivers `None`.
    pub fn detect_cancellable<F>(&self, input: DetectionInput, completion: F) -> CancelHandle
    where
        F: FnOnce(Option<Quadrilateral>) + Send + 'static,
    {
        let pending = self.begin(input);
        let id = pending.id;
        let delivery = OutcomeDelivery::new(id, self.completion.clone(), move |outcome| {
            completion(outcome.into_quadrilateral())
        });
        let timeout = self.timeout;
        let (abort, registration) = AbortHandle::new_pair();

        self.runtime.spawn(async move {
            let outcome = match Abortable::new(finish(pending, timeout), registration).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    debug!(request = %id, "Detection cancelled");
                    DetectionOutcome::NotFound(NotFoundReason::Cancelled)
                }
            };
            delivery.deliver(outcome);
        });

        CancelHandle { abort }
    }

    /// Detect and await the largest quadrilateral
    pub async fn detect_async(&self, input: DetectionInput) -> Option<Quadrilateral> {
        self.detect_outcome(input).await.into_quadrilateral()
    }

    /// Detect and await the outcome, including the reason for "none"
    ///
    /// The request runs as its own task on the detector's runtime. An engine
    /// panic, or a runtime that is already gone, yields
    /// [`NotFoundReason::Abandoned`].
    pub async fn detect_outcome(&self, input: DetectionInput) -> DetectionOutcome {
        let pending = self.begin(input);
        let id = pending.id;

        match self.runtime.spawn(finish(pending, self.timeout)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(request = %id, error = %e, "Detection task did not complete");
                DetectionOutcome::NotFound(NotFoundReason::Abandoned)
            }
        }
    }

    /// Validate the input and submit it to the engine
    fn begin(&self, input: DetectionInput) -> Pending {
        let extent = input.extent();
        let orientation = input.orientation;
        let request = DetectionRequest::new(input.frame, orientation);
        let id = request.id;

        debug!(
            request = %id,
            engine = self.engine.name(),
            width = extent.0,
            height = extent.1,
            orientation = ?orientation,
            "Submitting detection request"
        );

        let state = match request.frame.validate() {
            Err(e) => PendingState::Rejected(e.into()),
            Ok(()) => match self.engine.submit(request) {
                Ok(future) => PendingState::Submitted(future),
                Err(e) => PendingState::Rejected(e),
            },
        };

        Pending {
            id,
            extent,
            orientation,
            state,
        }
    }
}

/// Await the engine and turn its candidates into an outcome
async fn finish(pending: Pending, timeout: Option<Duration>) -> DetectionOutcome {
    let start = std::time::Instant::now();
    let Pending {
        id,
        extent: (width, height),
        orientation,
        state,
    } = pending;

    let future = match state {
        PendingState::Submitted(future) => future,
        PendingState::Rejected(e) => {
            warn!(request = %id, error = %e, "Detection request rejected");
            return DetectionOutcome::NotFound(NotFoundReason::Rejected(e));
        }
    };

    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .unwrap_or(Err(EngineError::TimedOut)),
        None => future.await,
    };

    let candidates = match result {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!(request = %id, error = %e, "Detection engine failed");
            return DetectionOutcome::NotFound(NotFoundReason::EngineFailed(e));
        }
    };

    let count = candidates.len();
    let Some(biggest) = candidates.biggest() else {
        debug!(request = %id, "No rectangle candidates");
        return DetectionOutcome::NotFound(NotFoundReason::NoCandidates);
    };

    let quad = biggest.scaled_to(width as f64, height as f64);

    debug!(
        request = %id,
        count,
        area = quad.area(),
        orientation = ?orientation,
        total_ms = start.elapsed().as_millis(),
        "Detected rectangle"
    );
    trace!(request = %id, ?quad, "Largest candidate in pixel coordinates");

    DetectionOutcome::Found(quad)
}
