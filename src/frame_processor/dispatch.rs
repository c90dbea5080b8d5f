// SPDX-License-Identifier: GPL-3.0-only

//! Completion delivery
//!
//! Decides which thread runs a detection's completion callback, and makes
//! sure every callback runs exactly once.

use super::types::{DetectionOutcome, NotFoundReason};
use crate::config::CallbackThread;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// A completion callback bound to its outcome
///
/// Runs exactly once: when invoked, or inline on the dropping thread if a
/// context discards it unrun (blocking pool or receiver shut down).
pub(crate) struct Job(Option<Box<dyn FnOnce() + Send + 'static>>);

impl Job {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self(Some(Box::new(f)))
    }

    fn run(mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl Drop for Job {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            debug!("Completion context discarded a callback, running it inline");
            f();
        }
    }
}

/// Where completion callbacks run
#[derive(Clone, Debug, Default)]
pub enum CompletionContext {
    /// On the runtime worker that finished the request
    #[default]
    Worker,
    /// On tokio's blocking pool
    Blocking,
    /// On whichever thread drains the paired [`CompletionReceiver`]
    Queue(CompletionQueue),
}

impl From<CallbackThread> for CompletionContext {
    fn from(thread: CallbackThread) -> Self {
        match thread {
            CallbackThread::Worker => Self::Worker,
            CallbackThread::Blocking => Self::Blocking,
        }
    }
}

impl CompletionContext {
    /// Run `job` in this context
    ///
    /// Falls back to running inline when the context can no longer accept
    /// work, so the job is never lost.
    pub(crate) fn dispatch(&self, job: Job) {
        match self {
            CompletionContext::Worker => job.run(),
            CompletionContext::Blocking => match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn_blocking(move || job.run());
                }
                Err(_) => job.run(),
            },
            CompletionContext::Queue(queue) => {
                if let Err(mpsc::error::SendError(job)) = queue.sender.send(job) {
                    debug!("Completion queue closed, running callback inline");
                    job.run();
                }
            }
        }
    }
}

/// Sending half of a completion queue
#[derive(Clone, Debug)]
pub struct CompletionQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl CompletionQueue {
    /// Create a queue and the receiver that runs its callbacks
    pub fn new() -> (Self, CompletionReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, CompletionReceiver { receiver })
    }
}

/// Runs queued completion callbacks on the thread that owns it
pub struct CompletionReceiver {
    receiver: mpsc::UnboundedReceiver<Job>,
}

impl CompletionReceiver {
    /// Run every callback queued so far without waiting
    ///
    /// Returns the number of callbacks run.
    pub fn run_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job.run();
            count += 1;
        }
        count
    }

    /// Wait for the next callback and run it
    ///
    /// Returns `false` once every queue sender is gone.
    pub async fn run_next(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(job) => {
                job.run();
                true
            }
            None => false,
        }
    }

    /// Block the current thread running callbacks until every sender is gone
    ///
    /// Must not be called from within an async runtime.
    pub fn run_until_closed(&mut self) -> usize {
        let mut count = 0;
        while let Some(job) = self.receiver.blocking_recv() {
            job.run();
            count += 1;
        }
        count
    }
}

/// Exactly-once delivery of one detection outcome
///
/// If dropped before [`OutcomeDelivery::deliver`] is called (the request
/// task panicked or was torn down), the callback still runs with
/// [`NotFoundReason::Abandoned`], in the same completion context.
pub(crate) struct OutcomeDelivery {
    request: Uuid,
    callback: Option<Box<dyn FnOnce(DetectionOutcome) + Send + 'static>>,
    context: CompletionContext,
}

impl OutcomeDelivery {
    pub(crate) fn new<F>(request: Uuid, context: CompletionContext, callback: F) -> Self
    where
        F: FnOnce(DetectionOutcome) + Send + 'static,
    {
        Self {
            request,
            callback: Some(Box::new(callback)),
            context,
        }
    }

    pub(crate) fn deliver(mut self, outcome: DetectionOutcome) {
        if let Some(callback) = self.callback.take() {
            self.context.dispatch(Job::new(move || callback(outcome)));
        }
    }
}

impl Drop for OutcomeDelivery {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            warn!(request = %self.request, "Detection dropped before completion");
            let outcome = DetectionOutcome::NotFound(NotFoundReason::Abandoned);
            self.context.dispatch(Job::new(move || callback(outcome)));
        }
    }
}
