// SPDX-License-Identifier: GPL-3.0-only

//! Frame processor module for async frame analysis
//!
//! This module turns one frame into at most one detected document outline.
//! Work is submitted to a detection engine and completes asynchronously,
//! either as a future or through a completion callback run in a chosen
//! [`CompletionContext`].

pub mod dispatch;
pub mod tasks;
pub mod types;

pub use dispatch::{CompletionContext, CompletionQueue, CompletionReceiver};
pub use tasks::{CancelHandle, RectangleDetector};
pub use types::{DetectionInput, DetectionOutcome, NotFoundReason};
