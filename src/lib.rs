// SPDX-License-Identifier: GPL-3.0-only

//! docscan - largest-rectangle document detection
//!
//! This library hands camera frames to a rectangle detection engine and
//! returns the largest detected quadrilateral in pixel coordinates.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`frame_processor`]: The detector, its inputs/outcomes and completion delivery
//! - [`engines`]: Detection engine abstraction and implementations
//! - [`geometry`]: Quadrilaterals, area ordering and affine transforms
//! - [`media`]: Image handles and orientation
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```no_run
//! use docscan::{DetectionInput, Frame, RectangleDetector, ScriptedEngine};
//!
//! # async fn run() {
//! let engine = ScriptedEngine::from_json_file("engine.json".as_ref()).unwrap();
//! let detector = RectangleDetector::current(engine);
//! let frame = Frame::from_gray(640, 480, vec![0u8; 640 * 480]);
//!
//! detector.detect(DetectionInput::pixel_buffer(frame), |quad| {
//!     println!("{:?}", quad);
//! });
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod engines;
pub mod errors;
pub mod frame_processor;
pub mod geometry;
pub mod media;

// Re-export commonly used types
pub use config::Config;
pub use engines::{BlockingEngine, FrameAnalyzer, RectangleDetectionEngine, ScriptedEngine};
pub use frame_processor::{
    CompletionContext, CompletionQueue, DetectionInput, DetectionOutcome, NotFoundReason,
    RectangleDetector,
};
pub use geometry::{AffineTransform, Point, Quadrilateral};
pub use media::{Frame, Orientation, PixelFormat};
