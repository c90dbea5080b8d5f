// SPDX-License-Identifier: GPL-3.0-only

//! Error types for document detection

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for detection engines
pub type EngineResult<T> = Result<T, EngineError>;

/// Application-level errors (CLI, configuration, file loading)
#[derive(Debug, Clone)]
pub enum AppError {
    /// Configuration errors
    Config(String),
    /// Filesystem errors
    Storage(String),
    /// Image decoding errors
    Image(String),
    /// Engine script could not be loaded or parsed
    Script(String),
    /// Invalid command-line input
    InvalidArgument(String),
    /// Generic error with message
    Other(String),
}

/// Image handle validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Width or height is zero
    ZeroExtent { width: u32, height: u32 },
    /// Row stride cannot hold one row of pixels
    StrideTooSmall { stride: u32, min_stride: u32 },
    /// Pixel buffer is shorter than stride * height
    BufferTooShort { len: usize, required: usize },
    /// Buffer size for this extent does not fit in memory arithmetic
    TooLarge { width: u32, height: u32, stride: u32 },
}

/// Detection engine errors
///
/// These never reach the caller of `detect`; they are kept for diagnostics
/// and logging only.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Input rejected before the request was submitted
    InvalidInput(FrameError),
    /// Engine cannot handle this image (pixel format, size, ...)
    Unsupported(String),
    /// Request failed while running
    Failed(String),
    /// Request did not complete within the configured timeout
    TimedOut,
}

/// Unknown orientation name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOrientationError(pub String);

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Image(msg) => write!(f, "Image error: {}", msg),
            AppError::Script(msg) => write!(f, "Engine script error: {}", msg),
            AppError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::ZeroExtent { width, height } => {
                write!(f, "Image has empty extent ({}x{})", width, height)
            }
            FrameError::StrideTooSmall { stride, min_stride } => {
                write!(f, "Row stride {} is smaller than {} bytes", stride, min_stride)
            }
            FrameError::BufferTooShort { len, required } => {
                write!(f, "Pixel buffer has {} bytes, {} required", len, required)
            }
            FrameError::TooLarge {
                width,
                height,
                stride,
            } => write!(
                f,
                "Image extent {}x{} with stride {} is too large",
                width, height, stride
            ),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidInput(e) => write!(f, "Invalid input: {}", e),
            EngineError::Unsupported(msg) => write!(f, "Unsupported image: {}", msg),
            EngineError::Failed(msg) => write!(f, "Detection failed: {}", msg),
            EngineError::TimedOut => write!(f, "Detection timed out"),
        }
    }
}

impl fmt::Display for ParseOrientationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown orientation: {:?}", self.0)
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for FrameError {}
impl std::error::Error for EngineError {}
impl std::error::Error for ParseOrientationError {}

impl From<FrameError> for EngineError {
    fn from(err: FrameError) -> Self {
        EngineError::InvalidInput(err)
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::Other(err.to_string())
    }
}

impl From<ParseOrientationError> for AppError {
    fn from(err: ParseOrientationError) -> Self {
        AppError::InvalidArgument(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Image(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Script(err.to_string())
    }
}
