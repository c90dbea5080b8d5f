// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Default upper bound on the longest side of images handed to analyzers
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Default tracing filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Directory name under the user's config directory
pub const CONFIG_DIR_NAME: &str = "docscan";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "config.json";
