// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Replaying recorded engine output against an image file
//! - Showing the effective configuration

use docscan::errors::{AppError, AppResult};
use docscan::{
    Config, DetectionInput, DetectionOutcome, NotFoundReason, Orientation, Quadrilateral,
    RectangleDetector, ScriptedEngine,
};
use image::{DynamicImage, ImageDecoder, ImageReader};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// JSON report printed by `docscan detect`
#[derive(Serialize)]
struct DetectionReport<'a> {
    image: &'a Path,
    width: u32,
    height: u32,
    orientation: Option<Orientation>,
    quadrilateral: Option<Quadrilateral>,
    reason: Option<String>,
}

/// Run one detection against `image_path` and print the result as JSON
pub fn detect(
    config: &Config,
    image_path: &Path,
    script_path: &Path,
    orientation: Option<&str>,
    ignore_exif: bool,
) -> AppResult<()> {
    let engine = ScriptedEngine::from_json_file(script_path)?;
    let (image, exif_orientation) = load_image(image_path)?;

    let orientation = match orientation {
        Some(name) => Some(name.parse::<Orientation>()?),
        None if ignore_exif => None,
        None => exif_orientation.filter(|o| *o != Orientation::Identity),
    };

    let input = match orientation {
        Some(orientation) => DetectionInput::oriented_image(&image, orientation),
        None => DetectionInput::image(&image),
    };
    let (width, height) = input.extent();

    info!(
        image = %image_path.display(),
        width,
        height,
        orientation = ?orientation,
        "Running detection"
    );

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(async {
        let detector = RectangleDetector::current(engine).configured(config);
        let (sender, receiver) = tokio::sync::oneshot::channel();

        detector.detect_with_outcome(input, move |outcome| {
            let _ = sender.send(outcome);
        });

        receiver
            .await
            .unwrap_or(DetectionOutcome::NotFound(NotFoundReason::Abandoned))
    });

    let report = DetectionReport {
        image: image_path,
        width,
        height,
        orientation,
        reason: outcome.reason().map(|reason| reason.to_string()),
        quadrilateral: outcome.into_quadrilateral(),
    };

    let json = serde_json::to_string_pretty(&report).map_err(|e| AppError::Other(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

/// Print the configuration and where it was loaded from
pub fn print_config(config: &Config, path: Option<&Path>) -> AppResult<()> {
    let path = path.map(Path::to_path_buf).or_else(Config::default_path);
    match path {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no configuration directory"),
    }

    let json = serde_json::to_string_pretty(config).map_err(|e| AppError::Config(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

/// Decode an image, keeping the orientation stored in its metadata
fn load_image(path: &Path) -> AppResult<(DynamicImage, Option<Orientation>)> {
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()?;

    let orientation = match decoder.orientation() {
        Ok(orientation) => Some(Orientation::from(orientation)),
        Err(e) => {
            debug!(error = %e, "No orientation metadata");
            None
        }
    };

    let image = DynamicImage::from_decoder(decoder)?;
    debug!(
        width = image.width(),
        height = image.height(),
        orientation = ?orientation,
        "Loaded image"
    );

    Ok((image, orientation))
}
