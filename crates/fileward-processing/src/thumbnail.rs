//! Image-backed variant processors
//!
//! Decoding and resizing are CPU-bound, so both processors run the `image`
//! work on the blocking pool.

use async_trait::async_trait;
use fileward_core::{FileError, FileResult, VariantOptions};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;

use crate::processor::VariantProcessor;

/// How the source is mapped onto the target box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    /// Scale and crop to exactly width x height
    Fill,
    /// Scale to fit inside width x height, keeping the aspect ratio
    Fit,
}

/// Output format from the destination extension
pub fn output_format(path: &Path) -> FileResult<ImageFormat> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(ImageFormat::from_extension)
        .ok_or_else(|| {
            FileError::Processing(format!(
                "Unsupported image format for {}",
                path.display()
            ))
        })
}

/// Decode `source`, resize it, and encode it to `destination` in the format
/// named by the destination extension
pub fn render(
    source: &Path,
    destination: &Path,
    width: u32,
    height: u32,
    mode: ResizeMode,
) -> FileResult<()> {
    let format = output_format(destination)?;

    let img = ImageReader::open(source)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| FileError::Processing(format!("Failed to decode {}: {}", source.display(), e)))?;

    let resized = match mode {
        ResizeMode::Fill => img.resize_to_fill(width, height, FilterType::Lanczos3),
        ResizeMode::Fit => img.resize(width, height, FilterType::Lanczos3),
    };

    // JPEG has no alpha channel
    let resized = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(resized.to_rgb8())
    } else {
        resized
    };

    resized.save_with_format(destination, format).map_err(|e| {
        FileError::Processing(format!("Failed to write {}: {}", destination.display(), e))
    })?;

    Ok(())
}

async fn render_blocking(
    source: &Path,
    destination: &Path,
    options: &VariantOptions,
    mode: ResizeMode,
) -> FileResult<()> {
    let source = source.to_path_buf();
    let destination = destination.to_path_buf();
    let (width, height) = (options.width, options.height);

    tokio::task::spawn_blocking(move || render(&source, &destination, width, height, mode))
        .await
        .map_err(|e| FileError::Processing(format!("Image task failed: {}", e)))?
}

/// `thumbnail`: exact width x height, cropped to fill
#[derive(Debug, Default, Clone, Copy)]
pub struct ThumbnailProcessor;

#[async_trait]
impl VariantProcessor for ThumbnailProcessor {
    fn kind(&self) -> &str {
        "thumbnail"
    }

    async fn process(
        &self,
        source: &Path,
        destination: &Path,
        options: &VariantOptions,
    ) -> FileResult<()> {
        tracing::debug!(
            source = %source.display(),
            destination = %destination.display(),
            width = options.width,
            height = options.height,
            "Generating thumbnail"
        );
        render_blocking(source, destination, options, ResizeMode::Fill).await
    }
}

/// `fit`: scaled down into width x height, aspect ratio kept
#[derive(Debug, Default, Clone, Copy)]
pub struct FitProcessor;

#[async_trait]
impl VariantProcessor for FitProcessor {
    fn kind(&self) -> &str {
        "fit"
    }

    async fn process(
        &self,
        source: &Path,
        destination: &Path,
        options: &VariantOptions,
    ) -> FileResult<()> {
        tracing::debug!(
            source = %source.display(),
            destination = %destination.display(),
            width = options.width,
            height = options.height,
            "Generating fitted copy"
        );
        render_blocking(source, destination, options, ResizeMode::Fit).await
    }
}
