//! Image module for downloading and resizing listing images
//!
//! This module handles:
//! - Validating image URLs and deriving on-disk names
//! - Downloading each listing's image over a shared HTTP client
//! - Writing square JPEG renditions atomically
//! - Skipping listings whose renditions are already present

mod naming;
mod pipeline;
mod resize;

pub use naming::{category_slug, has_image_extension, image_filename, listing_dir};
pub use pipeline::{ImageOutcome, ImagePipeline, ImageReport};
pub use resize::{render_sizes, square_thumbnail};

use thiserror::Error;

/// Errors scoped to a single listing's image
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Unsupported image URL: {0}")]
    UnsupportedUrl(String),

    #[error("Download of {url} failed: {source}")]
    Download { url: String, source: reqwest::Error },

    #[error("Unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Image task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
