//! File and directory naming for downloaded images
//!
//! Layout: `{root}/game_{external_id}/{slug}_{external_id}_{size}x{size}.jpg`,
//! where the slug is the image URL's file name without its extension.

use std::path::{Path, PathBuf};
use url::Url;

/// Extensions accepted as image sources, compared case-insensitively
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "svg"];

/// The last path segment of the URL, or `None` when it is empty
fn file_name(url: &Url) -> Option<&str> {
    url.path_segments()?.last().filter(|name| !name.is_empty())
}

/// Checks that the URL points at a file with a recognized image extension
///
/// Query strings and fragments are ignored.
pub fn has_image_extension(url: &Url) -> bool {
    file_name(url)
        .and_then(|name| name.rsplit_once('.'))
        .is_some_and(|(_, ext)| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Derives the slug used as file name prefix
///
/// # Example
///
/// `https://shop.example.com/assets/strategy.jpg` gives `strategy`.
pub fn category_slug(url: &Url) -> Option<String> {
    let name = file_name(url)?;
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Directory holding every rendition of one listing's image
pub fn listing_dir(root: &Path, external_id: i64) -> PathBuf {
    root.join(format!("game_{}", external_id))
}

/// File name of one square rendition
pub fn image_filename(slug: &str, external_id: i64, size: u32) -> String {
    format!("{}_{}_{}x{}.jpg", slug, external_id, size, size)
}
