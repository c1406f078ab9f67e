//! Decoding, square cropping and atomic JPEG writes
//!
//! Everything here is CPU-bound and synchronous; the pipeline runs it on the
//! blocking thread pool.

use crate::images::naming::image_filename;
use crate::images::ImageError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const JPEG_QUALITY: u8 = 85;

/// Decodes downloaded bytes, guessing the format from their content
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    image::load_from_memory(bytes).map_err(ImageError::Decode)
}

/// Scales the image to cover a `size` x `size` square and crops the overflow evenly
pub fn square_thumbnail(image: &DynamicImage, size: u32) -> DynamicImage {
    image.resize_to_fill(size, size, FilterType::CatmullRom)
}

/// Writes a JPEG so that readers never observe a partial file
///
/// The data goes to a temporary file in `dir` which is then renamed over
/// `dir/filename`.
pub fn write_jpeg_atomic(
    image: &DynamicImage,
    dir: &Path,
    filename: &str,
) -> Result<PathBuf, ImageError> {
    let target = dir.join(filename);
    let temp = NamedTempFile::new_in(dir)?;

    {
        let mut writer = BufWriter::new(temp.as_file());
        JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
            .encode_image(&image.to_rgb8())
            .map_err(ImageError::Encode)?;
        writer.flush()?;
    }

    temp.persist(&target).map_err(|e| ImageError::Io(e.error))?;
    Ok(target)
}

/// Order in which renditions are written: the smallest size goes last
///
/// The smallest rendition marks a listing as complete, so it must only
/// appear once every other size is on disk.
pub fn write_order(sizes: &[u32]) -> Vec<u32> {
    let mut order = sizes.to_vec();
    if let Some(smallest) = order
        .iter()
        .enumerate()
        .min_by_key(|&(_, size)| *size)
        .map(|(index, _)| index)
    {
        let last = order.remove(smallest);
        order.push(last);
    }
    order
}

/// Produces every configured rendition of one listing's image
///
/// # Arguments
///
/// * `bytes` - The downloaded image
/// * `dir` - The listing's directory, which must already exist
/// * `slug` - File name prefix
/// * `external_id` - The listing's identifier
/// * `sizes` - Square sizes in pixels
///
/// # Returns
///
/// Paths of the written files, in [`write_order`]
pub fn render_sizes(
    bytes: &[u8],
    dir: &Path,
    slug: &str,
    external_id: i64,
    sizes: &[u32],
) -> Result<Vec<PathBuf>, ImageError> {
    let source = decode(bytes)?;

    write_order(sizes)
        .into_iter()
        .map(|size| {
            let thumbnail = square_thumbnail(&source, size);
            write_jpeg_atomic(&thumbnail, dir, &image_filename(slug, external_id, size))
        })
        .collect()
}
