//! Image acquisition pipeline
//!
//! For each stored listing with an image, the pipeline downloads the source
//! image once and writes one square JPEG per configured size. A listing whose
//! directory already holds the smallest rendition is skipped, so re-runs only
//! download what is missing. Every failure is scoped to its own listing.

use crate::config::ImageConfig;
use crate::images::naming::{category_slug, has_image_extension, image_filename, listing_dir};
use crate::images::resize::render_sizes;
use crate::images::ImageError;
use crate::storage::ImageSource;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Listings per progress line
const PROGRESS_BLOCK: usize = 100;

/// What happened to one listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutcome {
    /// Downloaded and every size written
    Processed,
    /// The renditions were already on disk
    SkippedExisting,
    /// The image URL is not a supported image file
    Rejected,
    /// Download, decode or write failed
    Failed,
}

/// Counters for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageReport {
    pub processed: u64,
    pub skipped_existing: u64,
    pub rejected: u64,
    pub failed: u64,
}

impl ImageReport {
    fn record(&mut self, outcome: ImageOutcome) {
        match outcome {
            ImageOutcome::Processed => self.processed += 1,
            ImageOutcome::SkippedExisting => self.skipped_existing += 1,
            ImageOutcome::Rejected => self.rejected += 1,
            ImageOutcome::Failed => self.failed += 1,
        }
    }

    /// Number of listings the run looked at
    pub fn total(&self) -> u64 {
        self.processed + self.skipped_existing + self.rejected + self.failed
    }
}

/// Downloads and resizes listing images into a directory tree
pub struct ImagePipeline {
    client: Client,
    root: PathBuf,
    sizes: Arc<[u32]>,
    verify_all_sizes: bool,
    concurrency: usize,
    download_timeout: Duration,
}

impl ImagePipeline {
    /// Creates a pipeline writing under `root`
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client; its connections are reused for every download
    /// * `root` - Directory holding the per-listing folders
    /// * `config` - Target sizes, concurrency and timeouts
    pub fn new(client: Client, root: impl Into<PathBuf>, config: &ImageConfig) -> Self {
        Self {
            client,
            root: root.into(),
            sizes: config.sizes.iter().copied().collect(),
            verify_all_sizes: config.verify_all_sizes,
            concurrency: config.concurrency.max(1),
            download_timeout: Duration::from_secs(config.download_timeout_secs),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sizes whose files must exist for a listing to count as done
    fn completeness_sizes(&self) -> Vec<u32> {
        if self.verify_all_sizes {
            self.sizes.to_vec()
        } else {
            self.sizes.iter().copied().min().into_iter().collect()
        }
    }

    /// Processes every source, at most `concurrency` at a time
    ///
    /// Sources are deduplicated by listing id first, keeping the first
    /// occurrence, so no two workers ever share a directory.
    pub async fn run(&self, sources: &[ImageSource]) -> ImageReport {
        let mut seen = HashSet::new();
        let unique: Vec<&ImageSource> = sources
            .iter()
            .filter(|source| seen.insert(source.external_id))
            .collect();
        let total = unique.len();

        tracing::info!("Saving images for {} listings", total);

        let outcomes: Vec<ImageOutcome> = stream::iter(unique.into_iter().enumerate())
            .map(|(index, source)| async move {
                if index % PROGRESS_BLOCK == 0 {
                    let end = (index + PROGRESS_BLOCK).min(total);
                    tracing::info!("Downloading and saving images from range {}-{}", index + 1, end);
                }
                self.process_one(source).await
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = ImageReport::default();
        for outcome in outcomes {
            report.record(outcome);
        }

        tracing::info!(
            "Images done: {} processed, {} already present, {} rejected, {} failed",
            report.processed,
            report.skipped_existing,
            report.rejected,
            report.failed
        );
        report
    }

    /// Processes one listing, logging instead of propagating its failure
    pub async fn process_one(&self, source: &ImageSource) -> ImageOutcome {
        match self.try_process(source).await {
            Ok(outcome) => outcome,
            Err(ImageError::UnsupportedUrl(url)) => {
                tracing::warn!(
                    "Listing {} has an unsupported image URL {}, skipping",
                    source.external_id,
                    url
                );
                ImageOutcome::Rejected
            }
            Err(e) => {
                tracing::error!(
                    "Failed to process image of listing {}: {}",
                    source.external_id,
                    e
                );
                ImageOutcome::Failed
            }
        }
    }

    async fn try_process(&self, source: &ImageSource) -> Result<ImageOutcome, ImageError> {
        let external_id = source.external_id;
        let unsupported = || ImageError::UnsupportedUrl(source.image_url.clone());

        let url = Url::parse(&source.image_url).map_err(|_| unsupported())?;
        if !has_image_extension(&url) {
            return Err(unsupported());
        }
        let slug = category_slug(&url).ok_or_else(unsupported)?;

        let dir = listing_dir(&self.root, external_id);
        if is_dir(&dir).await {
            if self.is_complete(&dir, &slug, external_id).await {
                tracing::debug!("Images for listing {} already present", external_id);
                return Ok(ImageOutcome::SkippedExisting);
            }
            tracing::info!(
                "Images for listing {} are incomplete, deleting and re-downloading",
                external_id
            );
            tokio::fs::remove_dir_all(&dir).await?;
        }
        tokio::fs::create_dir_all(&dir).await?;

        if let Err(e) = self.fill_dir(&url, &dir, slug, external_id).await {
            // A partial directory must not pass the completeness check later
            if let Err(cleanup) = tokio::fs::remove_dir_all(&dir).await {
                tracing::warn!("Failed to remove {}: {}", dir.display(), cleanup);
            }
            return Err(e);
        }

        Ok(ImageOutcome::Processed)
    }

    /// Downloads the image and writes every rendition into `dir`
    async fn fill_dir(
        &self,
        url: &Url,
        dir: &Path,
        slug: String,
        external_id: i64,
    ) -> Result<(), ImageError> {
        let bytes = self.download(url).await?;

        let dir = dir.to_path_buf();
        let sizes = Arc::clone(&self.sizes);
        tokio::task::spawn_blocking(move || render_sizes(&bytes, &dir, &slug, external_id, &sizes))
            .await
            .map_err(|e| ImageError::Task(e.to_string()))??;

        Ok(())
    }

    async fn is_complete(&self, dir: &Path, slug: &str, external_id: i64) -> bool {
        for size in self.completeness_sizes() {
            let path = dir.join(image_filename(slug, external_id, size));
            if !is_file(&path).await {
                return false;
            }
        }
        true
    }

    async fn download(&self, url: &Url) -> Result<Vec<u8>, ImageError> {
        let download_error = |source: reqwest::Error| ImageError::Download {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(download_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(download_error)?;
        Ok(body.to_vec())
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
