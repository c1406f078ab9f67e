use serde::Deserialize;

/// Main configuration structure for Storefront Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub images: ImageConfig,
}

/// Storefront location and crawl bounds
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the storefront; listing and image paths resolve against it
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the paginated catalog, queried with `?page={n}`
    #[serde(rename = "listings-path", default = "default_listings_path")]
    pub listings_path: String,

    /// Stop after this many pages even if pagination says there are more
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,
}

/// How pages are rendered before extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Plain HTTP fetch of the server-rendered markup
    Http,
    /// Headless Chromium, requires the `browser` feature
    Chromium,
}

/// Page rendering configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_render_mode")]
    pub mode: RenderMode,

    /// Pixels scrolled per step while forcing lazy content to load
    #[serde(rename = "scroll-step", default = "default_scroll_step")]
    pub scroll_step: u32,

    /// Pause between scroll steps (milliseconds)
    #[serde(rename = "scroll-pause-ms", default = "default_scroll_pause_ms")]
    pub scroll_pause_ms: u64,

    #[serde(
        rename = "navigation-timeout-secs",
        default = "default_navigation_timeout_secs"
    )]
    pub navigation_timeout_secs: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: default_render_mode(),
            scroll_step: default_scroll_step(),
            scroll_pause_ms: default_scroll_pause_ms(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Root directory of the per-listing image folders
    #[serde(rename = "images-dir")]
    pub images_dir: String,

    /// CSV export destination; standard output when absent
    #[serde(rename = "csv-path", default)]
    pub csv_path: Option<String>,
}

/// Image acquisition configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    /// Square target sizes in pixels, in generation order
    #[serde(default = "default_sizes")]
    pub sizes: Vec<u32>,

    /// Number of listings processed at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(
        rename = "download-timeout-secs",
        default = "default_download_timeout_secs"
    )]
    pub download_timeout_secs: u64,

    /// Check every size instead of only the smallest before skipping a listing
    #[serde(rename = "verify-all-sizes", default)]
    pub verify_all_sizes: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            sizes: default_sizes(),
            concurrency: default_concurrency(),
            download_timeout_secs: default_download_timeout_secs(),
            verify_all_sizes: false,
        }
    }
}

fn default_listings_path() -> String {
    "/products".to_string()
}

fn default_render_mode() -> RenderMode {
    RenderMode::Http
}

fn default_scroll_step() -> u32 {
    500
}

fn default_scroll_pause_ms() -> u64 {
    100
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_sizes() -> Vec<u32> {
    vec![100, 500, 2000]
}

fn default_concurrency() -> usize {
    1
}

fn default_download_timeout_secs() -> u64 {
    10
}
