use crate::config::types::{Config, ImageConfig, OutputConfig, RenderConfig, SiteConfig, UserAgentConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

const MAX_IMAGE_SIZE: u32 = 10_000;
const MAX_IMAGE_CONCURRENCY: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_render_config(&config.render)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_image_config(&config.images)?;
    Ok(())
}

/// Validates the storefront location
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if !config.listings_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "listings_path must start with '/', got '{}'",
            config.listings_path
        )));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates page rendering settings
fn validate_render_config(config: &RenderConfig) -> Result<(), ConfigError> {
    if config.scroll_step < 1 {
        return Err(ConfigError::Validation(format!(
            "scroll_step must be >= 1, got {}",
            config.scroll_step
        )));
    }

    if config.navigation_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "navigation_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.images_dir.is_empty() {
        return Err(ConfigError::Validation(
            "images_dir cannot be empty".to_string(),
        ));
    }

    if matches!(config.csv_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "csv_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates image target sizes and download settings
fn validate_image_config(config: &ImageConfig) -> Result<(), ConfigError> {
    if config.sizes.is_empty() {
        return Err(ConfigError::Validation(
            "images.sizes must list at least one size".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for &size in &config.sizes {
        if size < 1 || size > MAX_IMAGE_SIZE {
            return Err(ConfigError::Validation(format!(
                "image size must be between 1 and {}, got {}",
                MAX_IMAGE_SIZE, size
            )));
        }
        if !seen.insert(size) {
            return Err(ConfigError::Validation(format!(
                "image size {} is listed more than once",
                size
            )));
        }
    }

    if config.concurrency < 1 || config.concurrency > MAX_IMAGE_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "images.concurrency must be between 1 and {}, got {}",
            MAX_IMAGE_CONCURRENCY, config.concurrency
        )));
    }

    if config.download_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "download_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Must contain exactly one @ with text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
