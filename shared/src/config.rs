use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::ValidatedUrl;
use crate::form::ImageRules;
use crate::{DEBOUNCE_MS, DEFAULT_API_BASE_URL, MAX_IMAGE_BYTES, MAX_LISTING_IMAGES};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Settings the shell hands to the core with `Event::Started`. Every field
/// is optional in JSON and falls back to the crate constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    pub api_base_url: String,
    pub debounce_ms: u64,
    pub max_images: usize,
    pub max_image_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            debounce_ms: DEBOUNCE_MS,
            max_images: MAX_LISTING_IMAGES,
            max_image_bytes: MAX_IMAGE_BYTES,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ValidatedUrl::new(self.api_base_url.as_str())
            .map_err(|e| ConfigError::Validation(format!("api_base_url: {e}")))?;
        if self.debounce_ms == 0 {
            return Err(ConfigError::Validation("debounce_ms must be > 0".into()));
        }
        if self.max_images == 0 {
            return Err(ConfigError::Validation("max_images must be > 0".into()));
        }
        if self.max_image_bytes == 0 {
            return Err(ConfigError::Validation("max_image_bytes must be > 0".into()));
        }
        Ok(())
    }

    #[must_use]
    pub const fn image_rules(&self) -> ImageRules {
        ImageRules {
            max_images: self.max_images,
            max_bytes: self.max_image_bytes,
        }
    }

    #[must_use]
    pub const fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}
