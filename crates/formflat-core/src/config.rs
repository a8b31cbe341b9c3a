//! Flattening configuration
//!
//! TOML-based configuration for where the document fonts come from.
//!
//! ```toml
//! webapp_url = "https://app.example.com"
//! fetch_timeout_secs = 20
//! # Optional overrides; default to {webapp_url}/fonts/...
//! cjk_font = "/opt/fonts/NotoSansCJKsc-Regular.otf"
//! ```

use crate::error::FlattenError;
use crate::fonts::source::is_url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Where fonts are fetched from and how long a download may take.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlattenConfig {
    /// Base URL of the web application serving `/fonts/...`
    #[serde(default = "default_webapp_url")]
    pub webapp_url: String,
    /// Default Unicode font location (URL or path). Derived from `webapp_url` when unset.
    #[serde(default)]
    pub default_font: Option<String>,
    /// CJK font location (URL or path). Derived from `webapp_url` when unset.
    #[serde(default)]
    pub cjk_font: Option<String>,
    /// HTTP font download timeout (default: 30)
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_webapp_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            webapp_url: default_webapp_url(),
            default_font: None,
            cjk_font: None,
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl FlattenConfig {
    pub fn new(webapp_url: impl Into<String>) -> Self {
        Self {
            webapp_url: webapp_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FlattenError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FlattenError::InvalidConfig(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, FlattenError> {
        let config: Self = toml::from_str(s)
            .map_err(|e| FlattenError::InvalidConfig(format!("Failed to parse TOML configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_default_font(mut self, location: impl Into<String>) -> Self {
        self.default_font = Some(location.into());
        self
    }

    pub fn with_cjk_font(mut self, location: impl Into<String>) -> Self {
        self.cjk_font = Some(location.into());
        self
    }

    pub fn with_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    pub fn validate(&self) -> Result<(), FlattenError> {
        if self.fetch_timeout_secs == 0 {
            return Err(FlattenError::InvalidConfig(
                "fetch_timeout_secs must be greater than zero".into(),
            ));
        }
        let needs_base = self.default_font.is_none() || self.cjk_font.is_none();
        if needs_base && !is_url(&self.webapp_url) {
            return Err(FlattenError::InvalidConfig(format!(
                "webapp_url must be an http(s) URL, got '{}'",
                self.webapp_url
            )));
        }
        for location in [&self.default_font, &self.cjk_font].into_iter().flatten() {
            if location.trim().is_empty() {
                return Err(FlattenError::InvalidConfig("font location is empty".into()));
            }
        }
        Ok(())
    }

    fn font_url(&self, file: &str) -> String {
        format!("{}/fonts/{}", self.webapp_url.trim_end_matches('/'), file)
    }

    pub fn default_font_location(&self) -> String {
        self.default_font
            .clone()
            .unwrap_or_else(|| self.font_url("noto-sans.ttf"))
    }

    pub fn cjk_font_location(&self) -> String {
        self.cjk_font
            .clone()
            .unwrap_or_else(|| self.font_url("noto-sans-chinese.ttf"))
    }
}
