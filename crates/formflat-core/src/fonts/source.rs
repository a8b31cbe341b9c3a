//! Font byte acquisition

use crate::error::FlattenError;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Supplies raw font program bytes for a location (URL or path).
pub trait FontSource: Send + Sync {
    fn fetch<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FlattenError>>;
}

pub fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Downloads fonts over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFontSource {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpFontSource {
    pub fn new(timeout_secs: u64) -> Result<Self, FlattenError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FlattenError::FontFetch {
                location: String::new(),
                reason: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FlattenError> {
        info!("Downloading font from: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FlattenError::FontTimeout {
                    location: url.to_string(),
                    secs: self.timeout_secs,
                }
            } else {
                FlattenError::FontFetch {
                    location: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        if !response.status().is_success() {
            return Err(FlattenError::FontFetch {
                location: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| FlattenError::FontFetch {
            location: url.to_string(),
            reason: e.to_string(),
        })?;
        debug!("Downloaded {} font bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

impl FontSource for HttpFontSource {
    fn fetch<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FlattenError>> {
        self.download(location).boxed()
    }
}

/// Reads fonts from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileFontSource {
    root: Option<PathBuf>,
}

impl FileFontSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative locations against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn path_for(&self, location: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(location),
            None => PathBuf::from(location),
        }
    }
}

impl FontSource for FileFontSource {
    fn fetch<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FlattenError>> {
        async move {
            let path = self.path_for(location);
            debug!("Reading font file: {}", path.display());
            tokio::fs::read(&path)
                .await
                .map_err(|source| FlattenError::FontRead { path, source })
        }
        .boxed()
    }
}

/// Fetches URLs over HTTP and everything else from disk.
#[derive(Debug, Clone)]
pub struct DefaultFontSource {
    http: HttpFontSource,
    files: FileFontSource,
}

impl DefaultFontSource {
    pub fn new(timeout_secs: u64) -> Result<Self, FlattenError> {
        Ok(Self {
            http: HttpFontSource::new(timeout_secs)?,
            files: FileFontSource::new(),
        })
    }

    pub fn with_files(mut self, files: FileFontSource) -> Self {
        self.files = files;
        self
    }
}

impl FontSource for DefaultFontSource {
    fn fetch<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FlattenError>> {
        if is_url(location) {
            self.http.fetch(location)
        } else {
            self.files.fetch(location)
        }
    }
}
