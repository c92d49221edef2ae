use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::error::FetchError;
use crate::models::DataFile;

/// Retrieves one ranking file by candidate path.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<DataFile, FetchError>;

    /// Deployment root the candidate paths are resolved against, for diagnostics.
    fn base(&self) -> String;
}

pub struct HttpFetcher {
    client: Client,
    base: Url,
}

impl HttpFetcher {
    pub fn new(base: Url, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("airank_reader/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, base }
    }

    /// Full URL for a candidate path. Relative templates resolve under the base, rooted ones under the host.
    pub fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        self.base.join(path).map_err(|_| FetchError::InvalidUrl {
            base: self.base.to_string(),
            path: path.to_string(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> Result<DataFile, FetchError> {
        let url = self.resolve(path)?;
        let url_str = url.to_string();

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url_str.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url_str,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url_str.clone(),
                source,
            })?;

        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            url: url_str,
            source,
        })
    }

    fn base(&self) -> String {
        self.base.to_string()
    }
}

/// Reads ranking files from an unpacked bundle directory.
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let relative = path.trim_start_matches("./").trim_start_matches('/');
        self.root.join(Path::new(relative))
    }
}

#[async_trait]
impl Fetcher for DirFetcher {
    async fn fetch(&self, path: &str) -> Result<DataFile, FetchError> {
        let full = self.resolve(path);
        let body = tokio::fs::read(&full).await.map_err(|source| FetchError::Io {
            path: full.clone(),
            source,
        })?;

        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            url: full.display().to_string(),
            source,
        })
    }

    fn base(&self) -> String {
        self.root.display().to_string()
    }
}
