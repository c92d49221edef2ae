use std::path::PathBuf;

use thiserror::Error;

use crate::models::RankingType;

/// One candidate path failed; the orchestrator logs it and moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} did not contain a ranking file: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot resolve '{path}' against '{base}'")]
    InvalidUrl { base: String, path: String },
}

#[derive(Debug, Error)]
pub enum AcquireError {
    /// Every candidate path failed and the embedded dataset could not be produced either.
    #[error(
        "no data for language '{language}' / '{ranking}' from {base}; tried: {}. \
         Choose a supported language and ranking type",
        .attempted_paths.join(", ")
    )]
    Total {
        language: String,
        ranking: RankingType,
        base: String,
        attempted_paths: Vec<String>,
        #[source]
        source: EmbeddedError,
    },
    /// A newer request started before this one finished.
    #[error("request superseded by a newer one")]
    Superseded,
}

#[derive(Debug, Error)]
pub enum EmbeddedError {
    #[error("embedded dataset for '{language}' is corrupt: {source}")]
    Corrupt {
        language: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no embedded dataset for '{language}'")]
    Missing { language: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config {} is not valid JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not find home directory")]
    NoHome,
}
