//! Data acquisition, caching, region partitioning, and pagination for the AI tools ranking table.

pub mod cache;
pub mod config;
pub mod embedded;
pub mod error;
pub mod fetcher;
pub mod filters;
pub mod format;
pub mod models;
pub mod orchestrator;
pub mod pagination;
pub mod paths;
pub mod region;
pub mod session;

pub use cache::{Clock, DatasetCache, ManualClock, SystemClock};
pub use config::AppConfig;
pub use embedded::EmbeddedFallbackProvider;
pub use error::{AcquireError, FetchError};
pub use fetcher::{DirFetcher, Fetcher, HttpFetcher};
pub use models::{Dataset, Metadata, RankingType, SourceKind, ToolRecord};
pub use orchestrator::{Acquisition, AcquisitionOrchestrator, RequestGeneration, Ticket};
pub use pagination::PaginationWindow;
pub use paths::PathResolver;
pub use session::{LoadState, LoadView, RankingSession};
