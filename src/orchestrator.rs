use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cache::DatasetCache;
use crate::embedded::EmbeddedFallbackProvider;
use crate::error::AcquireError;
use crate::fetcher::Fetcher;
use crate::models::{cache_key, Dataset, RankingType, SourceKind};
use crate::paths::PathResolver;

/// Hands out tickets; only the most recently issued ticket is current.
#[derive(Debug, Clone, Default)]
pub struct RequestGeneration {
    latest: Arc<AtomicU64>,
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        let id = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            id,
            latest: self.latest.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ticket {
    id: u64,
    latest: Arc<AtomicU64>,
}

impl Ticket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.id
    }
}

/// Result of one `acquire` call.
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub dataset: Dataset,
    pub source: SourceKind,
    /// Where the data was produced. Differs from `source` only on a cache hit.
    pub origin: SourceKind,
    /// Candidate paths that failed, in the order they were tried.
    pub attempted_paths: Vec<String>,
    /// The candidate path that produced the data, for network results.
    pub resolved_path: Option<String>,
    /// False when the embedded provider served its canonical pair instead of the requested one.
    pub exact: bool,
}

/// Cache first, then every candidate path in order, then the compiled-in dataset.
pub struct AcquisitionOrchestrator {
    fetcher: Arc<dyn Fetcher>,
    resolver: PathResolver,
    cache: Arc<DatasetCache>,
    embedded: EmbeddedFallbackProvider,
}

impl AcquisitionOrchestrator {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        resolver: PathResolver,
        cache: Arc<DatasetCache>,
        embedded: EmbeddedFallbackProvider,
    ) -> Self {
        Self {
            fetcher,
            resolver,
            cache,
            embedded,
        }
    }

    pub fn cache(&self) -> &Arc<DatasetCache> {
        &self.cache
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub async fn acquire(
        &self,
        language: &str,
        ranking: RankingType,
        ticket: &Ticket,
    ) -> Result<Acquisition, AcquireError> {
        let key = cache_key(language, ranking);

        if let Some(entry) = self.cache.get(&key) {
            tracing::debug!(key, items = entry.dataset.len(), "serving from cache");
            return Ok(Acquisition {
                dataset: entry.dataset,
                source: SourceKind::Cache,
                origin: entry.origin,
                attempted_paths: Vec::new(),
                resolved_path: None,
                exact: entry.exact,
            });
        }

        let mut attempted_paths = Vec::new();
        for path in self.resolver.candidates(language, ranking) {
            if !ticket.is_current() {
                tracing::debug!(key, ticket = ticket.id(), "abandoning superseded acquisition");
                return Err(AcquireError::Superseded);
            }

            tracing::debug!(path, "trying data path");
            match self.fetcher.fetch(&path).await {
                Ok(file) => {
                    if file.metadata.ranking_type != ranking || file.metadata.language != language {
                        tracing::warn!(
                            path,
                            file_language = %file.metadata.language,
                            file_ranking = %file.metadata.ranking_type,
                            "file header does not match the requested dataset"
                        );
                    }
                    let dataset = Dataset::from_file(file);
                    if !ticket.is_current() {
                        return Err(AcquireError::Superseded);
                    }
                    tracing::info!(path, items = dataset.len(), "loaded ranking data");
                    self.cache.put(&key, dataset.clone(), SourceKind::Network, true);
                    return Ok(Acquisition {
                        dataset,
                        source: SourceKind::Network,
                        origin: SourceKind::Network,
                        attempted_paths,
                        resolved_path: Some(path),
                        exact: true,
                    });
                }
                Err(err) => {
                    tracing::warn!(path, error = %err, "data path failed");
                    attempted_paths.push(path);
                }
            }
        }

        match self.embedded.get_embedded(language, ranking) {
            Ok(embedded) => {
                if !ticket.is_current() {
                    return Err(AcquireError::Superseded);
                }
                tracing::warn!(
                    key,
                    attempted = attempted_paths.len(),
                    exact = embedded.exact,
                    "all data paths failed, using embedded dataset"
                );
                self.cache
                    .put(&key, embedded.dataset.clone(), SourceKind::Embedded, embedded.exact);
                Ok(Acquisition {
                    dataset: embedded.dataset,
                    source: SourceKind::Embedded,
                    origin: SourceKind::Embedded,
                    attempted_paths,
                    resolved_path: None,
                    exact: embedded.exact,
                })
            }
            Err(source) => {
                tracing::error!(key, error = %source, "embedded dataset unavailable");
                Err(AcquireError::Total {
                    language: language.to_string(),
                    ranking,
                    base: self.fetcher.base(),
                    attempted_paths,
                    source,
                })
            }
        }
    }
}
