use crate::error::AcquireError;
use crate::filters::{collect_tags, ToolFilter};
use crate::models::{Dataset, Metadata, RankingType, SourceKind, ToolRecord};
use crate::orchestrator::{Acquisition, AcquisitionOrchestrator, RequestGeneration, Ticket};
use crate::pagination::PaginationWindow;
use crate::region::{self, RegionPartitionMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Acquiring,
    Ready,
    /// Showing embedded data because every network path failed.
    ReadyWithDiagnostics,
    Failed,
}

/// Everything the table needs to explain a failed load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub message: String,
    pub language: String,
    pub ranking: RankingType,
    pub base: String,
    pub attempted_paths: Vec<String>,
}

/// Snapshot handed to the rendering layer.
#[derive(Debug, Clone)]
pub struct LoadView {
    pub state: LoadState,
    pub records: Vec<ToolRecord>,
    pub loading: bool,
    pub error: Option<LoadFailure>,
    pub attempted_paths: Vec<String>,
    pub has_more: bool,
    pub source: Option<SourceKind>,
    /// Where the shown data was produced; `Embedded` even when it was served from the cache.
    pub origin: Option<SourceKind>,
    pub metadata: Option<Metadata>,
    pub region: Option<String>,
    /// The selected region has no records; offer a retry instead of an error.
    pub region_empty: bool,
    /// The embedded provider could not match the request and served its canonical pair.
    pub fallback_of_last_resort: bool,
}

/// Consumer-side state: acquisition bookkeeping, region partitions, filter, and window.
pub struct RankingSession {
    generation: RequestGeneration,
    language: String,
    ranking: RankingType,
    region: String,
    state: LoadState,
    dataset: Option<Dataset>,
    source: Option<SourceKind>,
    origin: Option<SourceKind>,
    exact: bool,
    attempted_paths: Vec<String>,
    failure: Option<LoadFailure>,
    partitions: RegionPartitionMap,
    filter: ToolFilter,
    active: Vec<ToolRecord>,
    window: PaginationWindow,
}

impl RankingSession {
    pub fn new(
        language: impl Into<String>,
        ranking: RankingType,
        default_region: &str,
        page_size: usize,
    ) -> Self {
        Self {
            generation: RequestGeneration::new(),
            language: language.into(),
            ranking,
            region: region::region_code(default_region)
                .unwrap_or_else(|| region::DEFAULT_REGION.to_string()),
            state: LoadState::Idle,
            dataset: None,
            source: None,
            origin: None,
            exact: true,
            attempted_paths: Vec::new(),
            failure: None,
            partitions: RegionPartitionMap::default(),
            filter: ToolFilter::default(),
            active: Vec::new(),
            window: PaginationWindow::new(page_size),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn ranking(&self) -> RankingType {
        self.ranking
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Acquiring
    }

    pub fn filter(&self) -> &ToolFilter {
        &self.filter
    }

    pub fn window(&self) -> &PaginationWindow {
        &self.window
    }

    /// Starts a load cycle and returns the ticket the acquisition must carry.
    ///
    /// Any earlier in-flight ticket stops being current. Switching language or
    /// ranking type drops the rows on screen; a same-context reload keeps them.
    pub fn begin_load(&mut self, language: &str, ranking: RankingType, region: Option<&str>) -> Ticket {
        let context_changed = language != self.language || ranking != self.ranking;
        self.language = language.to_string();
        self.ranking = ranking;
        let requested_region = region.and_then(region::region_code);

        if context_changed {
            if let Some(code) = requested_region {
                self.region = code;
            }
            self.dataset = None;
            self.partitions = RegionPartitionMap::default();
            self.active.clear();
            self.window.reset(0);
        } else if let Some(code) = requested_region {
            // Rows already on screen follow the new region right away
            if code != self.region {
                self.region = code;
                self.rebuild();
            }
        }

        self.failure = None;
        self.attempted_paths.clear();
        self.state = LoadState::Acquiring;
        self.generation.begin()
    }

    /// Re-runs the current context from the top. A valid cache entry will answer it.
    pub fn retry(&mut self) -> Ticket {
        let language = self.language.clone();
        self.begin_load(&language, self.ranking, None)
    }

    /// Commits an acquisition result. Returns false when the ticket was superseded.
    pub fn apply(&mut self, ticket: &Ticket, result: Result<Acquisition, AcquireError>) -> bool {
        if !ticket.is_current() {
            tracing::debug!(ticket = ticket.id(), "discarding stale acquisition");
            return false;
        }

        match result {
            Ok(acquisition) => {
                self.state = if acquisition.origin == SourceKind::Embedded {
                    LoadState::ReadyWithDiagnostics
                } else {
                    LoadState::Ready
                };
                self.source = Some(acquisition.source);
                self.origin = Some(acquisition.origin);
                self.exact = acquisition.exact;
                self.attempted_paths = acquisition.attempted_paths;
                self.partitions = if self.ranking.is_regional() {
                    region::partition(&acquisition.dataset.records)
                } else {
                    RegionPartitionMap::default()
                };
                self.dataset = Some(acquisition.dataset);
                self.failure = None;
                self.rebuild();
                true
            }
            Err(AcquireError::Superseded) => false,
            Err(err) => {
                let message = err.to_string();
                if let AcquireError::Total {
                    language,
                    ranking,
                    base,
                    attempted_paths,
                    ..
                } = err
                {
                    self.attempted_paths = attempted_paths.clone();
                    self.failure = Some(LoadFailure {
                        message,
                        language,
                        ranking,
                        base,
                        attempted_paths,
                    });
                }
                self.state = LoadState::Failed;
                self.source = None;
                self.origin = None;
                self.dataset = None;
                self.partitions = RegionPartitionMap::default();
                self.active.clear();
                self.window.reset(0);
                true
            }
        }
    }

    /// `begin_load`, acquire, and `apply` in one call.
    pub async fn load(
        &mut self,
        orchestrator: &AcquisitionOrchestrator,
        language: &str,
        ranking: RankingType,
        region: Option<&str>,
    ) -> LoadView {
        let ticket = self.begin_load(language, ranking, region);
        let result = orchestrator.acquire(language, ranking, &ticket).await;
        self.apply(&ticket, result);
        self.view()
    }

    /// Reveals another page. No-op while loading or once everything is shown.
    pub fn load_more(&mut self) -> usize {
        if self.is_loading() {
            return self.window.revealed_count();
        }
        self.window.reveal_more()
    }

    pub fn has_more(&self) -> bool {
        !self.is_loading() && self.window.has_more()
    }

    /// Switches the displayed region and restarts the window on its partition.
    pub fn select_region(&mut self, code: &str) {
        let Some(code) = region::region_code(code) else {
            return;
        };
        if code != self.region {
            self.region = code;
            self.rebuild();
        }
    }

    pub fn set_filter(&mut self, filter: ToolFilter) {
        if filter != self.filter {
            self.filter = filter;
            self.rebuild();
        }
    }

    /// Regions with data, largest first. Empty outside the region ranking.
    pub fn regions(&self) -> Vec<String> {
        self.partitions.regions().into_iter().map(str::to_string).collect()
    }

    /// Tags present in the unfiltered active partition.
    pub fn tags(&self) -> Vec<String> {
        collect_tags(self.partition())
    }

    /// Revealed prefix of the filtered partition.
    pub fn records(&self) -> &[ToolRecord] {
        self.window.slice(&self.active)
    }

    pub fn view(&self) -> LoadView {
        let regional = self.ranking.is_regional();
        let ready = matches!(self.state, LoadState::Ready | LoadState::ReadyWithDiagnostics);

        LoadView {
            state: self.state,
            records: self.records().to_vec(),
            loading: self.is_loading(),
            error: self.failure.clone(),
            attempted_paths: self.attempted_paths.clone(),
            has_more: self.has_more(),
            source: self.source,
            origin: self.origin,
            metadata: self.dataset.as_ref().map(|d| d.metadata.clone()),
            region: regional.then(|| self.region.clone()),
            region_empty: regional && ready && self.partitions.records(&self.region).is_empty(),
            fallback_of_last_resort: self.origin == Some(SourceKind::Embedded) && !self.exact,
        }
    }

    fn partition(&self) -> &[ToolRecord] {
        match &self.dataset {
            None => &[],
            Some(_) if self.ranking.is_regional() => self.partitions.records(&self.region),
            Some(dataset) => &dataset.records,
        }
    }

    fn rebuild(&mut self) {
        self.active = self.filter.apply(self.partition());
        self.window.reset(self.active.len());
    }
}
