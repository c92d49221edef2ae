mod support;

use std::sync::Arc;
use std::time::Duration;

use airank_reader::{
    AcquireError, AcquisitionOrchestrator, DatasetCache, EmbeddedFallbackProvider, ManualClock,
    PathResolver, RankingType, RequestGeneration, SourceKind,
};
use support::{ranking_file, tool, Reply, ScriptedFetcher};

const A: &str = "./assets/data/en/total_rank.json";
const B: &str = "/assets/data/en/total_rank.json";
const C: &str = "en/total_rank.json";
const D: &str = "/mirror/en/total_rank.json";

fn resolver() -> PathResolver {
    PathResolver::new([
        "./assets/data/{lang}/{type}.json",
        "/assets/data/{lang}/{type}.json",
        "{lang}/{type}.json",
        "/mirror/{lang}/{type}.json",
    ])
}

fn orchestrator(
    fetcher: Arc<ScriptedFetcher>,
    clock: Arc<ManualClock>,
) -> AcquisitionOrchestrator {
    AcquisitionOrchestrator::new(
        fetcher,
        resolver(),
        Arc::new(DatasetCache::new(Duration::from_secs(300), clock)),
        EmbeddedFallbackProvider::new(),
    )
}

fn three_tools() -> Vec<airank_reader::ToolRecord> {
    vec![tool("a", 300.0), tool("b", 200.0), tool("c", 100.0)]
}

#[tokio::test]
async fn ordered_fallback_stops_at_first_success() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .reply(A, Reply::Status(404))
            .reply(B, Reply::Garbage)
            .reply(C, Reply::File(ranking_file("en", RankingType::Total, three_tools())))
            .reply(D, Reply::File(ranking_file("en", RankingType::Total, vec![tool("z", 1.0)]))),
    );
    let orchestrator = orchestrator(fetcher.clone(), Arc::new(ManualClock::new()));
    let ticket = RequestGeneration::new().begin();

    let acquisition = orchestrator
        .acquire("en", RankingType::Total, &ticket)
        .await
        .unwrap();

    assert_eq!(acquisition.source, SourceKind::Network);
    assert_eq!(acquisition.attempted_paths, vec![A, B]);
    assert_eq!(acquisition.resolved_path.as_deref(), Some(C));
    assert_eq!(fetcher.calls(), vec![A, B, C]);
    assert_eq!(acquisition.dataset.len(), 3);
}

#[tokio::test]
async fn fresh_cache_entry_skips_the_network() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .reply(A, Reply::File(ranking_file("en", RankingType::Total, three_tools()))),
    );
    let clock = Arc::new(ManualClock::new());
    let orchestrator = orchestrator(fetcher.clone(), clock.clone());
    let generation = RequestGeneration::new();

    let first = orchestrator
        .acquire("en", RankingType::Total, &generation.begin())
        .await
        .unwrap();
    assert_eq!(first.source, SourceKind::Network);
    assert_eq!(fetcher.calls().len(), 1);

    clock.advance(Duration::from_secs(299));
    let second = orchestrator
        .acquire("en", RankingType::Total, &generation.begin())
        .await
        .unwrap();
    assert_eq!(second.source, SourceKind::Cache);
    assert_eq!(second.origin, SourceKind::Network);
    assert!(second.attempted_paths.is_empty());
    assert_eq!(second.dataset, first.dataset);
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn expired_cache_entry_goes_back_to_the_network() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .reply(A, Reply::File(ranking_file("en", RankingType::Total, three_tools()))),
    );
    let clock = Arc::new(ManualClock::new());
    let orchestrator = orchestrator(fetcher.clone(), clock.clone());
    let generation = RequestGeneration::new();

    orchestrator
        .acquire("en", RankingType::Total, &generation.begin())
        .await
        .unwrap();
    clock.advance(Duration::from_secs(301));
    let again = orchestrator
        .acquire("en", RankingType::Total, &generation.begin())
        .await
        .unwrap();

    assert_eq!(again.source, SourceKind::Network);
    assert_eq!(fetcher.calls(), vec![A, A]);
}

#[tokio::test]
async fn all_paths_404_falls_back_to_embedded() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .reply("./assets/data/en/region_rank.json", Reply::Status(404))
            .reply("/assets/data/en/region_rank.json", Reply::Status(404))
            .reply("en/region_rank.json", Reply::Status(404)),
    );
    let orchestrator = AcquisitionOrchestrator::new(
        fetcher.clone(),
        PathResolver::new([
            "./assets/data/{lang}/{type}.json",
            "/assets/data/{lang}/{type}.json",
            "{lang}/{type}.json",
        ]),
        Arc::new(DatasetCache::with_system_clock(Duration::from_secs(300))),
        EmbeddedFallbackProvider::new(),
    );

    let acquisition = orchestrator
        .acquire("en", RankingType::Region, &RequestGeneration::new().begin())
        .await
        .unwrap();

    assert_eq!(acquisition.source, SourceKind::Embedded);
    assert_eq!(acquisition.attempted_paths.len(), 3);
    assert!(acquisition.exact);
    assert!(!acquisition.dataset.is_empty());
    assert_eq!(acquisition.dataset.metadata.ranking_type, RankingType::Region);

    // the embedded result is cached like any other
    let cached = orchestrator
        .acquire("en", RankingType::Region, &RequestGeneration::new().begin())
        .await
        .unwrap();
    assert_eq!(cached.source, SourceKind::Cache);
    assert_eq!(cached.origin, SourceKind::Embedded);
    assert!(cached.exact);
    assert_eq!(fetcher.calls().len(), 3);
}

#[tokio::test]
async fn unsupported_language_is_served_the_canonical_fallback() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let orchestrator = orchestrator(fetcher.clone(), Arc::new(ManualClock::new()));

    let acquisition = orchestrator
        .acquire("fr", RankingType::Income, &RequestGeneration::new().begin())
        .await
        .unwrap();

    assert_eq!(acquisition.source, SourceKind::Embedded);
    assert!(!acquisition.exact);
    assert_eq!(acquisition.dataset.metadata.language, "en");
    assert_eq!(acquisition.attempted_paths.len(), 4);
}

#[tokio::test]
async fn total_failure_carries_diagnostics() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let orchestrator = AcquisitionOrchestrator::new(
        fetcher,
        resolver(),
        Arc::new(DatasetCache::with_system_clock(Duration::from_secs(300))),
        EmbeddedFallbackProvider::from_snapshots(vec![("en", "not json")]),
    );

    let err = orchestrator
        .acquire("en", RankingType::Monthly, &RequestGeneration::new().begin())
        .await
        .unwrap_err();

    match err {
        AcquireError::Total {
            language,
            ranking,
            base,
            attempted_paths,
            ..
        } => {
            assert_eq!(language, "en");
            assert_eq!(ranking, RankingType::Monthly);
            assert_eq!(base, "scripted://");
            assert_eq!(attempted_paths.len(), 4);
        }
        other => panic!("expected total failure, got {other:?}"),
    }
}

#[tokio::test]
async fn superseded_request_stops_and_leaves_cache_alone() {
    let generation = RequestGeneration::new();
    let interrupter = generation.clone();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .reply(B, Reply::File(ranking_file("en", RankingType::Total, three_tools())))
            .on_fetch(move |_| {
                interrupter.begin();
            }),
    );
    let orchestrator = orchestrator(fetcher.clone(), Arc::new(ManualClock::new()));

    let stale = generation.begin();
    let result = orchestrator.acquire("en", RankingType::Total, &stale).await;

    assert!(matches!(result, Err(AcquireError::Superseded)));
    // A failed and the ticket went stale during that fetch, so B is never requested
    assert_eq!(fetcher.calls(), vec![A]);
    assert!(orchestrator.cache().get("en:total_rank").is_none());
}
