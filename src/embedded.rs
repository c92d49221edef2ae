use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::EmbeddedError;
use crate::models::{DataFile, Dataset, Metadata, RankingType, ToolRecord};

/// Language of the canonical fallback used when a pair is not compiled in.
pub const CANONICAL_LANGUAGE: &str = "en";
pub const CANONICAL_RANKING: RankingType = RankingType::Monthly;

const SNAPSHOTS: [(&str, &str); 2] = [
    ("en", include_str!("../assets/fallback/en.json")),
    ("zh", include_str!("../assets/fallback/zh.json")),
];

#[derive(Debug, Deserialize)]
struct Snapshot {
    language: String,
    last_updated: DateTime<Utc>,
    data: Vec<ToolRecord>,
}

/// Compiled-in data served when no network path answers.
#[derive(Debug, Clone)]
pub struct EmbeddedDataset {
    pub dataset: Dataset,
    /// False when the requested pair was missing and the canonical pair was served instead.
    pub exact: bool,
}

#[derive(Debug, Clone)]
pub struct EmbeddedFallbackProvider {
    snapshots: Vec<(&'static str, &'static str)>,
}

impl Default for EmbeddedFallbackProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddedFallbackProvider {
    pub fn new() -> Self {
        Self::from_snapshots(SNAPSHOTS.to_vec())
    }

    /// Provider over `(language, snapshot JSON)` pairs other than the compiled-in ones.
    pub fn from_snapshots(snapshots: Vec<(&'static str, &'static str)>) -> Self {
        Self { snapshots }
    }

    pub fn languages(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.snapshots.iter().map(|(lang, _)| *lang)
    }

    pub fn get_embedded(
        &self,
        language: &str,
        ranking: RankingType,
    ) -> Result<EmbeddedDataset, EmbeddedError> {
        match self.snapshot_for(language).map(|raw| build(language, raw, ranking)) {
            Some(Ok(dataset)) => {
                return Ok(EmbeddedDataset {
                    dataset,
                    exact: true,
                })
            }
            Some(Err(err)) => tracing::warn!(
                language,
                ranking = %ranking,
                error = %err,
                "embedded snapshot unreadable, serving canonical {}:{}",
                CANONICAL_LANGUAGE,
                CANONICAL_RANKING
            ),
            None => tracing::warn!(
                language,
                ranking = %ranking,
                "no embedded data for pair, serving canonical {}:{}",
                CANONICAL_LANGUAGE,
                CANONICAL_RANKING
            ),
        }

        let raw = self
            .snapshot_for(CANONICAL_LANGUAGE)
            .ok_or_else(|| EmbeddedError::Missing {
                language: CANONICAL_LANGUAGE.to_string(),
            })?;
        Ok(EmbeddedDataset {
            dataset: build(CANONICAL_LANGUAGE, raw, CANONICAL_RANKING)?,
            exact: false,
        })
    }

    fn snapshot_for(&self, language: &str) -> Option<&'static str> {
        self.snapshots
            .iter()
            .find(|(lang, _)| *lang == language)
            .map(|(_, raw)| *raw)
    }
}

fn build(language: &str, raw: &str, ranking: RankingType) -> Result<Dataset, EmbeddedError> {
    let snapshot: Snapshot = serde_json::from_str(raw).map_err(|source| EmbeddedError::Corrupt {
        language: language.to_string(),
        source,
    })?;

    let mut data = snapshot.data;
    // One record set serves every ranking type; order it by the ranking's own measure
    match ranking {
        RankingType::Total => data.sort_by(|a, b| b.top_visits.total_cmp(&a.top_visits)),
        RankingType::Income => {
            data.sort_by(|a, b| b.estimated_income.total_cmp(&a.estimated_income))
        }
        RankingType::Monthly | RankingType::Region => {
            data.sort_by(|a, b| b.monthly_visits.total_cmp(&a.monthly_visits))
        }
    }

    Ok(Dataset::from_file(DataFile {
        metadata: Metadata {
            last_updated: snapshot.last_updated,
            ranking_type: ranking,
            language: snapshot.language,
            total_items: data.len(),
        },
        data,
    }))
}
