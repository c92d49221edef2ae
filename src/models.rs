use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four dataset variants published for every language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankingType {
    #[serde(rename = "monthly_rank")]
    Monthly,
    #[serde(rename = "total_rank")]
    Total,
    #[serde(rename = "income_rank")]
    Income,
    #[serde(rename = "region_rank")]
    Region,
}

impl RankingType {
    pub const ALL: [RankingType; 4] = [
        RankingType::Total,
        RankingType::Monthly,
        RankingType::Income,
        RankingType::Region,
    ];

    /// File stem used by the published JSON files.
    pub fn as_str(&self) -> &'static str {
        match self {
            RankingType::Monthly => "monthly_rank",
            RankingType::Total => "total_rank",
            RankingType::Income => "income_rank",
            RankingType::Region => "region_rank",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RankingType::Monthly => "Monthly",
            RankingType::Total => "Total",
            RankingType::Income => "Income",
            RankingType::Region => "Region",
        }
    }

    /// Whether the view groups records by region before windowing.
    pub fn is_regional(&self) -> bool {
        matches!(self, RankingType::Region)
    }
}

impl fmt::Display for RankingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "monthly_rank" | "monthly" => Ok(RankingType::Monthly),
            "total_rank" | "total" => Ok(RankingType::Total),
            "income_rank" | "income" => Ok(RankingType::Income),
            "region_rank" | "region" => Ok(RankingType::Region),
            other => Err(format!("unknown ranking type: {other}")),
        }
    }
}

/// Payment processors accepted by a product; the files carry either one name or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaymentPlatforms {
    One(String),
    Many(Vec<String>),
}

impl PaymentPlatforms {
    pub fn names(&self) -> Vec<&str> {
        match self {
            PaymentPlatforms::One(name) => vec![name.as_str()],
            PaymentPlatforms::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// One ranked product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub rank: u32,
    pub name: String,
    #[serde(default, alias = "website")]
    pub url: String,
    #[serde(default, alias = "logo", deserialize_with = "de_opt_string")]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub monthly_visits: f64,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub top_visits: f64,
    // Explicit region assignment; wins over `top_region` when present
    #[serde(default, deserialize_with = "de_opt_string")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub top_region: Option<String>,
    #[serde(default, alias = "top_region_value", deserialize_with = "de_opt_f64")]
    pub top_region_share: Option<f64>,
    #[serde(default, alias = "region_visits", deserialize_with = "de_opt_f64")]
    pub region_monthly_visits: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub growth: f64,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub growth_rate: f64,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub estimated_income: f64,
    #[serde(default, alias = "payment_platform", skip_serializing_if = "Option::is_none")]
    pub payment_platforms: Option<PaymentPlatforms>,
}

impl ToolRecord {
    /// Logo URL, or a generated letter avatar when the file has none.
    pub fn logo_or_avatar(&self) -> String {
        match self.logo_url.as_deref() {
            Some(url) if !url.trim().is_empty() => url.to_string(),
            _ => format!(
                "https://ui-avatars.com/api/?name={}&background=random&color=fff",
                urlencoding::encode(&self.name)
            ),
        }
    }

    /// Region-local visits: the supplied figure, else derived from the top-region share.
    pub fn region_local_visits(&self) -> Option<f64> {
        match self.region_monthly_visits {
            Some(v) if v.is_finite() => Some(v),
            _ => self
                .top_region_share
                .filter(|share| share.is_finite())
                .map(|share| (self.monthly_visits * share).round()),
        }
    }
}

/// Snapshot header of one published file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(deserialize_with = "de_timestamp")]
    pub last_updated: DateTime<Utc>,
    pub ranking_type: RankingType,
    pub language: String,
    #[serde(default)]
    pub total_items: usize,
}

/// On-disk shape of a ranking file: `{ "metadata": ..., "data": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFile {
    pub metadata: Metadata,
    pub data: Vec<ToolRecord>,
}

/// The full ordered collection for one (language, ranking type) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub metadata: Metadata,
    pub records: Vec<ToolRecord>,
}

impl Dataset {
    /// Reconciles the header with the records and re-derives dense ranks from file order.
    pub fn from_file(file: DataFile) -> Self {
        let DataFile { mut metadata, data } = file;

        if metadata.total_items != data.len() {
            tracing::warn!(
                declared = metadata.total_items,
                actual = data.len(),
                ranking = %metadata.ranking_type,
                "total_items disagrees with data length, using data length"
            );
            metadata.total_items = data.len();
        }

        let records = data
            .into_iter()
            .enumerate()
            .map(|(i, mut record)| {
                record.rank = (i + 1) as u32;
                if record.region_monthly_visits.is_none() {
                    record.region_monthly_visits = record
                        .top_region_share
                        .map(|share| (record.monthly_visits * share).round());
                }
                record
            })
            .collect();

        Self { metadata, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Where an acquired dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Cache,
    Network,
    Embedded,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::Cache => "cache",
            SourceKind::Network => "network",
            SourceKind::Embedded => "embedded",
        };
        f.write_str(s)
    }
}

/// Cache key for a (language, ranking type) pair.
pub fn cache_key(language: &str, ranking: RankingType) -> String {
    format!("{}:{}", language, ranking.as_str())
}

fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {other}"))),
    }
}

fn de_lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_opt_f64(deserializer)?.unwrap_or(0.0))
}

fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => Ok(n.as_f64()),
        Some(serde_json::Value::String(s)) => Ok(s.trim().parse::<f64>().ok()),
        Some(other) => Err(serde::de::Error::custom(format!("expected a number, got {other}"))),
    }
}

fn de_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn de_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    // Producer scripts sometimes write naive local timestamps
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "metadata": {
            "last_updated": "2025-03-01T08:00:00.123456",
            "ranking_type": "income_rank",
            "language": "en",
            "total_items": 5
        },
        "data": [
            {
                "id": 17,
                "rank": 9,
                "name": "Alpha",
                "website": "https://alpha.example",
                "logo": "",
                "description": "first",
                "monthly_visits": 1000,
                "top_visits": 1200.5,
                "top_region": "United States",
                "top_region_value": 0.25,
                "tags": ["AI"],
                "growth": null,
                "growth_rate": 0.1,
                "estimated_income": 5000,
                "payment_platform": "Stripe"
            },
            {
                "id": "b",
                "rank": 3,
                "name": "Beta",
                "url": "https://beta.example",
                "monthly_visits": 10,
                "payment_platforms": ["Stripe", "PayPal"]
            }
        ]
    }"#;

    #[test]
    fn parses_producer_field_names() {
        let file: DataFile = serde_json::from_str(SAMPLE).unwrap();
        let alpha = &file.data[0];
        assert_eq!(alpha.id, "17");
        assert_eq!(alpha.url, "https://alpha.example");
        assert_eq!(alpha.logo_url, None);
        assert_eq!(alpha.top_region_share, Some(0.25));
        assert_eq!(alpha.growth, 0.0);
        assert_eq!(
            alpha.payment_platforms,
            Some(PaymentPlatforms::One("Stripe".to_string()))
        );
        assert_eq!(
            file.data[1].payment_platforms.as_ref().unwrap().names(),
            vec!["Stripe", "PayPal"]
        );
        assert_eq!(file.metadata.ranking_type, RankingType::Income);
    }

    #[test]
    fn dataset_reconciles_counts_and_ranks() {
        let file: DataFile = serde_json::from_str(SAMPLE).unwrap();
        let dataset = Dataset::from_file(file);
        assert_eq!(dataset.metadata.total_items, 2);
        let ranks: Vec<u32> = dataset.records.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2]);
        assert_eq!(dataset.records[0].region_monthly_visits, Some(250.0));
        assert_eq!(dataset.records[1].region_monthly_visits, None);
    }

    #[test]
    fn avatar_used_when_logo_missing() {
        let file: DataFile = serde_json::from_str(SAMPLE).unwrap();
        let avatar = file.data[0].logo_or_avatar();
        assert!(avatar.starts_with("https://ui-avatars.com/api/?name=Alpha"));
    }

    #[test]
    fn ranking_type_round_trips_through_str() {
        for ranking in RankingType::ALL {
            assert_eq!(ranking.as_str().parse::<RankingType>().unwrap(), ranking);
        }
        assert!("weekly".parse::<RankingType>().is_err());
    }

    #[test]
    fn cache_key_joins_language_and_type() {
        assert_eq!(cache_key("zh", RankingType::Region), "zh:region_rank");
    }
}
