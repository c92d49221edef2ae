use std::collections::BTreeMap;

use crate::models::ToolRecord;

/// Region shown when the user has not picked one.
pub const DEFAULT_REGION: &str = "US";

// Market names as they appear in the published files, English and Chinese
const REGION_NAMES: &[(&str, &str)] = &[
    ("united states", "US"),
    ("usa", "US"),
    ("美国", "US"),
    ("china", "CN"),
    ("中国", "CN"),
    ("india", "IN"),
    ("印度", "IN"),
    ("japan", "JP"),
    ("日本", "JP"),
    ("united kingdom", "GB"),
    ("uk", "GB"),
    ("英国", "GB"),
    ("germany", "DE"),
    ("德国", "DE"),
    ("france", "FR"),
    ("法国", "FR"),
    ("brazil", "BR"),
    ("巴西", "BR"),
    ("south korea", "KR"),
    ("korea", "KR"),
    ("韩国", "KR"),
    ("indonesia", "ID"),
    ("印度尼西亚", "ID"),
    ("russia", "RU"),
    ("俄罗斯", "RU"),
    ("canada", "CA"),
    ("加拿大", "CA"),
    ("spain", "ES"),
    ("西班牙", "ES"),
    ("vietnam", "VN"),
    ("越南", "VN"),
    ("philippines", "PH"),
    ("菲律宾", "PH"),
    ("mexico", "MX"),
    ("墨西哥", "MX"),
];

/// Stable region code for a raw region field, or `None` when it is blank.
pub fn region_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lowered = trimmed.to_lowercase();
    if let Some((_, code)) = REGION_NAMES.iter().find(|(name, _)| *name == lowered) {
        return Some(code.to_string());
    }

    if (2..=3).contains(&trimmed.len()) && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(trimmed.to_ascii_uppercase());
    }

    Some(trimmed.to_string())
}

/// Region a record belongs to: the explicit field first, then its top region.
pub fn record_region(record: &ToolRecord) -> Option<String> {
    record
        .region
        .as_deref()
        .and_then(region_code)
        .or_else(|| record.top_region.as_deref().and_then(region_code))
}

/// Region code → that region's records, re-ranked by region-local visits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionPartitionMap {
    partitions: BTreeMap<String, Vec<ToolRecord>>,
}

impl RegionPartitionMap {
    pub fn get(&self, code: &str) -> Option<&[ToolRecord]> {
        self.partitions.get(code).map(Vec::as_slice)
    }

    /// Records for `code`, empty when the region has no data.
    pub fn records(&self, code: &str) -> &[ToolRecord] {
        self.get(code).unwrap_or(&[])
    }

    /// Region codes, largest partition first.
    pub fn regions(&self) -> Vec<&str> {
        let mut codes: Vec<(&str, usize)> = self
            .partitions
            .iter()
            .map(|(code, records)| (code.as_str(), records.len()))
            .collect();
        codes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        codes.into_iter().map(|(code, _)| code).collect()
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

/// Groups records by region and assigns dense per-region ranks.
///
/// Records with no region, or no way to know their region-local visits, are left out.
/// Ties keep dataset order. Input records are never modified; partitions hold copies.
pub fn partition(records: &[ToolRecord]) -> RegionPartitionMap {
    let mut groups: BTreeMap<String, Vec<(f64, &ToolRecord)>> = BTreeMap::new();

    for record in records {
        let Some(visits) = record.region_local_visits() else {
            continue;
        };
        let Some(code) = record_region(record) else {
            continue;
        };
        groups.entry(code).or_default().push((visits, record));
    }

    let partitions = groups
        .into_iter()
        .map(|(code, mut group)| {
            // sort_by is stable, so equal visit counts keep dataset order
            group.sort_by(|a, b| b.0.total_cmp(&a.0));
            let ranked = group
                .into_iter()
                .enumerate()
                .map(|(i, (visits, record))| {
                    let mut copy = record.clone();
                    copy.rank = (i + 1) as u32;
                    copy.region_monthly_visits = Some(visits);
                    copy
                })
                .collect();
            (code, ranked)
        })
        .collect();

    RegionPartitionMap { partitions }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, region: &str, visits: f64, share: Option<f64>) -> ToolRecord {
        ToolRecord {
            id: id.to_string(),
            name: id.to_string(),
            monthly_visits: visits,
            top_region: Some(region.to_string()),
            top_region_share: share,
            ..Default::default()
        }
    }

    #[test]
    fn names_and_codes_normalize() {
        assert_eq!(region_code("United States").as_deref(), Some("US"));
        assert_eq!(region_code("美国").as_deref(), Some("US"));
        assert_eq!(region_code(" jp ").as_deref(), Some("JP"));
        assert_eq!(region_code("Atlantis").as_deref(), Some("Atlantis"));
        assert_eq!(region_code("  "), None);
    }

    #[test]
    fn explicit_region_wins_over_top_region() {
        let mut r = record("a", "Japan", 10.0, Some(0.5));
        r.region = Some("de".to_string());
        assert_eq!(record_region(&r).as_deref(), Some("DE"));
    }

    #[test]
    fn partitions_rank_by_region_visits() {
        let records = vec![
            record("a", "US", 1000.0, Some(0.1)), // 100
            record("b", "US", 500.0, Some(0.5)),  // 250
            record("c", "JP", 300.0, Some(0.2)),  // 60
            record("d", "US", 200.0, None),       // excluded
        ];
        let map = partition(&records);

        let us: Vec<(&str, u32)> = map
            .records("US")
            .iter()
            .map(|r| (r.id.as_str(), r.rank))
            .collect();
        assert_eq!(us, vec![("b", 1), ("a", 2)]);
        assert_eq!(map.records("JP")[0].rank, 1);
        assert_eq!(map.records("JP")[0].region_monthly_visits, Some(60.0));
        assert!(map.records("BR").is_empty());
        assert_eq!(map.regions(), vec!["US", "JP"]);
    }

    #[test]
    fn supplied_region_visits_beat_share() {
        let mut a = record("a", "US", 1000.0, Some(0.9));
        a.region_monthly_visits = Some(5.0);
        let b = record("b", "US", 100.0, Some(0.5));
        let map = partition(&[a, b]);
        assert_eq!(map.records("US")[0].id, "b");
    }

    #[test]
    fn ties_keep_dataset_order_and_ranks_stay_dense() {
        let records: Vec<ToolRecord> = (0..7)
            .map(|i| record(&format!("t{i}"), "IN", 100.0, Some(0.5)))
            .collect();
        let map = partition(&records);
        let ids: Vec<&str> = map.records("IN").iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["t0", "t1", "t2", "t3", "t4", "t5", "t6"]);
        for (i, r) in map.records("IN").iter().enumerate() {
            assert_eq!(r.rank as usize, i + 1);
        }
    }

    #[test]
    fn input_records_are_not_touched() {
        let records = vec![record("a", "US", 10.0, Some(1.0)), record("b", "US", 20.0, Some(1.0))];
        let before = records.clone();
        let _ = partition(&records);
        assert_eq!(records, before);
    }
}
