use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::models::ToolRecord;

/// Free-text search plus tag selection applied to the active partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolFilter {
    pub search: String,
    pub tags: Vec<String>,
}

impl ToolFilter {
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.tags.is_empty()
    }

    pub fn matches(&self, record: &ToolRecord) -> bool {
        let needle = self.search.trim().to_lowercase();
        let matches_search = needle.is_empty()
            || record.name.to_lowercase().contains(&needle)
            || record.description.to_lowercase().contains(&needle);

        let matches_tags =
            self.tags.is_empty() || self.tags.iter().any(|tag| record.tags.contains(tag));

        matches_search && matches_tags
    }

    pub fn apply(&self, records: &[ToolRecord]) -> Vec<ToolRecord> {
        if self.is_empty() {
            return records.to_vec();
        }
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Sorted, de-duplicated tags across `records`.
pub fn collect_tags(records: &[ToolRecord]) -> Vec<String> {
    records
        .iter()
        .flat_map(|r| r.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Rank,
    Name,
    MonthlyVisits,
    GrowthRate,
    TopRegion,
    EstimatedIncome,
    PaymentPlatform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Column sort of the rows already on screen. Ranks are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSort {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for ColumnSort {
    fn default() -> Self {
        Self {
            key: SortKey::Rank,
            direction: SortDirection::Asc,
        }
    }
}

impl ColumnSort {
    /// Clicking the active column flips direction; another column starts ascending.
    pub fn toggle(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.flip();
        } else {
            self.key = key;
            self.direction = SortDirection::Asc;
        }
    }

    pub fn sort_revealed(&self, rows: &mut [ToolRecord]) {
        rows.sort_by(|a, b| {
            let ord = compare(self.key, a, b);
            match self.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }
}

fn compare(key: SortKey, a: &ToolRecord, b: &ToolRecord) -> Ordering {
    match key {
        SortKey::Rank => a.rank.cmp(&b.rank),
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::MonthlyVisits => a.monthly_visits.total_cmp(&b.monthly_visits),
        SortKey::GrowthRate => a.growth_rate.total_cmp(&b.growth_rate),
        SortKey::TopRegion => a.top_region.cmp(&b.top_region),
        SortKey::EstimatedIncome => a.estimated_income.total_cmp(&b.estimated_income),
        SortKey::PaymentPlatform => {
            let first = |r: &ToolRecord| {
                r.payment_platforms
                    .as_ref()
                    .and_then(|p| p.names().first().map(|s| s.to_string()))
            };
            first(a).cmp(&first(b))
        }
    }
}
