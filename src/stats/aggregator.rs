//! Crash Aggregator Module
//! Group-by-count summaries over a crash dataset: per month, per category,
//! and the totals derived from the monthly counts.

use crate::data::{CategoryField, CrashDataset};
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Categories with a share strictly below this percentage collapse into "Other".
pub const OTHER_THRESHOLD_PERCENT: f64 = 2.5;

/// Month number to crash count. Months without crashes are absent, not zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    counts: BTreeMap<u32, usize>,
}

impl MonthlyCount {
    /// Count for `month`, or `None` if the month has no crashes.
    pub fn get(&self, month: u32) -> Option<usize> {
        self.counts.get(&month).copied()
    }

    /// Count for `month`, failing when the month is absent.
    pub fn count_for(&self, month: u32) -> Result<usize> {
        self.get(month).ok_or(Error::SelectionOutOfRange { month })
    }

    /// Present months in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.counts.iter().map(|(&m, &c)| (m, c))
    }

    /// Number of months present.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(u32, usize)> for MonthlyCount {
    fn from_iter<I: IntoIterator<Item = (u32, usize)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}

/// Key of a category bucket.
///
/// The collapsed bucket is its own variant, so a literal "Other" value in the
/// source data stays a separate, ordinary category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum CategoryKey {
    Value(String),
    Other,
}

impl CategoryKey {
    pub fn label(&self) -> &str {
        match self {
            Self::Value(v) => v,
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One bucket of a [`CategoryCount`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBucket {
    pub key: CategoryKey,
    pub count: usize,
    /// Share of all counted records, 0-100.
    pub percent: f64,
}

/// Per-category crash counts with small categories collapsed into "Other".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub field: CategoryField,
    /// Direct buckets by count descending (ties by label), then "Other" if any.
    pub buckets: Vec<CategoryBucket>,
    /// Records with a value for `field`.
    pub total: usize,
    /// Raw values merged into "Other", sorted.
    pub collapsed: Vec<String>,
}

impl CategoryCount {
    pub fn get(&self, key: &CategoryKey) -> Option<&CategoryBucket> {
        self.buckets.iter().find(|b| &b.key == key)
    }

    /// The collapsed bucket, present only when something fell below threshold.
    pub fn other(&self) -> Option<&CategoryBucket> {
        self.get(&CategoryKey::Other)
    }
}

/// Totals derived from a [`MonthlyCount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SummaryStats {
    pub total: usize,
    /// Highest count among present months.
    pub max: Option<usize>,
    /// Lowest count among present months.
    pub min: Option<usize>,
}

/// Pure aggregation functions over a crash dataset.
pub struct CrashAggregator;

impl CrashAggregator {
    /// Group records by derived month and count each group.
    pub fn monthly_counts(dataset: &CrashDataset) -> MonthlyCount {
        let mut counts = BTreeMap::new();
        for record in dataset {
            *counts.entry(record.month).or_insert(0) += 1;
        }
        MonthlyCount { counts }
    }

    /// Group records by the raw value of `field`, compute each share and
    /// collapse every share below [`OTHER_THRESHOLD_PERCENT`] into "Other".
    ///
    /// Records missing the field are not counted.
    pub fn category_counts(dataset: &CrashDataset, field: CategoryField) -> CategoryCount {
        let mut raw: HashMap<&str, usize> = HashMap::new();
        for value in dataset.iter().filter_map(|r| field.value(r)) {
            *raw.entry(value).or_insert(0) += 1;
        }

        let total: usize = raw.values().sum();
        let percent_of = |count: usize| {
            if total == 0 {
                0.0
            } else {
                count as f64 * 100.0 / total as f64
            }
        };

        let mut buckets = Vec::with_capacity(raw.len() + 1);
        let mut collapsed = Vec::new();
        let mut other_count = 0;

        for (value, count) in raw {
            if percent_of(count) < OTHER_THRESHOLD_PERCENT {
                other_count += count;
                collapsed.push(value.to_string());
            } else {
                buckets.push(CategoryBucket {
                    key: CategoryKey::Value(value.to_string()),
                    count,
                    percent: percent_of(count),
                });
            }
        }

        buckets.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.key.label().cmp(b.key.label()))
        });
        collapsed.sort();

        if !collapsed.is_empty() {
            buckets.push(CategoryBucket {
                key: CategoryKey::Other,
                count: other_count,
                percent: percent_of(other_count),
            });
        }

        CategoryCount {
            field,
            buckets,
            total,
            collapsed,
        }
    }

    /// Sum, max and min of the monthly counts.
    pub fn summary_stats(monthly: &MonthlyCount) -> SummaryStats {
        SummaryStats {
            total: monthly.iter().map(|(_, c)| c).sum(),
            max: monthly.iter().map(|(_, c)| c).max(),
            min: monthly.iter().map(|(_, c)| c).min(),
        }
    }
}
