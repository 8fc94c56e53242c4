//! Stats module - crash aggregation

mod aggregator;

pub use aggregator::{
    CategoryKey, CrashAggregator, MonthlyCount, SummaryStats, OTHER_THRESHOLD_PERCENT,
};
