// src/classify.rs - Attribution of failure alarms to fault segments
use crate::model::{AlarmEvent, Interval};
use crate::taxonomy::UnitCategories;
use std::collections::BTreeMap;

/// Failure count per bucket name
pub type CategoryCounts = BTreeMap<String, u64>;

/// Count `Raised` failure alarms per bucket inside each sub-interval.
///
/// An alarm counts for a sub-interval `(s, e)` when `s <= ts < e`, so an
/// alarm exactly on a closing instant is never counted twice. `alarms` must
/// be sorted by timestamp. Every bucket of `categories` is present in the
/// result, with zero when nothing matched.
pub fn count_by_category(
    sub_intervals: &[Interval],
    alarms: &[AlarmEvent],
    categories: &UnitCategories,
) -> CategoryCounts {
    let mut counts: CategoryCounts = categories
        .bucket_names()
        .map(|bucket| (bucket.to_string(), 0))
        .collect();

    for interval in sub_intervals {
        let lo = alarms.partition_point(|a| a.timestamp < interval.start);
        let hi = alarms.partition_point(|a| a.timestamp < interval.end);
        let inside = alarms.get(lo..hi).unwrap_or_default();

        for alarm in inside.iter().filter(|a| a.is_raised()) {
            for bucket in categories.buckets_of(&alarm.category_name) {
                if let Some(count) = counts.get_mut(bucket) {
                    *count += 1;
                }
            }
        }
    }

    counts
}

/// Total failures across all buckets
pub fn total_failures(counts: &CategoryCounts) -> u64 {
    counts.values().sum()
}
