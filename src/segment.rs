// src/segment.rs - State-sample segmentation inside alarm intervals
use crate::model::{Interval, StateSample};
use serde::{Deserialize, Serialize};

/// Which state codes count as "inside" a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "code", rename_all = "snake_case")]
pub enum StatePredicate {
    /// Any state other than the given one (away from ready, for MTBF)
    NotEqual(i64),
    /// Exactly the given state (busy, for Utilization)
    Equal(i64),
}

impl StatePredicate {
    pub fn matches(self, state_code: i64) -> bool {
        match self {
            StatePredicate::NotEqual(code) => state_code != code,
            StatePredicate::Equal(code) => state_code == code,
        }
    }
}

/// Find the sub-intervals of `interval` where `predicate` holds.
///
/// `samples` must be sorted by timestamp. Only samples inside
/// `[interval.start, interval.end]` are considered. A segment opens on the
/// first matching sample, closes on the next non-matching sample, and a
/// segment still open after the last sample closes at `interval.end`.
///
/// Returned segments are ordered, non-overlapping and contained in
/// `interval`. No samples inside the interval means no segments.
pub fn segment<P>(samples: &[StateSample], interval: &Interval, predicate: P) -> Vec<Interval>
where
    P: Fn(i64) -> bool,
{
    let lo = samples.partition_point(|s| s.timestamp < interval.start);
    let hi = samples.partition_point(|s| s.timestamp <= interval.end);
    let inside = samples.get(lo..hi).unwrap_or_default();

    let mut segments = Vec::new();
    let mut open_since = None;

    for sample in inside {
        match (predicate(sample.state_code), open_since) {
            (true, None) => open_since = Some(sample.timestamp),
            (false, Some(start)) => {
                segments.push(Interval {
                    start,
                    end: sample.timestamp,
                });
                open_since = None;
            }
            _ => {}
        }
    }

    if let Some(start) = open_since {
        segments.push(Interval {
            start,
            end: interval.end,
        });
    }

    segments
}

/// Segment every parent interval with the same predicate and concatenate
pub fn segment_all(
    samples: &[StateSample],
    intervals: &[Interval],
    predicate: StatePredicate,
) -> Vec<Interval> {
    intervals
        .iter()
        .flat_map(|interval| segment(samples, interval, |code| predicate.matches(code)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, h, m, 0).unwrap()
    }

    fn samples(points: &[(u32, u32, i64)]) -> Vec<StateSample> {
        points
            .iter()
            .map(|&(h, m, code)| StateSample::new("U1", at(h, m), code))
            .collect()
    }

    #[test]
    fn test_fault_segment_closed_by_ready_sample() {
        let interval = Interval::new(at(10, 0), at(11, 0)).unwrap();
        let samples = samples(&[(10, 0, 11), (10, 10, 3), (10, 20, 5), (10, 40, 11)]);
        let segments = segment(&samples, &interval, |code| StatePredicate::NotEqual(11).matches(code));
        assert_eq!(segments, vec![Interval::new(at(10, 10), at(10, 40)).unwrap()]);
    }

    #[test]
    fn test_open_segment_closes_at_interval_end() {
        let interval = Interval::new(at(10, 0), at(11, 0)).unwrap();
        let samples = samples(&[(10, 30, 6), (10, 45, 6)]);
        let segments = segment(&samples, &interval, |code| code == 6);
        assert_eq!(segments, vec![Interval::new(at(10, 30), at(11, 0)).unwrap()]);
    }

    #[test]
    fn test_samples_outside_interval_are_ignored() {
        let interval = Interval::new(at(10, 0), at(11, 0)).unwrap();
        let samples = samples(&[(9, 0, 6), (9, 59, 11), (11, 0, 6), (12, 0, 11)]);
        let segments = segment(&samples, &interval, |code| code == 6);
        // the boundary sample at 11:00 opens a zero-length segment at the end
        assert_eq!(segments, vec![Interval::new(at(11, 0), at(11, 0)).unwrap()]);
    }

    #[test]
    fn test_empty_samples_yield_no_segments() {
        let interval = Interval::new(at(10, 0), at(11, 0)).unwrap();
        assert!(segment(&[], &interval, |_| true).is_empty());
    }

    #[test]
    fn test_segment_all_multiple_parents() {
        let parents = vec![
            Interval::new(at(10, 0), at(11, 0)).unwrap(),
            Interval::new(at(13, 0), at(14, 0)).unwrap(),
        ];
        let samples = samples(&[(10, 0, 3), (10, 30, 11), (13, 15, 4), (13, 45, 11)]);
        let segments = segment_all(&samples, &parents, StatePredicate::NotEqual(11));
        assert_eq!(
            segments,
            vec![
                Interval::new(at(10, 0), at(10, 30)).unwrap(),
                Interval::new(at(13, 15), at(13, 45)).unwrap(),
            ]
        );
        assert!(segments.iter().zip(&parents).all(|(s, p)| s.is_within(p)));
    }
}
