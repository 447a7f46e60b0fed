use chrono::{DateTime, Duration, TimeZone, Utc};
use moorkpi::classify::{count_by_category, total_failures};
use moorkpi::intervals::build_intervals;
use moorkpi::kpi::availability;
use moorkpi::segment::{segment, StatePredicate};
use moorkpi::taxonomy::FailureCategoryTable;
use moorkpi::{AlarmEvent, CanonicalDuration, EventType, Interval, ReopenPolicy, StateSample, Window};
use proptest::prelude::*;

const REMOTE: &str = "U1 in Remote";

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap()
}

fn window() -> Window {
    Window::ending_at(base() + Duration::days(1), CanonicalDuration::OneDay)
}

fn event_type() -> impl Strategy<Value = EventType> {
    prop_oneof![
        Just(EventType::Raised),
        Just(EventType::Cleared),
        Just(EventType::Acknowledged),
    ]
}

fn policy() -> impl Strategy<Value = ReopenPolicy> {
    prop_oneof![Just(ReopenPolicy::LastRaiseWins), Just(ReopenPolicy::FirstRaiseWins)]
}

/// Alarm stream over three days around the window, sorted by timestamp
fn alarm_stream() -> impl Strategy<Value = Vec<AlarmEvent>> {
    prop::collection::vec((0i64..3 * 24 * 60, event_type()), 0..60).prop_map(|mut rows| {
        rows.sort_by_key(|(minute, _)| *minute);
        rows.into_iter()
            .map(|(minute, event_type)| {
                let ts = base() - Duration::days(1) + Duration::minutes(minute);
                AlarmEvent::new("MoorUnit1", 1, REMOTE, event_type, ts)
            })
            .collect()
    })
}

fn sample_stream() -> impl Strategy<Value = Vec<StateSample>> {
    prop::collection::vec((0i64..24 * 60, 0i64..12), 0..80).prop_map(|mut rows| {
        rows.sort_by_key(|(minute, _)| *minute);
        rows.into_iter()
            .map(|(minute, code)| StateSample::new("U1", base() + Duration::minutes(minute), code))
            .collect()
    })
}

fn parent_interval() -> impl Strategy<Value = Interval> {
    (0i64..24 * 60, 0i64..24 * 60).prop_map(|(a, b)| {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Interval {
            start: base() + Duration::minutes(lo),
            end: base() + Duration::minutes(hi),
        }
    })
}

proptest! {
    #[test]
    fn test_intervals_closed_inside_window(alarms in alarm_stream(), policy in policy()) {
        let window = window();
        let intervals = build_intervals(&alarms, REMOTE, window, policy);

        for interval in &intervals {
            prop_assert!(interval.start <= interval.end);
            prop_assert!(interval.start >= window.start_time);
            prop_assert!(interval.end <= window.end_time);
        }
        for pair in intervals.windows(2) {
            prop_assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_single_dangling_raise(minute in 0i64..24 * 60, policy in policy()) {
        let window = window();
        let ts = window.start_time + Duration::minutes(minute);
        let alarms = vec![AlarmEvent::new("MoorUnit1", 1, REMOTE, EventType::Raised, ts)];

        let intervals = build_intervals(&alarms, REMOTE, window, policy);
        prop_assert_eq!(intervals.len(), 1);
        prop_assert_eq!(intervals[0].start, ts);
        prop_assert_eq!(intervals[0].end, window.end_time);
    }

    #[test]
    fn test_segments_contained_and_disjoint(
        samples in sample_stream(),
        parent in parent_interval(),
        code in 0i64..12,
    ) {
        for predicate in [StatePredicate::NotEqual(code), StatePredicate::Equal(code)] {
            let segments = segment(&samples, &parent, |c| predicate.matches(c));
            for seg in &segments {
                prop_assert!(seg.start <= seg.end);
                prop_assert!(seg.is_within(&parent));
            }
            for pair in segments.windows(2) {
                prop_assert!(pair[0].end <= pair[1].start);
            }
        }
    }

    #[test]
    fn test_availability_in_range(events in 0usize..100_000, minutes in 0i64..10_000) {
        let value = availability(&window(), events, Duration::minutes(minutes)).availability;
        prop_assert!((0.0..=100.0).contains(&value));
    }

    #[test]
    fn test_classifier_conserves_failures(
        samples in sample_stream(),
        raises in prop::collection::vec((0i64..24 * 60, 0usize..3), 0..40),
    ) {
        let names = ["U1 Check Vacuum Failed", "U1 Parking Failed to Park", "U1 in Remote"];
        let mut raises = raises;
        raises.sort_by_key(|(minute, _)| *minute);
        let alarms: Vec<AlarmEvent> = raises
            .iter()
            .map(|(minute, idx)| {
                AlarmEvent::new(
                    "MoorUnit1",
                    1,
                    names[*idx],
                    EventType::Raised,
                    base() + Duration::minutes(*minute),
                )
            })
            .collect();

        let parent = window().as_interval();
        let segments = segment(&samples, &parent, |c| c != 11);
        let categories = FailureCategoryTable::standard(["U1"]).for_unit("U1").unwrap();
        let counts = count_by_category(&segments, &alarms, &categories);

        let expected = alarms
            .iter()
            .filter(|a| categories.is_failure(&a.category_name))
            .filter(|a| segments.iter().any(|s| s.contains_half_open(a.timestamp)))
            .count() as u64;
        prop_assert_eq!(total_failures(&counts), expected);
        prop_assert_eq!(counts.len(), 7);
    }
}
