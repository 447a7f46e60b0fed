// src/kpi/inter_failure.rs - Mean gap between failure alarms
//
// A different KPI from MTBF: it ignores state samples entirely and averages
// the wall-clock gaps between consecutive raised failure alarms.

use crate::model::{to_hours, AlarmEvent, Window};
use crate::taxonomy::UnitCategories;

/// Mean hours between consecutive raised failure alarms inside the window.
///
/// `None` with fewer than two such alarms. `alarms` must be sorted by timestamp.
pub fn mean_time_between_alarms(
    alarms: &[AlarmEvent],
    window: &Window,
    categories: &UnitCategories,
) -> Option<f64> {
    let stamps: Vec<_> = alarms
        .iter()
        .filter(|a| {
            a.is_raised() && window.contains(a.timestamp) && categories.is_failure(&a.category_name)
        })
        .map(|a| a.timestamp)
        .collect();

    if stamps.len() < 2 {
        return None;
    }

    let gaps: f64 = stamps.windows(2).map(|pair| to_hours(pair[1] - pair[0])).sum();
    Some(gaps / (stamps.len() - 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanonicalDuration, EventType};
    use crate::taxonomy::FailureCategoryTable;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, h, m, 0).unwrap()
    }

    fn raised(name: &str, ts: DateTime<Utc>) -> AlarmEvent {
        AlarmEvent::new("MoorUnit1", 1, name, EventType::Raised, ts)
    }

    #[test]
    fn test_mean_gap() {
        let categories = FailureCategoryTable::standard(["U1"]).for_unit("U1").unwrap();
        let window = Window::ending_at(at(23, 0), CanonicalDuration::OneDay);
        let alarms = vec![
            raised("U1 Check Vacuum Failed", at(8, 0)),
            raised("U1 in Remote", at(9, 0)),
            raised("U1 Mooring Failed to Couple", at(10, 0)),
            raised("U1 Parking Failed to Park", at(14, 0)),
        ];
        assert_eq!(mean_time_between_alarms(&alarms, &window, &categories), Some(3.0));
    }

    #[test]
    fn test_single_failure_has_no_gap() {
        let categories = FailureCategoryTable::standard(["U1"]).for_unit("U1").unwrap();
        let window = Window::ending_at(at(23, 0), CanonicalDuration::OneDay);
        let alarms = vec![raised("U1 Check Vacuum Failed", at(8, 0))];
        assert_eq!(mean_time_between_alarms(&alarms, &window, &categories), None);
    }
}
