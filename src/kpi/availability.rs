// src/kpi/availability.rs - Availability percentage
//
// Downtime is a fixed duration per raised maintenance alarm, not a
// reconstructed interval.

use crate::model::{AlarmEvent, Window};
use chrono::Duration;
use serde::Serialize;

/// Identifies the maintenance alarm of one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceMatcher {
    /// Journal alarm id; takes precedence over the name when set
    pub alarm_id: Option<i64>,
    pub category_name: String,
}

impl MaintenanceMatcher {
    pub fn matches(&self, event: &AlarmEvent) -> bool {
        match self.alarm_id {
            Some(id) => event.alarm_id == id,
            None => event.category_name == self.category_name,
        }
    }
}

/// Number of raised maintenance alarms inside the window
pub fn maintenance_event_count(
    alarms: &[AlarmEvent],
    window: &Window,
    matcher: &MaintenanceMatcher,
) -> usize {
    alarms
        .iter()
        .filter(|e| e.is_raised() && window.contains(e.timestamp) && matcher.matches(e))
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AvailabilityOutcome {
    /// Percentage in `[0, 100]`
    pub availability: f64,
    pub maintenance_count: usize,
    pub maintenance_downtime_minutes: f64,
}

/// `((window - events * per_event) / window) * 100`, clamped to `[0, 100]`.
///
/// A zero-length window has nothing to be unavailable for and reports 100.
pub fn availability(
    window: &Window,
    maintenance_events: usize,
    per_event: Duration,
) -> AvailabilityOutcome {
    let downtime_ms = per_event.num_milliseconds() as f64 * maintenance_events as f64;
    let window_ms = window.length().num_milliseconds() as f64;

    let availability = if window_ms <= 0.0 {
        100.0
    } else {
        (((window_ms - downtime_ms) / window_ms) * 100.0).clamp(0.0, 100.0)
    };

    AvailabilityOutcome {
        availability,
        maintenance_count: maintenance_events,
        maintenance_downtime_minutes: downtime_ms / 60_000.0,
    }
}
