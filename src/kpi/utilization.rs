// src/kpi/utilization.rs - Busy time as a share of available time
use crate::model::{total_hours, Interval};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UtilizationOutcome {
    /// Percentage in `[0, 100]`
    pub utilization: f64,
    pub busy_hours: f64,
    pub maintenance_hours: f64,
    pub available_hours: f64,
}

/// `busy / (window - maintenance) * 100`, or `0` when nothing is available.
///
/// Busy time overlapping maintenance can push the raw ratio past 100; the
/// result is clamped.
pub fn utilization(
    window_hours: f64,
    busy_segments: &[Interval],
    maintenance_intervals: &[Interval],
) -> UtilizationOutcome {
    let busy_hours = total_hours(busy_segments);
    let maintenance_hours = total_hours(maintenance_intervals);
    let available_hours = window_hours - maintenance_hours;

    let utilization = if available_hours > 0.0 {
        ((busy_hours / available_hours) * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    UtilizationOutcome {
        utilization,
        busy_hours,
        maintenance_hours,
        available_hours,
    }
}
