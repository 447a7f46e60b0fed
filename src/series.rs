// src/series.rs - KPI time series
//
// A series re-evaluates the full pipeline with the window end pinned to each
// point, so every point is an ordinary report over its own trailing window.

use crate::batch::KpiBatch;
use crate::engine::{KpiEngine, KpiReport, KpiRequest};
use crate::error::Result;
use crate::kpi::Mtbf;
use crate::model::CanonicalDuration;
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

/// One point of a KPI time series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub availability: f64,
    pub mtbf_hours: Mtbf,
    pub utilization: f64,
}

/// Point timestamps from `end - duration` to `end` inclusive, oldest first.
///
/// The step follows the duration: hourly for 1D, daily for 7D and 30D, and
/// every 30 days for 1Y. The last point lands on `end` only when the step
/// divides the duration.
pub fn timestamps(end: DateTime<Utc>, duration: CanonicalDuration) -> Vec<DateTime<Utc>> {
    let step = duration.series_step();
    let mut points = Vec::new();
    let mut current = end - duration.as_duration();
    while current <= end {
        points.push(current);
        current += step;
    }
    points
}

impl From<&KpiReport> for SeriesPoint {
    fn from(report: &KpiReport) -> Self {
        Self {
            timestamp: report.window_end,
            availability: report.availability,
            mtbf_hours: report.mtbf_hours,
            utilization: report.utilization,
        }
    }
}

/// One request per series point, each with its window end pinned.
///
/// The clock is read at most once, so every point shares the same reference end.
pub fn point_requests(request: &KpiRequest) -> Vec<KpiRequest> {
    let end = request.window().end_time;
    timestamps(end, request.duration)
        .into_iter()
        .map(|ts| KpiRequest::new(request.unit.clone(), request.duration).ending_at(ts))
        .collect()
}

impl KpiEngine {
    /// Evaluate `request` at every series point on the calling thread.
    ///
    /// The batch should cover `2 * duration` before the request end; points
    /// whose window reaches before the batch simply see less data.
    pub fn series(&self, request: &KpiRequest, batch: &KpiBatch) -> Result<Vec<SeriesPoint>> {
        let points = point_requests(request);
        debug!(
            "{} {}: evaluating {} series point(s)",
            request.unit,
            request.duration,
            points.len()
        );

        points
            .iter()
            .map(|point| Ok(SeriesPoint::from(&self.evaluate(point, batch)?)))
            .collect()
    }
}
