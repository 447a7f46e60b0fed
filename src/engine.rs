// src/engine.rs - KPI evaluation engine
//
// Pipeline per KPI request:
//
//   alarms --IntervalBuilder--> Remote / Maintenance intervals
//   samples --segment--> fault (away from ready) and busy sub-intervals
//   fault sub-intervals + alarms --classify--> failure breakdown
//   everything --kpi::*--> Availability, MTBF, Utilization
//
// The engine owns nothing but its configuration. Every call takes the batch
// explicitly and returns a fresh report.

use crate::batch::KpiBatch;
use crate::classify::{count_by_category, CategoryCounts};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::intervals::build_intervals;
use crate::kpi::{
    self, maintenance_event_count, round2, AvailabilityOutcome, Mtbf, MtbfOutcome,
    UtilizationOutcome,
};
use crate::model::{CanonicalDuration, Interval, Window};
use crate::normalize::normalize_duration;
use crate::segment::{segment_all, StatePredicate};
use crate::taxonomy::{FailureCategoryTable, UnitCategories};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

// ============================================================================
// REQUESTS AND REPORTS
// ============================================================================

/// One KPI request: a unit, a canonical duration and an optional window end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiRequest {
    pub unit: String,
    #[serde(default)]
    pub duration: CanonicalDuration,
    /// Window end; `None` means now
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl KpiRequest {
    pub fn new(unit: impl Into<String>, duration: CanonicalDuration) -> Self {
        Self {
            unit: unit.into(),
            duration,
            end_time: None,
        }
    }

    /// Request from a free-form duration token (`24h`, `7d`, `12M`, ...)
    pub fn from_token(unit: impl Into<String>, token: &str) -> Self {
        Self::new(unit, normalize_duration(token))
    }

    pub fn ending_at(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// Resolve the reporting window, reading the clock when no end is pinned
    pub fn window(&self) -> Window {
        match self.end_time {
            Some(end) => Window::ending_at(end, self.duration),
            None => Window::ending_now(self.duration),
        }
    }
}

/// KPI values for one unit over one window, rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiReport {
    pub unit: String,
    pub duration: CanonicalDuration,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Percentage in `[0, 100]`
    pub availability: f64,
    /// Hours, or `"N/A"`
    pub mtbf_hours: Mtbf,
    pub mtbf_breakdown: CategoryCounts,
    /// Percentage in `[0, 100]`
    pub utilization: f64,
    pub mean_time_between_alarms_hours: Option<f64>,
}

// ============================================================================
// ENGINE
// ============================================================================

#[derive(Debug, Clone)]
pub struct KpiEngine {
    config: EngineConfig,
    categories: FailureCategoryTable,
}

impl KpiEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let categories = config.category_table();
        debug!(
            "KPI engine ready: {} unit(s), {} failure bucket(s), {:?}",
            config.units.len(),
            config.failure_categories.len(),
            config.reopen_policy
        );
        Ok(Self { config, categories })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Failure taxonomy rendered for `unit`, or `UnknownUnit`
    pub fn unit_categories(&self, unit: &str) -> Result<UnitCategories> {
        self.categories.for_unit(unit)
    }

    /// Evaluate every KPI for one request
    pub fn evaluate(&self, request: &KpiRequest, batch: &KpiBatch) -> Result<KpiReport> {
        self.evaluate_window(&request.unit, request.duration, request.window(), batch)
    }

    /// Evaluate every KPI over an explicit window
    pub fn evaluate_window(
        &self,
        unit: &str,
        duration: CanonicalDuration,
        window: Window,
        batch: &KpiBatch,
    ) -> Result<KpiReport> {
        let categories = self.unit_categories(unit)?;

        let availability = self.availability(unit, &window, batch)?;
        let mtbf = self.mtbf_with(&categories, &window, batch);
        let utilization = self.utilization(unit, &window, batch)?;
        let mean_gap = kpi::mean_time_between_alarms(batch.alarms(), &window, &categories);

        info!(
            "{} {} [{} .. {}]: availability {:.2}%, MTBF {}, utilization {:.2}%",
            unit,
            duration,
            window.start_time,
            window.end_time,
            availability.availability,
            mtbf.mtbf,
            utilization.utilization
        );

        Ok(KpiReport {
            unit: unit.to_string(),
            duration,
            window_start: window.start_time,
            window_end: window.end_time,
            availability: round2(availability.availability),
            mtbf_hours: mtbf.mtbf.rounded(),
            mtbf_breakdown: mtbf.breakdown,
            utilization: round2(utilization.utilization),
            mean_time_between_alarms_hours: mean_gap.map(round2),
        })
    }

    /// Availability from raised maintenance alarms in the window
    pub fn availability(
        &self,
        unit: &str,
        window: &Window,
        batch: &KpiBatch,
    ) -> Result<AvailabilityOutcome> {
        let matcher = self.config.maintenance_matcher(unit)?;
        let events = maintenance_event_count(batch.alarms(), window, &matcher);
        debug!("{}: {} maintenance event(s) in window", unit, events);
        Ok(kpi::availability(
            window,
            events,
            self.config.maintenance_event_duration(),
        ))
    }

    /// MTBF over the time the unit spent away from ready while in Remote
    pub fn mtbf(&self, unit: &str, window: &Window, batch: &KpiBatch) -> Result<MtbfOutcome> {
        let categories = self.unit_categories(unit)?;
        Ok(self.mtbf_with(&categories, window, batch))
    }

    /// Busy share of the time not spent in maintenance
    pub fn utilization(
        &self,
        unit: &str,
        window: &Window,
        batch: &KpiBatch,
    ) -> Result<UtilizationOutcome> {
        self.config.unit(unit)?;

        let remote = self.remote_intervals(unit, window, batch);
        let busy = segment_all(
            batch.samples_for(unit),
            &remote,
            StatePredicate::Equal(self.config.busy_state),
        );
        let maintenance = build_intervals(
            batch.alarms(),
            &self.config.maintenance_category(unit),
            *window,
            self.config.reopen_policy,
        );

        let outcome = kpi::utilization(window.hours(), &busy, &maintenance);
        debug!(
            "{}: {:.2} h busy, {:.2} h maintenance, {:.2} h available",
            unit, outcome.busy_hours, outcome.maintenance_hours, outcome.available_hours
        );
        Ok(outcome)
    }

    /// Mean hours between raised failure alarms, independent of state samples
    pub fn mean_time_between_alarms(
        &self,
        unit: &str,
        window: &Window,
        batch: &KpiBatch,
    ) -> Result<Option<f64>> {
        let categories = self.unit_categories(unit)?;
        Ok(kpi::mean_time_between_alarms(batch.alarms(), window, &categories))
    }

    /// Sub-intervals of Remote operation where the unit was away from ready
    pub fn fault_segments(&self, unit: &str, window: &Window, batch: &KpiBatch) -> Vec<Interval> {
        let remote = self.remote_intervals(unit, window, batch);
        segment_all(
            batch.samples_for(unit),
            &remote,
            StatePredicate::NotEqual(self.config.ready_state),
        )
    }

    fn mtbf_with(
        &self,
        categories: &UnitCategories,
        window: &Window,
        batch: &KpiBatch,
    ) -> MtbfOutcome {
        let unit = categories.unit();
        let faults = self.fault_segments(unit, window, batch);
        let breakdown = count_by_category(&faults, batch.alarms(), categories);
        let outcome = kpi::mtbf(&faults, breakdown);

        if outcome.segment_fallback {
            debug!(
                "{}: no categorized failures, counting {} fault segment(s)",
                unit, outcome.fault_segments
            );
        }
        outcome
    }

    fn remote_intervals(&self, unit: &str, window: &Window, batch: &KpiBatch) -> Vec<Interval> {
        build_intervals(
            batch.alarms(),
            &self.config.remote_category(unit),
            *window,
            self.config.reopen_policy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KpiError;
    use crate::model::{AlarmEvent, EventType, StateSample};
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, h, m, 0).unwrap()
    }

    fn alarm(id: i64, name: &str, event_type: EventType, ts: DateTime<Utc>) -> AlarmEvent {
        AlarmEvent::new("MoorUnit1", id, name, event_type, ts)
    }

    fn engine() -> KpiEngine {
        KpiEngine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_request_window() {
        let request = KpiRequest::from_token("U1", "7d").ending_at(at(12, 0));
        assert_eq!(request.duration, CanonicalDuration::SevenDays);
        assert_eq!(request.window().start_time, at(12, 0) - Duration::days(7));

        let lenient = KpiRequest::from_token("U1", "fortnight");
        assert_eq!(lenient.duration, CanonicalDuration::ThirtyDays);
    }

    #[test]
    fn test_unknown_unit() {
        let request = KpiRequest::new("U9", CanonicalDuration::OneDay).ending_at(at(12, 0));
        assert!(matches!(
            engine().evaluate(&request, &KpiBatch::empty()),
            Err(KpiError::UnknownUnit(_))
        ));
    }

    #[test]
    fn test_availability_reports_maintenance_downtime() {
        let alarms = vec![
            alarm(5, "U1 in Maintenance", EventType::Raised, at(3, 0)),
            alarm(5, "U1 in Maintenance", EventType::Cleared, at(4, 0)),
            alarm(5, "U1 in Maintenance", EventType::Raised, at(8, 0)),
        ];
        let batch = KpiBatch::new(Vec::new(), alarms).unwrap();
        let window = Window::ending_at(at(12, 0), CanonicalDuration::OneDay);

        let outcome = engine().availability("U1", &window, &batch).unwrap();
        assert_eq!(outcome.maintenance_count, 2);
        assert_eq!(outcome.maintenance_downtime_minutes, 10.0);
        assert_eq!(round2(outcome.availability), 99.31);
    }

    #[test]
    fn test_fault_segments_inside_remote() {
        let samples = vec![
            StateSample::new("U1", at(9, 0), 4),
            StateSample::new("U1", at(10, 0), 11),
            StateSample::new("U1", at(10, 10), 4),
            StateSample::new("U1", at(10, 40), 11),
        ];
        let alarms = vec![
            alarm(1, "U1 in Remote", EventType::Raised, at(10, 0)),
            alarm(1, "U1 in Remote", EventType::Cleared, at(11, 0)),
        ];
        let batch = KpiBatch::new(samples, alarms).unwrap();
        let window = Window::ending_at(at(23, 0), CanonicalDuration::OneDay);

        let faults = engine().fault_segments("U1", &window, &batch);
        assert_eq!(faults, vec![Interval::new(at(10, 10), at(10, 40)).unwrap()]);
    }

    #[test]
    fn test_utilization_uses_busy_state() {
        let samples = vec![
            StateSample::new("U1", at(1, 0), 6),
            StateSample::new("U1", at(7, 0), 11),
        ];
        let alarms = vec![
            alarm(1, "U1 in Remote", EventType::Raised, at(0, 0)),
            alarm(1, "U1 in Remote", EventType::Cleared, at(12, 0)),
        ];
        let batch = KpiBatch::new(samples, alarms).unwrap();
        let window = Window::ending_at(at(12, 0), CanonicalDuration::OneDay);

        let outcome = engine().utilization("U1", &window, &batch).unwrap();
        assert_eq!(outcome.busy_hours, 6.0);
        assert_eq!(round2(outcome.utilization), 25.0);
    }
}
