// src/model.rs - Core data model shared by every stage of the KPI pipeline
use crate::error::{KpiError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

// ============================================================================
// SAMPLES AND EVENTS
// ============================================================================

/// Sampled operating mode of one unit at one instant, as read from the historian.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSample {
    /// Unit code (or historian tag id when no unit mapping exists)
    pub unit: String,
    pub timestamp: DateTime<Utc>,
    pub state_code: i64,
}

impl StateSample {
    pub fn new(unit: impl Into<String>, timestamp: DateTime<Utc>, state_code: i64) -> Self {
        Self {
            unit: unit.into(),
            timestamp,
            state_code,
        }
    }
}

/// Alarm journal event type.
///
/// The journal encodes these as `0`, `1` and `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Raised,
    Cleared,
    Acknowledged,
}

impl EventType {
    /// Decode the journal's integer event type
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(EventType::Raised),
            1 => Ok(EventType::Cleared),
            2 => Ok(EventType::Acknowledged),
            other => Err(KpiError::InvalidInput(format!(
                "unknown alarm event type code {}",
                other
            ))),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            EventType::Raised => 0,
            EventType::Cleared => 1,
            EventType::Acknowledged => 2,
        }
    }
}

/// A normalized alarm journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmEvent {
    /// Unit or source tag the alarm was raised on
    pub unit: String,
    /// Journal alarm id (dictionary key of the alarm source)
    pub alarm_id: i64,
    /// Human-readable alarm label, e.g. `U1 in Remote`
    pub category_name: String,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
}

impl AlarmEvent {
    pub fn new(
        unit: impl Into<String>,
        alarm_id: i64,
        category_name: impl Into<String>,
        event_type: EventType,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            unit: unit.into(),
            alarm_id,
            category_name: category_name.into(),
            event_type,
            timestamp,
        }
    }

    pub fn is_raised(&self) -> bool {
        self.event_type == EventType::Raised
    }
}

// ============================================================================
// INTERVALS
// ============================================================================

/// Closed time span with `end >= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end < start {
            return Err(KpiError::InvalidInput(format!(
                "interval end {} precedes start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Length in fractional hours
    pub fn hours(&self) -> f64 {
        to_hours(self.duration())
    }

    /// `start <= ts <= end`
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// `start <= ts < end`; an event on the closing instant belongs to the next span
    pub fn contains_half_open(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }

    pub fn is_within(&self, outer: &Interval) -> bool {
        outer.start <= self.start && self.end <= outer.end
    }
}

/// Sum of interval lengths in hours
pub fn total_hours(intervals: &[Interval]) -> f64 {
    intervals.iter().map(Interval::hours).sum()
}

pub(crate) fn to_hours(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / MILLIS_PER_HOUR
}

// ============================================================================
// WINDOWS
// ============================================================================

/// Canonical reporting durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CanonicalDuration {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "7D")]
    SevenDays,
    #[default]
    #[serde(rename = "30D")]
    ThirtyDays,
    #[serde(rename = "1Y")]
    OneYear,
}

impl CanonicalDuration {
    pub fn days(self) -> i64 {
        match self {
            CanonicalDuration::OneDay => 1,
            CanonicalDuration::SevenDays => 7,
            CanonicalDuration::ThirtyDays => 30,
            CanonicalDuration::OneYear => 365,
        }
    }

    pub fn as_duration(self) -> Duration {
        Duration::days(self.days())
    }

    pub fn code(self) -> &'static str {
        match self {
            CanonicalDuration::OneDay => "1D",
            CanonicalDuration::SevenDays => "7D",
            CanonicalDuration::ThirtyDays => "30D",
            CanonicalDuration::OneYear => "1Y",
        }
    }

    /// Spacing between points of a KPI time series over this duration
    pub fn series_step(self) -> Duration {
        match self {
            CanonicalDuration::OneDay => Duration::hours(1),
            CanonicalDuration::SevenDays | CanonicalDuration::ThirtyDays => Duration::days(1),
            CanonicalDuration::OneYear => Duration::days(30),
        }
    }
}

impl fmt::Display for CanonicalDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Reporting window `[start_time, end_time]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl Window {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Result<Self> {
        if end_time < start_time {
            return Err(KpiError::InvalidInput(format!(
                "window end {} precedes start {}",
                end_time, start_time
            )));
        }
        Ok(Self {
            start_time,
            end_time,
        })
    }

    /// Window of `duration` ending at `end_time`
    pub fn ending_at(end_time: DateTime<Utc>, duration: CanonicalDuration) -> Self {
        Self {
            start_time: end_time - duration.as_duration(),
            end_time,
        }
    }

    /// Window of `duration` ending now
    pub fn ending_now(duration: CanonicalDuration) -> Self {
        Self::ending_at(Utc::now(), duration)
    }

    pub fn length(&self) -> Duration {
        self.end_time - self.start_time
    }

    pub fn hours(&self) -> f64 {
        to_hours(self.length())
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start_time <= ts && ts <= self.end_time
    }

    pub fn as_interval(&self) -> Interval {
        Interval {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

// ============================================================================
// ORDERING CHECKS
// ============================================================================

/// Reject sequences whose timestamps go backwards. Input is never reordered.
pub(crate) fn ensure_monotonic<T>(
    items: &[T],
    timestamp: impl Fn(&T) -> DateTime<Utc>,
    what: &str,
) -> Result<()> {
    for (index, pair) in items.windows(2).enumerate() {
        let (prev, next) = (timestamp(&pair[0]), timestamp(&pair[1]));
        if next < prev {
            return Err(KpiError::InvalidInput(format!(
                "{} out of order at position {}: {} after {}",
                what,
                index + 1,
                next,
                prev
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_event_type_codes() {
        assert_eq!(EventType::from_code(0).unwrap(), EventType::Raised);
        assert_eq!(EventType::from_code(1).unwrap(), EventType::Cleared);
        assert_eq!(EventType::from_code(2).unwrap(), EventType::Acknowledged);
        assert!(matches!(
            EventType::from_code(7),
            Err(KpiError::InvalidInput(_))
        ));
        assert_eq!(EventType::Cleared.code(), 1);
    }

    #[test]
    fn test_interval_rejects_inverted_bounds() {
        assert!(Interval::new(at(11, 0), at(10, 0)).is_err());
        let interval = Interval::new(at(10, 0), at(10, 30)).unwrap();
        assert_eq!(interval.hours(), 0.5);
    }

    #[test]
    fn test_half_open_membership() {
        let interval = Interval::new(at(10, 0), at(11, 0)).unwrap();
        assert!(interval.contains_half_open(at(10, 0)));
        assert!(!interval.contains_half_open(at(11, 0)));
        assert!(interval.contains(at(11, 0)));
    }

    #[test]
    fn test_window_ending_at() {
        let window = Window::ending_at(at(12, 0), CanonicalDuration::OneDay);
        assert_eq!(window.hours(), 24.0);
        assert_eq!(window.start_time, at(12, 0) - Duration::days(1));
        assert!(Window::new(at(12, 0), at(11, 0)).is_err());
    }

    #[test]
    fn test_series_steps() {
        assert_eq!(CanonicalDuration::OneDay.series_step(), Duration::hours(1));
        assert_eq!(CanonicalDuration::ThirtyDays.series_step(), Duration::days(1));
        assert_eq!(CanonicalDuration::OneYear.series_step(), Duration::days(30));
        assert_eq!(CanonicalDuration::default(), CanonicalDuration::ThirtyDays);
    }

    #[test]
    fn test_ensure_monotonic() {
        let samples = vec![
            StateSample::new("U1", at(10, 0), 11),
            StateSample::new("U1", at(10, 0), 4),
            StateSample::new("U1", at(9, 0), 11),
        ];
        assert!(ensure_monotonic(&samples[..2], |s| s.timestamp, "samples").is_ok());
        let err = ensure_monotonic(&samples, |s| s.timestamp, "samples").unwrap_err();
        assert!(err.to_string().contains("position 2"));
    }
}
