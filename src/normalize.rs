// src/normalize.rs - Alarm source and duration token normalization
//
// Raw journal rows carry a path-like source such as
// `prov:default:/tag:MoorUnit1/Modes:/alm:U1 in Remote`. The engine only ever
// consumes the trailing alarm label. Everything here is lenient, and
// the only hard failures are undecodable event codes and timestamps.

use crate::error::{KpiError, Result};
use crate::model::{AlarmEvent, CanonicalDuration, EventType};
use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

const ALARM_MARKER: &str = "/alm:";
const TAG_MARKER: &str = "/tag:";
const SEPARATOR: char = ':';

/// Extract the alarm label from a raw alarm source string.
///
/// Resolution order:
/// 1. text after the first `/alm:` marker
/// 2. text after the last `:` separator
/// 3. the raw string, unmodified
///
/// Never fails.
///
/// # Examples
///
/// ```rust
/// use moorkpi::normalize::normalize;
///
/// assert_eq!(normalize("prov:default:/tag:MoorUnit1:/alm:U1 in Remote"), "U1 in Remote");
/// assert_eq!(normalize("legacy:U2 in Maintenance"), "U2 in Maintenance");
/// assert_eq!(normalize("U1 in Remote"), "U1 in Remote");
/// ```
pub fn normalize(raw_source: &str) -> String {
    if let Some(idx) = raw_source.find(ALARM_MARKER) {
        let label = raw_source[idx + ALARM_MARKER.len()..].trim();
        if !label.is_empty() {
            return label.to_string();
        }
    }

    match raw_source.rfind(SEPARATOR) {
        Some(idx) => raw_source[idx + SEPARATOR.len_utf8()..].trim().to_string(),
        None => raw_source.to_string(),
    }
}

/// Extract the `/tag:<T>` segment of a raw alarm source, if present
pub fn extract_tag(raw_source: &str) -> Option<&str> {
    let start = raw_source.find(TAG_MARKER)? + TAG_MARKER.len();
    let rest = &raw_source[start..];
    let end = rest.find(ALARM_MARKER).unwrap_or(rest.len());
    let tag = rest[..end].trim_end_matches(SEPARATOR).trim();
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}

/// Map a free-form duration token onto the canonical enumeration.
///
/// Unrecognized tokens resolve to `30D` so a typo in a request never fails
/// the computation.
pub fn normalize_duration(token: &str) -> CanonicalDuration {
    match token.trim() {
        "24h" | "1d" | "1D" => CanonicalDuration::OneDay,
        "7d" | "7D" => CanonicalDuration::SevenDays,
        "30d" | "30D" => CanonicalDuration::ThirtyDays,
        "12M" | "1y" | "1Y" => CanonicalDuration::OneYear,
        other => {
            debug!("Unrecognized duration token '{}', using 30D", other);
            CanonicalDuration::ThirtyDays
        }
    }
}

/// Convert journal epoch seconds into a UTC timestamp
pub fn timestamp_from_epoch(secs: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single().ok_or_else(|| {
        KpiError::InvalidInput(format!("timestamp {} is out of range", secs))
    })
}

// ============================================================================
// RAW ALARM RECORDS
// ============================================================================

/// Alarm journal row as fetched from the landing database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAlarmRecord {
    pub alarm_id: i64,
    /// `0` raised, `1` cleared, `2` acknowledged
    pub event_type: i64,
    /// Epoch seconds
    pub event_time: i64,
    pub source: String,
}

impl RawAlarmRecord {
    /// Normalize into an [`AlarmEvent`].
    ///
    /// The event's unit is the source's tag segment when one is present.
    pub fn normalize(&self) -> Result<AlarmEvent> {
        let event_type = EventType::from_code(self.event_type)?;
        let timestamp = timestamp_from_epoch(self.event_time)?;
        let unit = extract_tag(&self.source).unwrap_or_default();

        Ok(AlarmEvent::new(
            unit,
            self.alarm_id,
            normalize(&self.source),
            event_type,
            timestamp,
        ))
    }
}
