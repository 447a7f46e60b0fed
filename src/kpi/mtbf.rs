// src/kpi/mtbf.rs - Mean time between failures over fault time
use crate::classify::{total_failures, CategoryCounts};
use crate::model::{total_hours, Interval};
use serde::{Serialize, Serializer};
use std::fmt;

/// MTBF in hours, or "never failed in this window".
///
/// Serializes as a number, or as the string `"N/A"` when not available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mtbf {
    Hours(f64),
    NotAvailable,
}

impl Mtbf {
    /// Non-finite values map to [`Mtbf::NotAvailable`]
    pub fn from_hours(hours: f64) -> Self {
        if hours.is_finite() {
            Mtbf::Hours(hours)
        } else {
            Mtbf::NotAvailable
        }
    }

    /// Hours, with `+inf` for not available
    pub fn hours(self) -> f64 {
        match self {
            Mtbf::Hours(h) => h,
            Mtbf::NotAvailable => f64::INFINITY,
        }
    }

    pub fn as_option(self) -> Option<f64> {
        match self {
            Mtbf::Hours(h) => Some(h),
            Mtbf::NotAvailable => None,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, Mtbf::Hours(_))
    }

    pub(crate) fn rounded(self) -> Self {
        match self {
            Mtbf::Hours(h) => Mtbf::Hours(super::round2(h)),
            Mtbf::NotAvailable => Mtbf::NotAvailable,
        }
    }
}

impl fmt::Display for Mtbf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mtbf::Hours(h) => write!(f, "{:.2}", h),
            Mtbf::NotAvailable => f.write_str("N/A"),
        }
    }
}

impl Serialize for Mtbf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Mtbf::Hours(h) => serializer.serialize_f64(*h),
            Mtbf::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

/// Everything the MTBF aggregation derived, for reporting and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MtbfOutcome {
    pub mtbf: Mtbf,
    pub fault_hours: f64,
    pub fault_segments: usize,
    /// Divisor actually used
    pub failures: u64,
    /// True when no categorized failure matched and segments were counted instead
    pub segment_fallback: bool,
    pub breakdown: CategoryCounts,
}

/// Fold fault segments and their failure breakdown into an MTBF.
///
/// - no fault time at all: not available
/// - no categorized failures: each fault segment counts as one failure
pub fn mtbf(fault_segments: &[Interval], breakdown: CategoryCounts) -> MtbfOutcome {
    let fault_hours = total_hours(fault_segments);
    let classified = total_failures(&breakdown);

    if fault_segments.is_empty() || fault_hours <= 0.0 {
        return MtbfOutcome {
            mtbf: Mtbf::NotAvailable,
            fault_hours,
            fault_segments: fault_segments.len(),
            failures: classified,
            segment_fallback: false,
            breakdown,
        };
    }

    let segment_fallback = classified == 0;
    let failures = if segment_fallback {
        fault_segments.len() as u64
    } else {
        classified
    };

    let hours = if failures == 0 {
        fault_hours
    } else {
        fault_hours / failures as f64
    };

    MtbfOutcome {
        mtbf: Mtbf::from_hours(hours),
        fault_hours,
        fault_segments: fault_segments.len(),
        failures,
        segment_fallback,
        breakdown,
    }
}
