//! KPI aggregators.
//!
//! Each aggregator is a pure function over the outputs of the interval
//! builder, the segmenter and the classifier. None of them performs I/O or
//! keeps state between calls.

pub mod availability;
pub mod inter_failure;
pub mod mtbf;
pub mod utilization;

pub use availability::{
    availability, maintenance_event_count, AvailabilityOutcome, MaintenanceMatcher,
};
pub use inter_failure::mean_time_between_alarms;
pub use mtbf::{mtbf, Mtbf, MtbfOutcome};
pub use utilization::{utilization, UtilizationOutcome};

/// Round to two decimals for reporting
pub fn round2(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round() / 100.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(99.652_777), 99.65);
        assert_eq!(round2(45.454_545), 45.45);
        assert!(round2(f64::INFINITY).is_infinite());
    }
}
