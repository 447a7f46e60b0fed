//! MOORKPI - Mooring fleet KPI engine
//!
//! Reconstructs alarm intervals and state segments from historian samples and
//! alarm journal events, and folds them into Availability, MTBF and
//! Utilization for any historical window.
//!
//! # Feature Flags
//!
//! - **fleet** (default): bounded concurrent evaluation of many units or windows
//! - **json-schema**: `schemars::JsonSchema` on the configuration types
//!
//! # Examples
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use moorkpi::{CanonicalDuration, EngineConfig, KpiBatch, KpiEngine, KpiRequest, Mtbf};
//!
//! let engine = KpiEngine::new(EngineConfig::default())?;
//! let end = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap();
//! let request = KpiRequest::new("U1", CanonicalDuration::SevenDays).ending_at(end);
//!
//! let report = engine.evaluate(&request, &KpiBatch::empty())?;
//! assert_eq!(report.availability, 100.0);
//! assert_eq!(report.mtbf_hours, Mtbf::NotAvailable);
//! assert_eq!(report.utilization, 0.0);
//! # Ok::<(), moorkpi::KpiError>(())
//! ```

// ============================================================================
// CORE MODULES
// ============================================================================

/// Error type and result alias
pub mod error;

/// Samples, alarm events, intervals and windows
pub mod model;

/// Alarm source and duration token normalization
pub mod normalize;

/// Raised/Cleared pairing into alarm intervals
pub mod intervals;

/// State-sample segmentation inside intervals
pub mod segment;

/// Failure category table
pub mod taxonomy;

/// Failure alarm attribution to fault segments
pub mod classify;

/// Availability, MTBF, Utilization and mean time between alarms
pub mod kpi;

/// YAML engine configuration
pub mod config;

/// Raw and normalized input batches
pub mod batch;

/// KPI evaluation engine
pub mod engine;

/// KPI time series
pub mod series;

// ============================================================================
// FLEET MODULE (feature-gated)
// ============================================================================

/// Bounded concurrent evaluation
#[cfg(feature = "fleet")]
pub mod fleet;

// ============================================================================
// PUBLIC RE-EXPORTS
// ============================================================================

pub use batch::{KpiBatch, RawBatch, RawSample};
pub use config::{EngineConfig, UnitConfig};
pub use engine::{KpiEngine, KpiReport, KpiRequest};
pub use error::{KpiError, Result};
pub use intervals::ReopenPolicy;
pub use kpi::Mtbf;
pub use model::{AlarmEvent, CanonicalDuration, EventType, Interval, StateSample, Window};
pub use normalize::{normalize_duration, RawAlarmRecord};
pub use series::SeriesPoint;

#[cfg(feature = "fleet")]
pub use fleet::FleetEvaluator;

// ============================================================================
// VERSION INFORMATION
// ============================================================================

/// MOORKPI version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build information
pub mod build_info {
    /// Git commit hash, or `unknown`
    pub const GIT_HASH: &str = env!("MOORKPI_GIT_HASH");

    /// Build timestamp (RFC 3339)
    pub const BUILD_TIMESTAMP: &str = env!("MOORKPI_BUILD_TIMESTAMP");

    /// Rust version used for compilation
    pub const RUSTC_VERSION: &str = env!("MOORKPI_RUST_VERSION");

    /// Target triple
    pub const TARGET: &str = env!("MOORKPI_TARGET");

    /// Build profile (debug/release)
    pub const PROFILE: &str = env!("MOORKPI_PROFILE");

    /// One-line summary for logs and `--version`
    pub fn summary() -> String {
        format!(
            "moorkpi {} ({} {}, {}, built {})",
            super::VERSION,
            GIT_HASH,
            PROFILE,
            TARGET,
            BUILD_TIMESTAMP
        )
    }
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize logging.
///
/// Honors `RUST_LOG`, defaulting to `moorkpi=info`. Calling it more than once,
/// or after another logger was installed, is harmless.
pub fn init() {
    let env = env_logger::Env::default().default_filter_or("moorkpi=info");
    if env_logger::Builder::from_env(env).try_init().is_ok() {
        log::debug!("{}", build_info::summary());
    }
}
