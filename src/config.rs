// src/config.rs - Engine configuration
//
// Everything unit-specific the engine needs is resolved here, once, at
// configuration time: state codes, alarm category templates, the failure
// taxonomy and the unit table. Evaluation never guesses from raw strings.

use crate::error::{KpiError, Result};
use crate::intervals::ReopenPolicy;
use crate::kpi::MaintenanceMatcher;
use crate::taxonomy::{self, render, FailureCategoryTable, UNIT_TOKEN};
use chrono::Duration;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[cfg(feature = "json-schema")]
use schemars::JsonSchema;

// ============================================================================
// MAIN CONFIGURATION
// ============================================================================

/// Main MOORKPI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(JsonSchema))]
pub struct EngineConfig {
    /// State code of the nominal ready state; anything else is fault time
    #[serde(default = "default_ready_state")]
    pub ready_state: i64,

    /// State code of the busy (in use) state
    #[serde(default = "default_busy_state")]
    pub busy_state: i64,

    /// Assumed downtime per raised maintenance alarm, in minutes
    #[serde(default = "default_maintenance_event_minutes")]
    pub maintenance_event_minutes: i64,

    /// Tie-break for a second raise while an alarm interval is open
    #[serde(default)]
    pub reopen_policy: ReopenPolicy,

    /// Template of the alarm bracketing remote operation
    #[serde(default = "default_remote_alarm")]
    pub remote_alarm: String,

    /// Template of the alarm bracketing maintenance
    #[serde(default = "default_maintenance_alarm")]
    pub maintenance_alarm: String,

    /// Known units, keyed by unit code
    #[serde(default = "default_units")]
    pub units: BTreeMap<String, UnitConfig>,

    /// Failure bucket -> category name templates
    #[serde(default = "taxonomy::default_failure_categories")]
    pub failure_categories: BTreeMap<String, Vec<String>>,

    /// Fleet worker pool size (None = number of CPUs)
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ready_state: default_ready_state(),
            busy_state: default_busy_state(),
            maintenance_event_minutes: default_maintenance_event_minutes(),
            reopen_policy: ReopenPolicy::default(),
            remote_alarm: default_remote_alarm(),
            maintenance_alarm: default_maintenance_alarm(),
            units: default_units(),
            failure_categories: taxonomy::default_failure_categories(),
            workers: None,
        }
    }
}

/// Per-unit configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "json-schema", derive(JsonSchema))]
pub struct UnitConfig {
    /// Journal alarm id of the unit's maintenance alarm
    #[serde(default)]
    pub maintenance_alarm_id: Option<i64>,

    /// Historian tag id carrying the unit's state code
    #[serde(default)]
    pub state_tag: Option<String>,
}

impl EngineConfig {
    /// Load and validate a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_yaml(&contents)
    }

    /// Parse and validate YAML configuration text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.units.is_empty() {
            return Err(KpiError::Config("no units configured".to_string()));
        }

        if self.maintenance_event_minutes < 0 {
            return Err(KpiError::Config(format!(
                "maintenance_event_minutes must not be negative, got {}",
                self.maintenance_event_minutes
            )));
        }

        for (field, template) in [
            ("remote_alarm", &self.remote_alarm),
            ("maintenance_alarm", &self.maintenance_alarm),
        ] {
            if !template.contains(UNIT_TOKEN) {
                return Err(KpiError::Config(format!(
                    "{} template '{}' must contain {}",
                    field, template, UNIT_TOKEN
                )));
            }
        }

        if let Some((bucket, _)) = self
            .failure_categories
            .iter()
            .find(|(_, names)| names.is_empty())
        {
            return Err(KpiError::Config(format!(
                "failure category '{}' has no alarm names",
                bucket
            )));
        }

        if self.workers == Some(0) {
            return Err(KpiError::Config("workers must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Failure taxonomy for all configured units
    pub fn category_table(&self) -> FailureCategoryTable {
        FailureCategoryTable::new(self.failure_categories.clone(), self.units.keys().cloned())
    }

    pub fn unit(&self, unit: &str) -> Result<&UnitConfig> {
        self.units
            .get(unit)
            .ok_or_else(|| KpiError::UnknownUnit(unit.to_string()))
    }

    /// Unit whose state samples are published under `tag`
    pub fn unit_for_tag(&self, tag: &str) -> Option<&str> {
        self.units
            .iter()
            .find(|(_, cfg)| cfg.state_tag.as_deref() == Some(tag))
            .map(|(unit, _)| unit.as_str())
    }

    pub fn remote_category(&self, unit: &str) -> String {
        render(&self.remote_alarm, unit)
    }

    pub fn maintenance_category(&self, unit: &str) -> String {
        render(&self.maintenance_alarm, unit)
    }

    pub fn maintenance_matcher(&self, unit: &str) -> Result<MaintenanceMatcher> {
        let unit_config = self.unit(unit)?;
        Ok(MaintenanceMatcher {
            alarm_id: unit_config.maintenance_alarm_id,
            category_name: self.maintenance_category(unit),
        })
    }

    pub fn maintenance_event_duration(&self) -> Duration {
        Duration::minutes(self.maintenance_event_minutes)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }
}

/// JSON schema of the configuration file
#[cfg(feature = "json-schema")]
pub fn json_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(EngineConfig)
}

// ============================================================================
// DEFAULT VALUE FUNCTIONS
// ============================================================================

fn default_ready_state() -> i64 { 11 }
fn default_busy_state() -> i64 { 6 }
fn default_maintenance_event_minutes() -> i64 { 5 }
fn default_remote_alarm() -> String { "{unit} in Remote".to_string() }
fn default_maintenance_alarm() -> String { "{unit} in Maintenance".to_string() }

fn default_units() -> BTreeMap<String, UnitConfig> {
    BTreeMap::from([
        (
            "U1".to_string(),
            UnitConfig {
                maintenance_alarm_id: Some(5),
                state_tag: Some("1".to_string()),
            },
        ),
        (
            "U2".to_string(),
            UnitConfig {
                maintenance_alarm_id: Some(50),
                state_tag: Some("2".to_string()),
            },
        ),
    ])
}
