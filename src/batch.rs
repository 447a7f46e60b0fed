// src/batch.rs - Already-fetched input batches
//
// A batch is the finite set of historian samples and journal alarms one
// evaluation runs over. Raw rows arrive as JSON; they are normalized once and
// validated for ordering before any KPI sees them.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::model::{ensure_monotonic, AlarmEvent, StateSample};
use crate::normalize::{timestamp_from_epoch, RawAlarmRecord};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// RAW ROWS
// ============================================================================

/// Historian row: one state code on one tag at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSample {
    /// Historian tag id, or a unit code directly. Numeric ids are kept as text.
    #[serde(alias = "tagpath_id", deserialize_with = "tag_id_text")]
    pub tag_id: String,
    #[serde(alias = "intvalue")]
    pub state_code: i64,
    /// Epoch seconds
    pub t_stamp: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagId {
    Text(String),
    Number(i64),
}

fn tag_id_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match TagId::deserialize(deserializer)? {
        TagId::Text(text) => text,
        TagId::Number(id) => id.to_string(),
    })
}

/// Raw input batch as exported from the landing database
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBatch {
    #[serde(default)]
    pub samples: Vec<RawSample>,
    #[serde(default)]
    pub alarms: Vec<RawAlarmRecord>,
}

impl RawBatch {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let batch = Self::from_json(&contents)?;
        debug!(
            "Read {} samples and {} alarms from {}",
            batch.samples.len(),
            batch.alarms.len(),
            path.display()
        );
        Ok(batch)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Normalize every row and resolve sample tags to unit codes.
    ///
    /// Tags without a configured unit keep the tag id as their unit.
    pub fn normalize(&self, config: &EngineConfig) -> Result<KpiBatch> {
        let samples = self
            .samples
            .iter()
            .map(|raw| {
                let unit = config.unit_for_tag(&raw.tag_id).unwrap_or(raw.tag_id.as_str());
                Ok(StateSample::new(
                    unit,
                    timestamp_from_epoch(raw.t_stamp)?,
                    raw.state_code,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let alarms = self
            .alarms
            .iter()
            .map(RawAlarmRecord::normalize)
            .collect::<Result<Vec<_>>>()?;

        KpiBatch::new(samples, alarms)
    }
}

// ============================================================================
// NORMALIZED BATCH
// ============================================================================

/// Normalized, order-checked input for the engine.
///
/// Samples are grouped per unit in arrival order; alarms form one stream
/// since their categories already carry the unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KpiBatch {
    samples: BTreeMap<String, Vec<StateSample>>,
    alarms: Vec<AlarmEvent>,
}

impl KpiBatch {
    /// Build a batch, rejecting samples (per unit) or alarms that go back in time
    pub fn new(samples: Vec<StateSample>, alarms: Vec<AlarmEvent>) -> Result<Self> {
        let mut grouped: BTreeMap<String, Vec<StateSample>> = BTreeMap::new();
        for sample in samples {
            grouped.entry(sample.unit.clone()).or_default().push(sample);
        }

        for (unit, unit_samples) in &grouped {
            ensure_monotonic(unit_samples, |s| s.timestamp, &format!("samples of {}", unit))?;
        }
        ensure_monotonic(&alarms, |a| a.timestamp, "alarms")?;

        Ok(Self {
            samples: grouped,
            alarms,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json_file(path: impl AsRef<Path>, config: &EngineConfig) -> Result<Self> {
        RawBatch::from_file(path)?.normalize(config)
    }

    /// Samples of one unit, sorted by timestamp
    pub fn samples_for(&self, unit: &str) -> &[StateSample] {
        self.samples.get(unit).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn alarms(&self) -> &[AlarmEvent] {
        &self.alarms
    }

    pub fn sample_count(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count() == 0 && self.alarms.is_empty()
    }
}
