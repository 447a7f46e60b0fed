// src/taxonomy.rs - Failure category table
//
// Buckets group the exact alarm labels that count as one kind of failure.
// Labels are stored as templates with a `{unit}` placeholder and rendered
// once per unit, so lookups at evaluation time are exact string matches.

use crate::error::{KpiError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Placeholder substituted with the unit code in category templates
pub const UNIT_TOKEN: &str = "{unit}";

/// Render a category template for one unit
pub fn render(template: &str, unit: &str) -> String {
    template.replace(UNIT_TOKEN, unit)
}

/// Bucket name -> category name templates, for every configured unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureCategoryTable {
    templates: BTreeMap<String, Vec<String>>,
    units: BTreeSet<String>,
}

impl FailureCategoryTable {
    pub fn new<I, S>(templates: BTreeMap<String, Vec<String>>, units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            templates,
            units: units.into_iter().map(Into::into).collect(),
        }
    }

    /// Table using the standard mooring failure taxonomy
    pub fn standard<I, S>(units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(default_failure_categories(), units)
    }

    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(String::as_str)
    }

    pub fn bucket_names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn knows(&self, unit: &str) -> bool {
        self.units.contains(unit)
    }

    /// Render the table for one unit.
    ///
    /// Fails with [`KpiError::UnknownUnit`] when the unit is not configured.
    pub fn for_unit(&self, unit: &str) -> Result<UnitCategories> {
        if !self.knows(unit) {
            return Err(KpiError::UnknownUnit(unit.to_string()));
        }

        let buckets: BTreeMap<String, BTreeSet<String>> = self
            .templates
            .iter()
            .map(|(bucket, templates)| {
                let names = templates.iter().map(|t| render(t, unit)).collect();
                (bucket.clone(), names)
            })
            .collect();

        let mut index: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (bucket, names) in &buckets {
            for name in names {
                index.entry(name.clone()).or_default().push(bucket.clone());
            }
        }

        Ok(UnitCategories {
            unit: unit.to_string(),
            buckets,
            index,
        })
    }
}

/// The category table rendered for a single unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitCategories {
    unit: String,
    buckets: BTreeMap<String, BTreeSet<String>>,
    // category name -> buckets containing it
    index: BTreeMap<String, Vec<String>>,
}

impl UnitCategories {
    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn buckets(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.buckets
    }

    pub fn bucket_names(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Buckets whose name set contains `category_name`
    pub fn buckets_of(&self, category_name: &str) -> &[String] {
        self.index
            .get(category_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// True when `category_name` belongs to any bucket
    pub fn is_failure(&self, category_name: &str) -> bool {
        self.index.contains_key(category_name)
    }
}

/// The standard mooring failure taxonomy
pub fn default_failure_categories() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 7] = [
        (
            "failed_to_arm",
            &[
                "{unit} Check Services Failed",
                "{unit} Check Fluid Mgmt Failed",
                "{unit} Check Vacuum Failed",
                "{unit} Charge Vacuum Failed",
                "{unit} Check Hydraulics Failed",
                "{unit} Check C3 Failed",
                "{unit} Check C1 Failed",
                "{unit} Check C2 Failed",
                "{unit} Check C4 Failed",
                "{unit} Move to RTM Failed",
            ],
        ),
        ("failed_to_reposition", &["{unit} at RTM Failed to Reposition"]),
        (
            "failed_to_moor",
            &[
                "{unit} Mooring Failed to Reach Vessel",
                "{unit} Mooring Failed to Couple",
                "{unit} Mooring Failed to Retract",
                "{unit} Mooring Failed to Decouple",
            ],
        ),
        (
            "failed_to_warp",
            &[
                "{unit} Warping Failed to Move Left",
                "{unit} Warping Failed to Move Right",
            ],
        ),
        (
            "failed_to_step",
            &[
                "{unit} Stepping Failed to Decouple",
                "{unit} Stepping Failed to Retract",
                "{unit} Stepping Failed to Reposition",
                "{unit} Stepping Failed to Reach Vessel",
                "{unit} Stepping Failed to Couple",
            ],
        ),
        (
            "failed_to_detach",
            &[
                "{unit} Detaching Failed to Decouple",
                "{unit} Detaching Failed to Retract",
                "{unit} Detaching Move to RTM Failed",
            ],
        ),
        (
            "failed_to_park",
            &[
                "{unit} Parking C3 Failed to Pre Park",
                "{unit} Parking C1 Failed to Park",
                "{unit} Parking C2 Failed to Park",
                "{unit} Parking C4 Failed to Park",
                "{unit} Parking C3 Failed to Park",
                "{unit} Parking Failed to Discharge",
                "{unit} Parking Failed to Park",
            ],
        ),
    ];

    table
        .iter()
        .map(|(bucket, names)| {
            (
                bucket.to_string(),
                names.iter().map(|n| n.to_string()).collect(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_unit() {
        assert_eq!(render("{unit} in Remote", "U2"), "U2 in Remote");
        assert_eq!(render("static label", "U2"), "static label");
    }

    #[test]
    fn test_unknown_unit() {
        let table = FailureCategoryTable::standard(["U1", "U2"]);
        assert!(matches!(
            table.for_unit("U3"),
            Err(KpiError::UnknownUnit(unit)) if unit == "U3"
        ));
    }

    #[test]
    fn test_rendered_lookup() {
        let table = FailureCategoryTable::standard(["U1"]);
        let categories = table.for_unit("U1").unwrap();
        assert_eq!(categories.unit(), "U1");
        assert_eq!(categories.bucket_names().count(), 7);
        assert_eq!(categories.buckets_of("U1 Check Vacuum Failed"), ["failed_to_arm"]);
        assert!(categories.buckets_of("U2 Check Vacuum Failed").is_empty());
        assert!(!categories.is_failure("U1 in Remote"));
    }

    #[test]
    fn test_name_in_two_buckets() {
        let mut templates = BTreeMap::new();
        templates.insert("a".to_string(), vec!["{unit} Trip".to_string()]);
        templates.insert("b".to_string(), vec!["{unit} Trip".to_string()]);
        let categories = FailureCategoryTable::new(templates, ["U1"]).for_unit("U1").unwrap();
        assert_eq!(categories.buckets_of("U1 Trip"), ["a", "b"]);
    }
}
