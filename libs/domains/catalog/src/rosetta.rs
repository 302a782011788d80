//! Rosetta Learner (component D): learns cross-reference mappings from
//! each product seen during an ingest. First occurrence wins — callers
//! must not overwrite an existing in-memory entry for the same key, and
//! the store layer enforces the same idempotence with `ON CONFLICT DO
//! NOTHING` at export time.

use crate::models::{MappingType, NewAttributeMapping};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use uuid::Uuid;

static INSTANCE_FAMILY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]+\d+[a-z]*").expect("static regex"));

static USAGE_TYPE_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]{2,4}\d?)-").expect("static regex"));

/// Accumulates learned mappings for one ingest, keyed so the first
/// occurrence of a `(mapping_type, source_value)` pair always wins.
#[derive(Debug, Default)]
pub struct RosettaLearner {
    learned: HashMap<(MappingType, String), String>,
}

impl RosettaLearner {
    pub fn new() -> Self {
        Self::default()
    }

    fn learn(&mut self, mapping_type: MappingType, source: &str, target: &str) {
        self.learned
            .entry((mapping_type, source.to_string()))
            .or_insert_with(|| target.to_string());
    }

    /// Learns every mapping derivable from one product's attributes.
    pub fn observe_product(&mut self, attributes: &HashMap<String, String>) {
        if let (Some(region), Some(location)) = (attributes.get("regionCode"), attributes.get("location")) {
            if !region.is_empty() && !location.is_empty() {
                self.learn(MappingType::RegionToLocation, region, location);
                self.learn(MappingType::LocationToRegion, location, region);
            }
        }

        if let Some(instance_type) = attributes.get("instanceType") {
            if let Some(m) = INSTANCE_FAMILY_RE.find(instance_type) {
                self.learn(MappingType::InstanceFamily, instance_type, m.as_str());
            }
        }

        for (attr_key, mapping_type) in [
            ("operatingSystem", MappingType::OperatingSystem),
            ("tenancy", MappingType::Tenancy),
            ("licenseModel", MappingType::LicenseModel),
        ] {
            if let Some(value) = attributes.get(attr_key) {
                self.learn(mapping_type, &value.to_lowercase(), value);
            }
        }

        if let Some(family) = attributes.get("productFamily") {
            self.learn(MappingType::ProductFamily, &family.to_lowercase(), family);
        }

        if let (Some(usage_type), Some(region)) = (
            attributes.get("usagetype").or_else(|| attributes.get("usageType")),
            attributes.get("regionCode"),
        ) {
            if let Some(caps) = USAGE_TYPE_PREFIX_RE.captures(usage_type) {
                let prefix = caps.get(1).expect("group 1 always present on match").as_str();
                self.learn(MappingType::UsageTypePrefix, prefix, region);
            }
        }
    }

    /// Exports everything learned this ingest as insertable rows.
    pub fn export(&self, catalog_version_id: Uuid) -> Vec<NewAttributeMapping> {
        self.learned
            .iter()
            .map(|((mapping_type, source_value), target_value)| NewAttributeMapping {
                catalog_version_id,
                mapping_type: *mapping_type,
                source_value: source_value.clone(),
                target_value: target_value.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn learns_region_to_location_and_inverse() {
        let mut learner = RosettaLearner::new();
        learner.observe_product(&attrs(&[("regionCode", "us-east-1"), ("location", "US East (N. Virginia)")]));
        let rows = learner.export(Uuid::now_v7());
        assert!(rows.iter().any(|r| r.mapping_type == MappingType::RegionToLocation && r.source_value == "us-east-1"));
        assert!(rows.iter().any(|r| r.mapping_type == MappingType::LocationToRegion && r.source_value == "US East (N. Virginia)"));
    }

    #[test]
    fn instance_family_regex_extracts_prefix() {
        let mut learner = RosettaLearner::new();
        learner.observe_product(&attrs(&[("instanceType", "m5ad.2xlarge")]));
        let rows = learner.export(Uuid::now_v7());
        let row = rows.iter().find(|r| r.mapping_type == MappingType::InstanceFamily).unwrap();
        assert_eq!(row.target_value, "m5ad");
    }

    #[test]
    fn first_occurrence_wins() {
        let mut learner = RosettaLearner::new();
        learner.observe_product(&attrs(&[("regionCode", "us-east-1"), ("location", "First Location")]));
        learner.observe_product(&attrs(&[("regionCode", "us-east-1"), ("location", "Second Location")]));
        let rows = learner.export(Uuid::now_v7());
        let row = rows
            .iter()
            .find(|r| r.mapping_type == MappingType::RegionToLocation && r.source_value == "us-east-1")
            .unwrap();
        assert_eq!(row.target_value, "First Location");
    }

    #[test]
    fn usage_type_prefix_maps_to_region() {
        let mut learner = RosettaLearner::new();
        learner.observe_product(&attrs(&[("usagetype", "USE1-BoxUsage:t3.micro"), ("regionCode", "us-east-1")]));
        let rows = learner.export(Uuid::now_v7());
        let row = rows.iter().find(|r| r.mapping_type == MappingType::UsageTypePrefix).unwrap();
        assert_eq!(row.source_value, "USE1");
        assert_eq!(row.target_value, "us-east-1");
    }
}
