//! Aggregator (component I) and Estimate Envelope (component J): groups
//! priced items by resource, rolls up per-service and total costs with
//! propagated confidence, and emits the canonical output schema.

use crate::model::{Confidence, CostEstimate, EstimateMetadata, PricedItem, ResourceCost, ServiceCost};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Splits `"<type>.<name>"` (optionally with a `[i]`/`["key"]` suffix on
/// the name) back into its type and name parts.
fn split_address(address: &str) -> (String, String) {
    match address.split_once('.') {
        Some((resource_type, name)) => (resource_type.to_string(), name.to_string()),
        None => (address.to_string(), String::new()),
    }
}

/// Groups priced items by exact `resource_address`, then rolls resources
/// up by service and into a total. `evaluated_at` and `catalog_version`
/// are threaded in rather than computed here — they depend on wall-clock
/// time and warehouse state the aggregator itself has no business
/// reaching for.
pub fn aggregate(
    items: Vec<PricedItem>,
    input_bytes: &[u8],
    catalog_version: String,
    evaluated_at: DateTime<Utc>,
    engine_version: String,
) -> CostEstimate {
    let mut by_address: BTreeMap<String, Vec<PricedItem>> = BTreeMap::new();
    for item in items {
        by_address.entry(item.resource_address.clone()).or_default().push(item);
    }

    let mut warnings = Vec::new();
    let mut seen_assumptions = Vec::new();
    let mut by_resource = Vec::with_capacity(by_address.len());

    for (address, line_items) in by_address {
        let (resource_type, name) = split_address(&address);
        let service = line_items.first().map(|i| i.service.clone()).unwrap_or_default();

        let monthly_cost: Decimal = line_items.iter().map(|i| i.monthly_cost).sum();
        let confidence = Confidence::min_over(line_items.iter().map(|i| i.confidence));

        let mut assumptions = Vec::new();
        for item in &line_items {
            for assumption in &item.assumptions {
                if !assumptions.contains(assumption) {
                    assumptions.push(assumption.clone());
                }
                if !seen_assumptions.contains(assumption) {
                    seen_assumptions.push(assumption.clone());
                }
            }
            if item.pricing_source == "NOT_FOUND" {
                warnings.push(format!("no pricing match for {} ({})", item.usage_type, address));
            }
        }

        by_resource.push(ResourceCost {
            address,
            resource_type,
            name,
            service,
            monthly_cost,
            confidence,
            line_items,
            assumptions,
        });
    }

    let mut by_service: BTreeMap<String, ServiceCost> = BTreeMap::new();
    for resource in &by_resource {
        let entry = by_service.entry(resource.service.clone()).or_insert_with(|| ServiceCost {
            service: resource.service.clone(),
            monthly_cost: Decimal::ZERO,
            resource_count: 0,
            confidence: Confidence::High,
        });
        entry.monthly_cost += resource.monthly_cost;
        entry.resource_count += 1;
        entry.confidence = entry.confidence.min(resource.confidence);
    }

    let total_monthly_cost: Decimal = by_resource.iter().map(|r| r.monthly_cost).sum();
    let overall_confidence = Confidence::min_over(by_resource.iter().map(|r| r.confidence));

    CostEstimate {
        total_monthly_cost,
        currency: "USD".to_string(),
        by_service,
        by_resource,
        overall_confidence,
        assumptions: seen_assumptions,
        warnings,
        metadata: EstimateMetadata {
            catalog_version,
            input_hash: input_hash(input_bytes),
            evaluated_at,
            engine_version,
        },
    }
}

/// `"sha256:" || hex(SHA-256(input_bytes))`, computed identically for
/// both the inline-HCL and ZIP-upload request paths.
pub fn input_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("sha256:{:x}", digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn item(address: &str, service: &str, cost: &str, confidence: Confidence) -> PricedItem {
        PricedItem {
            resource_address: address.to_string(),
            service: service.to_string(),
            usage_type: "BoxUsage:t3.micro".to_string(),
            operation: None,
            region: "us-east-1".to_string(),
            unit: "Hrs".to_string(),
            quantity: 730.0,
            attributes: Map::new(),
            confidence,
            assumptions: Vec::new(),
            price_per_unit: "0.0116".parse().unwrap(),
            monthly_cost: cost.parse().unwrap(),
            match_confidence: confidence,
            match_score: 1.0,
            pricing_source: "SKU1".to_string(),
            formula: "730.00 Hrs × $0.0116/Hr".to_string(),
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn totals_sum_from_line_items_up_through_services() {
        let items = vec![
            item("aws_instance.web[0]", "VMCompute", "8.47", Confidence::High),
            item("aws_instance.web[1]", "VMCompute", "8.47", Confidence::High),
        ];
        let estimate = aggregate(items, b"input", "2026-01-01".to_string(), Utc::now(), "1.0.0".to_string());
        assert_eq!(estimate.total_monthly_cost, "16.94".parse().unwrap());
        assert_eq!(estimate.by_service["VMCompute"].resource_count, 2);
        assert_eq!(estimate.by_service["VMCompute"].monthly_cost, "16.94".parse().unwrap());
    }

    #[test]
    fn confidence_propagates_as_minimum() {
        let items = vec![item("aws_instance.web", "VMCompute", "8.47", Confidence::High), item("aws_instance.web", "VMCompute", "0", Confidence::Low)];
        let estimate = aggregate(items, b"input", "v1".to_string(), Utc::now(), "1.0.0".to_string());
        assert_eq!(estimate.by_resource[0].confidence, Confidence::Low);
        assert_eq!(estimate.overall_confidence, Confidence::Low);
    }

    #[test]
    fn input_hash_is_deterministic() {
        assert_eq!(input_hash(b"hello"), input_hash(b"hello"));
        assert!(input_hash(b"hello").starts_with("sha256:"));
    }

    #[test]
    fn by_service_keys_are_ordered_ascending() {
        let items = vec![
            item("aws_s3_bucket.assets", "ObjectStorage", "1.00", Confidence::High),
            item("aws_instance.web", "VMCompute", "8.47", Confidence::High),
            item("aws_ebs_volume.data", "BlockStorage", "0.10", Confidence::High),
        ];
        let estimate = aggregate(items, b"input", "v1".to_string(), Utc::now(), "1.0.0".to_string());
        let services: Vec<&String> = estimate.by_service.keys().collect();
        assert_eq!(services, vec!["BlockStorage", "ObjectStorage", "VMCompute"]);
    }

    #[test]
    fn not_found_items_surface_as_warnings() {
        let mut not_found = item("aws_instance.web", "VMCompute", "0", Confidence::Unknown);
        not_found.pricing_source = "NOT_FOUND".to_string();
        let estimate = aggregate(vec![not_found], b"input", "v1".to_string(), Utc::now(), "1.0.0".to_string());
        assert_eq!(estimate.warnings.len(), 1);
        assert_eq!(estimate.overall_confidence, Confidence::Unknown);
    }
}
