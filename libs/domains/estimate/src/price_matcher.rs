//! Price Matcher (component H): resolves one `UsageVector` against the
//! warehouse via a tiered scoring strategy, first hit wins.

use crate::error::EstimateResult;
use crate::model::{Confidence, PricedItem, UsageVector};
use domain_catalog::{MatchCriteria, MappingType, PricingOverride, TermType, WarehouseStore};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashMap;

const EXACT_SCORE: f64 = 1.00;
const PATTERN_SCORE: f64 = 0.85;
const REGION_STRIPPED_SCORE: f64 = 0.75;
const ATTRIBUTE_SCORE: f64 = 0.90;

const NOT_FOUND_SOURCE: &str = "NOT_FOUND";

/// Resolves `vector` to a priced line item. Never fails: a miss becomes
/// a zero-priced `Unknown`-confidence item rather than an error.
pub async fn match_price(store: &dyn WarehouseStore, vector: UsageVector) -> EstimateResult<PricedItem> {
    if let Some((row, score)) = exact_match(store, &vector).await? {
        return Ok(priced_item(vector, row, score));
    }

    if let Some((row, score)) = pattern_match(store, &vector).await? {
        return Ok(priced_item(vector, row, score));
    }

    if let Some((row, score)) = region_stripped_match(store, &vector).await? {
        return Ok(priced_item(vector, row, score));
    }

    if let Some((row, score)) = attribute_match(store, &vector).await? {
        return Ok(priced_item(vector, row, score));
    }

    Ok(not_found_item(vector))
}

/// Hand-authored discount, applied as a post-match transform once a
/// `PricedItem` already has a warehouse price: the most specific
/// applicable override (region- and pattern-scoped beats a service-wide
/// wildcard) replaces `price_per_unit` or discounts it by a percentage,
/// recomputes `monthly_cost`, and records why in `assumptions`. An item
/// with no price (`NOT_FOUND`) is left untouched — there's nothing to
/// override.
pub async fn apply_override(store: &dyn WarehouseStore, item: PricedItem) -> EstimateResult<PricedItem> {
    if item.pricing_source == NOT_FOUND_SOURCE {
        return Ok(item);
    }

    let overrides = store.find_applicable_overrides(&item.service, &item.region, &item.usage_type).await?;
    let Some(best) = most_specific_override(&overrides) else {
        return Ok(item);
    };

    Ok(apply_override_to_item(item, best))
}

fn most_specific_override(overrides: &[PricingOverride]) -> Option<&PricingOverride> {
    overrides.iter().max_by_key(|o| o.region_code.is_some() as u8 + o.usage_type_pattern.is_some() as u8)
}

fn apply_override_to_item(mut item: PricedItem, over: &PricingOverride) -> PricedItem {
    let new_price = match (over.override_price, over.override_percentage) {
        (Some(price), _) => price,
        (None, Some(pct)) => item.price_per_unit * (Decimal::ONE - Decimal::try_from(pct / 100.0).unwrap_or(Decimal::ZERO)),
        (None, None) => item.price_per_unit,
    };

    item.monthly_cost = cost_for(new_price, item.quantity);
    item.price_per_unit = new_price;
    item.formula = format!("{:.2} {} × ${}/{} (override: {})", item.quantity, item.unit, new_price, item.unit, over.reason);
    item.assumptions.push(format!("Pricing override applied: {}", over.reason));
    item
}

type MatchRow = domain_catalog::PricingDimension;

async fn exact_match(store: &dyn WarehouseStore, vector: &UsageVector) -> EstimateResult<Option<(MatchRow, f64)>> {
    let criteria = MatchCriteria {
        service: vector.service.clone(),
        region_code: vector.region.clone(),
        usage_type: vector.usage_type.clone(),
        usage_type_pattern: false,
        term_type: TermType::OnDemand,
        attributes: HashMap::new(),
    };
    Ok(lowest_price(store.query_best_match(&criteria).await?).map(|row| (row, EXACT_SCORE)))
}

async fn pattern_match(store: &dyn WarehouseStore, vector: &UsageVector) -> EstimateResult<Option<(MatchRow, f64)>> {
    pattern_match_usage_type(store, vector, &vector.usage_type).await
}

async fn pattern_match_usage_type(store: &dyn WarehouseStore, vector: &UsageVector, usage_type: &str) -> EstimateResult<Option<(MatchRow, f64)>> {
    let criteria = MatchCriteria {
        service: vector.service.clone(),
        region_code: vector.region.clone(),
        usage_type: usage_type.to_string(),
        usage_type_pattern: true,
        term_type: TermType::OnDemand,
        attributes: HashMap::new(),
    };
    Ok(lowest_price(store.query_best_match(&criteria).await?).map(|row| (row, PATTERN_SCORE)))
}

static CANDIDATE_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Z]{2,4}\d?)-(.+)$").expect("static regex"));

async fn region_stripped_match(store: &dyn WarehouseStore, vector: &UsageVector) -> EstimateResult<Option<(MatchRow, f64)>> {
    let Some(caps) = CANDIDATE_PREFIX_RE.captures(&vector.usage_type) else {
        return Ok(None);
    };
    let prefix = caps.get(1).expect("group 1 always present on match").as_str();
    let remainder = caps.get(2).expect("group 2 always present on match").as_str();

    if store.lookup_mapping(MappingType::UsageTypePrefix, prefix).await?.is_none() {
        return Ok(None);
    }

    Ok(pattern_match_usage_type(store, vector, remainder).await?.map(|(row, _)| (row, REGION_STRIPPED_SCORE)))
}

async fn attribute_match(store: &dyn WarehouseStore, vector: &UsageVector) -> EstimateResult<Option<(MatchRow, f64)>> {
    if !vector.usage_type.starts_with("BoxUsage:") {
        return Ok(None);
    }
    let instance_type = vector.usage_type.trim_start_matches("BoxUsage:").to_string();

    let mut attributes = HashMap::new();
    attributes.insert("instanceType".to_string(), instance_type);
    attributes.insert(
        "operatingSystem".to_string(),
        vector.attributes.get("operatingSystem").cloned().unwrap_or_else(|| "Linux".to_string()),
    );
    attributes.insert(
        "tenancy".to_string(),
        vector.attributes.get("tenancy").cloned().unwrap_or_else(|| "Shared".to_string()),
    );

    // Attribute matching ignores usage_type entirely; an empty pattern
    // matches every usage type and leaves the JSONB containment filter
    // to do the actual narrowing.
    let criteria = MatchCriteria {
        service: vector.service.clone(),
        region_code: vector.region.clone(),
        usage_type: String::new(),
        usage_type_pattern: true,
        term_type: TermType::OnDemand,
        attributes,
    };
    Ok(lowest_price(store.query_best_match(&criteria).await?).map(|row| (row, ATTRIBUTE_SCORE)))
}

fn lowest_price(mut rows: Vec<MatchRow>) -> Option<MatchRow> {
    rows.sort_by(|a, b| a.price_per_unit.cmp(&b.price_per_unit));
    rows.into_iter().next()
}

fn priced_item(vector: UsageVector, row: MatchRow, score: f64) -> PricedItem {
    let monthly_cost = cost_for(row.price_per_unit, vector.quantity);
    let formula = format!("{:.2} {} × ${}/{}", vector.quantity, row.unit, row.price_per_unit, row.unit);

    PricedItem {
        resource_address: vector.resource_address,
        service: vector.service,
        usage_type: vector.usage_type,
        operation: vector.operation,
        region: vector.region,
        unit: vector.unit,
        quantity: vector.quantity,
        attributes: vector.attributes,
        confidence: vector.confidence,
        assumptions: vector.assumptions,
        price_per_unit: row.price_per_unit,
        monthly_cost,
        match_confidence: Confidence::from_score(score),
        match_score: score,
        pricing_source: row.sku,
        formula,
        currency: row.currency,
    }
}

fn not_found_item(vector: UsageVector) -> PricedItem {
    PricedItem {
        resource_address: vector.resource_address,
        service: vector.service,
        usage_type: vector.usage_type,
        operation: vector.operation,
        region: vector.region,
        unit: vector.unit,
        quantity: vector.quantity,
        attributes: vector.attributes,
        confidence: vector.confidence,
        assumptions: vector.assumptions,
        price_per_unit: Decimal::ZERO,
        monthly_cost: Decimal::ZERO,
        match_confidence: Confidence::Unknown,
        match_score: 0.0,
        pricing_source: NOT_FOUND_SOURCE.to_string(),
        formula: "No pricing match found".to_string(),
        currency: "USD".to_string(),
    }
}

fn cost_for(price_per_unit: Decimal, quantity: f64) -> Decimal {
    Decimal::try_from(quantity).map(|q| price_per_unit * q).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain_catalog::{CatalogStatus, CatalogVersion, MockWarehouseStore, PricingDimension};
    use uuid::Uuid;

    fn sample_row(price: &str, sku: &str) -> PricingDimension {
        PricingDimension {
            id: Uuid::now_v7(),
            catalog_version_id: Uuid::now_v7(),
            service: "VMCompute".to_string(),
            region_code: "us-east-1".to_string(),
            usage_type: "BoxUsage:t3.micro".to_string(),
            operation: None,
            unit: "Hrs".to_string(),
            price_per_unit: price.parse().unwrap(),
            currency: "USD".to_string(),
            begin_range: 0.0,
            end_range: None,
            term_type: TermType::OnDemand,
            sku: sku.to_string(),
            rate_code: format!("{sku}.RC1"),
            description: None,
            product_family: None,
            attributes: HashMap::new(),
        }
    }

    fn sample_vector() -> UsageVector {
        UsageVector {
            resource_address: "aws_instance.web".to_string(),
            service: "VMCompute".to_string(),
            usage_type: "BoxUsage:t3.micro".to_string(),
            operation: None,
            region: "us-east-1".to_string(),
            unit: "Hrs".to_string(),
            quantity: 730.0,
            attributes: HashMap::new(),
            confidence: Confidence::High,
            assumptions: Vec::new(),
        }
    }

    #[tokio::test]
    async fn exact_match_scores_one_and_computes_cost() {
        let mut store = MockWarehouseStore::new();
        store.expect_latest_completed_version().returning(|_| {
            Ok(Some(CatalogVersion {
                id: Uuid::now_v7(),
                service: "VMCompute".to_string(),
                version_hash: "hash".to_string(),
                source_url: "https://example.com".to_string(),
                etag: None,
                publication_date: Utc::now(),
                ingested_at: Utc::now(),
                record_count: 1,
                status: CatalogStatus::Completed,
                error_message: None,
            }))
        });
        store.expect_query_best_match().returning(|_| Ok(vec![sample_row("0.0116", "SKU1")]));

        let priced = match_price(&store, sample_vector()).await.unwrap();
        assert_eq!(priced.match_confidence, Confidence::High);
        assert_eq!(priced.match_score, 1.0);
        assert_eq!(priced.pricing_source, "SKU1");
    }

    #[tokio::test]
    async fn no_match_returns_zero_priced_unknown_item() {
        let mut store = MockWarehouseStore::new();
        store.expect_latest_completed_version().returning(|_| Ok(None));
        store.expect_query_best_match().returning(|_| Ok(Vec::new()));
        store.expect_lookup_mapping().returning(|_, _| Ok(None));

        let priced = match_price(&store, sample_vector()).await.unwrap();
        assert_eq!(priced.pricing_source, "NOT_FOUND");
        assert_eq!(priced.match_confidence, Confidence::Unknown);
        assert_eq!(priced.monthly_cost, Decimal::ZERO);
        assert_eq!(priced.formula, "No pricing match found");
    }

    #[tokio::test]
    async fn tie_break_picks_lowest_price() {
        let mut store = MockWarehouseStore::new();
        store.expect_latest_completed_version().returning(|_| {
            Ok(Some(CatalogVersion {
                id: Uuid::now_v7(),
                service: "VMCompute".to_string(),
                version_hash: "hash".to_string(),
                source_url: "https://example.com".to_string(),
                etag: None,
                publication_date: Utc::now(),
                ingested_at: Utc::now(),
                record_count: 2,
                status: CatalogStatus::Completed,
                error_message: None,
            }))
        });
        store.expect_query_best_match().returning(|_| Ok(vec![sample_row("0.02", "EXPENSIVE"), sample_row("0.01", "CHEAP")]));

        let priced = match_price(&store, sample_vector()).await.unwrap();
        assert_eq!(priced.pricing_source, "CHEAP");
    }

    fn sample_priced_item() -> PricedItem {
        PricedItem {
            resource_address: "aws_instance.web".to_string(),
            service: "VMCompute".to_string(),
            usage_type: "BoxUsage:t3.micro".to_string(),
            operation: None,
            region: "us-east-1".to_string(),
            unit: "Hrs".to_string(),
            quantity: 730.0,
            attributes: HashMap::new(),
            confidence: Confidence::High,
            assumptions: Vec::new(),
            price_per_unit: "0.0116".parse().unwrap(),
            monthly_cost: "8.47".parse().unwrap(),
            match_confidence: Confidence::High,
            match_score: 1.0,
            pricing_source: "SKU1".to_string(),
            formula: "730.00 Hrs × $0.0116/Hr".to_string(),
            currency: "USD".to_string(),
        }
    }

    fn sample_override(override_price: &str, region_code: Option<&str>, usage_type_pattern: Option<&str>) -> PricingOverride {
        PricingOverride {
            id: Uuid::now_v7(),
            service: "VMCompute".to_string(),
            region_code: region_code.map(str::to_string),
            usage_type_pattern: usage_type_pattern.map(str::to_string),
            override_price: Some(override_price.parse().unwrap()),
            override_percentage: None,
            reason: "negotiated enterprise discount".to_string(),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn apply_override_replaces_price_and_recomputes_cost() {
        let mut store = MockWarehouseStore::new();
        store
            .expect_find_applicable_overrides()
            .returning(|_, _, _| Ok(vec![sample_override("0.01", None, None)]));

        let item = apply_override(&store, sample_priced_item()).await.unwrap();
        assert_eq!(item.price_per_unit, "0.01".parse().unwrap());
        assert_eq!(item.monthly_cost, "7.30".parse().unwrap());
        assert!(item.assumptions.iter().any(|a| a.contains("negotiated enterprise discount")));
    }

    #[tokio::test]
    async fn apply_override_prefers_the_most_specific_match() {
        let mut store = MockWarehouseStore::new();
        store.expect_find_applicable_overrides().returning(|_, _, _| {
            Ok(vec![
                sample_override("0.02", None, None),
                sample_override("0.009", Some("us-east-1"), Some("BoxUsage")),
            ])
        });

        let item = apply_override(&store, sample_priced_item()).await.unwrap();
        assert_eq!(item.price_per_unit, "0.009".parse().unwrap());
    }

    #[tokio::test]
    async fn not_found_items_are_never_overridden() {
        let mut store = MockWarehouseStore::new();
        store.expect_find_applicable_overrides().times(0).returning(|_, _, _| Ok(Vec::new()));

        let mut item = sample_priced_item();
        item.pricing_source = "NOT_FOUND".to_string();
        let unchanged = apply_override(&store, item.clone()).await.unwrap();
        assert_eq!(unchanged.price_per_unit, item.price_per_unit);
    }

    #[tokio::test]
    async fn no_applicable_override_leaves_item_unchanged() {
        let mut store = MockWarehouseStore::new();
        store.expect_find_applicable_overrides().returning(|_, _, _| Ok(Vec::new()));

        let item = apply_override(&store, sample_priced_item()).await.unwrap();
        assert_eq!(item.price_per_unit, "0.0116".parse().unwrap());
    }
}
