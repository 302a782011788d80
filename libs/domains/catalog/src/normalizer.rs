//! Dimension Normalizer (component C): turns a raw `(product, term,
//! term_type)` triple from a provider's price list into zero or more
//! `PricingDimension` rows. Pure functions only — no I/O, no store access.

use crate::models::{NewPricingDimension, TermType};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// A raw product record as it appears in the provider's `products` map,
/// keyed by SKU.
#[derive(Debug, Clone)]
pub struct RawProduct {
    pub sku: String,
    pub product_family: Option<String>,
    pub attributes: HashMap<String, String>,
}

/// A raw term (one `OnDemand`/`Reserved` entry, itself containing one or
/// more price dimensions/tiers).
#[derive(Debug, Clone)]
pub struct RawTerm {
    pub sku: String,
    pub rate_code: String,
    pub price_dimensions: Vec<RawPriceDimension>,
}

#[derive(Debug, Clone)]
pub struct RawPriceDimension {
    pub unit: String,
    pub description: Option<String>,
    pub begin_range: Option<Value>,
    pub end_range: Option<Value>,
    /// `{ "USD": "0.0120000000" }`-style map, first key wins.
    pub price_per_unit: HashMap<String, String>,
}

/// SKU -> product lookup built by a full `products` pass before any term
/// pass runs. Backed by an in-memory map for small catalogs or a
/// disk-backed store for catalogs over the spill threshold; both satisfy
/// this trait so the normalizer never cares which.
pub trait ProductLookup {
    fn get(&self, sku: &str) -> Option<RawProduct>;
}

impl ProductLookup for HashMap<String, RawProduct> {
    fn get(&self, sku: &str) -> Option<RawProduct> {
        HashMap::get(self, sku).cloned()
    }
}

/// Resolves a region code for a product: prefer `regionCode`, fall back to
/// a location -> region lookup, else `"global"`.
pub fn resolve_region(attributes: &HashMap<String, String>, location_to_region: &dyn Fn(&str) -> Option<String>) -> String {
    if let Some(code) = attributes.get("regionCode") {
        if !code.is_empty() {
            return code.clone();
        }
    }
    if let Some(location) = attributes.get("location") {
        if let Some(region) = location_to_region(location) {
            return region;
        }
    }
    "global".to_string()
}

/// Resolves the usage type: prefer `usagetype`, then `usageType`, else
/// `"Unknown"`.
pub fn resolve_usage_type(attributes: &HashMap<String, String>) -> String {
    attributes
        .get("usagetype")
        .or_else(|| attributes.get("usageType"))
        .cloned()
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Picks the first currency entry in `pricePerUnit`. `NaN` (and anything
/// unparsable) normalizes to `0`.
pub fn resolve_price(price_per_unit: &HashMap<String, String>) -> (rust_decimal::Decimal, String) {
    let Some((currency, raw)) = price_per_unit.iter().next() else {
        return (rust_decimal::Decimal::ZERO, "USD".to_string());
    };
    let price = raw
        .parse::<rust_decimal::Decimal>()
        .unwrap_or(rust_decimal::Decimal::ZERO);
    (price, currency.clone())
}

/// Parses `beginRange`/`endRange`. `beginRange` defaults to `0`;
/// `endRange` of `"Inf"` (or missing) becomes `None`; unparsable values
/// normalize like `NaN` does, to `None`/`0`.
pub fn resolve_range(begin_range: Option<&Value>, end_range: Option<&Value>) -> (f64, Option<f64>) {
    let begin = begin_range
        .and_then(value_as_f64)
        .filter(|v| !v.is_nan())
        .unwrap_or(0.0);

    let end = match end_range {
        None => None,
        Some(Value::String(s)) if s == "Inf" => None,
        Some(v) => value_as_f64(v).filter(|v| !v.is_nan()),
    };

    (begin, end)
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

/// Outcome of normalizing one term against the SKU lookup: either the
/// set of rows it produced, or a note that its SKU was unknown (counted
/// by the caller in `skipped`, never a hard failure).
pub enum NormalizeOutcome {
    Rows(Vec<NewPricingDimension>),
    UnknownSku,
}

/// Normalizes one term into its price-dimension rows. `term_type` and
/// `catalog_version_id` are threaded through from the ingest context;
/// `location_to_region` is the Rosetta fallback lookup.
pub fn normalize_term(
    catalog_version_id: Uuid,
    service: &str,
    term: &RawTerm,
    term_type: TermType,
    products: &dyn ProductLookup,
    location_to_region: &dyn Fn(&str) -> Option<String>,
) -> NormalizeOutcome {
    let Some(product) = products.get(&term.sku) else {
        return NormalizeOutcome::UnknownSku;
    };

    let region_code = resolve_region(&product.attributes, location_to_region);
    let usage_type = resolve_usage_type(&product.attributes);

    let rows = term
        .price_dimensions
        .iter()
        .map(|dim| {
            let (price_per_unit, currency) = resolve_price(&dim.price_per_unit);
            let (begin_range, end_range) = resolve_range(dim.begin_range.as_ref(), dim.end_range.as_ref());

            NewPricingDimension {
                catalog_version_id,
                service: service.to_string(),
                region_code: region_code.clone(),
                usage_type: usage_type.clone(),
                operation: product.attributes.get("operation").cloned(),
                unit: dim.unit.clone(),
                price_per_unit,
                currency,
                begin_range,
                end_range,
                term_type,
                sku: term.sku.clone(),
                rate_code: term.rate_code.clone(),
                description: dim.description.clone(),
                product_family: product.product_family.clone(),
                attributes: product.attributes.clone(),
            }
        })
        .collect();

    NormalizeOutcome::Rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn region_prefers_region_code() {
        let a = attrs(&[("regionCode", "us-east-1"), ("location", "US East (N. Virginia)")]);
        assert_eq!(resolve_region(&a, &|_| None), "us-east-1");
    }

    #[test]
    fn region_falls_back_to_location_lookup() {
        let a = attrs(&[("location", "US East (N. Virginia)")]);
        assert_eq!(resolve_region(&a, &|loc| (loc == "US East (N. Virginia)").then(|| "us-east-1".to_string())), "us-east-1");
    }

    #[test]
    fn region_defaults_to_global() {
        let a = attrs(&[]);
        assert_eq!(resolve_region(&a, &|_| None), "global");
    }

    #[test]
    fn usage_type_prefers_lowercase_key() {
        let a = attrs(&[("usagetype", "BoxUsage:t3.micro"), ("usageType", "other")]);
        assert_eq!(resolve_usage_type(&a), "BoxUsage:t3.micro");
    }

    #[test]
    fn usage_type_defaults_to_unknown() {
        assert_eq!(resolve_usage_type(&attrs(&[])), "Unknown");
    }

    #[test]
    fn price_takes_first_currency_key() {
        let mut m = HashMap::new();
        m.insert("USD".to_string(), "0.0120000000".to_string());
        let (price, currency) = resolve_price(&m);
        assert_eq!(currency, "USD");
        assert_eq!(price, "0.0120000000".parse().unwrap());
    }

    #[test]
    fn price_nan_normalizes_to_zero() {
        let mut m = HashMap::new();
        m.insert("USD".to_string(), "NaN".to_string());
        let (price, _) = resolve_price(&m);
        assert_eq!(price, rust_decimal::Decimal::ZERO);
    }

    #[test]
    fn range_inf_end_becomes_none() {
        let end = Value::String("Inf".to_string());
        let (begin, end) = resolve_range(None, Some(&end));
        assert_eq!(begin, 0.0);
        assert_eq!(end, None);
    }

    #[test]
    fn range_parses_numeric_bounds() {
        let begin = Value::String("100".to_string());
        let end = Value::String("500".to_string());
        assert_eq!(resolve_range(Some(&begin), Some(&end)), (100.0, Some(500.0)));
    }

    #[test]
    fn unknown_sku_is_reported_not_failed() {
        let products: HashMap<String, RawProduct> = HashMap::new();
        let term = RawTerm {
            sku: "MISSING".to_string(),
            rate_code: "RC1".to_string(),
            price_dimensions: vec![],
        };
        let outcome = normalize_term(Uuid::now_v7(), "AmazonEC2", &term, TermType::OnDemand, &products, &|_| None);
        assert!(matches!(outcome, NormalizeOutcome::UnknownSku));
    }
}
