//! Value types flowing through the estimate pipeline: the translator's
//! input AST, the usage vectors matchers emit, the priced items the
//! price matcher produces, and the aggregation/envelope output schema.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use ts_rs::TS;
use utoipa::ToSchema;

/// Confidence ordering is `Unknown < Low < Medium < High`; derive order
/// follows declaration order so `Ord`/`PartialOrd` give that for free.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default, ToSchema, TS,
)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    #[default]
    Unknown,
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.95 {
            Confidence::High
        } else if score >= 0.70 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn min_over<I: IntoIterator<Item = Confidence>>(items: I) -> Confidence {
        items.into_iter().min().unwrap_or(Confidence::Unknown)
    }
}

/// One variable declaration with its (possibly absent) default value.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub default: Option<serde_json::Value>,
}

/// A raw attribute expression as the external config parser hands it to
/// the translator: either a concrete value, a reference into `var.*` or
/// `local.*` the translator must resolve, or a value the parser has
/// already flagged as unknown (computed at apply time).
#[derive(Debug, Clone)]
pub enum AttrExpr {
    Literal(serde_json::Value),
    VarRef(String),
    LocalRef(String),
    Unknown,
}

/// `count` or `for_each` meta-argument on a resource block.
#[derive(Debug, Clone)]
pub enum Multiplicity {
    Single,
    Count(u32),
    ForEach(Vec<String>),
}

/// One resource block as parsed by the external config parser, before
/// `count`/`for_each` expansion.
#[derive(Debug, Clone)]
pub struct ResourceBlock {
    pub resource_type: String,
    pub name: String,
    pub multiplicity: Multiplicity,
    pub config: HashMap<String, AttrExpr>,
}

/// Locals block: each entry may itself reference `var.*`, resolved in
/// the same pass as resource attributes.
#[derive(Debug, Clone, Default)]
pub struct ParsedConfig {
    pub variables: HashMap<String, Variable>,
    pub locals: HashMap<String, AttrExpr>,
    pub resources: Vec<ResourceBlock>,
}

/// One resource instance after `count`/`for_each` expansion, with every
/// attribute the translator could resolve fully evaluated.
#[derive(Debug, Clone)]
pub struct ExpandedResource {
    pub address: String,
    pub resource_type: String,
    pub name: String,
    pub config: HashMap<String, serde_json::Value>,
}

/// A billable quantity a matcher derives from one expanded resource.
/// In-flight only, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct UsageVector {
    pub resource_address: String,
    pub service: String,
    pub usage_type: String,
    pub operation: Option<String>,
    pub region: String,
    pub unit: String,
    pub quantity: f64,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub attributes: HashMap<String, String>,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub assumptions: Vec<String>,
}

impl UsageVector {
    pub fn with_assumption(mut self, assumption: impl Into<String>) -> Self {
        self.assumptions.push(assumption.into());
        self
    }
}

/// A `UsageVector` resolved against the warehouse: price, cost, and the
/// match metadata that explains where the price came from.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct PricedItem {
    pub resource_address: String,
    pub service: String,
    pub usage_type: String,
    pub operation: Option<String>,
    pub region: String,
    pub unit: String,
    pub quantity: f64,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub attributes: HashMap<String, String>,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub assumptions: Vec<String>,
    #[ts(as = "String")]
    pub price_per_unit: Decimal,
    #[ts(as = "String")]
    pub monthly_cost: Decimal,
    pub match_confidence: Confidence,
    pub match_score: f64,
    pub pricing_source: String,
    pub formula: String,
    pub currency: String,
}

/// Per-resource rollup: every priced line item for one expanded
/// resource address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct ResourceCost {
    pub address: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub service: String,
    #[ts(as = "String")]
    pub monthly_cost: Decimal,
    pub confidence: Confidence,
    pub line_items: Vec<PricedItem>,
    pub assumptions: Vec<String>,
}

/// Per-service rollup across every resource of that service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct ServiceCost {
    pub service: String,
    #[ts(as = "String")]
    pub monthly_cost: Decimal,
    pub resource_count: u64,
    pub confidence: Confidence,
}

/// Provenance attached to every estimate: which catalog snapshot priced
/// it, a content hash of the input, when it ran, and the engine build.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct EstimateMetadata {
    pub catalog_version: String,
    pub input_hash: String,
    #[ts(as = "String")]
    pub evaluated_at: DateTime<Utc>,
    pub engine_version: String,
}

/// The canonical output schema for a cost estimate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct CostEstimate {
    #[ts(as = "String")]
    pub total_monthly_cost: Decimal,
    pub currency: String,
    pub by_service: BTreeMap<String, ServiceCost>,
    pub by_resource: Vec<ResourceCost>,
    pub overall_confidence: Confidence,
    pub assumptions: Vec<String>,
    pub warnings: Vec<String>,
    pub metadata: EstimateMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_orders_unknown_lowest() {
        assert!(Confidence::Unknown < Confidence::Low);
        assert!(Confidence::Low < Confidence::Medium);
        assert!(Confidence::Medium < Confidence::High);
    }

    #[test]
    fn confidence_min_over_empty_is_unknown() {
        assert_eq!(Confidence::min_over(Vec::<Confidence>::new()), Confidence::Unknown);
    }

    #[test]
    fn confidence_from_score_boundaries() {
        assert_eq!(Confidence::from_score(0.95), Confidence::High);
        assert_eq!(Confidence::from_score(0.70), Confidence::Medium);
        assert_eq!(Confidence::from_score(0.69), Confidence::Low);
    }
}
