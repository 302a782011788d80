pub mod aggregator;
pub mod error;
pub mod matchers;
pub mod model;
pub mod price_matcher;
pub mod translator;

pub use aggregator::{aggregate, input_hash};
pub use error::{EstimateError, EstimateResult};
pub use matchers::{MatcherRegistry, ResourceMatcher};
pub use model::{
    AttrExpr, Confidence, CostEstimate, EstimateMetadata, ExpandedResource, Multiplicity,
    ParsedConfig, PricedItem, ResourceBlock, ResourceCost, ServiceCost, UsageVector, Variable,
};
pub use price_matcher::{apply_override, match_price};
pub use translator::expand;
