//! Service Matcher Registry (component G): a registry of per-service
//! matchers, each a pure function of a resource plus static rate
//! constants. Dispatch is first-match-wins; an unsupported resource
//! type contributes zero vectors and is warning-logged, never an error.

mod block_volume;
mod cache;
mod container;
mod keyvalue_table;
mod network;
mod object_storage;
mod relational_db;
mod serverless;
mod vm;

pub use block_volume::BlockVolumeMatcher;
pub use cache::CacheMatcher;
pub use container::ContainerMatcher;
pub use keyvalue_table::KeyValueTableMatcher;
pub use network::NetworkMatcher;
pub use object_storage::ObjectStorageMatcher;
pub use relational_db::RelationalDbMatcher;
pub use serverless::ServerlessMatcher;
pub use vm::VmMatcher;

use crate::model::{ExpandedResource, UsageVector};

/// Hours in a 730-hour average month, the constant every hourly matcher
/// multiplies by. Defined once so every matcher agrees with the spec's
/// literal fixtures.
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Capability set a service matcher implements. `match_resource` MUST be
/// a pure function of its inputs plus static rate constants — no I/O, no
/// warehouse access.
pub trait ResourceMatcher: Send + Sync {
    fn service_name(&self) -> &'static str;
    fn supports(&self, resource_type: &str) -> bool;
    fn match_resource(&self, resource: &ExpandedResource, region: &str) -> Vec<UsageVector>;
}

/// Ordered collection of matchers; the first whose `supports` returns
/// true wins.
pub struct MatcherRegistry {
    matchers: Vec<Box<dyn ResourceMatcher>>,
}

impl MatcherRegistry {
    pub fn new() -> Self {
        Self { matchers: Vec::new() }
    }

    pub fn register(&mut self, matcher: Box<dyn ResourceMatcher>) {
        self.matchers.push(matcher);
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(VmMatcher));
        registry.register(Box::new(BlockVolumeMatcher));
        registry.register(Box::new(RelationalDbMatcher));
        registry.register(Box::new(ServerlessMatcher));
        registry.register(Box::new(ObjectStorageMatcher));
        registry.register(Box::new(KeyValueTableMatcher));
        registry.register(Box::new(CacheMatcher));
        registry.register(Box::new(ContainerMatcher { vm_matcher: VmMatcher }));
        registry.register(Box::new(NetworkMatcher));
        registry
    }

    pub fn match_resource(&self, resource: &ExpandedResource, region: &str) -> Vec<UsageVector> {
        match self.matchers.iter().find(|m| m.supports(&resource.resource_type)) {
            Some(matcher) => matcher.match_resource(resource, region),
            None => {
                tracing::warn!(resource_type = %resource.resource_type, address = %resource.address, "no matcher for resource type");
                Vec::new()
            }
        }
    }
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Reads a string attribute off a resource's resolved config, falling
/// back to `default` and recording an assumption string when it does.
pub fn string_attr_or_default(
    resource: &ExpandedResource,
    key: &str,
    default: &str,
    assumptions: &mut Vec<String>,
) -> String {
    match resource.config.get(key).and_then(|v| v.as_str()) {
        Some(value) => value.to_string(),
        None => {
            assumptions.push(format!("Assumed {key} = \"{default}\" (not specified)"));
            default.to_string()
        }
    }
}

pub fn f64_attr_or_default(
    resource: &ExpandedResource,
    key: &str,
    default: f64,
    assumptions: &mut Vec<String>,
) -> f64 {
    match resource.config.get(key).and_then(|v| v.as_f64()) {
        Some(value) => value,
        None => {
            assumptions.push(format!("Assumed {key} = {default} (not specified)"));
            default
        }
    }
}

pub fn bool_attr_or_default(resource: &ExpandedResource, key: &str, default: bool) -> bool {
    resource.config.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

pub fn u64_attr_or_default(
    resource: &ExpandedResource,
    key: &str,
    default: u64,
    assumptions: &mut Vec<String>,
) -> u64 {
    match resource.config.get(key).and_then(|v| v.as_u64()) {
        Some(value) => value,
        None => {
            assumptions.push(format!("Assumed {key} = {default} (not specified)"));
            default
        }
    }
}
