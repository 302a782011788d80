use super::{f64_attr_or_default, string_attr_or_default, u64_attr_or_default, ResourceMatcher, HOURS_PER_MONTH};
use crate::model::{Confidence, ExpandedResource, UsageVector};

/// In-memory cache clusters: `aws_elasticache_cluster`. Node-hours ×
/// node count, plus backup storage if snapshot retention is set.
pub struct CacheMatcher;

impl ResourceMatcher for CacheMatcher {
    fn service_name(&self) -> &'static str {
        "InMemoryCache"
    }

    fn supports(&self, resource_type: &str) -> bool {
        resource_type == "aws_elasticache_cluster"
    }

    fn match_resource(&self, resource: &ExpandedResource, region: &str) -> Vec<UsageVector> {
        let mut assumptions = Vec::new();
        let node_type = string_attr_or_default(resource, "node_type", "cache.t3.micro", &mut assumptions);
        let num_nodes = u64_attr_or_default(resource, "num_cache_nodes", 1, &mut assumptions);

        let mut vectors = vec![UsageVector {
            resource_address: resource.address.clone(),
            service: self.service_name().to_string(),
            usage_type: format!("NodeUsage:{node_type}"),
            operation: None,
            region: region.to_string(),
            unit: "Hrs".to_string(),
            quantity: HOURS_PER_MONTH * num_nodes as f64,
            attributes: [("nodeType".to_string(), node_type.clone())].into(),
            confidence: if assumptions.is_empty() { Confidence::High } else { Confidence::Medium },
            assumptions: assumptions.clone(),
        }];

        let retention_days = f64_attr_or_default(resource, "snapshot_retention_limit", 0.0, &mut Vec::new());
        if retention_days > 0.0 {
            let backup_gb = f64_attr_or_default(resource, "backup_storage_gb", 10.0, &mut Vec::new());
            vectors.push(UsageVector {
                resource_address: resource.address.clone(),
                service: self.service_name().to_string(),
                usage_type: "Snapshot-Storage".to_string(),
                operation: None,
                region: region.to_string(),
                unit: "GB-Mo".to_string(),
                quantity: backup_gb,
                attributes: Default::default(),
                confidence: Confidence::Medium,
                assumptions: vec!["Assumed 10 GB of snapshot storage (not specified)".to_string()],
            });
        }

        vectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn node_hours_scale_with_node_count() {
        let mut config = HashMap::new();
        config.insert("num_cache_nodes".to_string(), serde_json::json!(3));
        let resource = ExpandedResource {
            address: "aws_elasticache_cluster.sessions".to_string(),
            resource_type: "aws_elasticache_cluster".to_string(),
            name: "sessions".to_string(),
            config,
        };
        let vectors = CacheMatcher.match_resource(&resource, "us-east-1");
        let node_hours = vectors.iter().find(|v| v.unit == "Hrs").unwrap();
        assert_eq!(node_hours.quantity, HOURS_PER_MONTH * 3.0);
    }

    #[test]
    fn no_retention_emits_no_backup_vector() {
        let resource = ExpandedResource {
            address: "aws_elasticache_cluster.sessions".to_string(),
            resource_type: "aws_elasticache_cluster".to_string(),
            name: "sessions".to_string(),
            config: HashMap::new(),
        };
        let vectors = CacheMatcher.match_resource(&resource, "us-east-1");
        assert!(!vectors.iter().any(|v| v.usage_type == "Snapshot-Storage"));
    }
}
