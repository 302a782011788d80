use super::{bool_attr_or_default, f64_attr_or_default, string_attr_or_default, ResourceMatcher, HOURS_PER_MONTH};
use crate::model::{Confidence, ExpandedResource, UsageVector};

/// Relational database instances: `aws_db_instance`. Compute hours
/// (doubled for multi-AZ), allocated storage GB-Mo, and backup storage
/// GB-Mo (defaults to allocated storage).
pub struct RelationalDbMatcher;

impl ResourceMatcher for RelationalDbMatcher {
    fn service_name(&self) -> &'static str {
        "RelationalDatabase"
    }

    fn supports(&self, resource_type: &str) -> bool {
        resource_type == "aws_db_instance"
    }

    fn match_resource(&self, resource: &ExpandedResource, region: &str) -> Vec<UsageVector> {
        let mut assumptions = Vec::new();
        let engine = string_attr_or_default(resource, "engine", "postgres", &mut assumptions);
        let instance_class = string_attr_or_default(resource, "instance_class", "db.t3.micro", &mut assumptions);
        let multi_az = bool_attr_or_default(resource, "multi_az", false);
        let allocated_storage = f64_attr_or_default(resource, "allocated_storage", 20.0, &mut Vec::new());

        let compute_multiplier = if multi_az { 2.0 } else { 1.0 };

        let mut vectors = vec![UsageVector {
            resource_address: resource.address.clone(),
            service: self.service_name().to_string(),
            usage_type: format!("InstanceUsage:{engine}:{instance_class}"),
            operation: None,
            region: region.to_string(),
            unit: "Hrs".to_string(),
            quantity: HOURS_PER_MONTH * compute_multiplier,
            attributes: [("engine".to_string(), engine.clone()), ("multiAZ".to_string(), multi_az.to_string())].into(),
            confidence: if assumptions.is_empty() { Confidence::High } else { Confidence::Medium },
            assumptions: assumptions.clone(),
        }];

        vectors.push(UsageVector {
            resource_address: resource.address.clone(),
            service: self.service_name().to_string(),
            usage_type: format!("RDS:StorageUsage:{engine}"),
            operation: None,
            region: region.to_string(),
            unit: "GB-Mo".to_string(),
            quantity: allocated_storage,
            attributes: Default::default(),
            confidence: Confidence::High,
            assumptions: Vec::new(),
        });

        vectors.push(UsageVector {
            resource_address: resource.address.clone(),
            service: self.service_name().to_string(),
            usage_type: format!("RDS:ChargedBackupUsage:{engine}"),
            operation: None,
            region: region.to_string(),
            unit: "GB-Mo".to_string(),
            quantity: allocated_storage,
            attributes: Default::default(),
            confidence: Confidence::Medium,
            assumptions: vec!["Assumed backup storage equal to allocated storage (not specified)".to_string()],
        });

        vectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn multi_az_doubles_compute_hours() {
        let mut config = HashMap::new();
        config.insert("multi_az".to_string(), serde_json::json!(true));
        let resource = ExpandedResource {
            address: "aws_db_instance.primary".to_string(),
            resource_type: "aws_db_instance".to_string(),
            name: "primary".to_string(),
            config,
        };
        let vectors = RelationalDbMatcher.match_resource(&resource, "us-east-1");
        let compute = vectors.iter().find(|v| v.unit == "Hrs").unwrap();
        assert_eq!(compute.quantity, HOURS_PER_MONTH * 2.0);
    }

    #[test]
    fn single_az_uses_default_hours() {
        let resource = ExpandedResource {
            address: "aws_db_instance.primary".to_string(),
            resource_type: "aws_db_instance".to_string(),
            name: "primary".to_string(),
            config: HashMap::new(),
        };
        let vectors = RelationalDbMatcher.match_resource(&resource, "us-east-1");
        let compute = vectors.iter().find(|v| v.unit == "Hrs").unwrap();
        assert_eq!(compute.quantity, HOURS_PER_MONTH);
    }
}
