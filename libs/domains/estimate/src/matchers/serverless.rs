use super::{f64_attr_or_default, u64_attr_or_default, ResourceMatcher};
use crate::model::{Confidence, ExpandedResource, UsageVector};

const FREE_EPHEMERAL_STORAGE_MB: f64 = 512.0;

/// Serverless functions: `aws_lambda_function`. Request count, GB-second
/// compute, and ephemeral storage GB-second above the 512 MiB baseline.
pub struct ServerlessMatcher;

impl ResourceMatcher for ServerlessMatcher {
    fn service_name(&self) -> &'static str {
        "Serverless"
    }

    fn supports(&self, resource_type: &str) -> bool {
        resource_type == "aws_lambda_function"
    }

    fn match_resource(&self, resource: &ExpandedResource, region: &str) -> Vec<UsageVector> {
        let mut assumptions = Vec::new();
        let memory_mb = f64_attr_or_default(resource, "memory_size", 128.0, &mut assumptions);
        let monthly_requests = u64_attr_or_default(resource, "monthly_requests", 1_000_000, &mut assumptions);
        let avg_duration_ms = f64_attr_or_default(resource, "avg_duration_ms", 100.0, &mut assumptions);

        let gb_seconds = (memory_mb / 1024.0) * (avg_duration_ms / 1000.0) * monthly_requests as f64;
        let confidence = if assumptions.is_empty() { Confidence::High } else { Confidence::Low };

        let mut vectors = vec![
            UsageVector {
                resource_address: resource.address.clone(),
                service: self.service_name().to_string(),
                usage_type: "Request".to_string(),
                operation: None,
                region: region.to_string(),
                unit: "Requests".to_string(),
                quantity: monthly_requests as f64,
                attributes: Default::default(),
                confidence,
                assumptions: assumptions.clone(),
            },
            UsageVector {
                resource_address: resource.address.clone(),
                service: self.service_name().to_string(),
                usage_type: "Lambda-GB-Second".to_string(),
                operation: None,
                region: region.to_string(),
                unit: "GB-Sec".to_string(),
                quantity: gb_seconds,
                attributes: Default::default(),
                confidence,
                assumptions: assumptions.clone(),
            },
        ];

        let ephemeral_storage_mb = f64_attr_or_default(resource, "ephemeral_storage_mb", FREE_EPHEMERAL_STORAGE_MB, &mut Vec::new());
        if ephemeral_storage_mb > FREE_EPHEMERAL_STORAGE_MB {
            let extra_gb = (ephemeral_storage_mb - FREE_EPHEMERAL_STORAGE_MB) / 1024.0;
            vectors.push(UsageVector {
                resource_address: resource.address.clone(),
                service: self.service_name().to_string(),
                usage_type: "Lambda-Storage-GB-Second".to_string(),
                operation: None,
                region: region.to_string(),
                unit: "GB-Sec".to_string(),
                quantity: extra_gb * (avg_duration_ms / 1000.0) * monthly_requests as f64,
                attributes: Default::default(),
                confidence: Confidence::Medium,
                assumptions: Vec::new(),
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
    fn baseline_ephemeral_storage_emits_no_extra_vector() {
        let resource = ExpandedResource {
            address: "aws_lambda_function.handler".to_string(),
            resource_type: "aws_lambda_function".to_string(),
            name: "handler".to_string(),
            config: HashMap::new(),
        };
        let vectors = ServerlessMatcher.match_resource(&resource, "us-east-1");
        assert!(!vectors.iter().any(|v| v.usage_type == "Lambda-Storage-GB-Second"));
    }

    #[test]
    fn ephemeral_storage_above_baseline_emits_extra_vector() {
        let mut config = HashMap::new();
        config.insert("ephemeral_storage_mb".to_string(), serde_json::json!(1024));
        let resource = ExpandedResource {
            address: "aws_lambda_function.handler".to_string(),
            resource_type: "aws_lambda_function".to_string(),
            name: "handler".to_string(),
            config,
        };
        let vectors = ServerlessMatcher.match_resource(&resource, "us-east-1");
        assert!(vectors.iter().any(|v| v.usage_type == "Lambda-Storage-GB-Second"));
    }
}
