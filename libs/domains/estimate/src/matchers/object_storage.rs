use super::{f64_attr_or_default, u64_attr_or_default, ResourceMatcher};
use crate::model::{Confidence, ExpandedResource, UsageVector};

const DEFAULT_STORAGE_GB: f64 = 1000.0;
const DEFAULT_TIER1_REQUESTS: u64 = 10_000;
const DEFAULT_TIER2_REQUESTS: u64 = 100_000;
const DEFAULT_TRANSFER_OUT_GB: f64 = 100.0;

/// Object storage buckets: `aws_s3_bucket`. Timed storage GB-Mo, tier-1
/// and tier-2 request counts, and a data-transfer-out placeholder.
pub struct ObjectStorageMatcher;

impl ResourceMatcher for ObjectStorageMatcher {
    fn service_name(&self) -> &'static str {
        "ObjectStorage"
    }

    fn supports(&self, resource_type: &str) -> bool {
        resource_type == "aws_s3_bucket"
    }

    fn match_resource(&self, resource: &ExpandedResource, region: &str) -> Vec<UsageVector> {
        let mut assumptions = Vec::new();
        let storage_gb = f64_attr_or_default(resource, "storage_gb", DEFAULT_STORAGE_GB, &mut assumptions);
        let tier1_requests = u64_attr_or_default(resource, "tier1_requests_per_month", DEFAULT_TIER1_REQUESTS, &mut Vec::new());
        let tier2_requests = u64_attr_or_default(resource, "tier2_requests_per_month", DEFAULT_TIER2_REQUESTS, &mut Vec::new());

        vec![
            UsageVector {
                resource_address: resource.address.clone(),
                service: self.service_name().to_string(),
                usage_type: "TimedStorage-ByteHrs".to_string(),
                operation: None,
                region: region.to_string(),
                unit: "GB-Mo".to_string(),
                quantity: storage_gb,
                attributes: Default::default(),
                confidence: if assumptions.is_empty() { Confidence::High } else { Confidence::Medium },
                assumptions: assumptions.clone(),
            },
            UsageVector {
                resource_address: resource.address.clone(),
                service: self.service_name().to_string(),
                usage_type: "Requests-Tier1".to_string(),
                operation: Some("PUT/COPY/POST/LIST".to_string()),
                region: region.to_string(),
                unit: "Requests".to_string(),
                quantity: tier1_requests as f64,
                attributes: Default::default(),
                confidence: Confidence::Low,
                assumptions: vec!["Assumed 10,000 Tier-1 requests/month (not specified)".to_string()],
            },
            UsageVector {
                resource_address: resource.address.clone(),
                service: self.service_name().to_string(),
                usage_type: "Requests-Tier2".to_string(),
                operation: Some("GET/SELECT".to_string()),
                region: region.to_string(),
                unit: "Requests".to_string(),
                quantity: tier2_requests as f64,
                attributes: Default::default(),
                confidence: Confidence::Low,
                assumptions: vec!["Assumed 100,000 Tier-2 requests/month (not specified)".to_string()],
            },
            UsageVector {
                resource_address: resource.address.clone(),
                service: self.service_name().to_string(),
                usage_type: "DataTransfer-Out-Bytes".to_string(),
                operation: None,
                region: region.to_string(),
                unit: "GB".to_string(),
                quantity: DEFAULT_TRANSFER_OUT_GB,
                attributes: Default::default(),
                confidence: Confidence::Low,
                assumptions: vec!["Assumed 100 GB/month data transfer out (not specified)".to_string()],
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_storage_is_1000_gb() {
        let resource = ExpandedResource {
            address: "aws_s3_bucket.assets".to_string(),
            resource_type: "aws_s3_bucket".to_string(),
            name: "assets".to_string(),
            config: HashMap::new(),
        };
        let vectors = ObjectStorageMatcher.match_resource(&resource, "us-east-1");
        let storage = vectors.iter().find(|v| v.usage_type == "TimedStorage-ByteHrs").unwrap();
        assert_eq!(storage.quantity, 1000.0);
    }

    #[test]
    fn default_storage_prices_to_the_literal_fixture() {
        let resource = ExpandedResource {
            address: "aws_s3_bucket.assets".to_string(),
            resource_type: "aws_s3_bucket".to_string(),
            name: "assets".to_string(),
            config: HashMap::new(),
        };
        let vectors = ObjectStorageMatcher.match_resource(&resource, "us-east-1");
        let storage = vectors.iter().find(|v| v.usage_type == "TimedStorage-ByteHrs").unwrap();
        let price_per_gb = 0.023;
        assert_eq!((storage.quantity * price_per_gb * 100.0).round() / 100.0, 23.00);
    }
}
