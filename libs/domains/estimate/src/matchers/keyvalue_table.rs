use super::{bool_attr_or_default, f64_attr_or_default, ResourceMatcher, HOURS_PER_MONTH};
use crate::model::{Confidence, ExpandedResource, UsageVector};

/// Wide-column / key-value tables: `aws_dynamodb_table`. Either
/// provisioned capacity (read + write capacity units × hours) or
/// on-demand capacity, plus storage.
pub struct KeyValueTableMatcher;

impl ResourceMatcher for KeyValueTableMatcher {
    fn service_name(&self) -> &'static str {
        "KeyValueStore"
    }

    fn supports(&self, resource_type: &str) -> bool {
        resource_type == "aws_dynamodb_table"
    }

    fn match_resource(&self, resource: &ExpandedResource, region: &str) -> Vec<UsageVector> {
        let mut assumptions = Vec::new();
        let on_demand = bool_attr_or_default(resource, "on_demand", false);
        let storage_gb = f64_attr_or_default(resource, "storage_gb", 1.0, &mut assumptions);

        let mut vectors = Vec::new();

        if on_demand {
            let monthly_reads = f64_attr_or_default(resource, "monthly_read_request_units", 1_000_000.0, &mut assumptions);
            let monthly_writes = f64_attr_or_default(resource, "monthly_write_request_units", 1_000_000.0, &mut assumptions);
            vectors.push(UsageVector {
                resource_address: resource.address.clone(),
                service: self.service_name().to_string(),
                usage_type: "ReadRequestUnits".to_string(),
                operation: None,
                region: region.to_string(),
                unit: "RequestUnits".to_string(),
                quantity: monthly_reads,
                attributes: Default::default(),
                confidence: Confidence::Low,
                assumptions: Vec::new(),
            });
            vectors.push(UsageVector {
                resource_address: resource.address.clone(),
                service: self.service_name().to_string(),
                usage_type: "WriteRequestUnits".to_string(),
                operation: None,
                region: region.to_string(),
                unit: "RequestUnits".to_string(),
                quantity: monthly_writes,
                attributes: Default::default(),
                confidence: Confidence::Low,
                assumptions: Vec::new(),
            });
        } else {
            let read_capacity = f64_attr_or_default(resource, "read_capacity", 5.0, &mut assumptions);
            let write_capacity = f64_attr_or_default(resource, "write_capacity", 5.0, &mut assumptions);
            vectors.push(UsageVector {
                resource_address: resource.address.clone(),
                service: self.service_name().to_string(),
                usage_type: "ReadCapacityUnit-Hrs".to_string(),
                operation: None,
                region: region.to_string(),
                unit: "Hrs".to_string(),
                quantity: read_capacity * HOURS_PER_MONTH,
                attributes: Default::default(),
                confidence: if assumptions.is_empty() { Confidence::High } else { Confidence::Medium },
                assumptions: assumptions.clone(),
            });
            vectors.push(UsageVector {
                resource_address: resource.address.clone(),
                service: self.service_name().to_string(),
                usage_type: "WriteCapacityUnit-Hrs".to_string(),
                operation: None,
                region: region.to_string(),
                unit: "Hrs".to_string(),
                quantity: write_capacity * HOURS_PER_MONTH,
                attributes: Default::default(),
                confidence: if assumptions.is_empty() { Confidence::High } else { Confidence::Medium },
                assumptions: assumptions.clone(),
            });
        }

        vectors.push(UsageVector {
            resource_address: resource.address.clone(),
            service: self.service_name().to_string(),
            usage_type: "TimedStorage-ByteHrs".to_string(),
            operation: None,
            region: region.to_string(),
            unit: "GB-Mo".to_string(),
            quantity: storage_gb,
            attributes: Default::default(),
            confidence: Confidence::Medium,
            assumptions: vec!["Assumed 1 GB of table storage (not specified)".to_string()],
        });

        vectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn on_demand_splits_read_and_write_units() {
        let mut config = HashMap::new();
        config.insert("on_demand".to_string(), serde_json::json!(true));
        let resource = ExpandedResource {
            address: "aws_dynamodb_table.orders".to_string(),
            resource_type: "aws_dynamodb_table".to_string(),
            name: "orders".to_string(),
            config,
        };
        let vectors = KeyValueTableMatcher.match_resource(&resource, "us-east-1");
        assert!(vectors.iter().any(|v| v.usage_type == "ReadRequestUnits"));
        assert!(vectors.iter().any(|v| v.usage_type == "WriteRequestUnits"));
    }

    #[test]
    fn provisioned_emits_capacity_unit_hours() {
        let resource = ExpandedResource {
            address: "aws_dynamodb_table.orders".to_string(),
            resource_type: "aws_dynamodb_table".to_string(),
            name: "orders".to_string(),
            config: HashMap::new(),
        };
        let vectors = KeyValueTableMatcher.match_resource(&resource, "us-east-1");
        let read = vectors.iter().find(|v| v.usage_type == "ReadCapacityUnit-Hrs").unwrap();
        assert_eq!(read.quantity, 5.0 * HOURS_PER_MONTH);
    }
}
