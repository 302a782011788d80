use super::block_volume::provisioned_capacity_vectors;
use super::{string_attr_or_default, ResourceMatcher, HOURS_PER_MONTH};
use crate::model::{Confidence, ExpandedResource, UsageVector};

/// Compute instances: `aws_instance`. Emits compute hours, root block
/// storage, any extra block devices, provisioned IOPS/throughput above
/// baseline, and a data-transfer-out placeholder.
pub struct VmMatcher;

impl ResourceMatcher for VmMatcher {
    fn service_name(&self) -> &'static str {
        "VMCompute"
    }

    fn supports(&self, resource_type: &str) -> bool {
        resource_type == "aws_instance"
    }

    fn match_resource(&self, resource: &ExpandedResource, region: &str) -> Vec<UsageVector> {
        let mut vectors = Vec::new();
        let mut assumptions = Vec::new();

        let instance_type = string_attr_or_default(resource, "instance_type", "t3.micro", &mut assumptions);
        let compute_confidence = if assumptions.is_empty() { Confidence::High } else { Confidence::Medium };

        vectors.push(UsageVector {
            resource_address: resource.address.clone(),
            service: self.service_name().to_string(),
            usage_type: format!("BoxUsage:{instance_type}"),
            operation: None,
            region: region.to_string(),
            unit: "Hrs".to_string(),
            quantity: HOURS_PER_MONTH,
            attributes: [("instanceType".to_string(), instance_type.clone())].into(),
            confidence: compute_confidence,
            assumptions: assumptions.clone(),
        });

        vectors.extend(root_volume_vectors(resource, region));
        vectors.extend(extra_device_vectors(resource, region));
        vectors.push(data_transfer_out_placeholder(resource, region, "VMCompute"));

        vectors
    }
}

fn root_volume_vectors(resource: &ExpandedResource, region: &str) -> Vec<UsageVector> {
    let Some(root) = resource.config.get("root_block_device") else {
        return vec![default_root_volume(resource, region)];
    };
    volume_vectors(resource, region, root, true)
}

fn default_root_volume(resource: &ExpandedResource, region: &str) -> UsageVector {
    UsageVector {
        resource_address: resource.address.clone(),
        service: "VMCompute".to_string(),
        usage_type: "EBS:VolumeUsage.gp3".to_string(),
        operation: None,
        region: region.to_string(),
        unit: "GB-Mo".to_string(),
        quantity: 8.0,
        attributes: Default::default(),
        confidence: Confidence::Medium,
        assumptions: vec!["Assumed 8 GB gp3 root volume (not specified)".to_string()],
    }
}

fn extra_device_vectors(resource: &ExpandedResource, region: &str) -> Vec<UsageVector> {
    let Some(devices) = resource.config.get("ebs_block_device").and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    devices.iter().flat_map(|device| volume_vectors(resource, region, device, false)).collect()
}

/// Storage GB-Mo for one `root_block_device`/`ebs_block_device` entry, plus
/// any provisioned IOPS/throughput vectors above baseline for its type —
/// the same capacity pricing `BlockVolumeMatcher` applies to a standalone
/// `aws_ebs_volume`, reused here since an instance's attached volumes are
/// billed identically.
fn volume_vectors(resource: &ExpandedResource, region: &str, device: &serde_json::Value, is_root: bool) -> Vec<UsageVector> {
    let volume_type = device.get("volume_type").and_then(|v| v.as_str()).unwrap_or("gp3");
    let volume_size = device.get("volume_size").and_then(|v| v.as_f64()).unwrap_or(8.0);
    let label = if is_root { "root" } else { "extra" };

    let mut vectors = vec![UsageVector {
        resource_address: resource.address.clone(),
        service: "VMCompute".to_string(),
        usage_type: format!("EBS:VolumeUsage.{volume_type}"),
        operation: None,
        region: region.to_string(),
        unit: "GB-Mo".to_string(),
        quantity: volume_size,
        attributes: [("volumeType".to_string(), volume_type.to_string()), ("deviceRole".to_string(), label.to_string())].into(),
        confidence: Confidence::High,
        assumptions: Vec::new(),
    }];

    let iops = device.get("iops").and_then(|v| v.as_f64());
    let throughput = device.get("throughput").and_then(|v| v.as_f64());
    vectors.extend(provisioned_capacity_vectors(resource, region, "VMCompute", volume_type, iops, throughput));

    vectors
}

fn data_transfer_out_placeholder(resource: &ExpandedResource, region: &str, service: &str) -> UsageVector {
    UsageVector {
        resource_address: resource.address.clone(),
        service: service.to_string(),
        usage_type: "DataTransfer-Out-Bytes".to_string(),
        operation: None,
        region: region.to_string(),
        unit: "GB".to_string(),
        quantity: 100.0,
        attributes: Default::default(),
        confidence: Confidence::Low,
        assumptions: vec!["Assumed 100 GB/month data transfer out (not specified)".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resource(config: HashMap<String, serde_json::Value>) -> ExpandedResource {
        ExpandedResource {
            address: "aws_instance.web".to_string(),
            resource_type: "aws_instance".to_string(),
            name: "web".to_string(),
            config,
        }
    }

    #[test]
    fn emits_compute_hours_root_volume_and_transfer_placeholder() {
        let mut config = HashMap::new();
        config.insert("instance_type".to_string(), serde_json::json!("t3.micro"));
        let vectors = VmMatcher.match_resource(&resource(config), "us-east-1");

        let compute = vectors.iter().find(|v| v.usage_type == "BoxUsage:t3.micro").unwrap();
        assert_eq!(compute.quantity, 730.0);
        assert_eq!(compute.confidence, Confidence::High);

        let transfer = vectors.iter().find(|v| v.usage_type == "DataTransfer-Out-Bytes").unwrap();
        assert_eq!(transfer.confidence, Confidence::Low);
        assert_eq!(transfer.assumptions[0], "Assumed 100 GB/month data transfer out (not specified)");
    }

    #[test]
    fn missing_instance_type_defaults_and_lowers_confidence() {
        let vectors = VmMatcher.match_resource(&resource(HashMap::new()), "us-east-1");
        let compute = vectors.iter().find(|v| v.usage_type == "BoxUsage:t3.micro").unwrap();
        assert_eq!(compute.confidence, Confidence::Medium);
    }

    #[test]
    fn root_volume_above_baseline_emits_provisioned_capacity_vectors() {
        let mut config = HashMap::new();
        config.insert("instance_type".to_string(), serde_json::json!("t3.micro"));
        config.insert(
            "root_block_device".to_string(),
            serde_json::json!({"volume_type": "gp3", "volume_size": 100, "iops": 4000, "throughput": 200}),
        );
        let vectors = VmMatcher.match_resource(&resource(config), "us-east-1");

        let iops = vectors.iter().find(|v| v.usage_type == "EBS:VolumeP-IOPS.gp3").unwrap();
        assert_eq!(iops.quantity, 1000.0);
        let throughput = vectors.iter().find(|v| v.usage_type == "EBS:VolumeP-Throughput.gp3").unwrap();
        assert_eq!(throughput.quantity, 75.0);
    }

    #[test]
    fn extra_io1_device_always_emits_iops_vector() {
        let mut config = HashMap::new();
        config.insert(
            "ebs_block_device".to_string(),
            serde_json::json!([{"volume_type": "io1", "volume_size": 50, "iops": 500}]),
        );
        let vectors = VmMatcher.match_resource(&resource(config), "us-east-1");
        let iops = vectors.iter().find(|v| v.usage_type == "EBS:VolumeP-IOPS.io1").unwrap();
        assert_eq!(iops.quantity, 500.0);
    }
}
