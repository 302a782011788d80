use super::{f64_attr_or_default, string_attr_or_default, ResourceMatcher};
use crate::model::{Confidence, ExpandedResource, UsageVector};

pub(crate) const GP3_BASELINE_IOPS: f64 = 3000.0;
pub(crate) const GP3_BASELINE_THROUGHPUT: f64 = 125.0;

/// Standalone block volumes: `aws_ebs_volume`. Storage GB-Mo always;
/// provisioned-IOPS-Mo for `io1`/`io2`/provisioned `gp3`; throughput-Mo
/// for `gp3` above its free baseline.
pub struct BlockVolumeMatcher;

impl ResourceMatcher for BlockVolumeMatcher {
    fn service_name(&self) -> &'static str {
        "BlockStorage"
    }

    fn supports(&self, resource_type: &str) -> bool {
        resource_type == "aws_ebs_volume"
    }

    fn match_resource(&self, resource: &ExpandedResource, region: &str) -> Vec<UsageVector> {
        let mut assumptions = Vec::new();
        let volume_type = string_attr_or_default(resource, "type", "gp3", &mut assumptions);
        let size = f64_attr_or_default(resource, "size", 100.0, &mut assumptions);

        let mut vectors = vec![UsageVector {
            resource_address: resource.address.clone(),
            service: self.service_name().to_string(),
            usage_type: format!("EBS:VolumeUsage.{volume_type}"),
            operation: None,
            region: region.to_string(),
            unit: "GB-Mo".to_string(),
            quantity: size,
            attributes: [("volumeType".to_string(), volume_type.clone())].into(),
            confidence: if assumptions.is_empty() { Confidence::High } else { Confidence::Medium },
            assumptions: assumptions.clone(),
        }];

        let iops_attr = resource.config.get("iops").and_then(|v| v.as_f64());
        let throughput_attr = resource.config.get("throughput").and_then(|v| v.as_f64());
        vectors.extend(provisioned_capacity_vectors(
            resource,
            region,
            self.service_name(),
            &volume_type,
            iops_attr,
            throughput_attr,
        ));

        vectors
    }
}

/// IOPS-Mo/MiBps-Mo vectors for a volume attached to any resource kind:
/// always for `io1`/`io2` (defaulting to 100 IOPS unspecified), above the
/// gp3 free baseline otherwise. Shared by `BlockVolumeMatcher` for
/// standalone `aws_ebs_volume`s and by `VmMatcher` for an instance's
/// `root_block_device`/`ebs_block_device` entries, so provisioned capacity
/// is priced the same way regardless of which resource block declared it.
pub fn provisioned_capacity_vectors(
    resource: &ExpandedResource,
    region: &str,
    service: &str,
    volume_type: &str,
    iops: Option<f64>,
    throughput: Option<f64>,
) -> Vec<UsageVector> {
    let mut vectors = Vec::new();

    match volume_type {
        "io1" | "io2" => {
            vectors.push(UsageVector {
                resource_address: resource.address.clone(),
                service: service.to_string(),
                usage_type: format!("EBS:VolumeP-IOPS.{volume_type}"),
                operation: None,
                region: region.to_string(),
                unit: "IOPS-Mo".to_string(),
                quantity: iops.unwrap_or(100.0),
                attributes: Default::default(),
                confidence: Confidence::High,
                assumptions: Vec::new(),
            });
        }
        "gp3" => {
            let iops = iops.unwrap_or(GP3_BASELINE_IOPS);
            if iops > GP3_BASELINE_IOPS {
                vectors.push(UsageVector {
                    resource_address: resource.address.clone(),
                    service: service.to_string(),
                    usage_type: "EBS:VolumeP-IOPS.gp3".to_string(),
                    operation: None,
                    region: region.to_string(),
                    unit: "IOPS-Mo".to_string(),
                    quantity: iops - GP3_BASELINE_IOPS,
                    attributes: Default::default(),
                    confidence: Confidence::High,
                    assumptions: Vec::new(),
                });
            }
            let throughput = throughput.unwrap_or(GP3_BASELINE_THROUGHPUT);
            if throughput > GP3_BASELINE_THROUGHPUT {
                vectors.push(UsageVector {
                    resource_address: resource.address.clone(),
                    service: service.to_string(),
                    usage_type: "EBS:VolumeP-Throughput.gp3".to_string(),
                    operation: None,
                    region: region.to_string(),
                    unit: "MiBps-Mo".to_string(),
                    quantity: throughput - GP3_BASELINE_THROUGHPUT,
                    attributes: Default::default(),
                    confidence: Confidence::High,
                    assumptions: Vec::new(),
                });
            }
        }
        _ => {}
    }

    vectors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn gp3_above_baseline_iops_emits_extra_vector() {
        let mut config = HashMap::new();
        config.insert("type".to_string(), serde_json::json!("gp3"));
        config.insert("size".to_string(), serde_json::json!(200));
        config.insert("iops".to_string(), serde_json::json!(4000));
        let resource = ExpandedResource {
            address: "aws_ebs_volume.data".to_string(),
            resource_type: "aws_ebs_volume".to_string(),
            name: "data".to_string(),
            config,
        };
        let vectors = BlockVolumeMatcher.match_resource(&resource, "us-east-1");
        let iops = vectors.iter().find(|v| v.usage_type == "EBS:VolumeP-IOPS.gp3").unwrap();
        assert_eq!(iops.quantity, 1000.0);
    }

    #[test]
    fn io1_always_emits_iops_vector() {
        let mut config = HashMap::new();
        config.insert("type".to_string(), serde_json::json!("io1"));
        config.insert("size".to_string(), serde_json::json!(50));
        config.insert("iops".to_string(), serde_json::json!(500));
        let resource = ExpandedResource {
            address: "aws_ebs_volume.data".to_string(),
            resource_type: "aws_ebs_volume".to_string(),
            name: "data".to_string(),
            config,
        };
        let vectors = BlockVolumeMatcher.match_resource(&resource, "us-east-1");
        assert!(vectors.iter().any(|v| v.usage_type == "EBS:VolumeP-IOPS.io1"));
    }
}
