use super::vm::VmMatcher;
use super::{f64_attr_or_default, u64_attr_or_default, ResourceMatcher, HOURS_PER_MONTH};
use crate::model::{Confidence, ExpandedResource, UsageVector};

/// Container orchestrators: `aws_eks_cluster` / `aws_ecs_cluster`.
/// Control-plane hours always; node-group compute is delegated to the VM
/// matcher per node; serverless (Fargate) profiles emit vCPU-hours and
/// memory-GB-hours directly.
pub struct ContainerMatcher {
    pub vm_matcher: VmMatcher,
}

impl ResourceMatcher for ContainerMatcher {
    fn service_name(&self) -> &'static str {
        "ContainerOrchestration"
    }

    fn supports(&self, resource_type: &str) -> bool {
        matches!(resource_type, "aws_eks_cluster" | "aws_ecs_cluster")
    }

    fn match_resource(&self, resource: &ExpandedResource, region: &str) -> Vec<UsageVector> {
        let mut vectors = vec![UsageVector {
            resource_address: resource.address.clone(),
            service: self.service_name().to_string(),
            usage_type: "AmazonEKS-Hours:perCluster".to_string(),
            operation: None,
            region: region.to_string(),
            unit: "Hrs".to_string(),
            quantity: HOURS_PER_MONTH,
            attributes: Default::default(),
            confidence: Confidence::High,
            assumptions: Vec::new(),
        }];

        if let Some(node_group) = resource.config.get("node_group") {
            let synthetic = ExpandedResource {
                address: format!("{}.node_group", resource.address),
                resource_type: "aws_instance".to_string(),
                name: format!("{}-node-group", resource.name),
                config: node_group.as_object().map(|m| m.clone().into_iter().collect()).unwrap_or_default(),
            };
            let desired_size = u64_attr_or_default(&synthetic, "desired_size", 1, &mut Vec::new());
            for i in 0..desired_size {
                let mut node_vectors = self.vm_matcher.match_resource(&synthetic, region);
                for vector in &mut node_vectors {
                    vector.resource_address = format!("{}[{}]", synthetic.address, i);
                }
                vectors.extend(node_vectors);
            }
        }

        if let Some(fargate) = resource.config.get("fargate_profile") {
            let synthetic = ExpandedResource {
                address: resource.address.clone(),
                resource_type: resource.resource_type.clone(),
                name: resource.name.clone(),
                config: fargate.as_object().map(|m| m.clone().into_iter().collect()).unwrap_or_default(),
            };
            let mut assumptions = Vec::new();
            let vcpu = f64_attr_or_default(&synthetic, "vcpu", 0.25, &mut assumptions);
            let memory_gb = f64_attr_or_default(&synthetic, "memory_gb", 0.5, &mut assumptions);
            let pod_count = u64_attr_or_default(&synthetic, "pod_count", 1, &mut assumptions);

            vectors.push(UsageVector {
                resource_address: resource.address.clone(),
                service: self.service_name().to_string(),
                usage_type: "Fargate-vCPU-Hours:perCPU".to_string(),
                operation: None,
                region: region.to_string(),
                unit: "vCPU-Hrs".to_string(),
                quantity: vcpu * pod_count as f64 * HOURS_PER_MONTH,
                attributes: Default::default(),
                confidence: if assumptions.is_empty() { Confidence::Medium } else { Confidence::Low },
                assumptions: assumptions.clone(),
            });
            vectors.push(UsageVector {
                resource_address: resource.address.clone(),
                service: self.service_name().to_string(),
                usage_type: "Fargate-GB-Hours".to_string(),
                operation: None,
                region: region.to_string(),
                unit: "GB-Hrs".to_string(),
                quantity: memory_gb * pod_count as f64 * HOURS_PER_MONTH,
                attributes: Default::default(),
                confidence: if assumptions.is_empty() { Confidence::Medium } else { Confidence::Low },
                assumptions,
            });
        }

        vectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn control_plane_hours_always_present() {
        let resource = ExpandedResource {
            address: "aws_eks_cluster.main".to_string(),
            resource_type: "aws_eks_cluster".to_string(),
            name: "main".to_string(),
            config: HashMap::new(),
        };
        let matcher = ContainerMatcher { vm_matcher: VmMatcher };
        let vectors = matcher.match_resource(&resource, "us-east-1");
        assert!(vectors.iter().any(|v| v.usage_type == "AmazonEKS-Hours:perCluster"));
    }

    #[test]
    fn node_group_delegates_to_vm_matcher_per_node() {
        let mut config = HashMap::new();
        config.insert("node_group".to_string(), json!({"instance_type": "m5.large", "desired_size": 2}));
        let resource = ExpandedResource {
            address: "aws_eks_cluster.main".to_string(),
            resource_type: "aws_eks_cluster".to_string(),
            name: "main".to_string(),
            config,
        };
        let matcher = ContainerMatcher { vm_matcher: VmMatcher };
        let vectors = matcher.match_resource(&resource, "us-east-1");
        let compute: Vec<_> = vectors.iter().filter(|v| v.usage_type == "BoxUsage:m5.large").collect();
        assert_eq!(compute.len(), 2);
    }

    #[test]
    fn fargate_profile_emits_vcpu_and_memory_vectors() {
        let mut config = HashMap::new();
        config.insert("fargate_profile".to_string(), json!({"vcpu": 0.5, "memory_gb": 1.0, "pod_count": 4}));
        let resource = ExpandedResource {
            address: "aws_ecs_cluster.workers".to_string(),
            resource_type: "aws_ecs_cluster".to_string(),
            name: "workers".to_string(),
            config,
        };
        let matcher = ContainerMatcher { vm_matcher: VmMatcher };
        let vectors = matcher.match_resource(&resource, "us-east-1");
        assert!(vectors.iter().any(|v| v.usage_type == "Fargate-vCPU-Hours:perCPU"));
        assert!(vectors.iter().any(|v| v.usage_type == "Fargate-GB-Hours"));
    }
}
