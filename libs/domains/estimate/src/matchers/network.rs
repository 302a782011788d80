use super::{string_attr_or_default, ResourceMatcher, HOURS_PER_MONTH};
use crate::model::{Confidence, ExpandedResource, UsageVector};

/// Network elements: NAT/VPN gateways, transit gateways, VPC endpoints,
/// and load balancers. Hourly charge for anything that bills by the
/// hour; a `quantity = 0` data-processing placeholder for every
/// chargeable byte path the matcher doesn't yet model; gateway-type
/// endpoints and customer gateways are genuinely free and get a
/// `quantity = 0` "no charge" row instead.
pub struct NetworkMatcher;

impl ResourceMatcher for NetworkMatcher {
    fn service_name(&self) -> &'static str {
        "Network"
    }

    fn supports(&self, resource_type: &str) -> bool {
        matches!(
            resource_type,
            "aws_nat_gateway" | "aws_vpn_gateway" | "aws_customer_gateway" | "aws_ec2_transit_gateway"
                | "aws_vpc_endpoint" | "aws_lb"
        )
    }

    fn match_resource(&self, resource: &ExpandedResource, region: &str) -> Vec<UsageVector> {
        match resource.resource_type.as_str() {
            "aws_vpc_endpoint" => vpc_endpoint_vectors(resource, region),
            "aws_customer_gateway" => vec![no_charge_vector(resource, region, "CustomerGateway-NoCharge")],
            "aws_nat_gateway" => hourly_with_data_processing(resource, region, "NatGateway-Hours", "NatGateway-Bytes"),
            "aws_vpn_gateway" => hourly_with_data_processing(resource, region, "VpnGateway-Hours", "VpnGateway-Bytes"),
            "aws_ec2_transit_gateway" => hourly_with_data_processing(resource, region, "TransitGateway-Hours", "TransitGateway-Bytes"),
            "aws_lb" => hourly_with_data_processing(resource, region, "LoadBalancerUsage", "LCUUsage"),
            _ => Vec::new(),
        }
    }
}

fn hourly_with_data_processing(resource: &ExpandedResource, region: &str, hourly_usage_type: &str, processing_usage_type: &str) -> Vec<UsageVector> {
    vec![
        UsageVector {
            resource_address: resource.address.clone(),
            service: "Network".to_string(),
            usage_type: hourly_usage_type.to_string(),
            operation: None,
            region: region.to_string(),
            unit: "Hrs".to_string(),
            quantity: HOURS_PER_MONTH,
            attributes: Default::default(),
            confidence: Confidence::High,
            assumptions: Vec::new(),
        },
        UsageVector {
            resource_address: resource.address.clone(),
            service: "Network".to_string(),
            usage_type: processing_usage_type.to_string(),
            operation: None,
            region: region.to_string(),
            unit: "GB".to_string(),
            quantity: 0.0,
            attributes: Default::default(),
            confidence: Confidence::Low,
            assumptions: vec!["traffic not yet modeled".to_string()],
        },
    ]
}

fn vpc_endpoint_vectors(resource: &ExpandedResource, region: &str) -> Vec<UsageVector> {
    let mut assumptions = Vec::new();
    let endpoint_type = string_attr_or_default(resource, "vpc_endpoint_type", "Interface", &mut assumptions);

    if endpoint_type.eq_ignore_ascii_case("gateway") {
        return vec![no_charge_vector(resource, region, "VpcEndpoint-Gateway-NoCharge")];
    }

    hourly_with_data_processing(resource, region, "VpcEndpoint-Hours", "VpcEndpoint-Bytes")
}

fn no_charge_vector(resource: &ExpandedResource, region: &str, usage_type: &str) -> UsageVector {
    UsageVector {
        resource_address: resource.address.clone(),
        service: "Network".to_string(),
        usage_type: usage_type.to_string(),
        operation: None,
        region: region.to_string(),
        unit: "Hrs".to_string(),
        quantity: 0.0,
        attributes: Default::default(),
        confidence: Confidence::High,
        assumptions: vec!["no charge".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resource(resource_type: &str, config: HashMap<String, serde_json::Value>) -> ExpandedResource {
        ExpandedResource {
            address: format!("{resource_type}.x"),
            resource_type: resource_type.to_string(),
            name: "x".to_string(),
            config,
        }
    }

    #[test]
    fn nat_gateway_emits_hourly_and_zero_quantity_processing() {
        let vectors = NetworkMatcher.match_resource(&resource("aws_nat_gateway", HashMap::new()), "us-east-1");
        let processing = vectors.iter().find(|v| v.usage_type == "NatGateway-Bytes").unwrap();
        assert_eq!(processing.quantity, 0.0);
    }

    #[test]
    fn customer_gateway_is_no_charge() {
        let vectors = NetworkMatcher.match_resource(&resource("aws_customer_gateway", HashMap::new()), "us-east-1");
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].quantity, 0.0);
        assert_eq!(vectors[0].assumptions[0], "no charge");
    }

    #[test]
    fn gateway_type_vpc_endpoint_is_no_charge() {
        let mut config = HashMap::new();
        config.insert("vpc_endpoint_type".to_string(), serde_json::json!("Gateway"));
        let vectors = NetworkMatcher.match_resource(&resource("aws_vpc_endpoint", config), "us-east-1");
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].quantity, 0.0);
    }

    #[test]
    fn interface_type_vpc_endpoint_bills_hourly() {
        let mut config = HashMap::new();
        config.insert("vpc_endpoint_type".to_string(), serde_json::json!("Interface"));
        let vectors = NetworkMatcher.match_resource(&resource("aws_vpc_endpoint", config), "us-east-1");
        assert!(vectors.iter().any(|v| v.usage_type == "VpcEndpoint-Hours"));
    }
}
