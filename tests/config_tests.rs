// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack configuration and construction-time validation tests
//!
//! Every rejected configuration must fail before a single resource is
//! declared or a single provider call is issued.

mod fixtures;

use async_trait::async_trait;
use fixtures::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use test_case::test_case;

use cim_provisioning::domain::{ResourceKind, ValidationError};
use cim_provisioning::graph::{Outputs, ResolvedInputs};
use cim_provisioning::provider::{
    PackageRequest, ProviderError, ProviderResult, ResourceProvider, ZoneFilter,
};
use cim_provisioning::stack::ClusterStack;
use cim_provisioning::{provision, ProvisioningError, ResourceGraph, StackConfig};

fn modified(change: fn(&mut StackConfig)) -> StackConfig {
    let mut config = two_zone_config();
    change(&mut config);
    config
}

#[test_case(|c| c.private_subnet_cidrs.clear() => matches Err(ValidationError::SubnetCountMismatch { public: 2, private: 0 }) ; "unpaired subnets")]
#[test_case(|c| { c.public_subnet_cidrs.clear(); c.private_subnet_cidrs.clear(); } => matches Err(ValidationError::NoSubnets) ; "no subnets")]
#[test_case(|c| c.public_subnet_cidrs[0] = "10.1.1.0/24".to_string() => matches Err(ValidationError::SubnetOutsideVpc { .. }) ; "subnet outside vpc")]
#[test_case(|c| c.private_subnet_cidrs[1] = "10.0.1.128/25".to_string() => matches Err(ValidationError::OverlappingSubnets { .. }) ; "overlapping subnets")]
#[test_case(|c| c.vpc_cidr = "10.0.0.0/33".to_string() => matches Err(ValidationError::InvalidCidr { .. }) ; "malformed vpc cidr")]
#[test_case(|c| c.instance_types.clear() => matches Err(ValidationError::NoInstanceTypes) ; "no instance types")]
#[test_case(|c| c.min_size = 0 => matches Err(ValidationError::InvalidScaling { .. }) ; "zero minimum")]
#[test_case(|c| c.desired_size = 5 => matches Err(ValidationError::InvalidScaling { .. }) ; "desired above maximum")]
#[test_case(|c| c.project_name = "Demo".to_string() => matches Err(ValidationError::InvalidProjectName(_)) ; "uppercase project")]
#[test_case(|c| c.project_name = String::new() => matches Err(ValidationError::InvalidProjectName(_)) ; "empty project")]
#[test_case(|c| c.enable_load_balancer_controller = true => matches Err(ValidationError::MissingThumbprint) ; "controller without thumbprint")]
#[test_case(|c| c.max_concurrency = 0 => matches Err(ValidationError::InvalidSetting { .. }) ; "zero concurrency")]
#[test_case(|_| () => matches Ok(()) ; "defaults")]
fn test_validation(change: fn(&mut StackConfig)) -> Result<(), ValidationError> {
    modified(change).validate()
}

#[test]
fn test_invalid_config_declares_nothing() {
    let graph = ResourceGraph::new();
    let config = modified(|c| c.max_size = 1);

    let err = ClusterStack::declare_in_zones(&graph, &config, &zones(2)).unwrap_err();

    assert!(err.is_validation());
    assert!(graph.is_empty());
}

#[tokio::test]
async fn test_invalid_config_issues_no_provider_calls() {
    let provider = Arc::new(provider());
    let config = modified(|c| c.public_subnet_cidrs.push("10.0.5.0/24".to_string()));

    let err = provision(&config, provider.clone()).await.unwrap_err();

    assert!(matches!(
        err,
        ProvisioningError::Validation(ValidationError::SubnetCountMismatch {
            public: 3,
            private: 2
        })
    ));
    assert!(provider.started_order().is_empty());
}

#[tokio::test]
async fn test_region_with_too_few_zones() {
    let provider = Arc::new(provider().with_zones(["eu-west-2a"]));

    let err = provision(&two_zone_config(), provider.clone()).await.unwrap_err();

    assert!(matches!(
        err,
        ProvisioningError::Validation(ValidationError::InsufficientZones {
            required: 2,
            available: 1
        })
    ));
    assert_eq!(provider.created_count(ResourceKind::Vpc), 0);
}

struct ZonelessProvider;

#[async_trait]
impl ResourceProvider for ZonelessProvider {
    async fn create(
        &self,
        _kind: ResourceKind,
        name: &str,
        _inputs: &ResolvedInputs,
    ) -> ProviderResult<Outputs> {
        Err(ProviderError::Rejected(format!("unexpected create of {name}")))
    }

    async fn list_zones(&self, _filter: &ZoneFilter) -> ProviderResult<Vec<String>> {
        Err(ProviderError::Unavailable("region endpoint unreachable".to_string()))
    }

    async fn install_package(
        &self,
        name: &str,
        _request: &PackageRequest,
    ) -> ProviderResult<Outputs> {
        Err(ProviderError::Rejected(format!("unexpected install of {name}")))
    }
}

#[tokio::test]
async fn test_zone_lookup_failure() {
    let err = provision(&two_zone_config(), Arc::new(ZonelessProvider))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ProvisioningError::ZoneLookup(ProviderError::Unavailable(_))
    ));
    assert!(!err.is_validation());
}

#[test]
fn test_partial_document_keeps_defaults() {
    let config: StackConfig = serde_json::from_str(
        r#"{
            "project_name": "orders",
            "region": "ap-south-1",
            "instance_types": ["m5.large"],
            "enable_load_balancer_controller": true,
            "oidc_thumbprints": ["9E99A48A9960B14926BB7F3B02E22DA2B0AB7280"]
        }"#,
    )
    .unwrap();

    assert_eq!(config.project_name, "orders");
    assert_eq!(config.stack_name, "dev");
    assert_eq!(config.cluster_version, "1.33");
    assert_eq!(config.public_subnet_cidrs.len(), 2);
    assert_eq!(config.max_concurrency, 10);
    assert!(config.validate().is_ok());
}

#[test]
fn test_configuration_round_trips_through_json() {
    let config = federated_config();
    let json = serde_json::to_string(&config).unwrap();
    let back: StackConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_lookup_lists_and_flags() {
    let config = StackConfig::from_lookup(|key| match key {
        "PROVISION_PUBLIC_SUBNET_CIDRS" => Some("10.0.10.0/24,10.0.11.0/24,10.0.12.0/24".to_string()),
        "PROVISION_PRIVATE_SUBNET_CIDRS" => Some("10.0.20.0/24, 10.0.21.0/24, 10.0.22.0/24".to_string()),
        "PROVISION_ENABLE_LOAD_BALANCER_CONTROLLER" => Some("true".to_string()),
        "PROVISION_OIDC_THUMBPRINTS" => Some(THUMBPRINT.to_string()),
        _ => None,
    })
    .unwrap();

    assert_eq!(config.subnet_layout().unwrap().pairs(), 3);
    assert!(config.enable_load_balancer_controller);
    assert_eq!(config.oidc_thumbprints, vec![THUMBPRINT.to_string()]);
    assert!(config.validate().is_ok());
}

#[test]
fn test_unparseable_flag_is_rejected() {
    let result = StackConfig::from_lookup(|key| {
        (key == "PROVISION_ENABLE_LOAD_BALANCER_CONTROLLER").then(|| "sometimes".to_string())
    });

    assert_eq!(
        result,
        Err(ValidationError::InvalidSetting {
            key: "PROVISION_ENABLE_LOAD_BALANCER_CONTROLLER".to_string(),
            value: "sometimes".to_string(),
        })
    );
}
