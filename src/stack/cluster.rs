// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cluster provisioner
//!
//! The managed control plane spans every subnet; the worker node group runs
//! in the private subnets only. Once the control plane's generated name is
//! known, each subnet is tagged so load balancer controllers can discover it.

use serde_json::json;

use crate::config::StackConfig;
use crate::deferred::Deferred;
use crate::domain::invariants::validate_scaling;
use crate::domain::{ResourceKind, ValidationError};
use crate::errors::ProvisioningResult;
use crate::graph::{Inputs, Resource, ResourceGraph};

use super::identity::ClusterRoles;
use super::network::NetworkTopology;

/// Prefix of the per-cluster subnet discovery tag key
pub const CLUSTER_DISCOVERY_PREFIX: &str = "kubernetes.io/cluster/";
/// Value marking a subnet as owned by the cluster
pub const OWNED: &str = "owned";
pub const CAPACITY_TYPE: &str = "ON_DEMAND";
pub const AMI_TYPE: &str = "AL2023_x86_64_STANDARD";

/// Discovery tag key for a cluster
pub fn cluster_discovery_key(cluster_name: &str) -> String {
    format!("{CLUSTER_DISCOVERY_PREFIX}{cluster_name}")
}

/// Control plane, node group, and subnet discovery tags
#[derive(Debug, Clone)]
pub struct ClusterDeployment {
    cluster: Resource,
    node_group: Resource,
    discovery_tags: Vec<Resource>,
}

impl ClusterDeployment {
    /// Declare the cluster over an existing network and role set
    ///
    /// # Errors
    ///
    /// Rejects inconsistent node scaling or an empty instance-type list
    /// before declaring anything.
    pub fn declare(
        graph: &ResourceGraph,
        config: &StackConfig,
        network: &NetworkTopology,
        roles: &ClusterRoles,
    ) -> ProvisioningResult<Self> {
        validate_scaling(config.min_size, config.desired_size, config.max_size)?;
        if config.instance_types.is_empty() {
            return Err(ValidationError::NoInstanceTypes.into());
        }

        let base = config.base_tags();
        let public_access = config.endpoint_public_access;
        let private_access = config.endpoint_private_access;

        let vpc_config = network.all_subnet_ids().resolve(move |subnet_ids| {
            json!({
                "subnet_ids": subnet_ids,
                "endpoint_private_access": private_access,
                "endpoint_public_access": public_access,
            })
        });

        let cluster = graph.declare(
            ResourceKind::Cluster,
            config.project_name.clone(),
            Inputs::new()
                .set("role_arn", roles.cluster_role_arn())
                .set("version", config.cluster_version.as_str())
                .set("vpc_config", vpc_config)
                .tags(&base.named(config.project_name.as_str())),
        )?;

        let node_group = graph.declare(
            ResourceKind::NodeGroup,
            config.resource_name("ng"),
            Inputs::new()
                .set("cluster_name", cluster.physical_name())
                .set("node_role_arn", roles.node_role_arn())
                .set("subnet_ids", network.private_subnet_ids())
                .set(
                    "scaling_config",
                    json!({
                        "desired_size": config.desired_size,
                        "min_size": config.min_size,
                        "max_size": config.max_size,
                    }),
                )
                .set("instance_types", config.instance_types.clone())
                .set("capacity_type", CAPACITY_TYPE)
                .set("ami_type", AMI_TYPE)
                .tags(&base),
        )?;

        let discovery_key = cluster
            .physical_name()
            .resolve(|name| cluster_discovery_key(&name));

        let discovery_tags = network
            .public_subnets()
            .chain(network.private_subnets())
            .enumerate()
            .map(|(i, subnet)| {
                graph.declare(
                    ResourceKind::Tag,
                    config.resource_name(&format!("subnet-cluster-tag-{}", i + 1)),
                    Inputs::new()
                        .set("resource_id", subnet.id())
                        .set("key", &discovery_key)
                        .set("value", OWNED),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            cluster,
            node_group,
            discovery_tags,
        })
    }

    pub fn cluster(&self) -> &Resource {
        &self.cluster
    }

    pub fn node_group(&self) -> &Resource {
        &self.node_group
    }

    /// One tag operation per subnet, public first
    pub fn discovery_tags(&self) -> &[Resource] {
        &self.discovery_tags
    }

    /// Generated cluster name
    pub fn name(&self) -> Deferred<String> {
        self.cluster.physical_name()
    }

    pub fn endpoint(&self) -> Deferred<String> {
        self.cluster.output_string("endpoint")
    }

    /// Base64 certificate authority data
    pub fn certificate_authority(&self) -> Deferred<String> {
        self.cluster.output_string("certificate_authority")
    }

    /// Token issuer URL
    pub fn oidc_issuer(&self) -> Deferred<String> {
        self.cluster.output_string("oidc_issuer")
    }

    pub fn arn(&self) -> Deferred<String> {
        self.cluster.arn()
    }
}
