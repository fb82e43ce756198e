// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioned Resource Kind Taxonomy
//!
//! Defines the vocabulary of resources a provisioning graph can declare. The
//! provider collaborator dispatches on these kinds; the core only uses them
//! for identity, logging, and reporting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a declared resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    // Network
    /// Virtual private cloud
    Vpc,
    /// Internet gateway attached to a VPC
    InternetGateway,
    /// Route table
    RouteTable,
    /// Subnet to route table association
    RouteTableAssociation,
    /// Subnet in one availability zone
    Subnet,
    /// Static public address
    ElasticIp,
    /// NAT gateway for private egress
    NatGateway,
    /// Tag applied to an existing resource after creation
    Tag,

    // Identity
    /// Assumable role with a trust policy
    Role,
    /// Customer managed permission policy
    Policy,
    /// Role to policy attachment
    RolePolicyAttachment,
    /// OIDC identity provider registration
    OidcProvider,

    // Compute
    /// Managed Kubernetes control plane
    Cluster,
    /// Managed worker node group
    NodeGroup,

    // Registry
    /// Container image repository
    Repository,
    /// Image retention policy
    LifecyclePolicy,

    // In-cluster workload
    /// Namespaced Kubernetes service account
    ServiceAccount,
    /// Installed package chart
    ChartRelease,
}

/// Broad grouping of resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    Network,
    Identity,
    Compute,
    Registry,
    Workload,
}

impl ResourceKind {
    /// All kinds, in taxonomy order
    pub const ALL: [ResourceKind; 18] = [
        Self::Vpc,
        Self::InternetGateway,
        Self::RouteTable,
        Self::RouteTableAssociation,
        Self::Subnet,
        Self::ElasticIp,
        Self::NatGateway,
        Self::Tag,
        Self::Role,
        Self::Policy,
        Self::RolePolicyAttachment,
        Self::OidcProvider,
        Self::Cluster,
        Self::NodeGroup,
        Self::Repository,
        Self::LifecyclePolicy,
        Self::ServiceAccount,
        Self::ChartRelease,
    ];

    /// Get the canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vpc => "vpc",
            Self::InternetGateway => "internet_gateway",
            Self::RouteTable => "route_table",
            Self::RouteTableAssociation => "route_table_association",
            Self::Subnet => "subnet",
            Self::ElasticIp => "elastic_ip",
            Self::NatGateway => "nat_gateway",
            Self::Tag => "tag",
            Self::Role => "role",
            Self::Policy => "policy",
            Self::RolePolicyAttachment => "role_policy_attachment",
            Self::OidcProvider => "oidc_provider",
            Self::Cluster => "cluster",
            Self::NodeGroup => "node_group",
            Self::Repository => "repository",
            Self::LifecyclePolicy => "lifecycle_policy",
            Self::ServiceAccount => "service_account",
            Self::ChartRelease => "chart_release",
        }
    }

    /// Get the category this kind belongs to
    pub fn category(&self) -> ResourceCategory {
        match self {
            Self::Vpc
            | Self::InternetGateway
            | Self::RouteTable
            | Self::RouteTableAssociation
            | Self::Subnet
            | Self::ElasticIp
            | Self::NatGateway
            | Self::Tag => ResourceCategory::Network,
            Self::Role | Self::Policy | Self::RolePolicyAttachment | Self::OidcProvider => {
                ResourceCategory::Identity
            }
            Self::Cluster | Self::NodeGroup => ResourceCategory::Compute,
            Self::Repository | Self::LifecyclePolicy => ResourceCategory::Registry,
            Self::ServiceAccount | Self::ChartRelease => ResourceCategory::Workload,
        }
    }

    /// Whether the provider installs this kind as a package rather than creating it
    pub fn is_package(&self) -> bool {
        matches!(self, Self::ChartRelease)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown resource kind: {s}"))
    }
}
