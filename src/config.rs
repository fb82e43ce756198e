// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack configuration
//!
//! [`StackConfig`] is threaded explicitly through every component. It can be
//! deserialized, built from defaults, or read from `PROVISION_*` environment
//! variables.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `PROVISION_PROJECT_NAME` | `project_name` | `hello-eks` |
//! | `PROVISION_STACK_NAME` | `stack_name` | `dev` |
//! | `PROVISION_REGION` | `region` | `us-west-2` |
//! | `PROVISION_CLUSTER_VERSION` | `cluster_version` | `1.33` |
//! | `PROVISION_VPC_CIDR` | `vpc_cidr` | `10.0.0.0/16` |
//! | `PROVISION_PUBLIC_SUBNET_CIDRS` | `public_subnet_cidrs` | `10.0.1.0/24,10.0.2.0/24` |
//! | `PROVISION_PRIVATE_SUBNET_CIDRS` | `private_subnet_cidrs` | `10.0.3.0/24,10.0.4.0/24` |
//! | `PROVISION_INSTANCE_TYPES` | `instance_types` | `t3.medium` |
//! | `PROVISION_DESIRED_SIZE` / `MIN_SIZE` / `MAX_SIZE` | node scaling | `2` / `2` / `4` |
//! | `PROVISION_ENDPOINT_PUBLIC_ACCESS` / `PRIVATE_ACCESS` | endpoint access | `true` / `true` |
//! | `PROVISION_ENABLE_LOAD_BALANCER_CONTROLLER` | controller extension | `false` |
//! | `PROVISION_OIDC_THUMBPRINTS` | `oidc_thumbprints` | empty |
//! | `PROVISION_MAX_CONCURRENCY` | `max_concurrency` | `10` |

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::invariants::{
    parse_cidr, validate_project_name, validate_scaling, validate_subnet_layout,
    validate_subnet_pairing,
};
use crate::domain::{CidrBlock, TagSet, ValidationError, ValidationResult};
use crate::graph::ExecutorConfig;

const ENV_PREFIX: &str = "PROVISION_";

/// Parameters of one provisioned stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    pub project_name: String,
    pub stack_name: String,
    pub region: String,
    pub cluster_version: String,
    pub vpc_cidr: String,
    pub public_subnet_cidrs: Vec<String>,
    pub private_subnet_cidrs: Vec<String>,
    pub instance_types: Vec<String>,
    pub desired_size: u32,
    pub min_size: u32,
    pub max_size: u32,
    pub endpoint_public_access: bool,
    pub endpoint_private_access: bool,
    pub enable_load_balancer_controller: bool,
    /// Root certificate thumbprints of the cluster's token issuer
    ///
    /// Region-specific and rotated by the issuer, so supplied by the caller.
    pub oidc_thumbprints: Vec<String>,
    pub max_concurrency: usize,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            project_name: "hello-eks".to_string(),
            stack_name: "dev".to_string(),
            region: "us-west-2".to_string(),
            cluster_version: "1.33".to_string(),
            vpc_cidr: "10.0.0.0/16".to_string(),
            public_subnet_cidrs: vec!["10.0.1.0/24".to_string(), "10.0.2.0/24".to_string()],
            private_subnet_cidrs: vec!["10.0.3.0/24".to_string(), "10.0.4.0/24".to_string()],
            instance_types: vec!["t3.medium".to_string()],
            desired_size: 2,
            min_size: 2,
            max_size: 4,
            endpoint_public_access: true,
            endpoint_private_access: true,
            enable_load_balancer_controller: false,
            oidc_thumbprints: Vec::new(),
            max_concurrency: 10,
        }
    }
}

impl StackConfig {
    /// Load configuration from `PROVISION_*` environment variables
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup
    ///
    /// Keys are the environment variable names. Missing keys keep their
    /// defaults; present but unparseable values are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let mut config = Self::default();

        if let Some(v) = get("PROJECT_NAME") {
            config.project_name = v;
        }
        if let Some(v) = get("STACK_NAME") {
            config.stack_name = v;
        }
        if let Some(v) = get("REGION") {
            config.region = v;
        }
        if let Some(v) = get("CLUSTER_VERSION") {
            config.cluster_version = v;
        }
        if let Some(v) = get("VPC_CIDR") {
            config.vpc_cidr = v;
        }
        if let Some(v) = get("PUBLIC_SUBNET_CIDRS") {
            config.public_subnet_cidrs = split_list(&v);
        }
        if let Some(v) = get("PRIVATE_SUBNET_CIDRS") {
            config.private_subnet_cidrs = split_list(&v);
        }
        if let Some(v) = get("INSTANCE_TYPES") {
            config.instance_types = split_list(&v);
        }
        if let Some(v) = get("DESIRED_SIZE") {
            config.desired_size = parse_setting("DESIRED_SIZE", &v)?;
        }
        if let Some(v) = get("MIN_SIZE") {
            config.min_size = parse_setting("MIN_SIZE", &v)?;
        }
        if let Some(v) = get("MAX_SIZE") {
            config.max_size = parse_setting("MAX_SIZE", &v)?;
        }
        if let Some(v) = get("ENDPOINT_PUBLIC_ACCESS") {
            config.endpoint_public_access = parse_setting("ENDPOINT_PUBLIC_ACCESS", &v)?;
        }
        if let Some(v) = get("ENDPOINT_PRIVATE_ACCESS") {
            config.endpoint_private_access = parse_setting("ENDPOINT_PRIVATE_ACCESS", &v)?;
        }
        if let Some(v) = get("ENABLE_LOAD_BALANCER_CONTROLLER") {
            config.enable_load_balancer_controller =
                parse_setting("ENABLE_LOAD_BALANCER_CONTROLLER", &v)?;
        }
        if let Some(v) = get("OIDC_THUMBPRINTS") {
            config.oidc_thumbprints = split_list(&v);
        }
        if let Some(v) = get("MAX_CONCURRENCY") {
            config.max_concurrency = parse_setting("MAX_CONCURRENCY", &v)?;
        }

        Ok(config)
    }

    /// Check every construction-time invariant
    ///
    /// Runs before any resource is declared.
    pub fn validate(&self) -> ValidationResult {
        validate_project_name(&self.project_name)?;
        let layout = self.subnet_layout()?;

        let mut subnets = layout.public.clone();
        subnets.extend(layout.private.iter().cloned());
        validate_subnet_layout(&layout.vpc, &subnets)?;

        if self.instance_types.is_empty() {
            return Err(ValidationError::NoInstanceTypes);
        }
        validate_scaling(self.min_size, self.desired_size, self.max_size)?;

        if self.enable_load_balancer_controller && self.oidc_thumbprints.is_empty() {
            return Err(ValidationError::MissingThumbprint);
        }
        if self.max_concurrency == 0 {
            return Err(ValidationError::InvalidSetting {
                key: "max_concurrency".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Parsed network blocks
    ///
    /// Checks the pairing invariant first, so a mismatch is reported even
    /// when the blocks themselves are malformed.
    pub fn subnet_layout(&self) -> Result<SubnetLayout, ValidationError> {
        validate_subnet_pairing(self.public_subnet_cidrs.len(), self.private_subnet_cidrs.len())?;

        let vpc = parse_cidr("vpc_cidr", &self.vpc_cidr)?;
        let public = self
            .public_subnet_cidrs
            .iter()
            .map(|cidr| parse_cidr("public_subnet_cidrs", cidr))
            .collect::<Result<Vec<_>, _>>()?;
        let private = self
            .private_subnet_cidrs
            .iter()
            .map(|cidr| parse_cidr("private_subnet_cidrs", cidr))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SubnetLayout {
            vpc,
            public,
            private,
        })
    }

    /// Tags shared by every resource
    pub fn base_tags(&self) -> TagSet {
        TagSet::base(&self.project_name, &self.stack_name)
    }

    /// Logical name `<project>-<suffix>`
    pub fn resource_name(&self, suffix: &str) -> String {
        format!("{}-{suffix}", self.project_name)
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig::new(self.max_concurrency)
    }
}

/// Parsed VPC and subnet blocks, paired by index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetLayout {
    pub vpc: CidrBlock,
    pub public: Vec<CidrBlock>,
    pub private: Vec<CidrBlock>,
}

impl SubnetLayout {
    /// Number of public/private pairs
    pub fn pairs(&self) -> usize {
        self.public.len()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_setting<T: FromStr>(key: &str, value: &str) -> Result<T, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidSetting {
            key: format!("{ENV_PREFIX}{key}"),
            value: value.to_string(),
        })
}
