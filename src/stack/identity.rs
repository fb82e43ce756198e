// Copyright (c) 2025 - Cowboy AI, Inc.
//! Identity fabric
//!
//! Trust roles for the cluster control plane and its worker nodes, and the
//! optional federated identity that lets an in-cluster workload assume a
//! role through the cluster's token issuer.
//!
//! # Federated trust
//!
//! ```text
//! cluster.oidc_issuer ──┬──> OidcProvider ──> provider ARN ──┐
//!                       └────────────────────────────────────┴──> combine2 ──> trust policy JSON ──> Role
//! ```
//!
//! The trust document names the issuer host in its condition keys, so it is
//! assembled inside a continuation of the issuer and provider ARN, never
//! before both exist.

use crate::config::StackConfig;
use crate::deferred::{combine2, Deferred, DeferredError};
use crate::domain::policy::STS_AUDIENCE;
use crate::domain::{PolicyDocument, ResourceKind, ValidationError};
use crate::errors::ProvisioningResult;
use crate::graph::{Input, Inputs, Resource, ResourceGraph};

use super::controller_policy::load_balancer_controller_policy;

/// Service principal of the managed control plane
pub const CLUSTER_SERVICE: &str = "eks.amazonaws.com";
/// Service principal of worker instances
pub const NODE_SERVICE: &str = "ec2.amazonaws.com";

pub const CLUSTER_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AmazonEKSClusterPolicy";
pub const WORKER_NODE_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AmazonEKSWorkerNodePolicy";
pub const CNI_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AmazonEKS_CNI_Policy";
pub const REGISTRY_READ_ONLY_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/AmazonEC2ContainerRegistryReadOnly";

/// Identity string of a namespaced service account
pub fn service_account_subject(namespace: &str, name: &str) -> String {
    format!("system:serviceaccount:{namespace}:{name}")
}

/// Deferred trust policy for a federated workload identity
///
/// Resolves once both the provider ARN and the issuer URL resolve; the
/// document is rendered inside that continuation.
pub fn federated_trust_policy(
    provider_arn: &Deferred<String>,
    issuer_url: &Deferred<String>,
    subject: &str,
) -> Deferred<String> {
    let subject = subject.to_string();
    combine2(provider_arn, issuer_url).try_resolve(move |(arn, issuer)| {
        PolicyDocument::web_identity_trust(&arn, &issuer, &subject)
            .to_json()
            .map_err(DeferredError::from)
    })
}

/// Control-plane and node roles with their managed policy attachments
#[derive(Debug, Clone)]
pub struct ClusterRoles {
    cluster_role: Resource,
    node_role: Resource,
    attachments: Vec<Resource>,
}

impl ClusterRoles {
    pub fn declare(graph: &ResourceGraph, config: &StackConfig) -> ProvisioningResult<Self> {
        let base = config.base_tags();
        let name = |suffix: &str| config.resource_name(suffix);

        let cluster_role = graph.declare(
            ResourceKind::Role,
            name("cluster-role"),
            Inputs::new()
                .set(
                    "assume_role_policy",
                    PolicyDocument::service_trust(CLUSTER_SERVICE).to_json()?,
                )
                .tags(&base.named(name("cluster-role"))),
        )?;

        let node_role = graph.declare(
            ResourceKind::Role,
            name("node-role"),
            Inputs::new()
                .set(
                    "assume_role_policy",
                    PolicyDocument::service_trust(NODE_SERVICE).to_json()?,
                )
                .tags(&base.named(name("node-role"))),
        )?;

        let grants = [
            (&cluster_role, "cluster-policy", CLUSTER_POLICY_ARN),
            (&node_role, "worker-node-policy", WORKER_NODE_POLICY_ARN),
            (&node_role, "cni-policy", CNI_POLICY_ARN),
            (&node_role, "ecr-ro", REGISTRY_READ_ONLY_POLICY_ARN),
        ];
        let attachments = grants
            .into_iter()
            .map(|(role, suffix, policy_arn)| attach(graph, name(suffix), role, policy_arn))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            cluster_role,
            node_role,
            attachments,
        })
    }

    pub fn cluster_role(&self) -> &Resource {
        &self.cluster_role
    }

    pub fn node_role(&self) -> &Resource {
        &self.node_role
    }

    pub fn cluster_role_arn(&self) -> Deferred<String> {
        self.cluster_role.arn()
    }

    pub fn node_role_arn(&self) -> Deferred<String> {
        self.node_role.arn()
    }

    pub fn attachments(&self) -> &[Resource] {
        &self.attachments
    }
}

fn attach(
    graph: &ResourceGraph,
    name: String,
    role: &Resource,
    policy_arn: impl Into<Input>,
) -> Result<Resource, ValidationError> {
    graph.declare(
        ResourceKind::RolePolicyAttachment,
        name,
        Inputs::new()
            .set("role", role.physical_name())
            .set("policy_arn", policy_arn),
    )
}

/// OIDC provider, federated role, and its permission policy
#[derive(Debug, Clone)]
pub struct FederatedIdentity {
    oidc_provider: Resource,
    role: Resource,
    policy: Resource,
    attachment: Resource,
    trust_policy: Deferred<String>,
}

impl FederatedIdentity {
    /// Declare the federated identity for one service account
    ///
    /// # Arguments
    ///
    /// * `issuer_url` - The cluster's token issuer, usually still unresolved
    /// * `subject` - Service-account identity allowed to assume the role
    ///
    /// # Errors
    ///
    /// `MissingThumbprint` when no issuer certificate thumbprint is configured.
    pub fn declare(
        graph: &ResourceGraph,
        config: &StackConfig,
        issuer_url: &Deferred<String>,
        subject: &str,
    ) -> ProvisioningResult<Self> {
        if config.oidc_thumbprints.is_empty() {
            return Err(ValidationError::MissingThumbprint.into());
        }

        let base = config.base_tags();
        let name = |suffix: &str| config.resource_name(suffix);

        let oidc_provider = graph.declare(
            ResourceKind::OidcProvider,
            name("oidc-provider"),
            Inputs::new()
                .set("url", issuer_url)
                .set("client_id_list", vec![STS_AUDIENCE.to_string()])
                .set("thumbprint_list", config.oidc_thumbprints.clone())
                .tags(&base.named(name("oidc-provider"))),
        )?;

        let trust_policy = federated_trust_policy(&oidc_provider.arn(), issuer_url, subject);

        let role = graph.declare(
            ResourceKind::Role,
            name("alb-controller-role"),
            Inputs::new()
                .set("assume_role_policy", &trust_policy)
                .tags(&base.named(name("alb-controller-role"))),
        )?;

        let policy = graph.declare(
            ResourceKind::Policy,
            name("alb-controller-policy"),
            Inputs::new()
                .set(
                    "policy",
                    load_balancer_controller_policy(&config.region).to_json()?,
                )
                .tags(&base.named(name("alb-controller-policy"))),
        )?;

        let attachment = attach(
            graph,
            name("alb-controller-policy-attachment"),
            &role,
            policy.arn(),
        )?;

        Ok(Self {
            oidc_provider,
            role,
            policy,
            attachment,
            trust_policy,
        })
    }

    pub fn oidc_provider(&self) -> &Resource {
        &self.oidc_provider
    }

    pub fn oidc_provider_arn(&self) -> Deferred<String> {
        self.oidc_provider.arn()
    }

    pub fn role(&self) -> &Resource {
        &self.role
    }

    pub fn role_arn(&self) -> Deferred<String> {
        self.role.arn()
    }

    pub fn policy(&self) -> &Resource {
        &self.policy
    }

    pub fn attachment(&self) -> &Resource {
        &self.attachment
    }

    /// Rendered trust policy of the federated role
    pub fn trust_policy(&self) -> &Deferred<String> {
        &self.trust_policy
    }
}
