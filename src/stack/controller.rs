// Copyright (c) 2025 - Cowboy AI, Inc.
//! Load balancer controller installation
//!
//! Builds the cluster client configuration from the control plane's
//! deferred connection details, binds a service account to the federated
//! role, and installs the controller chart gated on that binding.

use serde_json::json;

use crate::config::StackConfig;
use crate::deferred::{combine2, combine3, Deferred, DeferredError};
use crate::domain::ClientConfig;
use crate::domain::ResourceKind;
use crate::errors::ProvisioningResult;
use crate::graph::{Inputs, Resource, ResourceGraph};

use super::cluster::ClusterDeployment;
use super::identity::{service_account_subject, FederatedIdentity};

pub const CHART_NAME: &str = "aws-load-balancer-controller";
pub const CHART_VERSION: &str = "1.13.4";
pub const CHART_REPOSITORY: &str = "https://aws.github.io/eks-charts";
pub const CONTROLLER_NAMESPACE: &str = "kube-system";
pub const SERVICE_ACCOUNT_NAME: &str = "aws-load-balancer-controller";
/// Annotation binding a service account to a cloud role
pub const ROLE_ARN_ANNOTATION: &str = "eks.amazonaws.com/role-arn";

/// Deferred client configuration for a cluster
pub fn client_config(cluster: &ClusterDeployment, region: &str) -> Deferred<ClientConfig> {
    let region = region.to_string();
    combine3(
        &cluster.endpoint(),
        &cluster.certificate_authority(),
        &cluster.name(),
    )
    .resolve(move |(endpoint, certificate_authority, name)| {
        ClientConfig::for_cluster(&name, &endpoint, &certificate_authority, &region)
    })
}

/// Client configuration rendered as a document
pub fn rendered_client_config(cluster: &ClusterDeployment, region: &str) -> Deferred<String> {
    client_config(cluster, region)
        .try_resolve(|config| config.render().map_err(DeferredError::from))
}

/// Federated identity, service account, and chart release
#[derive(Debug, Clone)]
pub struct ControllerInstallation {
    identity: FederatedIdentity,
    service_account: Resource,
    release: Resource,
    kubeconfig: Deferred<String>,
}

impl ControllerInstallation {
    pub fn declare(
        graph: &ResourceGraph,
        config: &StackConfig,
        cluster: &ClusterDeployment,
        vpc_id: &Deferred<String>,
    ) -> ProvisioningResult<Self> {
        let subject = service_account_subject(CONTROLLER_NAMESPACE, SERVICE_ACCOUNT_NAME);
        let identity = FederatedIdentity::declare(graph, config, &cluster.oidc_issuer(), &subject)?;
        let kubeconfig = rendered_client_config(cluster, &config.region);

        let annotations = identity
            .role_arn()
            .resolve(|arn| json!({ ROLE_ARN_ANNOTATION: arn }));

        let service_account = graph.declare(
            ResourceKind::ServiceAccount,
            config.resource_name("alb-controller-sa"),
            Inputs::new()
                .set("name", SERVICE_ACCOUNT_NAME)
                .set("namespace", CONTROLLER_NAMESPACE)
                .set("annotations", annotations)
                .set("kubeconfig", &kubeconfig),
        )?;

        let region = config.region.clone();
        let values = combine2(&cluster.name(), vpc_id).resolve(move |(cluster_name, vpc_id)| {
            json!({
                "clusterName": cluster_name,
                "serviceAccount": {
                    "create": false,
                    "name": SERVICE_ACCOUNT_NAME,
                },
                "region": region,
                "vpcId": vpc_id,
                "podDisruptionBudget": {
                    "maxUnavailable": 1,
                },
            })
        });

        let release = graph.declare(
            ResourceKind::ChartRelease,
            config.resource_name("alb-controller-chart"),
            Inputs::new()
                .set("chart", CHART_NAME)
                .set("version", CHART_VERSION)
                .set("repository", CHART_REPOSITORY)
                .set("namespace", CONTROLLER_NAMESPACE)
                .set("values", values)
                .set("kubeconfig", &kubeconfig)
                .depends_on(&service_account),
        )?;

        Ok(Self {
            identity,
            service_account,
            release,
            kubeconfig,
        })
    }

    pub fn identity(&self) -> &FederatedIdentity {
        &self.identity
    }

    pub fn service_account(&self) -> &Resource {
        &self.service_account
    }

    pub fn release(&self) -> &Resource {
        &self.release
    }

    /// Rendered client configuration
    pub fn kubeconfig(&self) -> &Deferred<String> {
        &self.kubeconfig
    }
}
