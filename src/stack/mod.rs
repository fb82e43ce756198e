// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cluster Stack
//!
//! Declares the full topology into one resource graph:
//!
//! ```text
//! NetworkTopology ──┐
//!                   ├──> ClusterDeployment ──> ControllerInstallation (optional)
//! ClusterRoles ─────┘
//! Registry (independent)
//! ```
//!
//! Components only share deferred values; declaration order in this module
//! implies nothing about creation order.

pub mod cluster;
pub mod controller;
pub mod controller_policy;
pub mod identity;
pub mod network;
pub mod registry;

pub use cluster::ClusterDeployment;
pub use controller::ControllerInstallation;
pub use identity::{federated_trust_policy, ClusterRoles, FederatedIdentity};
pub use network::{NetworkTopology, ZoneNetwork};
pub use registry::{LifecycleDocument, Registry};

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::config::StackConfig;
use crate::errors::{ProvisioningError, ProvisioningResult};
use crate::graph::{CreationSequence, ProvisioningReport, ResourceGraph};
use crate::provider::{ResourceProvider, ZoneFilter};

/// Every component of one stack
#[derive(Debug, Clone)]
pub struct ClusterStack {
    region: String,
    network: NetworkTopology,
    roles: ClusterRoles,
    cluster: ClusterDeployment,
    registry: Registry,
    controller: Option<ControllerInstallation>,
}

impl ClusterStack {
    /// Validate `config`, look up zones, and declare every component
    pub async fn declare(
        graph: &ResourceGraph,
        config: &StackConfig,
        provider: &dyn ResourceProvider,
    ) -> ProvisioningResult<Self> {
        config.validate()?;
        let zones = provider
            .list_zones(&ZoneFilter::available())
            .await
            .map_err(ProvisioningError::ZoneLookup)?;
        Self::declare_in_zones(graph, config, &zones)
    }

    /// Declare every component over known zones
    pub fn declare_in_zones(
        graph: &ResourceGraph,
        config: &StackConfig,
        zones: &[String],
    ) -> ProvisioningResult<Self> {
        config.validate()?;

        let network = NetworkTopology::declare(graph, config, zones)?;
        let roles = ClusterRoles::declare(graph, config)?;
        let cluster = ClusterDeployment::declare(graph, config, &network, &roles)?;
        let registry = Registry::declare(graph, config)?;
        let controller = if config.enable_load_balancer_controller {
            Some(ControllerInstallation::declare(
                graph,
                config,
                &cluster,
                &network.vpc_id(),
            )?)
        } else {
            None
        };

        info!(
            project = %config.project_name,
            zones = network.zones().len(),
            resources = graph.len(),
            controller = controller.is_some(),
            "Declared cluster stack"
        );

        Ok(Self {
            region: config.region.clone(),
            network,
            roles,
            cluster,
            registry,
            controller,
        })
    }

    pub fn network(&self) -> &NetworkTopology {
        &self.network
    }

    pub fn roles(&self) -> &ClusterRoles {
        &self.roles
    }

    pub fn cluster(&self) -> &ClusterDeployment {
        &self.cluster
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn controller(&self) -> Option<&ControllerInstallation> {
        self.controller.as_ref()
    }

    /// Wait for the exported results
    ///
    /// Fails with the first unresolved value when the run did not succeed.
    pub async fn outputs(&self) -> ProvisioningResult<StackOutputs> {
        let federation = match &self.controller {
            Some(controller) => Some(FederationOutputs {
                oidc_provider_arn: controller.identity().oidc_provider_arn().value().await?,
                controller_role_arn: controller.identity().role_arn().value().await?,
                kubeconfig: controller.kubeconfig().value().await?,
            }),
            None => None,
        };

        Ok(StackOutputs {
            region: self.region.clone(),
            cluster_name: self.cluster.name().value().await?,
            cluster_endpoint: self.cluster.endpoint().value().await?,
            vpc_id: self.network.vpc_id().value().await?,
            ecr_repository_url: self.registry.repository_url().value().await?,
            public_subnet_ids: self.network.public_subnet_ids().value().await?,
            private_subnet_ids: self.network.private_subnet_ids().value().await?,
            federation,
        })
    }
}

/// Exported results of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackOutputs {
    pub region: String,
    pub cluster_name: String,
    pub cluster_endpoint: String,
    pub vpc_id: String,
    pub ecr_repository_url: String,
    pub public_subnet_ids: Vec<String>,
    pub private_subnet_ids: Vec<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub federation: Option<FederationOutputs>,
}

/// Exported results of the federated identity extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FederationOutputs {
    pub oidc_provider_arn: String,
    pub controller_role_arn: String,
    pub kubeconfig: String,
}

/// A completed provisioning run
#[derive(Debug)]
pub struct ProvisioningRun {
    /// Creation waves computed when the graph was sealed
    pub plan: CreationSequence,
    pub report: ProvisioningReport,
    /// Present when every resource succeeded
    pub outputs: Option<StackOutputs>,
}

/// Declare, seal, and execute a full stack
///
/// Partial failure is not an error here; inspect `report`.
pub async fn provision(
    config: &StackConfig,
    provider: Arc<dyn ResourceProvider>,
) -> ProvisioningResult<ProvisioningRun> {
    let graph = ResourceGraph::new();
    let stack = ClusterStack::declare(&graph, config, provider.as_ref()).await?;
    let sealed = graph.seal()?;
    let plan = sealed.sequence().clone();

    let report = sealed.execute(provider, config.executor_config()).await;
    let outputs = if report.is_success() {
        Some(stack.outputs().await?)
    } else {
        None
    };

    Ok(ProvisioningRun {
        plan,
        report,
        outputs,
    })
}
