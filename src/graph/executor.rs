// Copyright (c) 2025 - Cowboy AI, Inc.
//! Graph Executor
//!
//! Interprets a sealed graph against a [`ResourceProvider`].
//!
//! # Architecture
//!
//! ```text
//! one task per resource
//! ─────────────────────
//! Declared ──> Waiting ──(inputs resolved)──> Creating ──> Succeeded
//!                 │                               │
//!                 └──(upstream failed)──> DependencyFailed
//!                                                 └──> Failed
//! ```
//!
//! Tasks suspend on their own deferred inputs, so a resource starts the
//! moment its producers finish, independent of unrelated branches. A
//! semaphore bounds how many provider calls are in flight; tasks waiting
//! on inputs do not hold a permit.

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::report::{LifecycleStep, ProvisioningReport, ResourceFailure, ResourceOutcome};
use super::{NodeRecord, Outputs};
use crate::deferred::{DeferredError, DeferredResult};
use crate::domain::ResourceKind;
use crate::provider::{PackageRequest, ProviderError, ProviderFailure, ResourceProvider};
use crate::state_machine::{LifecycleCommand, Recorded, ResourceState};

/// Default bound on concurrent provider calls
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Executor settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Maximum provider calls in flight
    pub max_concurrency: usize,
}

impl ExecutorConfig {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

type Lifecycle = Recorded<ResourceState>;

pub(crate) async fn run(
    nodes: Vec<(String, NodeRecord)>,
    provider: Arc<dyn ResourceProvider>,
    config: ExecutorConfig,
) -> ProvisioningReport {
    let run_id = Uuid::now_v7();
    let started_at = Utc::now();
    let semaphore = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
    let completion = Arc::new(Mutex::new(Vec::with_capacity(nodes.len())));

    info!(
        %run_id,
        resources = nodes.len(),
        max_concurrency = config.max_concurrency,
        "Starting provisioning run"
    );

    let kinds: BTreeMap<String, ResourceKind> = nodes
        .iter()
        .map(|(name, node)| (name.clone(), node.kind))
        .collect();

    let mut tasks = JoinSet::new();
    for (name, node) in nodes {
        tasks.spawn(run_node(
            name,
            node,
            Arc::clone(&provider),
            Arc::clone(&semaphore),
            Arc::clone(&completion),
        ));
    }

    let mut outcomes = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => {
                outcomes.insert(outcome.logical_name.clone(), outcome);
            }
            Err(e) => error!(error = %e, "Resource task aborted"),
        }
    }

    // Aborted tasks dropped their resolvers; dependents already saw them as abandoned.
    for (name, kind) in kinds {
        if !outcomes.contains_key(&name) {
            completion.lock().push(name.clone());
            outcomes.insert(name.clone(), aborted_outcome(name, kind));
        }
    }

    let completion_order = std::mem::take(&mut *completion.lock());
    let report = ProvisioningReport::new(run_id, started_at, outcomes, completion_order);

    info!(
        %run_id,
        succeeded = report.count(ResourceState::Succeeded),
        failed = report.count(ResourceState::Failed),
        dependency_failed = report.count(ResourceState::DependencyFailed),
        "Provisioning run finished"
    );

    report
}

async fn run_node(
    name: String,
    node: NodeRecord,
    provider: Arc<dyn ResourceProvider>,
    semaphore: Arc<Semaphore>,
    completion: Arc<Mutex<Vec<String>>>,
) -> ResourceOutcome {
    let NodeRecord {
        kind,
        inputs,
        resolver,
        ..
    } = node;
    let mut lifecycle = Lifecycle::new(ResourceState::Declared);

    advance(&mut lifecycle, &name, LifecycleCommand::AwaitInputs);
    debug!(resource = %name, %kind, "Waiting on inputs");

    let (settlement, failure): (DeferredResult<Arc<Outputs>>, Option<ResourceFailure>) =
        match inputs.resolve_all().await {
            Err(cause) => {
                advance(&mut lifecycle, &name, LifecycleCommand::UpstreamFailed);
                warn!(resource = %name, %kind, cause = %cause, "Skipping resource, an input failed");
                (
                    Err(DeferredError::UpstreamFailed {
                        resource: name.clone(),
                        reason: cause.to_string(),
                    }),
                    Some(ResourceFailure::Dependency {
                        logical_name: name.clone(),
                        kind,
                        cause,
                    }),
                )
            }
            Ok(values) => {
                advance(&mut lifecycle, &name, LifecycleCommand::InputsResolved);

                let result = match semaphore.acquire().await {
                    Ok(_permit) => {
                        info!(resource = %name, %kind, "Creating resource");
                        if kind.is_package() {
                            match PackageRequest::from_inputs(&values) {
                                Ok(request) => provider.install_package(&name, &request).await,
                                Err(e) => Err(e),
                            }
                        } else {
                            provider.create(kind, &name, &values).await
                        }
                    }
                    Err(e) => Err(ProviderError::Unavailable(e.to_string())),
                };

                match result {
                    Ok(outputs) => {
                        advance(&mut lifecycle, &name, LifecycleCommand::CreationSucceeded);
                        info!(resource = %name, %kind, attributes = outputs.len(), "Created resource");
                        (Ok(Arc::new(outputs)), None)
                    }
                    Err(error) => {
                        advance(&mut lifecycle, &name, LifecycleCommand::CreationFailed);
                        error!(resource = %name, %kind, error = %error, "Provider rejected resource");
                        (
                            Err(DeferredError::UpstreamFailed {
                                resource: name.clone(),
                                reason: error.to_string(),
                            }),
                            Some(ResourceFailure::Provider(ProviderFailure {
                                logical_name: name.clone(),
                                kind,
                                inputs: values,
                                error,
                            })),
                        )
                    }
                }
            }
        };

    // Record completion before waking dependents so the order is causal.
    completion.lock().push(name.clone());
    if let Some(resolver) = resolver {
        resolver.settle(settlement);
    }

    ResourceOutcome {
        logical_name: name,
        kind,
        state: lifecycle.state(),
        failure,
        history: lifecycle.steps().iter().map(LifecycleStep::from).collect(),
        completed_at: Utc::now(),
    }
}

fn advance(lifecycle: &mut Lifecycle, name: &str, command: LifecycleCommand) {
    if let Err(e) = lifecycle.apply(command, Utc::now()) {
        warn!(resource = %name, error = %e, "Rejected lifecycle transition");
    }
}

fn aborted_outcome(name: String, kind: ResourceKind) -> ResourceOutcome {
    ResourceOutcome {
        failure: Some(ResourceFailure::Provider(ProviderFailure {
            logical_name: name.clone(),
            kind,
            inputs: Default::default(),
            error: ProviderError::Unavailable("resource task aborted".to_string()),
        })),
        logical_name: name,
        kind,
        state: ResourceState::Failed,
        history: Vec::new(),
        completed_at: Utc::now(),
    }
}
