// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning report
//!
//! Every declared resource ends a run in a terminal lifecycle state. The
//! report records that state, the failure that put it there, and the
//! transition history, so a caller can retry just the failed subtree.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::deferred::DeferredError;
use crate::domain::ResourceKind;
use crate::errors::{ProvisioningError, ProvisioningResult};
use crate::provider::ProviderFailure;
use crate::state_machine::{LifecycleCommand, ResourceState, Step};

/// Why a resource did not reach `Succeeded`
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceFailure {
    /// The provider rejected the create call
    Provider(ProviderFailure),

    /// An input's producer failed, so the create call was never issued
    Dependency {
        logical_name: String,
        kind: ResourceKind,
        cause: DeferredError,
    },
}

impl ResourceFailure {
    pub fn logical_name(&self) -> &str {
        match self {
            Self::Provider(failure) => &failure.logical_name,
            Self::Dependency { logical_name, .. } => logical_name,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Provider(failure) => failure.kind,
            Self::Dependency { kind, .. } => *kind,
        }
    }

    /// Whether the provider itself rejected this resource
    pub fn is_root_cause(&self) -> bool {
        matches!(self, Self::Provider(_))
    }
}

impl fmt::Display for ResourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider(failure) => write!(f, "{failure}"),
            Self::Dependency {
                logical_name,
                kind,
                cause,
            } => write!(f, "{kind} '{logical_name}' skipped: {cause}"),
        }
    }
}

impl std::error::Error for ResourceFailure {}

/// One recorded lifecycle step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleStep {
    pub from: ResourceState,
    pub to: ResourceState,
    pub command: String,
    pub at: DateTime<Utc>,
}

impl From<&Step<ResourceState, LifecycleCommand>> for LifecycleStep {
    fn from(step: &Step<ResourceState, LifecycleCommand>) -> Self {
        Self {
            from: step.from,
            to: step.to,
            command: format!("{:?}", step.input),
            at: step.at,
        }
    }
}

/// Final outcome of one resource
#[derive(Debug, Clone, Serialize)]
pub struct ResourceOutcome {
    pub logical_name: String,
    pub kind: ResourceKind,
    pub state: ResourceState,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "failure_text")]
    pub failure: Option<ResourceFailure>,
    pub history: Vec<LifecycleStep>,
    pub completed_at: DateTime<Utc>,
}

fn failure_text<S>(failure: &Option<ResourceFailure>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match failure {
        Some(failure) => serializer.serialize_str(&failure.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Outcome of a full provisioning run
#[derive(Debug, Clone, Serialize)]
pub struct ProvisioningReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: BTreeMap<String, ResourceOutcome>,
    completion_order: Vec<String>,
}

impl ProvisioningReport {
    pub(crate) fn new(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        outcomes: BTreeMap<String, ResourceOutcome>,
        completion_order: Vec<String>,
    ) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            outcomes,
            completion_order,
        }
    }

    /// Terminal state of a resource
    pub fn state_of(&self, name: &str) -> Option<ResourceState> {
        self.outcomes.get(name).map(|o| o.state)
    }

    pub fn outcome(&self, name: &str) -> Option<&ResourceOutcome> {
        self.outcomes.get(name)
    }

    /// Whether every resource succeeded
    pub fn is_success(&self) -> bool {
        self.outcomes
            .values()
            .all(|o| o.state == ResourceState::Succeeded)
    }

    /// Failures, root causes first
    pub fn failures(&self) -> Vec<&ResourceFailure> {
        let mut failures: Vec<&ResourceFailure> =
            self.outcomes.values().filter_map(|o| o.failure.as_ref()).collect();
        failures.sort_by_key(|f| !f.is_root_cause());
        failures
    }

    /// Number of resources in the given state
    pub fn count(&self, state: ResourceState) -> usize {
        self.outcomes.values().filter(|o| o.state == state).count()
    }

    /// Names of the resources in the order they reached a terminal state
    pub fn completion_order(&self) -> &[String] {
        &self.completion_order
    }

    /// Position of a resource in the completion order
    pub fn completed_position(&self, name: &str) -> Option<usize> {
        self.completion_order.iter().position(|n| n == name)
    }

    /// Convert into an error when any resource failed
    ///
    /// A lone failure surfaces as its own taxonomy arm; anything more is
    /// returned as [`ProvisioningError::Aggregate`], root causes first.
    pub fn into_result(self) -> ProvisioningResult<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let mut failures: Vec<ResourceFailure> = self.failures().into_iter().cloned().collect();
        if failures.len() == 1 {
            return Err(match failures.remove(0) {
                ResourceFailure::Provider(failure) => failure.into(),
                ResourceFailure::Dependency { cause, .. } => cause.into(),
            });
        }
        Err(ProvisioningError::Aggregate { failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;

    fn outcome(name: &str, state: ResourceState, failure: Option<ResourceFailure>) -> ResourceOutcome {
        ResourceOutcome {
            logical_name: name.to_string(),
            kind: ResourceKind::Subnet,
            state,
            failure,
            history: Vec::new(),
            completed_at: Utc::now(),
        }
    }

    fn report(outcomes: Vec<ResourceOutcome>) -> ProvisioningReport {
        let order = outcomes.iter().map(|o| o.logical_name.clone()).collect();
        let outcomes = outcomes
            .into_iter()
            .map(|o| (o.logical_name.clone(), o))
            .collect();
        ProvisioningReport::new(Uuid::now_v7(), Utc::now(), outcomes, order)
    }

    #[test]
    fn test_successful_report() {
        let report = report(vec![
            outcome("a", ResourceState::Succeeded, None),
            outcome("b", ResourceState::Succeeded, None),
        ]);

        assert!(report.is_success());
        assert_eq!(report.count(ResourceState::Succeeded), 2);
        assert_eq!(report.completed_position("b"), Some(1));
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_failures_list_root_causes_first() {
        let dependency = ResourceFailure::Dependency {
            logical_name: "a-nat".to_string(),
            kind: ResourceKind::NatGateway,
            cause: DeferredError::UpstreamFailed {
                resource: "z-eip".to_string(),
                reason: "quota".to_string(),
            },
        };
        let provider = ResourceFailure::Provider(ProviderFailure {
            logical_name: "z-eip".to_string(),
            kind: ResourceKind::ElasticIp,
            inputs: Default::default(),
            error: ProviderError::Rejected("quota".to_string()),
        });

        let report = report(vec![
            outcome("a-nat", ResourceState::DependencyFailed, Some(dependency)),
            outcome("z-eip", ResourceState::Failed, Some(provider)),
        ]);

        let failures = report.failures();
        assert_eq!(failures[0].logical_name(), "z-eip");
        assert_eq!(failures[1].logical_name(), "a-nat");

        match report.into_result() {
            Err(ProvisioningError::Aggregate { failures }) => assert_eq!(failures.len(), 2),
            other => panic!("expected aggregate error, got {other:?}"),
        }
    }

    #[test]
    fn test_lone_failures_keep_their_arm() {
        let rejected = report(vec![
            outcome("a", ResourceState::Succeeded, None),
            outcome(
                "b",
                ResourceState::Failed,
                Some(ResourceFailure::Provider(ProviderFailure {
                    logical_name: "b".to_string(),
                    kind: ResourceKind::Subnet,
                    inputs: Default::default(),
                    error: ProviderError::Rejected("quota".to_string()),
                })),
            ),
        ]);
        match rejected.into_result() {
            Err(ProvisioningError::ProviderOperation(failure)) => {
                assert_eq!(failure.logical_name, "b")
            }
            other => panic!("expected provider operation error, got {other:?}"),
        }

        let abandoned = report(vec![outcome(
            "c",
            ResourceState::DependencyFailed,
            Some(ResourceFailure::Dependency {
                logical_name: "c".to_string(),
                kind: ResourceKind::Subnet,
                cause: DeferredError::Abandoned {
                    origin: "an external producer".to_string(),
                },
            }),
        )]);
        assert!(matches!(
            abandoned.into_result(),
            Err(ProvisioningError::DependencyResolution(DeferredError::Abandoned { .. }))
        ));
    }
}
