// Copyright (c) 2025 - Cowboy AI, Inc.
//! Partial failure of a full stack
//!
//! A failing resource leaves its independent siblings created and is
//! reported, not rolled back.

mod fixtures;

use fixtures::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;

use cim_provisioning::domain::ResourceKind;
use cim_provisioning::state_machine::ResourceState;
use cim_provisioning::{provision, ProvisioningError};

#[tokio::test]
async fn test_node_group_failure_leaves_cluster_and_network() {
    let provider = Arc::new(provider().fail_resource("demo-ng", "insufficient capacity"));
    let run = provision(&two_zone_config(), provider.clone()).await.unwrap();
    let report = run.report;

    assert_eq!(report.state_of("demo"), Some(ResourceState::Succeeded));
    assert_eq!(report.state_of("demo-ng"), Some(ResourceState::Failed));
    assert_eq!(report.state_of("demo-ecr"), Some(ResourceState::Succeeded));
    assert_eq!(report.state_of("demo-ecr-lifecycle-policy"), Some(ResourceState::Succeeded));
    for tag in 1..=4 {
        assert_eq!(
            report.state_of(&format!("demo-subnet-cluster-tag-{tag}")),
            Some(ResourceState::Succeeded)
        );
    }
    for (name, outcome) in &report.outcomes {
        if name != "demo-ng" {
            assert_eq!(outcome.state, ResourceState::Succeeded, "{name}");
        }
    }

    assert!(run.outputs.is_none());
    assert_eq!(provider.created_count(ResourceKind::Cluster), 1);
    assert_eq!(provider.created_count(ResourceKind::NodeGroup), 0);

    assert_eq!(report.failures().len(), 1);
    match report.into_result() {
        Err(ProvisioningError::ProviderOperation(failure)) => {
            assert_eq!(failure.logical_name, "demo-ng");
            assert_eq!(failure.kind, ResourceKind::NodeGroup);
            assert!(failure.inputs.contains_key("cluster_name"));
            assert!(failure.inputs.contains_key("node_role_arn"));
        }
        other => panic!("expected provider operation failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cluster_failure_skips_its_subtree() {
    let provider = Arc::new(provider().fail_resource("demo", "unsupported version"));
    let run = provision(&two_zone_config(), provider.clone()).await.unwrap();
    let report = &run.report;

    assert_eq!(report.state_of("demo"), Some(ResourceState::Failed));
    assert_eq!(report.state_of("demo-ng"), Some(ResourceState::DependencyFailed));
    assert_eq!(
        report.state_of("demo-subnet-cluster-tag-1"),
        Some(ResourceState::DependencyFailed)
    );
    assert_eq!(report.state_of("demo-vpc"), Some(ResourceState::Succeeded));
    assert_eq!(report.state_of("demo-natgw-2"), Some(ResourceState::Succeeded));
    assert_eq!(report.state_of("demo-cluster-role"), Some(ResourceState::Succeeded));
    assert_eq!(report.state_of("demo-ecr"), Some(ResourceState::Succeeded));

    assert_eq!(report.count(ResourceState::Failed), 1);
    assert_eq!(report.count(ResourceState::DependencyFailed), 5);

    let failures = report.failures();
    assert_eq!(failures.len(), 6);
    assert!(failures[0].is_root_cause());
    assert!(failures[1..].iter().all(|f| !f.is_root_cause()));
    assert_eq!(provider.created_count(ResourceKind::Tag), 0);
}

#[tokio::test]
async fn test_every_resource_reaches_a_terminal_state() {
    let provider = Arc::new(provider().fail_resource("demo-vpc", "quota exceeded"));
    let run = provision(&federated_config(), provider).await.unwrap();

    for outcome in run.report.outcomes.values() {
        assert!(outcome.state.is_terminal(), "{} is {}", outcome.logical_name, outcome.state);
    }
    assert_eq!(run.report.completion_order().len(), run.report.outcomes.len());
    assert_eq!(run.report.state_of("demo-ecr"), Some(ResourceState::Succeeded));
    assert_eq!(
        run.report.state_of("demo-alb-controller-chart"),
        Some(ResourceState::DependencyFailed)
    );
}

#[tokio::test]
async fn test_report_serializes_failures_as_text() {
    let provider = Arc::new(provider().fail_resource("demo-ecr", "name taken"));
    let run = provision(&two_zone_config(), provider).await.unwrap();

    let json = serde_json::to_value(&run.report).unwrap();
    let failure = json["outcomes"]["demo-ecr"]["failure"].as_str().unwrap();
    assert!(failure.contains("name taken"));
    assert!(json["outcomes"]["demo-vpc"].get("failure").is_none());
    assert_eq!(
        json["outcomes"]["demo-ecr-lifecycle-policy"]["state"],
        serde_json::json!(ResourceState::DependencyFailed)
    );
}
