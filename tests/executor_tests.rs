// Copyright (c) 2025 - Cowboy AI, Inc.
//! Graph executor tests
//!
//! Ordering, failure propagation, and concurrency bounds of a run against
//! the simulated provider.

mod fixtures;

use fixtures::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use cim_provisioning::domain::ResourceKind;
use cim_provisioning::graph::ResourceFailure;
use cim_provisioning::state_machine::ResourceState;
use cim_provisioning::{
    Deferred, DeferredError, ExecutorConfig, Inputs, ProvisioningError, ResourceGraph,
};

/// vpc -> subnet -> nat, plus an unrelated repository
fn chain(graph: &ResourceGraph) {
    let vpc = graph
        .declare(
            ResourceKind::Vpc,
            "vpc",
            Inputs::new().set("cidr_block", "10.0.0.0/16"),
        )
        .unwrap();
    let subnet = graph
        .declare(
            ResourceKind::Subnet,
            "subnet",
            Inputs::new()
                .set("vpc_id", vpc.id())
                .set("cidr_block", "10.0.1.0/24"),
        )
        .unwrap();
    graph
        .declare(
            ResourceKind::NatGateway,
            "nat",
            Inputs::new().set("subnet_id", subnet.id()),
        )
        .unwrap();
    graph
        .declare(
            ResourceKind::Repository,
            "repo",
            Inputs::new().set("name", "images"),
        )
        .unwrap();
}

#[tokio::test]
async fn test_producer_completes_before_consumer_starts() {
    let graph = ResourceGraph::new();
    chain(&graph);
    let provider = Arc::new(RecordingProvider::new(
        provider().with_latency(Duration::from_millis(5)),
    ));

    let report = graph
        .seal()
        .unwrap()
        .execute(provider.clone(), ExecutorConfig::default())
        .await;

    assert!(report.is_success());
    let end_vpc = provider.position("end:vpc").unwrap();
    let start_subnet = provider.position("start:subnet").unwrap();
    let end_subnet = provider.position("end:subnet").unwrap();
    let start_nat = provider.position("start:nat").unwrap();
    assert!(end_vpc < start_subnet, "events: {:?}", provider.events());
    assert!(end_subnet < start_nat, "events: {:?}", provider.events());

    assert!(report.completed_position("vpc") < report.completed_position("subnet"));
    assert!(report.completed_position("subnet") < report.completed_position("nat"));
}

#[tokio::test]
async fn test_consumers_receive_resolved_values() {
    let graph = ResourceGraph::new();
    chain(&graph);
    let provider = Arc::new(provider());

    let report = graph
        .seal()
        .unwrap()
        .execute(provider.clone(), ExecutorConfig::default())
        .await;
    assert!(report.is_success());

    let subnet_inputs = provider.created_inputs("subnet").unwrap();
    let vpc_id = subnet_inputs["vpc_id"].as_str().unwrap();
    assert!(vpc_id.starts_with("vpc-"));
    assert_eq!(subnet_inputs["cidr_block"], json!("10.0.1.0/24"));

    let nat_inputs = provider.created_inputs("nat").unwrap();
    assert!(nat_inputs["subnet_id"].as_str().unwrap().starts_with("subnet-"));
}

#[tokio::test]
async fn test_failure_only_affects_dependents() {
    let graph = ResourceGraph::new();
    chain(&graph);
    let provider = Arc::new(provider().fail_resource("subnet", "address space exhausted"));

    let report = graph
        .seal()
        .unwrap()
        .execute(provider.clone(), ExecutorConfig::default())
        .await;

    assert_eq!(report.state_of("vpc"), Some(ResourceState::Succeeded));
    assert_eq!(report.state_of("repo"), Some(ResourceState::Succeeded));
    assert_eq!(report.state_of("subnet"), Some(ResourceState::Failed));
    assert_eq!(report.state_of("nat"), Some(ResourceState::DependencyFailed));
    assert_eq!(provider.created_count(ResourceKind::NatGateway), 0);

    let failures = report.failures();
    assert_eq!(failures.len(), 2);
    assert!(failures[0].is_root_cause());
    assert_eq!(failures[0].logical_name(), "subnet");
    assert_eq!(failures[1].logical_name(), "nat");

    match failures[0] {
        ResourceFailure::Provider(failure) => {
            assert_eq!(failure.kind, ResourceKind::Subnet);
            assert!(failure.inputs["vpc_id"].as_str().unwrap().starts_with("vpc-"));
            assert!(failure.error.to_string().contains("address space exhausted"));
        }
        other => panic!("expected provider failure, got {other:?}"),
    }
    match failures[1] {
        ResourceFailure::Dependency { cause, .. } => {
            assert_eq!(cause.resource(), Some("subnet"));
        }
        other => panic!("expected dependency failure, got {other:?}"),
    }

    let nat = report.outcome("nat").unwrap();
    let states: Vec<ResourceState> = nat.history.iter().map(|step| step.to).collect();
    assert_eq!(
        states,
        vec![ResourceState::Waiting, ResourceState::DependencyFailed]
    );
}

#[tokio::test]
async fn test_partial_failure_surfaces_as_aggregate() {
    let graph = ResourceGraph::new();
    chain(&graph);
    let provider = Arc::new(provider().fail_resource("vpc", "quota exceeded"));

    let report = graph
        .seal()
        .unwrap()
        .execute(provider, ExecutorConfig::default())
        .await;

    assert_eq!(report.count(ResourceState::Succeeded), 1);
    assert_eq!(report.count(ResourceState::DependencyFailed), 2);

    match report.into_result() {
        Err(ProvisioningError::Aggregate { failures }) => {
            assert_eq!(failures.len(), 3);
            assert_eq!(failures[0].logical_name(), "vpc");
        }
        other => panic!("expected aggregate failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let graph = ResourceGraph::new();
    for i in 0..8 {
        graph
            .declare(
                ResourceKind::Repository,
                format!("repo-{i}"),
                Inputs::new().set("name", format!("images-{i}")),
            )
            .unwrap();
    }
    let provider = Arc::new(provider().with_latency(Duration::from_millis(20)));

    let report = graph
        .seal()
        .unwrap()
        .execute(provider.clone(), ExecutorConfig::new(2))
        .await;

    assert!(report.is_success());
    assert_eq!(provider.created_count(ResourceKind::Repository), 8);
    assert!(provider.peak_in_flight() <= 2);
    assert!(provider.peak_in_flight() >= 1);
}

#[test]
fn test_zero_concurrency_is_clamped() {
    assert_eq!(ExecutorConfig::new(0).max_concurrency, 1);
    assert_eq!(ExecutorConfig::default().max_concurrency, 10);
}

#[tokio::test]
async fn test_external_value_gates_creation() {
    let graph = ResourceGraph::new();
    let (resolver, approval) = Deferred::<String>::pending(["change-ticket"]);
    graph
        .declare(
            ResourceKind::Repository,
            "repo",
            Inputs::new().set("name", &approval),
        )
        .unwrap();
    let provider = Arc::new(provider());

    let run = tokio::spawn(
        graph
            .seal()
            .unwrap()
            .execute(provider.clone(), ExecutorConfig::default()),
    );

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(provider.created_count(ResourceKind::Repository), 0);

    resolver.resolve("approved-images".to_string());
    let report = run.await.unwrap();

    assert!(report.is_success());
    assert_eq!(
        provider.created_inputs("repo").unwrap()["name"],
        json!("approved-images")
    );
}

#[tokio::test]
async fn test_abandoned_external_value_fails_dependents() {
    let graph = ResourceGraph::new();
    let (resolver, approval) = Deferred::<String>::pending(["change-ticket"]);
    graph
        .declare(
            ResourceKind::Repository,
            "repo",
            Inputs::new().set("name", &approval),
        )
        .unwrap();
    drop(resolver);

    let report = graph
        .seal()
        .unwrap()
        .execute(Arc::new(provider()), ExecutorConfig::default())
        .await;

    assert_eq!(report.state_of("repo"), Some(ResourceState::DependencyFailed));
    match report.failures()[0] {
        ResourceFailure::Dependency { cause, .. } => {
            assert!(matches!(cause, DeferredError::Abandoned { .. }));
        }
        other => panic!("expected dependency failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_handles_observe_outputs_after_run() {
    let graph = ResourceGraph::new();
    let vpc = graph
        .declare(
            ResourceKind::Vpc,
            "vpc",
            Inputs::new().set("cidr_block", "10.0.0.0/16"),
        )
        .unwrap();
    assert!(vpc.id().peek().is_none());

    graph
        .seal()
        .unwrap()
        .execute(Arc::new(provider()), ExecutorConfig::default())
        .await;

    let id = vpc.id().value().await.unwrap();
    assert!(id.starts_with("vpc-"));
    assert_eq!(vpc.output_string("cidr_block").value().await.unwrap(), "10.0.0.0/16");
}
