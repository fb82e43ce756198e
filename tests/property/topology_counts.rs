// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Topology Declaration
//!
//! For `N` subnet pairs the network always declares `2N` subnets, `N` NAT
//! gateways with their Elastic IPs, and `N + 1` route tables. Unpaired
//! layouts never declare anything.

use cim_provisioning::domain::ResourceKind;
use cim_provisioning::stack::{ClusterStack, NetworkTopology};
use cim_provisioning::{ResourceGraph, StackConfig};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn config(public: usize, private: usize) -> StackConfig {
    StackConfig {
        project_name: "prop".to_string(),
        region: "us-east-1".to_string(),
        public_subnet_cidrs: (0..public).map(|i| format!("10.0.{i}.0/24")).collect(),
        private_subnet_cidrs: (0..private)
            .map(|i| format!("10.0.{}.0/24", 100 + i))
            .collect(),
        ..StackConfig::default()
    }
}

fn zones(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("us-east-1-zone-{i}")).collect()
}

/// Pair count plus spare zones beyond what the layout needs
fn layout() -> impl Strategy<Value = (usize, usize)> {
    (1usize..=6, 0usize..3)
}

/// Two different list lengths
fn unpaired() -> impl Strategy<Value = (usize, usize)> {
    (0usize..6, 0usize..6).prop_filter("lengths must differ", |(a, b)| a != b)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: Counts scale linearly with the pair count
    #[test]
    fn prop_network_counts_follow_pairs((pairs, spare) in layout()) {
        let graph = ResourceGraph::new();
        let network = NetworkTopology::declare(&graph, &config(pairs, pairs), &zones(pairs + spare))
            .expect("valid layout");

        prop_assert_eq!(graph.count(ResourceKind::Vpc), 1);
        prop_assert_eq!(graph.count(ResourceKind::InternetGateway), 1);
        prop_assert_eq!(graph.count(ResourceKind::Subnet), 2 * pairs);
        prop_assert_eq!(graph.count(ResourceKind::NatGateway), pairs);
        prop_assert_eq!(graph.count(ResourceKind::ElasticIp), pairs);
        prop_assert_eq!(graph.count(ResourceKind::RouteTable), pairs + 1);
        prop_assert_eq!(graph.count(ResourceKind::RouteTableAssociation), 2 * pairs);
        prop_assert_eq!(network.zones().len(), pairs);
    }

    /// Property: Each zone hosts exactly one pair
    #[test]
    fn prop_zones_are_distinct((pairs, spare) in layout()) {
        let graph = ResourceGraph::new();
        let available = zones(pairs + spare);
        let network = NetworkTopology::declare(&graph, &config(pairs, pairs), &available)
            .expect("valid layout");

        let used: Vec<&str> = network.zones().iter().map(|z| z.zone.as_str()).collect();
        let expected: Vec<&str> = available[..pairs].iter().map(String::as_str).collect();
        prop_assert_eq!(used, expected);
    }

    /// Property: Unpaired layouts leave the graph empty
    #[test]
    fn prop_unpaired_layout_declares_nothing((public, private) in unpaired()) {
        let graph = ResourceGraph::new();
        let result = NetworkTopology::declare(&graph, &config(public, private), &zones(8));

        prop_assert!(result.is_err());
        prop_assert!(graph.is_empty());
    }

    /// Property: The whole stack seals into an acyclic plan
    #[test]
    fn prop_stack_always_seals((pairs, spare) in layout()) {
        let graph = ResourceGraph::new();
        ClusterStack::declare_in_zones(&graph, &config(pairs, pairs), &zones(pairs + spare))
            .expect("valid stack");
        let declared = graph.len();

        let sealed = graph.seal().expect("acyclic graph");
        prop_assert_eq!(sealed.sequence().total(), declared);
        prop_assert_eq!(sealed.sequence().wave_of("prop-vpc"), Some(0));
        prop_assert_eq!(graph.count(ResourceKind::Tag), 2 * pairs);
    }
}
