// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning engine for cloud network and cluster topology
//!
//! A stack is declared into a [`ResourceGraph`] before any value exists.
//! Resource outputs are [`Deferred`] values; using one as another resource's
//! input records a dependency edge. Once sealed, the graph is executed against
//! a [`ResourceProvider`], which creates each resource as soon as its inputs
//! resolve.
//!
//! # Modules
//!
//! - [`deferred`] - Single-assignment deferred values and combinators
//! - [`graph`] - Declaration, sealing, and concurrent execution
//! - [`domain`] - CIDR blocks, tags, policy and client-config documents
//! - [`stack`] - Network, identity, cluster, registry, and controller components
//! - [`provider`] - Provider collaborator contract and a simulated provider
//! - [`state_machine`] - Per-resource lifecycle FSM
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_provisioning::{provision, SimulatedProvider, StackConfig};
//!
//! let config = StackConfig::default();
//! let provider = Arc::new(SimulatedProvider::new(&config.region));
//! let run = provision(&config, provider).await?;
//! assert!(run.report.is_success());
//! ```

pub mod config;
pub mod deferred;
pub mod domain;
pub mod errors;
pub mod graph;
pub mod provider;
pub mod stack;
pub mod state_machine;

// Re-export commonly used types
pub use config::StackConfig;
pub use deferred::{combine, combine2, combine3, Deferred, DeferredError, Resolver};
pub use errors::{ProvisioningError, ProvisioningResult};
pub use graph::{
    ExecutorConfig, Inputs, ProvisioningReport, Resource, ResourceGraph, SealedGraph,
};
pub use provider::{ResourceProvider, SimulatedProvider};
pub use stack::{provision, ClusterStack, ProvisioningRun, StackOutputs};
