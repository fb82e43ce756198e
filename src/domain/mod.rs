// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning Domain Models
//!
//! Value objects and pure functions shared by every stack component.
//!
//! # Value Objects with Invariants
//!
//! - [`CidrBlock`] - IPv4 network blocks with containment checks
//! - [`TagSet`] - Ordered tags with `Name` always applied last
//! - [`ResourceKind`] - Taxonomy of declarable resources
//!
//! # Documents
//!
//! - [`PolicyDocument`] - Trust and permission policies
//! - [`ClientConfig`] - Cluster client configuration
//!
//! # Invariants
//!
//! [`invariants`] holds every construction-time check as a pure function
//! returning [`ValidationError`].

pub mod invariants;
pub mod kubeconfig;
pub mod network;
pub mod policy;
pub mod resource_kind;
pub mod tags;

pub use invariants::{ValidationError, ValidationResult};
pub use kubeconfig::ClientConfig;
pub use network::{CidrBlock, NetworkError, DEFAULT_ROUTE};
pub use policy::{Condition, Effect, OneOrMany, PolicyDocument, Principal, Statement};
pub use resource_kind::{ResourceCategory, ResourceKind};
pub use tags::{resource_tags, TagSet};
