// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deferred Values
//!
//! This module provides the single-assignment future type used to wire a
//! provisioning graph together before any cloud provider has answered.
//!
//! # Core Concepts
//!
//! ## Deferred<T>
//!
//! A value that is either already known (a literal) or will be produced by an
//! upstream resource once its creation call returns. Every `Deferred` carries
//! the set of logical resource names it flows from, which is how the
//! [`ResourceGraph`](crate::graph::ResourceGraph) derives dependency edges.
//!
//! ```text
//! Declaration time:  vpc.id() ──resolve──> subnet.vpc_id      (nothing known)
//! Execution time:    "vpc-0001" ─────────> "vpc-0001"          (continuation runs)
//! ```
//!
//! ## Resolver<T>
//!
//! The write side of a pending `Deferred`. It is consumed on use, so a value
//! can be settled exactly once.
//!
//! # Laws
//!
//! ```text
//! resolve id = id
//! resolve (g . f) = resolve g . resolve f
//! combine [known a, known b] = known [a, b]
//! combine [.., failed e, ..] = failed e
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_provisioning::deferred::{combine2, Deferred};
//!
//! let (resolver, issuer) = Deferred::<String>::pending(["cluster"]);
//! let host = issuer.resolve(|url| url.trim_start_matches("https://").to_string());
//!
//! resolver.resolve("https://oidc.example/id/ABC".to_string());
//! assert_eq!(host.value().await?, "oidc.example/id/ABC");
//! ```

pub mod combinators;
pub mod value;

pub use combinators::{combine, combine2, combine3};
pub use value::{Deferred, DeferredResult, Resolvable, Resolver};

use thiserror::Error;

/// Errors carried by a deferred value that could not be produced
///
/// Deferred results are shared by every consumer, so this type is `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeferredError {
    /// The resource producing this value failed or was skipped
    #[error("Upstream resource '{resource}' failed: {reason}")]
    UpstreamFailed { resource: String, reason: String },

    /// The resolver was dropped without settling the value
    #[error("Deferred value from {origin} was abandoned before resolving")]
    Abandoned { origin: String },

    /// The producing resource did not report the requested attribute
    #[error("Resource '{resource}' has no output attribute '{attribute}'")]
    MissingAttribute { resource: String, attribute: String },

    /// The attribute exists but has an unexpected shape
    #[error("Output attribute '{attribute}' of '{resource}' is not a {expected}")]
    TypeMismatch {
        resource: String,
        attribute: String,
        expected: String,
    },

    /// A fallible transformation rejected the resolved value
    #[error("Transformation failed: {0}")]
    Transform(String),
}

impl DeferredError {
    /// Name of the resource the failure originated from, when known
    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::UpstreamFailed { resource, .. }
            | Self::MissingAttribute { resource, .. }
            | Self::TypeMismatch { resource, .. } => Some(resource),
            Self::Abandoned { .. } | Self::Transform(_) => None,
        }
    }
}

impl From<serde_json::Error> for DeferredError {
    fn from(err: serde_json::Error) -> Self {
        DeferredError::Transform(err.to_string())
    }
}
