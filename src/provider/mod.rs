// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provider Collaborator Contract
//!
//! The provisioning core never calls a cloud endpoint. It emits intents to a
//! [`ResourceProvider`], which performs them and answers with output
//! attributes.
//!
//! # Architecture
//!
//! ```text
//! ResourceGraph ── sealed ──> Executor ── create / install_package ──> ResourceProvider
//!                                ▲                                          │
//!                                └──────── outputs resolve deferreds ◄──────┘
//! ```
//!
//! Retries and backoff belong to provider implementations; the executor
//! issues each intent exactly once.

pub mod simulated;

pub use simulated::SimulatedProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::graph::{Outputs, ResolvedInputs};
use crate::domain::ResourceKind;

/// Result type for provider calls
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors reported by a provider collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider refused the request
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The request was malformed for this kind
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The provider could not be reached or is throttling
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// A rejected create call, with enough context to retry the declaration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Provider failed to create {kind} '{logical_name}': {error}")]
pub struct ProviderFailure {
    /// Logical name of the resource
    pub logical_name: String,
    /// Kind of the resource
    pub kind: ResourceKind,
    /// Inputs as sent to the provider
    pub inputs: ResolvedInputs,
    /// Provider error
    pub error: ProviderError,
}

/// Availability-zone query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneFilter {
    /// Zone state to match
    pub state: String,
}

impl ZoneFilter {
    /// Zones currently accepting resources
    pub fn available() -> Self {
        Self {
            state: "available".to_string(),
        }
    }
}

impl Default for ZoneFilter {
    fn default() -> Self {
        Self::available()
    }
}

/// Package installation intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRequest {
    pub chart: String,
    pub version: String,
    pub repository: String,
    pub namespace: String,
    pub values: Value,
}

impl PackageRequest {
    /// Extract a package request from resolved chart-release inputs
    pub fn from_inputs(inputs: &ResolvedInputs) -> ProviderResult<Self> {
        let text = |key: &str| -> ProviderResult<String> {
            inputs
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ProviderError::InvalidInput(format!("chart release is missing '{key}'")))
        };

        Ok(Self {
            chart: text("chart")?,
            version: text("version")?,
            repository: text("repository")?,
            namespace: text("namespace")?,
            values: inputs.get("values").cloned().unwrap_or(Value::Null),
        })
    }
}

impl fmt::Display for PackageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} from {}", self.chart, self.version, self.repository)
    }
}

/// Cloud provider collaborator
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Create a resource from fully resolved inputs
    ///
    /// # Returns
    /// Output attributes of the created resource
    async fn create(
        &self,
        kind: ResourceKind,
        name: &str,
        inputs: &ResolvedInputs,
    ) -> ProviderResult<Outputs>;

    /// Ordered availability zones matching the filter
    async fn list_zones(&self, filter: &ZoneFilter) -> ProviderResult<Vec<String>>;

    /// Install a package chart
    ///
    /// Ordering against other resources is expressed by the graph, so the
    /// installer only sees the request once its gates have settled.
    async fn install_package(&self, name: &str, request: &PackageRequest)
        -> ProviderResult<Outputs>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_package_request_from_inputs() {
        let mut inputs = ResolvedInputs::new();
        inputs.insert("chart".into(), json!("aws-load-balancer-controller"));
        inputs.insert("version".into(), json!("1.13.4"));
        inputs.insert("repository".into(), json!("https://aws.github.io/eks-charts"));
        inputs.insert("namespace".into(), json!("kube-system"));
        inputs.insert("values".into(), json!({"clusterName": "demo"}));

        let request = PackageRequest::from_inputs(&inputs).unwrap();
        assert_eq!(request.values["clusterName"], json!("demo"));
        assert_eq!(
            request.to_string(),
            "aws-load-balancer-controller@1.13.4 from https://aws.github.io/eks-charts"
        );
    }

    #[test]
    fn test_package_request_missing_field() {
        let inputs = ResolvedInputs::new();
        assert!(matches!(
            PackageRequest::from_inputs(&inputs),
            Err(ProviderError::InvalidInput(_))
        ));
    }
}
