//! Error types for provisioning operations

use thiserror::Error;

use crate::deferred::DeferredError;
use crate::domain::ValidationError;
use crate::graph::ResourceFailure;
use crate::provider::{ProviderError, ProviderFailure};

/// Errors that can occur while declaring or provisioning a stack
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// Configuration rejected before any resource was declared
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A deferred value could not be produced
    #[error("Dependency resolution error: {0}")]
    DependencyResolution(#[from] DeferredError),

    /// The provider rejected a create call
    #[error("Provider operation error: {0}")]
    ProviderOperation(#[from] ProviderFailure),

    /// Availability zones could not be listed
    #[error("Zone lookup error: {0}")]
    ZoneLookup(ProviderError),

    /// One or more resources failed during a run
    #[error("{} resource(s) failed to provision", .failures.len())]
    Aggregate { failures: Vec<ResourceFailure> },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for provisioning operations
pub type ProvisioningResult<T> = Result<T, ProvisioningError>;

impl From<serde_json::Error> for ProvisioningError {
    fn from(err: serde_json::Error) -> Self {
        ProvisioningError::Serialization(err.to_string())
    }
}

impl ProvisioningError {
    /// Whether the failure happened before any provider call
    pub fn is_validation(&self) -> bool {
        matches!(self, ProvisioningError::Validation(_))
    }
}
