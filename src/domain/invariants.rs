// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Construction-Time Invariants
//!
//! Every check here runs before a single resource is declared. A failure is
//! always fatal: no partial graph is left behind.
//!
//! # Invariant Categories
//!
//! 1. **Topology Invariants**: subnet pairing, zone coverage, CIDR containment
//! 2. **Graph Invariants**: unique identities, acyclic edges, no dangling references
//! 3. **Capacity Invariants**: node group scaling bounds
//! 4. **Identity Invariants**: federation inputs present when federation is on

use crate::domain::network::{CidrBlock, NetworkError};
use crate::domain::resource_kind::ResourceKind;

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Construction-time validation error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Public and private subnet lists differ in length
    #[error("Public subnet count ({public}) must equal private subnet count ({private})")]
    SubnetCountMismatch { public: usize, private: usize },

    /// No subnet pairs were configured
    #[error("At least one public/private subnet pair is required")]
    NoSubnets,

    /// Fewer availability zones than subnet pairs
    #[error("{required} availability zones required, only {available} available")]
    InsufficientZones { required: usize, available: usize },

    /// A CIDR string could not be parsed
    #[error("Invalid CIDR for {field}: {source}")]
    InvalidCidr {
        field: String,
        #[source]
        source: NetworkError,
    },

    /// A subnet CIDR lies outside the VPC CIDR
    #[error("Subnet {subnet} is outside VPC {vpc}")]
    SubnetOutsideVpc { subnet: String, vpc: String },

    /// Two subnet CIDRs overlap
    #[error("Subnets {first} and {second} overlap")]
    OverlappingSubnets { first: String, second: String },

    /// Same logical name declared with different inputs
    #[error("Resource '{name}' was already declared with different inputs")]
    ConflictingDeclaration { name: String },

    /// Same logical name used for two kinds
    #[error("Resource '{name}' is a {existing}, not a {requested}")]
    KindMismatch {
        name: String,
        existing: ResourceKind,
        requested: ResourceKind,
    },

    /// Declared edges form a cycle
    #[error("Dependency cycle detected: {}", .path.join(" -> "))]
    DependencyCycle { path: Vec<String> },

    /// A forward reference was never declared
    #[error("Resource '{name}' was referenced but never declared")]
    UndeclaredReference { name: String },

    /// Declaration attempted after the graph was sealed
    #[error("Resource graph is sealed; cannot declare '{name}'")]
    GraphSealed { name: String },

    /// Node group bounds are inconsistent
    #[error("Invalid node scaling: min {min}, desired {desired}, max {max}")]
    InvalidScaling { min: u32, desired: u32, max: u32 },

    /// No instance types configured
    #[error("At least one instance type is required")]
    NoInstanceTypes,

    /// Project name missing or not usable as a resource prefix
    #[error("Invalid project name: {0:?}")]
    InvalidProjectName(String),

    /// Federation enabled without an OIDC root certificate thumbprint
    #[error("OIDC provider thumbprint required when federation is enabled")]
    MissingThumbprint,

    /// A configuration value could not be interpreted
    #[error("Invalid value for {key}: {value:?}")]
    InvalidSetting { key: String, value: String },
}

/// Parse a CIDR, attributing failures to a configuration field
pub fn parse_cidr(field: &str, value: &str) -> Result<CidrBlock, ValidationError> {
    CidrBlock::new(value).map_err(|source| ValidationError::InvalidCidr {
        field: field.to_string(),
        source,
    })
}

/// Validate the subnet pairing invariant
///
/// # Rules
/// - `len(public) == len(private)`
/// - at least one pair
pub fn validate_subnet_pairing(public: usize, private: usize) -> ValidationResult {
    if public != private {
        return Err(ValidationError::SubnetCountMismatch { public, private });
    }
    if public == 0 {
        return Err(ValidationError::NoSubnets);
    }
    Ok(())
}

/// Validate that enough zones exist to give every pair its own zone
pub fn validate_zone_coverage(pairs: usize, zones: usize) -> ValidationResult {
    if zones < pairs {
        return Err(ValidationError::InsufficientZones {
            required: pairs,
            available: zones,
        });
    }
    Ok(())
}

/// Validate that every subnet sits inside the VPC and no two subnets overlap
pub fn validate_subnet_layout(vpc: &CidrBlock, subnets: &[CidrBlock]) -> ValidationResult {
    for subnet in subnets {
        if !vpc.contains(subnet) {
            return Err(ValidationError::SubnetOutsideVpc {
                subnet: subnet.to_string(),
                vpc: vpc.to_string(),
            });
        }
    }

    for (i, first) in subnets.iter().enumerate() {
        if let Some(second) = subnets[i + 1..].iter().find(|other| first.overlaps(other)) {
            return Err(ValidationError::OverlappingSubnets {
                first: first.to_string(),
                second: second.to_string(),
            });
        }
    }

    Ok(())
}

/// Validate node group scaling bounds
///
/// # Rules
/// - `1 <= min <= desired <= max`
pub fn validate_scaling(min: u32, desired: u32, max: u32) -> ValidationResult {
    if min == 0 || min > desired || desired > max {
        return Err(ValidationError::InvalidScaling { min, desired, max });
    }
    Ok(())
}

/// Validate the project name used as every logical-name prefix
///
/// Lowercase alphanumerics and dashes, starting with a letter.
pub fn validate_project_name(name: &str) -> ValidationResult {
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.ends_with('-');

    if !valid {
        return Err(ValidationError::InvalidProjectName(name.to_string()));
    }
    Ok(())
}
