// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address: {0}")]
    InvalidAddress(String),

    #[error("Invalid CIDR notation: {0} (expected a.b.c.d/n)")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    #[error("CIDR {0} has host bits set")]
    HostBitsSet(String),
}

/// IPv4 CIDR block value object
///
/// Invariants:
/// - Valid IPv4 network address
/// - Prefix length 0-32
/// - No host bits set (`10.0.1.0/24`, never `10.0.1.7/24`)
///
/// # Examples
///
/// ```rust
/// use cim_provisioning::domain::CidrBlock;
///
/// let vpc = CidrBlock::new("10.0.0.0/16").unwrap();
/// let subnet = CidrBlock::new("10.0.1.0/24").unwrap();
/// assert!(vpc.contains(&subnet));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CidrBlock {
    network: Ipv4Addr,
    prefix_length: u8,
}

impl CidrBlock {
    /// Parse CIDR notation
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref().trim();

        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let network = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidAddress(addr_str.to_string()))?;
        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        if prefix_length > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        let block = Self {
            network,
            prefix_length,
        };
        if u32::from(network) & !block.mask() != 0 {
            return Err(NetworkError::HostBitsSet(cidr.to_string()));
        }

        Ok(block)
    }

    fn mask(&self) -> u32 {
        match self.prefix_length {
            0 => 0,
            n => u32::MAX << (32 - u32::from(n)),
        }
    }

    /// Network address
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Check whether `other` lies entirely inside this block
    pub fn contains(&self, other: &CidrBlock) -> bool {
        other.prefix_length >= self.prefix_length
            && (u32::from(other.network) & self.mask()) == u32::from(self.network)
    }

    /// Check whether two blocks share any address
    pub fn overlaps(&self, other: &CidrBlock) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// Get as CIDR notation string
    pub fn as_cidr(&self) -> String {
        format!("{}/{}", self.network, self.prefix_length)
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_cidr())
    }
}

impl FromStr for CidrBlock {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CidrBlock {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CidrBlock> for String {
    fn from(block: CidrBlock) -> Self {
        block.as_cidr()
    }
}

/// Destination of every default route
pub const DEFAULT_ROUTE: &str = "0.0.0.0/0";
