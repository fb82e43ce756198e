// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-provisioning
//!
//! Deterministic configurations and providers shared by the integration
//! suites. Every scenario uses the same project name and region so logical
//! names can be asserted literally.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;

use cim_provisioning::domain::ResourceKind;
use cim_provisioning::graph::{Outputs, ResolvedInputs};
use cim_provisioning::provider::{
    PackageRequest, ProviderResult, ResourceProvider, SimulatedProvider, ZoneFilter,
};
use cim_provisioning::StackConfig;

pub const PROJECT: &str = "demo";
pub const REGION: &str = "eu-west-2";
/// Root CA thumbprint of the regional token issuer
pub const THUMBPRINT: &str = "06B25927C42A721631C1EFD9431E648FA62E1E39";
pub const MOCK_ISSUER: &str = "https://oidc.eks.eu-west-2.amazonaws.com/id/MOCK0123456789";

/// Two zones, default CIDRs, no controller
pub fn two_zone_config() -> StackConfig {
    StackConfig {
        project_name: PROJECT.to_string(),
        region: REGION.to_string(),
        ..StackConfig::default()
    }
}

/// Two zones with the load balancer controller and its federated identity
pub fn federated_config() -> StackConfig {
    StackConfig {
        enable_load_balancer_controller: true,
        oidc_thumbprints: vec![THUMBPRINT.to_string()],
        ..two_zone_config()
    }
}

/// Config with `n` subnet pairs carved out of 10.0.0.0/16
pub fn config_with_pairs(n: usize) -> StackConfig {
    StackConfig {
        public_subnet_cidrs: (0..n).map(|i| format!("10.0.{}.0/24", i)).collect(),
        private_subnet_cidrs: (0..n).map(|i| format!("10.0.{}.0/24", 100 + i)).collect(),
        ..two_zone_config()
    }
}

/// Zone names `eu-west-2a`, `eu-west-2b`, ...
pub fn zones(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("{REGION}{}", (b'a' + i as u8) as char))
        .collect()
}

pub fn provider() -> SimulatedProvider {
    SimulatedProvider::new(REGION)
}

pub fn name(suffix: &str) -> String {
    format!("{PROJECT}-{suffix}")
}

/// Provider wrapper recording `start:<name>` and `end:<name>` events
pub struct RecordingProvider {
    inner: SimulatedProvider,
    events: Mutex<Vec<String>>,
}

impl RecordingProvider {
    pub fn new(inner: SimulatedProvider) -> Self {
        Self {
            inner,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// Index of an event in the log
    pub fn position(&self, event: &str) -> Option<usize> {
        self.events.lock().iter().position(|e| e == event)
    }

    pub fn inner(&self) -> &SimulatedProvider {
        &self.inner
    }

    fn record(&self, event: String) {
        self.events.lock().push(event);
    }
}

#[async_trait]
impl ResourceProvider for RecordingProvider {
    async fn create(
        &self,
        kind: ResourceKind,
        name: &str,
        inputs: &ResolvedInputs,
    ) -> ProviderResult<Outputs> {
        self.record(format!("start:{name}"));
        let result = self.inner.create(kind, name, inputs).await;
        self.record(format!("end:{name}"));
        result
    }

    async fn list_zones(&self, filter: &ZoneFilter) -> ProviderResult<Vec<String>> {
        self.inner.list_zones(filter).await
    }

    async fn install_package(
        &self,
        name: &str,
        request: &PackageRequest,
    ) -> ProviderResult<Outputs> {
        self.record(format!("start:{name}"));
        let result = self.inner.install_package(name, request).await;
        self.record(format!("end:{name}"));
        result
    }
}
