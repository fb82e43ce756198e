// Copyright (c) 2025 - Cowboy AI, Inc.
//! Simulated provider
//!
//! Deterministic in-memory [`ResourceProvider`] used by the dry-run binary
//! and the test suites. Identifiers come from a counter, so two runs with the
//! same declaration order produce the same values. Failures can be injected
//! per logical name, and the provider records creation order and the peak
//! number of calls in flight.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::{PackageRequest, ProviderError, ProviderResult, ResourceProvider, ZoneFilter};
use crate::domain::policy::issuer_host;
use crate::domain::ResourceKind;
use crate::graph::{Outputs, ResolvedInputs};

/// Placeholder account used in generated ARNs
pub const SIMULATED_ACCOUNT: &str = "123456789012";

#[derive(Debug, Default)]
struct Ledger {
    sequence: u64,
    started: Vec<String>,
    completed: Vec<String>,
    in_flight: usize,
    peak_in_flight: usize,
    created: BTreeMap<String, (ResourceKind, ResolvedInputs)>,
    packages: Vec<(String, PackageRequest)>,
}

/// In-memory provider with generated identifiers
#[derive(Debug)]
pub struct SimulatedProvider {
    region: String,
    account: String,
    zones: Vec<String>,
    latency: Option<Duration>,
    failures: BTreeMap<String, String>,
    ledger: Mutex<Ledger>,
}

impl SimulatedProvider {
    /// Provider for a region with three zones `<region>a..c`
    pub fn new(region: impl Into<String>) -> Self {
        let region = region.into();
        let zones = ["a", "b", "c"]
            .iter()
            .map(|suffix| format!("{region}{suffix}"))
            .collect();
        Self {
            region,
            account: SIMULATED_ACCOUNT.to_string(),
            zones,
            latency: None,
            failures: BTreeMap::new(),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    /// Replace the available zones
    pub fn with_zones<I, S>(mut self, zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zones = zones.into_iter().map(Into::into).collect();
        self
    }

    /// Sleep this long inside every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Reject the create call for a logical name
    pub fn fail_resource(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(name.into(), message.into());
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Logical names in the order their calls were issued
    pub fn started_order(&self) -> Vec<String> {
        self.ledger.lock().started.clone()
    }

    /// Logical names in the order their calls returned
    pub fn completed_order(&self) -> Vec<String> {
        self.ledger.lock().completed.clone()
    }

    /// Highest number of calls observed in flight at once
    pub fn peak_in_flight(&self) -> usize {
        self.ledger.lock().peak_in_flight
    }

    /// Inputs a resource was created with
    pub fn created_inputs(&self, name: &str) -> Option<ResolvedInputs> {
        self.ledger
            .lock()
            .created
            .get(name)
            .map(|(_, inputs)| inputs.clone())
    }

    /// Number of successful create calls for a kind
    pub fn created_count(&self, kind: ResourceKind) -> usize {
        self.ledger
            .lock()
            .created
            .values()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    /// Packages installed, in order
    pub fn installed_packages(&self) -> Vec<(String, PackageRequest)> {
        self.ledger.lock().packages.clone()
    }

    fn begin(&self, name: &str) -> u64 {
        let mut ledger = self.ledger.lock();
        ledger.sequence += 1;
        ledger.started.push(name.to_string());
        ledger.in_flight += 1;
        ledger.peak_in_flight = ledger.peak_in_flight.max(ledger.in_flight);
        ledger.sequence
    }

    fn finish(&self, name: &str) {
        let mut ledger = self.ledger.lock();
        ledger.in_flight -= 1;
        ledger.completed.push(name.to_string());
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn rejection(&self, name: &str) -> Option<ProviderError> {
        self.failures
            .get(name)
            .map(|message| ProviderError::Rejected(message.clone()))
    }

    fn outputs_for(
        &self,
        kind: ResourceKind,
        name: &str,
        inputs: &ResolvedInputs,
        sequence: u64,
    ) -> ProviderResult<Outputs> {
        let region = &self.region;
        let account = &self.account;
        let short = short_suffix(sequence);
        let text = |key: &str| inputs.get(key).and_then(Value::as_str).map(str::to_string);

        let outputs = match kind {
            ResourceKind::Vpc => json!({
                "id": format!("vpc-{short}"),
                "arn": format!("arn:aws:ec2:{region}:{account}:vpc/vpc-{short}"),
                "cidr_block": inputs.get("cidr_block").cloned().unwrap_or(Value::Null),
            }),
            ResourceKind::InternetGateway => json!({ "id": format!("igw-{short}") }),
            ResourceKind::RouteTable => json!({ "id": format!("rtb-{short}") }),
            ResourceKind::RouteTableAssociation => json!({ "id": format!("rtbassoc-{short}") }),
            ResourceKind::Subnet => json!({
                "id": format!("subnet-{short}"),
                "arn": format!("arn:aws:ec2:{region}:{account}:subnet/subnet-{short}"),
                "availability_zone": inputs.get("availability_zone").cloned().unwrap_or(Value::Null),
            }),
            ResourceKind::ElasticIp => json!({
                "id": format!("eipalloc-{short}"),
                "public_ip": format!("203.0.113.{}", sequence % 254 + 1),
            }),
            ResourceKind::NatGateway => json!({ "id": format!("nat-{short}") }),
            ResourceKind::Tag => {
                let resource = text("resource_id").unwrap_or_default();
                let key = text("key").unwrap_or_default();
                json!({ "id": format!("{resource},{key}") })
            }
            ResourceKind::Role => {
                let generated = format!("{name}-{short}");
                json!({
                    "id": generated,
                    "name": generated,
                    "arn": format!("arn:aws:iam::{account}:role/{generated}"),
                })
            }
            ResourceKind::Policy => {
                let generated = format!("{name}-{short}");
                json!({
                    "id": generated,
                    "name": generated,
                    "arn": format!("arn:aws:iam::{account}:policy/{generated}"),
                })
            }
            ResourceKind::RolePolicyAttachment => json!({ "id": format!("{name}-{short}") }),
            ResourceKind::OidcProvider => {
                let url = text("url").ok_or_else(|| {
                    ProviderError::InvalidInput("oidc provider requires 'url'".to_string())
                })?;
                json!({
                    "id": format!("oidc-{short}"),
                    "arn": format!("arn:aws:iam::{account}:oidc-provider/{}", issuer_host(&url)),
                    "url": url,
                })
            }
            ResourceKind::Cluster => {
                let generated = format!("{name}-{short}");
                let identity = long_suffix(sequence);
                json!({
                    "id": generated,
                    "name": generated,
                    "arn": format!("arn:aws:eks:{region}:{account}:cluster/{generated}"),
                    "endpoint": format!("https://{identity}.gr7.{region}.eks.amazonaws.com"),
                    "certificate_authority": format!("LS0tLS1CRUdJTi{identity}"),
                    "oidc_issuer": format!("https://oidc.eks.{region}.amazonaws.com/id/{identity}"),
                    "version": inputs.get("version").cloned().unwrap_or(Value::Null),
                })
            }
            ResourceKind::NodeGroup => {
                let cluster = text("cluster_name").unwrap_or_default();
                let generated = format!("{name}-{short}");
                json!({
                    "id": format!("{cluster}:{generated}"),
                    "name": generated,
                    "arn": format!("arn:aws:eks:{region}:{account}:nodegroup/{cluster}/{generated}"),
                    "status": "ACTIVE",
                })
            }
            ResourceKind::Repository => {
                let repository = text("name").unwrap_or_else(|| name.to_string());
                json!({
                    "id": repository,
                    "name": repository,
                    "arn": format!("arn:aws:ecr:{region}:{account}:repository/{repository}"),
                    "repository_url": format!("{account}.dkr.ecr.{region}.amazonaws.com/{repository}"),
                })
            }
            ResourceKind::LifecyclePolicy => json!({
                "id": text("repository").unwrap_or_else(|| name.to_string()),
            }),
            ResourceKind::ServiceAccount => {
                let namespace = text("namespace").unwrap_or_else(|| "default".to_string());
                let account_name = text("name").unwrap_or_else(|| name.to_string());
                json!({
                    "id": format!("{namespace}/{account_name}"),
                    "name": account_name,
                    "namespace": namespace,
                })
            }
            ResourceKind::ChartRelease => {
                return Err(ProviderError::InvalidInput(
                    "chart releases are installed as packages".to_string(),
                ))
            }
        };

        match outputs {
            Value::Object(map) => Ok(map.into_iter().collect()),
            _ => Ok(Outputs::new()),
        }
    }
}

#[async_trait]
impl ResourceProvider for SimulatedProvider {
    async fn create(
        &self,
        kind: ResourceKind,
        name: &str,
        inputs: &ResolvedInputs,
    ) -> ProviderResult<Outputs> {
        let sequence = self.begin(name);
        self.pause().await;

        let result = match self.rejection(name) {
            Some(error) => Err(error),
            None => self.outputs_for(kind, name, inputs, sequence),
        };

        if result.is_ok() {
            self.ledger
                .lock()
                .created
                .insert(name.to_string(), (kind, inputs.clone()));
        }
        self.finish(name);
        debug!(resource = %name, %kind, ok = result.is_ok(), "Simulated create");
        result
    }

    async fn list_zones(&self, filter: &ZoneFilter) -> ProviderResult<Vec<String>> {
        if filter.state != "available" {
            return Ok(Vec::new());
        }
        Ok(self.zones.clone())
    }

    async fn install_package(
        &self,
        name: &str,
        request: &PackageRequest,
    ) -> ProviderResult<Outputs> {
        self.begin(name);
        self.pause().await;

        let result = match self.rejection(name) {
            Some(error) => Err(error),
            None => {
                self.ledger
                    .lock()
                    .packages
                    .push((name.to_string(), request.clone()));
                let mut outputs = Outputs::new();
                outputs.insert("id".to_string(), json!(format!("{}/{name}", request.namespace)));
                outputs.insert("name".to_string(), json!(name));
                outputs.insert("status".to_string(), json!("deployed"));
                outputs.insert("version".to_string(), json!(request.version));
                Ok(outputs)
            }
        };

        self.finish(name);
        debug!(resource = %name, package = %request, ok = result.is_ok(), "Simulated install");
        result
    }
}

fn short_suffix(sequence: u64) -> String {
    format!("{:07x}", sequence.wrapping_mul(2_654_435_761) & 0x0fff_ffff)
}

fn long_suffix(sequence: u64) -> String {
    format!("{:032X}", u128::from(sequence).wrapping_mul(0x9E37_79B9_7F4A_7C15_F39C_C060_5CED_C834))
}
