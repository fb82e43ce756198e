// Copyright (c) 2025 - Cowboy AI, Inc.
//! Policy Documents
//!
//! Typed trust and permission documents. Assembly is a pure function over
//! fully-resolved inputs; callers that depend on provider outputs (an issuer
//! URL, a provider ARN) must call these builders from inside a deferred
//! continuation so no document is ever rendered from partial data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Policy language version
pub const POLICY_VERSION: &str = "2012-10-17";

/// Action for service-principal trust
pub const ASSUME_ROLE: &str = "sts:AssumeRole";
/// Action for federated web-identity trust
pub const ASSUME_ROLE_WITH_WEB_IDENTITY: &str = "sts:AssumeRoleWithWebIdentity";
/// Audience presented by in-cluster workloads
pub const STS_AUDIENCE: &str = "sts.amazonaws.com";

/// Statement effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Who a trust statement applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Principal {
    /// A cloud service, e.g. `eks.amazonaws.com`
    Service(String),
    /// A federated identity provider ARN
    Federated(String),
}

/// A single value or a list, as the policy language allows both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<Vec<&str>> for OneOrMany {
    fn from(values: Vec<&str>) -> Self {
        OneOrMany::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Statement conditions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "StringEquals", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub string_equals: BTreeMap<String, String>,
}

impl Condition {
    /// Single string-equals condition
    pub fn string_equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut string_equals = BTreeMap::new();
        string_equals.insert(key.into(), value.into());
        Self { string_equals }
    }
}

/// One policy statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub effect: Effect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    pub action: OneOrMany,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<OneOrMany>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl Statement {
    /// Allow `action` on `resource`
    pub fn allow(action: impl Into<OneOrMany>, resource: impl Into<OneOrMany>) -> Self {
        Self {
            effect: Effect::Allow,
            principal: None,
            action: action.into(),
            resource: Some(resource.into()),
            condition: None,
        }
    }

    /// Attach a condition
    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// Trust or permission policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

impl PolicyDocument {
    /// Document from statements
    pub fn new(statement: Vec<Statement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement,
        }
    }

    /// Trust policy assumable only by the given service principal
    pub fn service_trust(service: &str) -> Self {
        Self::new(vec![Statement {
            effect: Effect::Allow,
            principal: Some(Principal::Service(service.to_string())),
            action: OneOrMany::from(ASSUME_ROLE),
            resource: None,
            condition: None,
        }])
    }

    /// Trust policy for a workload identity federated through an OIDC provider
    ///
    /// The condition keys are `<issuer host>:sub` and `<issuer host>:aud`,
    /// where the host is the issuer URL without its scheme.
    pub fn web_identity_trust(provider_arn: &str, issuer_url: &str, subject: &str) -> Self {
        let host = issuer_host(issuer_url);
        let mut string_equals = BTreeMap::new();
        string_equals.insert(format!("{host}:sub"), subject.to_string());
        string_equals.insert(format!("{host}:aud"), STS_AUDIENCE.to_string());

        Self::new(vec![Statement {
            effect: Effect::Allow,
            principal: Some(Principal::Federated(provider_arn.to_string())),
            action: OneOrMany::from(ASSUME_ROLE_WITH_WEB_IDENTITY),
            resource: None,
            condition: Some(Condition { string_equals }),
        }])
    }

    /// Serialize to the provider's policy language
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Issuer URL with its scheme stripped
pub fn issuer_host(issuer_url: &str) -> &str {
    issuer_url
        .strip_prefix("https://")
        .or_else(|| issuer_url.strip_prefix("http://"))
        .unwrap_or(issuer_url)
}
