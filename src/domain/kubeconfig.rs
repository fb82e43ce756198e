// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cluster client configuration document
//!
//! A kubeconfig-shaped record with one cluster, one context, and one user that
//! obtains tokens through an exec credential plugin. It is rendered as JSON,
//! which every kubeconfig consumer also accepts as YAML.

use serde::{Deserialize, Serialize};

/// API version of the exec credential plugin protocol
pub const EXEC_API_VERSION: &str = "client.authentication.k8s.io/v1beta1";

/// Kubeconfig document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub clusters: Vec<NamedCluster>,
    pub contexts: Vec<NamedContext>,
    #[serde(rename = "current-context")]
    pub current_context: String,
    pub users: Vec<NamedUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: ClusterEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEntry {
    pub server: String,
    #[serde(rename = "certificate-authority-data")]
    pub certificate_authority_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub cluster: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    pub user: UserEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub exec: ExecConfig,
}

/// Exec-style credential plugin invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecConfig {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub command: String,
    pub args: Vec<String>,
}

impl ClientConfig {
    /// Build the configuration for one cluster
    ///
    /// # Arguments
    ///
    /// * `cluster_name` - Generated cluster name, also used for context and user
    /// * `endpoint` - API server URL
    /// * `certificate_authority` - Base64 certificate authority data
    /// * `region` - Region passed to the token command
    pub fn for_cluster(
        cluster_name: &str,
        endpoint: &str,
        certificate_authority: &str,
        region: &str,
    ) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "Config".to_string(),
            clusters: vec![NamedCluster {
                name: cluster_name.to_string(),
                cluster: ClusterEntry {
                    server: endpoint.to_string(),
                    certificate_authority_data: certificate_authority.to_string(),
                },
            }],
            contexts: vec![NamedContext {
                name: cluster_name.to_string(),
                context: ContextEntry {
                    cluster: cluster_name.to_string(),
                    user: cluster_name.to_string(),
                },
            }],
            current_context: cluster_name.to_string(),
            users: vec![NamedUser {
                name: cluster_name.to_string(),
                user: UserEntry {
                    exec: ExecConfig {
                        api_version: EXEC_API_VERSION.to_string(),
                        command: "aws".to_string(),
                        args: vec![
                            "eks".to_string(),
                            "get-token".to_string(),
                            "--cluster-name".to_string(),
                            cluster_name.to_string(),
                            "--region".to_string(),
                            region.to_string(),
                        ],
                    },
                },
            }],
        }
    }

    /// Render as a JSON document
    pub fn render(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a rendered document
    pub fn parse(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }

    /// API server of the current context's cluster
    pub fn server(&self) -> Option<&str> {
        let context = self
            .contexts
            .iter()
            .find(|c| c.name == self.current_context)?;
        self.clusters
            .iter()
            .find(|c| c.name == context.context.cluster)
            .map(|c| c.cluster.server.as_str())
    }
}
