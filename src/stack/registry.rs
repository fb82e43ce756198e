// Copyright (c) 2025 - Cowboy AI, Inc.
//! Container registry with an image-retention policy.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::StackConfig;
use crate::deferred::Deferred;
use crate::domain::ResourceKind;
use crate::errors::ProvisioningResult;
use crate::graph::{Inputs, Resource, ResourceGraph};

/// Image retention rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleDocument {
    pub rules: Vec<LifecycleRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleRule {
    pub rule_priority: u32,
    pub description: String,
    pub selection: Selection,
    pub action: RuleAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub tag_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_prefix_list: Option<Vec<String>>,
    pub count_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_unit: Option<String>,
    pub count_number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub kind: String,
}

impl RuleAction {
    pub fn expire() -> Self {
        Self {
            kind: "expire".to_string(),
        }
    }
}

impl LifecycleDocument {
    /// Keep the last `keep` `v`-tagged images; expire untagged images after `untagged_days`
    pub fn retention(keep: u32, untagged_days: u32) -> Self {
        Self {
            rules: vec![
                LifecycleRule {
                    rule_priority: 1,
                    description: format!("Keep last {keep} images"),
                    selection: Selection {
                        tag_status: "tagged".to_string(),
                        tag_prefix_list: Some(vec!["v".to_string()]),
                        count_type: "imageCountMoreThan".to_string(),
                        count_unit: None,
                        count_number: keep,
                    },
                    action: RuleAction::expire(),
                },
                LifecycleRule {
                    rule_priority: 2,
                    description: format!("Delete untagged images older than {untagged_days} day"),
                    selection: Selection {
                        tag_status: "untagged".to_string(),
                        tag_prefix_list: None,
                        count_type: "sinceImagePushed".to_string(),
                        count_unit: Some("days".to_string()),
                        count_number: untagged_days,
                    },
                    action: RuleAction::expire(),
                },
            ],
        }
    }
}

impl Default for LifecycleDocument {
    fn default() -> Self {
        Self::retention(10, 1)
    }
}

/// Repository and its lifecycle policy
#[derive(Debug, Clone)]
pub struct Registry {
    repository: Resource,
    lifecycle_policy: Resource,
}

impl Registry {
    pub fn declare(graph: &ResourceGraph, config: &StackConfig) -> ProvisioningResult<Self> {
        let repository_name = config.resource_name("hello-world");

        let repository = graph.declare(
            ResourceKind::Repository,
            config.resource_name("ecr"),
            Inputs::new()
                .set("name", repository_name.as_str())
                .set("image_tag_mutability", "MUTABLE")
                .set("image_scanning_configuration", json!({ "scan_on_push": true }))
                .set(
                    "encryption_configurations",
                    json!([{ "encryption_type": "AES256" }]),
                )
                .tags(&config.base_tags().named(repository_name.as_str())),
        )?;

        let lifecycle_policy = graph.declare(
            ResourceKind::LifecyclePolicy,
            config.resource_name("ecr-lifecycle-policy"),
            Inputs::new()
                .set("repository", repository.physical_name())
                .set("policy", serde_json::to_string(&LifecycleDocument::default())?),
        )?;

        Ok(Self {
            repository,
            lifecycle_policy,
        })
    }

    pub fn repository(&self) -> &Resource {
        &self.repository
    }

    pub fn lifecycle_policy(&self) -> &Resource {
        &self.lifecycle_policy
    }

    pub fn repository_url(&self) -> Deferred<String> {
        self.repository.output_string("repository_url")
    }
}
