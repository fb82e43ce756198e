// Copyright (c) 2025 - Cowboy AI, Inc.
//! Ordered tag sets
//!
//! Base tags (project, stack) are shared by every resource; each resource adds
//! its own overrides and finally its `Name`. Later writes win on collision,
//! and `Name` is always written last so a base tag can never shadow it.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Tag key holding the human-readable resource name
pub const NAME_TAG: &str = "Name";
/// Tag key holding the project name
pub const PROJECT_TAG: &str = "Project";
/// Tag key holding the stack identity
pub const STACK_TAG: &str = "Stack";

/// Ordered mapping of tag key to value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    entries: Vec<(String, String)>,
}

impl TagSet {
    /// Create an empty tag set
    pub fn new() -> Self {
        Self::default()
    }

    /// Base tags identifying the project and stack
    pub fn base(project: &str, stack: &str) -> Self {
        Self::new()
            .with(PROJECT_TAG, project)
            .with(STACK_TAG, stack)
    }

    /// Set a tag, replacing an existing value in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder form of [`TagSet::insert`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Merge `overrides` over these tags
    pub fn merged(&self, overrides: &TagSet) -> TagSet {
        let mut merged = self.clone();
        for (key, value) in &overrides.entries {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Copy of these tags with `Name` set as the final entry
    pub fn named(&self, name: impl Into<String>) -> TagSet {
        let mut tags = self.clone();
        tags.entries.retain(|(k, _)| k != NAME_TAG);
        tags.entries.push((NAME_TAG.to_string(), name.into()));
        tags
    }

    /// Look up a tag value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Tag keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as a JSON object, keys in tag order
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }
}

impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Tags for one resource: base, then overrides, then `Name`
pub fn resource_tags(base: &TagSet, overrides: &TagSet, name: impl Into<String>) -> TagSet {
    base.merged(overrides).named(name)
}
