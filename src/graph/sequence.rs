// Copyright (c) 2025 - Cowboy AI, Inc.
//! Creation waves
//!
//! Groups the sealed graph into waves: every resource in wave N depends only
//! on resources in waves 0..N-1. The executor does not run wave by wave (it
//! starts each resource the moment its own inputs settle), but the waves are
//! the plan shown to operators and a second, independent check that the
//! declared edges are acyclic.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::domain::ValidationError;

/// Ordered groups of resources that may be created concurrently
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationSequence {
    waves: Vec<Vec<String>>,
    total: usize,
}

impl CreationSequence {
    /// Compute waves from a map of node to the nodes it depends on
    ///
    /// Dependencies naming nodes outside the map are external producers and
    /// impose no ordering here.
    ///
    /// Uses Kahn's algorithm:
    /// 1. Collect every unplaced node whose internal dependencies are placed
    /// 2. Emit them as the next wave
    /// 3. Repeat until all nodes are placed, or no progress means a cycle
    pub fn from_dependencies(
        nodes: &BTreeMap<String, BTreeSet<String>>,
    ) -> Result<Self, ValidationError> {
        let total = nodes.len();
        let mut placed: BTreeSet<&str> = BTreeSet::new();
        let mut waves: Vec<Vec<String>> = Vec::new();

        while placed.len() < total {
            let wave: Vec<String> = nodes
                .iter()
                .filter(|(name, _)| !placed.contains(name.as_str()))
                .filter(|(_, deps)| {
                    deps.iter()
                        .filter(|dep| nodes.contains_key(*dep))
                        .all(|dep| placed.contains(dep.as_str()))
                })
                .map(|(name, _)| name.clone())
                .collect();

            if wave.is_empty() {
                let stuck: Vec<String> = nodes
                    .keys()
                    .filter(|name| !placed.contains(name.as_str()))
                    .cloned()
                    .collect();
                return Err(ValidationError::DependencyCycle { path: stuck });
            }

            debug!(wave = waves.len(), resources = wave.len(), "Computed creation wave");

            for name in &wave {
                if let Some((key, _)) = nodes.get_key_value(name) {
                    placed.insert(key.as_str());
                }
            }
            waves.push(wave);
        }

        info!(waves = waves.len(), resources = total, "Computed creation sequence");

        Ok(Self { waves, total })
    }

    /// Waves in creation order
    pub fn waves(&self) -> &[Vec<String>] {
        &self.waves
    }

    pub fn num_waves(&self) -> usize {
        self.waves.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Wave index of a resource
    pub fn wave_of(&self, name: &str) -> Option<usize> {
        self.waves
            .iter()
            .position(|wave| wave.iter().any(|n| n == name))
    }

    /// All names in wave order
    pub fn all_in_order(&self) -> Vec<String> {
        self.waves.iter().flatten().cloned().collect()
    }
}
