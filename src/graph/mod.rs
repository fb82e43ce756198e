// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Graph
//!
//! Components declare resources into a shared graph. A declaration registers
//! a node whose edges are exactly the dependency sets of its deferred inputs,
//! and returns a [`Resource`] handle whose outputs are deferred values.
//!
//! # Lifecycle
//!
//! ```text
//! declare / reference ──> seal ──> execute ──> ProvisioningReport
//!     (cycle check)      (waves)   (one task per resource)
//! ```
//!
//! Cycles are rejected at declaration time. Forward references let a
//! component name a resource before declaring it; a reference that is never
//! declared is rejected when the graph is sealed.

pub mod executor;
pub mod report;
pub mod resource;
pub mod sequence;

pub use executor::ExecutorConfig;
pub use report::{LifecycleStep, ProvisioningReport, ResourceFailure, ResourceOutcome};
pub use resource::{Input, Inputs, Outputs, ResolvedInputs, Resource, TAGS};
pub use sequence::CreationSequence;

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::deferred::Resolver;
use crate::domain::{ResourceKind, ValidationError};
use crate::provider::ResourceProvider;

/// A declared node, ready to be executed once sealed
#[derive(Debug)]
pub(crate) struct NodeRecord {
    pub(crate) kind: ResourceKind,
    pub(crate) inputs: Inputs,
    pub(crate) dependencies: BTreeSet<String>,
    pub(crate) handle: Resource,
    pub(crate) resolver: Option<Resolver<Arc<Outputs>>>,
}

#[derive(Debug)]
enum Slot {
    /// Named by a forward reference, not declared yet
    Reserved {
        handle: Resource,
        resolver: Resolver<Arc<Outputs>>,
    },
    Declared(NodeRecord),
}

impl Slot {
    fn kind(&self) -> ResourceKind {
        match self {
            Slot::Reserved { handle, .. } => handle.kind(),
            Slot::Declared(node) => node.kind,
        }
    }

    fn handle(&self) -> &Resource {
        match self {
            Slot::Reserved { handle, .. } => handle,
            Slot::Declared(node) => &node.handle,
        }
    }
}

#[derive(Debug, Default)]
struct GraphState {
    slots: BTreeMap<String, Slot>,
    order: Vec<String>,
    sealed: bool,
}

impl GraphState {
    fn dependencies_of(&self, name: &str) -> Option<&BTreeSet<String>> {
        match self.slots.get(name) {
            Some(Slot::Declared(node)) => Some(&node.dependencies),
            _ => None,
        }
    }

    /// Path from `start` back to `target` along declared edges, if one exists
    fn path_to(&self, start: &str, target: &str) -> Option<Vec<String>> {
        let mut visited = BTreeSet::new();
        let mut path = Vec::new();
        if self.search(start, target, &mut visited, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn search(
        &self,
        current: &str,
        target: &str,
        visited: &mut BTreeSet<String>,
        path: &mut Vec<String>,
    ) -> bool {
        path.push(current.to_string());
        if current == target {
            return true;
        }
        if visited.insert(current.to_string()) {
            if let Some(deps) = self.dependencies_of(current) {
                for dep in deps {
                    if self.search(dep, target, visited, path) {
                        return true;
                    }
                }
            }
        }
        path.pop();
        false
    }
}

/// Shared, declaration-time resource graph
///
/// Cloning yields another handle to the same graph.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    inner: Arc<RwLock<GraphState>>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource and return its handle
    ///
    /// Declaring the same name again with the same kind and equivalent inputs
    /// returns the existing handle. Literal inputs are compared by value and
    /// deferred inputs by the resources they flow from.
    ///
    /// # Errors
    ///
    /// - `GraphSealed` once the graph has been sealed
    /// - `ConflictingDeclaration` for a name already declared differently
    /// - `KindMismatch` when a forward reference named another kind
    /// - `DependencyCycle` when the inputs flow from this resource itself
    pub fn declare(
        &self,
        kind: ResourceKind,
        name: impl Into<String>,
        inputs: Inputs,
    ) -> Result<Resource, ValidationError> {
        let name = name.into();
        let dependencies = inputs.dependencies();
        let mut state = self.inner.write();

        if state.sealed {
            return Err(ValidationError::GraphSealed { name });
        }

        match state.slots.get(&name) {
            Some(Slot::Declared(existing)) => {
                if existing.kind == kind && existing.inputs.same_as(&inputs) {
                    debug!(resource = %name, %kind, "Declaration already present");
                    return Ok(existing.handle.clone());
                }
                return Err(ValidationError::ConflictingDeclaration { name });
            }
            Some(Slot::Reserved { handle, .. }) if handle.kind() != kind => {
                return Err(ValidationError::KindMismatch {
                    name,
                    existing: handle.kind(),
                    requested: kind,
                });
            }
            _ => {}
        }

        if dependencies.contains(&name) {
            return Err(ValidationError::DependencyCycle {
                path: vec![name.clone(), name],
            });
        }
        for dep in &dependencies {
            if let Some(mut path) = state.path_to(dep, &name) {
                path.insert(0, name.clone());
                return Err(ValidationError::DependencyCycle { path });
            }
        }

        let (handle, resolver) = match state.slots.remove(&name) {
            Some(Slot::Reserved { handle, resolver }) => (handle, resolver),
            _ => {
                let (handle, resolver) = Resource::pending(kind, &name);
                state.order.push(name.clone());
                (handle, resolver)
            }
        };

        debug!(
            resource = %name,
            %kind,
            dependencies = dependencies.len(),
            "Declared resource"
        );

        state.slots.insert(
            name,
            Slot::Declared(NodeRecord {
                kind,
                inputs,
                dependencies,
                handle: handle.clone(),
                resolver: Some(resolver),
            }),
        );

        Ok(handle)
    }

    /// Handle to a resource that may not be declared yet
    ///
    /// The returned handle's outputs settle once the resource is declared and
    /// created. Referencing an existing name of another kind is rejected.
    pub fn reference(
        &self,
        kind: ResourceKind,
        name: impl Into<String>,
    ) -> Result<Resource, ValidationError> {
        let name = name.into();
        let mut state = self.inner.write();

        if let Some(slot) = state.slots.get(&name) {
            if slot.kind() != kind {
                return Err(ValidationError::KindMismatch {
                    name,
                    existing: slot.kind(),
                    requested: kind,
                });
            }
            return Ok(slot.handle().clone());
        }

        if state.sealed {
            return Err(ValidationError::GraphSealed { name });
        }

        let (handle, resolver) = Resource::pending(kind, &name);
        state.order.push(name.clone());
        state.slots.insert(
            name,
            Slot::Reserved {
                handle: handle.clone(),
                resolver,
            },
        );
        Ok(handle)
    }

    /// Handle of a declared resource
    pub fn get(&self, name: &str) -> Option<Resource> {
        match self.inner.read().slots.get(name) {
            Some(Slot::Declared(node)) => Some(node.handle.clone()),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        matches!(self.inner.read().slots.get(name), Some(Slot::Declared(_)))
    }

    /// Number of declared resources
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .slots
            .values()
            .filter(|slot| matches!(slot, Slot::Declared(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of declared resources of a kind
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.resources_of(kind).len()
    }

    /// Declared resources of a kind, in declaration order
    pub fn resources_of(&self, kind: ResourceKind) -> Vec<Resource> {
        let state = self.inner.read();
        state
            .order
            .iter()
            .filter_map(|name| match state.slots.get(name) {
                Some(Slot::Declared(node)) if node.kind == kind => Some(node.handle.clone()),
                _ => None,
            })
            .collect()
    }

    /// Names of declared resources, in declaration order
    pub fn names(&self) -> Vec<String> {
        let state = self.inner.read();
        state
            .order
            .iter()
            .filter(|name| matches!(state.slots.get(*name), Some(Slot::Declared(_))))
            .cloned()
            .collect()
    }

    /// Resources a declared resource's inputs flow from
    pub fn dependencies_of(&self, name: &str) -> Option<BTreeSet<String>> {
        self.inner.read().dependencies_of(name).cloned()
    }

    /// Literal snapshot of a declared resource's inputs
    pub fn inputs_of(&self, name: &str) -> Option<ResolvedInputs> {
        match self.inner.read().slots.get(name) {
            Some(Slot::Declared(node)) => Some(node.inputs.snapshot()),
            _ => None,
        }
    }

    /// Freeze the graph and compute its creation waves
    ///
    /// Later declarations through any clone of this graph are rejected. The
    /// graph stays queryable; execution belongs to the returned value.
    ///
    /// # Errors
    ///
    /// - `UndeclaredReference` when a forward reference was never declared
    /// - `GraphSealed` when called twice
    pub fn seal(&self) -> Result<SealedGraph, ValidationError> {
        let mut state = self.inner.write();

        if state.sealed {
            return Err(ValidationError::GraphSealed {
                name: "<graph>".to_string(),
            });
        }
        if let Some((name, _)) = state
            .slots
            .iter()
            .find(|(_, slot)| matches!(slot, Slot::Reserved { .. }))
        {
            return Err(ValidationError::UndeclaredReference { name: name.clone() });
        }

        let edges: BTreeMap<String, BTreeSet<String>> = state
            .slots
            .iter()
            .filter_map(|(name, slot)| match slot {
                Slot::Declared(node) => Some((name.clone(), node.dependencies.clone())),
                Slot::Reserved { .. } => None,
            })
            .collect();
        let sequence = CreationSequence::from_dependencies(&edges)?;

        state.sealed = true;
        let GraphState { slots, order, .. } = &mut *state;
        let nodes: Vec<(String, NodeRecord)> = order
            .iter()
            .filter_map(|name| match slots.get_mut(name) {
                Some(Slot::Declared(node)) => Some((
                    name.clone(),
                    NodeRecord {
                        kind: node.kind,
                        inputs: node.inputs.clone(),
                        dependencies: node.dependencies.clone(),
                        handle: node.handle.clone(),
                        resolver: node.resolver.take(),
                    },
                )),
                _ => None,
            })
            .collect();

        info!(
            resources = nodes.len(),
            waves = sequence.num_waves(),
            "Sealed resource graph"
        );

        Ok(SealedGraph { nodes, sequence })
    }
}

/// A frozen graph, ready to be executed once
#[derive(Debug)]
pub struct SealedGraph {
    nodes: Vec<(String, NodeRecord)>,
    sequence: CreationSequence,
}

impl SealedGraph {
    /// Creation waves for display and planning
    pub fn sequence(&self) -> &CreationSequence {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.nodes.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Create every resource through the provider
    ///
    /// Each resource starts as soon as its own inputs settle. A failure
    /// marks the resource's dependents as dependency-failed and leaves
    /// unrelated resources untouched.
    pub async fn execute(
        self,
        provider: Arc<dyn ResourceProvider>,
        config: ExecutorConfig,
    ) -> ProvisioningReport {
        executor::run(self.nodes, provider, config).await
    }
}
