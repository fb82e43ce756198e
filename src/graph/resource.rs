// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource handles and their inputs
//!
//! Inputs are literals or deferred values. Every deferred input contributes
//! its dependency set to the declaring node's edges. Outputs are always
//! deferred: a handle exists as soon as the resource is declared, long before
//! the provider has returned anything.

use futures::future::{try_join, try_join_all};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::deferred::{Deferred, DeferredError, DeferredResult, Resolvable, Resolver};
use crate::domain::{ResourceKind, TagSet};

/// Attributes returned by the provider for a created resource
pub type Outputs = BTreeMap<String, Value>;

/// Inputs with every deferred value resolved, as handed to the provider
pub type ResolvedInputs = BTreeMap<String, Value>;

/// Input attribute key for tags
pub const TAGS: &str = "tags";

/// One input attribute
#[derive(Debug, Clone)]
pub enum Input {
    /// Known at declaration time
    Literal(Value),
    /// Produced by another resource
    Deferred(Deferred<Value>),
}

impl Input {
    /// Resource names this input flows from
    pub fn dependencies(&self) -> BTreeSet<String> {
        match self {
            Input::Literal(_) => BTreeSet::new(),
            Input::Deferred(d) => d.dependencies().clone(),
        }
    }

    /// Wait for the input's value
    pub async fn value(&self) -> DeferredResult<Value> {
        match self {
            Input::Literal(v) => Ok(v.clone()),
            Input::Deferred(d) => d.value().await,
        }
    }

    /// Literals compare by value; deferred inputs by provenance
    fn same_as(&self, other: &Input) -> bool {
        match (self, other) {
            (Input::Literal(a), Input::Literal(b)) => a == b,
            (Input::Deferred(a), Input::Deferred(b)) => a.same_source(b),
            _ => false,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Input::Deferred(_))
    }
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Input::Literal(value)
    }
}

impl From<&str> for Input {
    fn from(value: &str) -> Self {
        Input::Literal(Value::String(value.to_string()))
    }
}

impl From<String> for Input {
    fn from(value: String) -> Self {
        Input::Literal(Value::String(value))
    }
}

impl From<bool> for Input {
    fn from(value: bool) -> Self {
        Input::Literal(Value::Bool(value))
    }
}

impl From<u32> for Input {
    fn from(value: u32) -> Self {
        Input::Literal(Value::from(value))
    }
}

impl From<Vec<String>> for Input {
    fn from(values: Vec<String>) -> Self {
        Input::Literal(Value::from(values))
    }
}

impl From<&TagSet> for Input {
    fn from(tags: &TagSet) -> Self {
        Input::Literal(tags.to_value())
    }
}

impl<T: Resolvable + Serialize> From<Deferred<T>> for Input {
    fn from(value: Deferred<T>) -> Self {
        Input::from(&value)
    }
}

impl<T: Resolvable + Serialize> From<&Deferred<T>> for Input {
    fn from(value: &Deferred<T>) -> Self {
        // Serialization keeps the source's provenance
        Input::Deferred(value.project(value.origin(), |v| {
            serde_json::to_value(v).map_err(DeferredError::from)
        }))
    }
}

/// Input attributes of one resource plus explicit ordering edges
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    entries: BTreeMap<String, Input>,
    gates: Vec<Deferred<()>>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an input attribute
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Input>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Set the `tags` attribute
    pub fn tags(self, tags: &TagSet) -> Self {
        self.set(TAGS, tags)
    }

    /// Order this resource after `resource` without consuming any of its outputs
    ///
    /// For collaborators that cannot express the dependency themselves, such
    /// as a package installer that needs an identity binding to exist first.
    pub fn depends_on(mut self, resource: &Resource) -> Self {
        self.gates.push(resource.outputs().resolve(|_| ()));
        self
    }

    /// Look up an input attribute
    pub fn get(&self, key: &str) -> Option<&Input> {
        self.entries.get(key)
    }

    /// Literal value of an attribute, if it is one
    pub fn literal(&self, key: &str) -> Option<&Value> {
        match self.entries.get(key) {
            Some(Input::Literal(v)) => Some(v),
            _ => None,
        }
    }

    /// Attribute names
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Union of every resource name the inputs and gates flow from
    pub fn dependencies(&self) -> BTreeSet<String> {
        self.entries
            .values()
            .flat_map(|input| input.dependencies())
            .chain(self.gates.iter().flat_map(|g| g.dependencies().iter().cloned()))
            .collect()
    }

    /// Literal snapshot: literals as-is, unresolved inputs as `null`
    pub fn snapshot(&self) -> ResolvedInputs {
        self.entries
            .iter()
            .map(|(key, input)| {
                let value = match input {
                    Input::Literal(v) => v.clone(),
                    Input::Deferred(d) => d.peek().and_then(Result::ok).unwrap_or(Value::Null),
                };
                (key.clone(), value)
            })
            .collect()
    }

    /// Wait for every input and gate
    ///
    /// Fails as soon as any input fails.
    pub async fn resolve_all(&self) -> DeferredResult<ResolvedInputs> {
        let entries = try_join_all(self.entries.iter().map(|(key, input)| async move {
            input.value().await.map(|value| (key.clone(), value))
        }));
        let gates = try_join_all(self.gates.iter().map(|gate| gate.value()));

        let (entries, _) = try_join(entries, gates).await?;
        Ok(entries.into_iter().collect())
    }

    pub(crate) fn same_as(&self, other: &Inputs) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(key, input)| other.entries.get(key).is_some_and(|o| input.same_as(o)))
            && self.gate_dependencies() == other.gate_dependencies()
    }

    fn gate_dependencies(&self) -> BTreeSet<String> {
        self.gates
            .iter()
            .flat_map(|g| g.dependencies().iter().cloned())
            .collect()
    }
}

/// Handle to a declared resource
///
/// Owned by the component that declared it. Every output attribute is a
/// deferred value that settles once the provider call for this resource
/// completes.
#[derive(Debug, Clone)]
pub struct Resource {
    name: String,
    kind: ResourceKind,
    outputs: Deferred<Arc<Outputs>>,
}

impl Resource {
    pub(crate) fn pending(kind: ResourceKind, name: &str) -> (Self, Resolver<Arc<Outputs>>) {
        let (resolver, outputs) = Deferred::pending([name]);
        let handle = Self {
            name: name.to_string(),
            kind,
            outputs: outputs.with_origin(name),
        };
        (handle, resolver)
    }

    /// Logical name, unique within the graph
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// All outputs, once created
    pub fn outputs(&self) -> &Deferred<Arc<Outputs>> {
        &self.outputs
    }

    /// One output attribute
    pub fn output(&self, attribute: &str) -> Deferred<Value> {
        let origin = self.attribute_origin(attribute);
        let resource = self.name.clone();
        let attribute = attribute.to_string();
        self.outputs.project(origin, move |outputs| {
            outputs
                .get(&attribute)
                .cloned()
                .ok_or(DeferredError::MissingAttribute {
                    resource,
                    attribute,
                })
        })
    }

    /// One string output attribute
    pub fn output_string(&self, attribute: &str) -> Deferred<String> {
        let origin = self.attribute_origin(attribute);
        let resource = self.name.clone();
        let attribute = attribute.to_string();
        self.outputs.project(origin, move |outputs| match outputs.get(&attribute) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(DeferredError::TypeMismatch {
                resource,
                attribute,
                expected: "string".to_string(),
            }),
            None => Err(DeferredError::MissingAttribute {
                resource,
                attribute,
            }),
        })
    }

    // A string attribute serializes to the same value as the raw attribute,
    // so both accessors share one key.
    fn attribute_origin(&self, attribute: &str) -> String {
        format!("{}.{attribute}", self.name)
    }

    /// Provider identifier
    pub fn id(&self) -> Deferred<String> {
        self.output_string("id")
    }

    /// Provider resource name
    pub fn arn(&self) -> Deferred<String> {
        self.output_string("arn")
    }

    /// Generated physical name
    pub fn physical_name(&self) -> Deferred<String> {
        self.output_string("name")
    }
}
