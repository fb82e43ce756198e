// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deferred<T> - single-assignment values with dependency tracking
//!
//! A `Deferred<T>` is backed by a shared, lazily-polled future. Continuations
//! registered with [`Deferred::resolve`] never run until the source value has
//! settled, and they run at most once no matter how many consumers await the
//! derived value. Waiting consumers are suspended tasks, not blocked threads.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::BTreeSet;
use std::fmt::{self, Debug};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

use super::DeferredError;

/// Result of settling a deferred value
pub type DeferredResult<T> = Result<T, DeferredError>;

/// Bound for anything that can flow through a deferred value
///
/// Resolved values are handed out to every consumer, hence `Clone`, and they
/// cross task boundaries inside the executor, hence `Send + Sync`.
pub trait Resolvable: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Resolvable for T {}

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(0);

fn unique(prefix: &str) -> Arc<str> {
    let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
    Arc::from(format!("{prefix}#{token}"))
}

/// A value that may not be known yet
///
/// # Type Parameters
///
/// - `T`: The eventual value type
///
/// # Implementation
///
/// The value is a `Shared<BoxFuture>`, so cloning a `Deferred` is cheap and
/// all clones observe the same single result.
///
/// The origin is a provenance key: two values with equal origins are
/// guaranteed to settle to the same result. Resource attributes are keyed
/// `<resource>.<attribute>`; every closure passed to `resolve` mints a fresh
/// key, since two closures cannot be compared.
pub struct Deferred<T> {
    future: Shared<BoxFuture<'static, DeferredResult<T>>>,
    dependencies: Arc<BTreeSet<String>>,
    origin: Arc<str>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            future: self.future.clone(),
            dependencies: Arc::clone(&self.dependencies),
            origin: Arc::clone(&self.origin),
        }
    }
}

impl<T> Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Deferred<{}>({}, depends on {:?})",
            std::any::type_name::<T>(),
            self.origin,
            self.dependencies
        )
    }
}

impl<T: Resolvable> Deferred<T> {
    /// Create a deferred value that is already known
    ///
    /// Known values carry no dependencies.
    pub fn known(value: T) -> Self {
        Self::from_future(async move { Ok(value) }, BTreeSet::new(), unique("known"))
    }

    /// Create a deferred value that has already failed
    pub fn failed(error: DeferredError) -> Self {
        Self::from_future(async move { Err(error) }, BTreeSet::new(), unique("failed"))
    }

    /// Create a pending value and the resolver that settles it
    ///
    /// # Arguments
    ///
    /// * `dependencies` - Logical names of the resources that will produce the value
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let (resolver, name) = Deferred::<String>::pending(["demo-cluster"]);
    /// resolver.resolve("demo-cluster-4f1c2a9".to_string());
    /// ```
    pub fn pending<I, S>(dependencies: I) -> (Resolver<T>, Self)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dependencies: BTreeSet<String> = dependencies.into_iter().map(Into::into).collect();
        let origin = if dependencies.is_empty() {
            "an external producer".to_string()
        } else {
            dependencies.iter().cloned().collect::<Vec<_>>().join(", ")
        };

        let (sender, receiver) = oneshot::channel::<DeferredResult<T>>();
        let future = async move {
            match receiver.await {
                Ok(result) => result,
                Err(_) => Err(DeferredError::Abandoned { origin }),
            }
        };

        (
            Resolver { sender },
            Self::from_future(future, dependencies, unique("pending")),
        )
    }

    pub(crate) fn from_future<F>(
        future: F,
        dependencies: BTreeSet<String>,
        origin: Arc<str>,
    ) -> Self
    where
        F: Future<Output = DeferredResult<T>> + Send + 'static,
    {
        Self {
            future: future.boxed().shared(),
            dependencies: Arc::new(dependencies),
            origin,
        }
    }

    /// Replace the provenance key
    ///
    /// Only for values whose key is deterministic, such as a resource's
    /// output record.
    pub(crate) fn with_origin(mut self, origin: impl Into<Arc<str>>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Apply a fallible function under a caller-chosen provenance key
    ///
    /// The caller guarantees that equal keys mean equal functions.
    pub(crate) fn project<U, F>(&self, origin: impl Into<Arc<str>>, f: F) -> Deferred<U>
    where
        U: Resolvable,
        F: FnOnce(T) -> DeferredResult<U> + Send + 'static,
    {
        let source = self.future.clone();
        Deferred::from_future(
            async move { source.await.and_then(f) },
            (*self.dependencies).clone(),
            origin.into(),
        )
    }

    /// Provenance key of this value
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Whether both values are known to settle to the same result
    pub fn same_source<U>(&self, other: &Deferred<U>) -> bool {
        self.origin == other.origin && self.dependencies == other.dependencies
    }

    pub(crate) fn shared(&self) -> Shared<BoxFuture<'static, DeferredResult<T>>> {
        self.future.clone()
    }

    /// Logical names of the resources this value flows from
    pub fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }

    /// Check whether this value flows from the named resource
    pub fn depends_on(&self, resource: &str) -> bool {
        self.dependencies.contains(resource)
    }

    /// Apply a function to the eventual value
    ///
    /// `f` is not invoked until this value resolves, and it is never invoked
    /// when this value fails; the failure is propagated unchanged.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let key = cluster.name().resolve(|name| format!("kubernetes.io/cluster/{name}"));
    /// ```
    pub fn resolve<U, F>(&self, f: F) -> Deferred<U>
    where
        U: Resolvable,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let source = self.future.clone();
        Deferred::from_future(
            async move { source.await.map(f) },
            (*self.dependencies).clone(),
            unique(&self.origin),
        )
    }

    /// Apply a fallible function to the eventual value
    ///
    /// Used where the continuation itself can fail, such as serializing a
    /// document or reading a typed attribute out of a provider response.
    pub fn try_resolve<U, F>(&self, f: F) -> Deferred<U>
    where
        U: Resolvable,
        F: FnOnce(T) -> DeferredResult<U> + Send + 'static,
    {
        self.project(unique(&self.origin), f)
    }

    /// Record an additional ordering dependency on this value
    pub fn with_dependency(&self, resource: impl Into<String>) -> Self {
        let mut dependencies = (*self.dependencies).clone();
        dependencies.insert(resource.into());
        Self {
            future: self.future.clone(),
            dependencies: Arc::new(dependencies),
            origin: Arc::clone(&self.origin),
        }
    }

    /// Wait for the value to settle
    pub async fn value(&self) -> DeferredResult<T> {
        self.future.clone().await
    }

    /// The settled result, if some consumer has already driven this value to completion
    pub fn peek(&self) -> Option<DeferredResult<T>> {
        self.future.peek().cloned()
    }
}

/// Write side of a pending [`Deferred`]
///
/// Settling consumes the resolver, so a value is assigned exactly once.
/// Dropping it unsettled fails the value with [`DeferredError::Abandoned`].
pub struct Resolver<T> {
    sender: oneshot::Sender<DeferredResult<T>>,
}

impl<T> Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resolver<{}>", std::any::type_name::<T>())
    }
}

impl<T> Resolver<T> {
    /// Settle the value successfully
    pub fn resolve(self, value: T) {
        // Nobody listening is fine: no consumer ever asked for the value.
        let _ = self.sender.send(Ok(value));
    }

    /// Settle the value with a failure
    pub fn fail(self, error: DeferredError) {
        let _ = self.sender.send(Err(error));
    }

    /// Settle the value from a result
    pub fn settle(self, result: DeferredResult<T>) {
        let _ = self.sender.send(result);
    }
}
