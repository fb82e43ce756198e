// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deferred Combinators
//!
//! Functions for joining several deferred values into one. The joined value
//! resolves only when every input resolves and fails as soon as any input
//! fails. Its dependency set is the union of the inputs' dependency sets.
//!
//! # Available Combinators
//!
//! - `combine` - Join a list of same-typed values into a `Vec`
//! - `combine2` - Join two values into a pair
//! - `combine3` - Join three values into a triple
//!
//! # Examples
//!
//! ```rust,ignore
//! use cim_provisioning::deferred::*;
//!
//! let ids = combine(subnets.iter().map(|s| s.id()).collect());
//! let config = combine3(endpoint, ca_data, name).resolve(|(e, c, n)| render(e, c, n));
//! ```

use futures::future::{try_join, try_join3, try_join_all};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::value::{Deferred, Resolvable};

fn union<'a>(sets: impl IntoIterator<Item = &'a BTreeSet<String>>) -> BTreeSet<String> {
    sets.into_iter().flatten().cloned().collect()
}

// Joining is pure, so the joined key is a function of the input keys.
fn joined<'a>(origins: impl IntoIterator<Item = &'a str>) -> Arc<str> {
    Arc::from(format!("({})", origins.into_iter().collect::<Vec<_>>().join(",")))
}

/// Join a list of deferred values
///
/// Element order is preserved. An empty list resolves immediately to an
/// empty `Vec`.
///
/// # Arguments
///
/// * `values` - Deferred values to join
///
/// # Examples
///
/// ```rust,ignore
/// let all = combine(vec![Deferred::known(1), Deferred::known(2)]);
/// assert_eq!(all.value().await, Ok(vec![1, 2]));
/// ```
pub fn combine<T: Resolvable>(values: Vec<Deferred<T>>) -> Deferred<Vec<T>> {
    let dependencies = union(values.iter().map(|v| v.dependencies()));
    let origin = joined(values.iter().map(|v| v.origin()));
    let futures: Vec<_> = values.iter().map(|v| v.shared()).collect();

    Deferred::from_future(async move { try_join_all(futures).await }, dependencies, origin)
}

/// Join two deferred values of different types
pub fn combine2<A, B>(a: &Deferred<A>, b: &Deferred<B>) -> Deferred<(A, B)>
where
    A: Resolvable,
    B: Resolvable,
{
    let dependencies = union([a.dependencies(), b.dependencies()]);
    let origin = joined([a.origin(), b.origin()]);
    let (fa, fb) = (a.shared(), b.shared());

    Deferred::from_future(async move { try_join(fa, fb).await }, dependencies, origin)
}

/// Join three deferred values of different types
///
/// # Examples
///
/// ```rust,ignore
/// let descriptor = combine3(&endpoint, &certificate, &name);
/// ```
pub fn combine3<A, B, C>(a: &Deferred<A>, b: &Deferred<B>, c: &Deferred<C>) -> Deferred<(A, B, C)>
where
    A: Resolvable,
    B: Resolvable,
    C: Resolvable,
{
    let dependencies = union([a.dependencies(), b.dependencies(), c.dependencies()]);
    let origin = joined([a.origin(), b.origin(), c.origin()]);
    let (fa, fb, fc) = (a.shared(), b.shared(), c.shared());

    Deferred::from_future(
        async move { try_join3(fa, fb, fc).await },
        dependencies,
        origin,
    )
}
