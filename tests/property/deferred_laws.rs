// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Deferred Values
//!
//! Verifies the functor laws of `resolve`, the join behaviour of `combine`,
//! and that continuations run at most once no matter how many consumers
//! await a value.

use cim_provisioning::{combine, Deferred, DeferredError};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_test::block_on;

// ============================================================================
// Strategies
// ============================================================================

fn values() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(any::<i64>(), 0..20)
}

fn dependency_sets() -> impl Strategy<Value = Vec<BTreeSet<String>>> {
    prop::collection::vec(
        prop::collection::btree_set("[a-e]-[0-9]", 0..4),
        1..6,
    )
}

fn upstream(index: usize) -> DeferredError {
    DeferredError::UpstreamFailed {
        resource: format!("resource-{index}"),
        reason: "rejected".to_string(),
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: resolve id = id
    #[test]
    fn prop_resolve_identity(x in any::<i64>()) {
        let d = Deferred::known(x);
        prop_assert_eq!(block_on(d.resolve(|v| v).value()), Ok(x));
    }

    /// Property: resolve (g . f) = resolve g . resolve f
    #[test]
    fn prop_resolve_composition(x in any::<i64>(), a in any::<i64>(), b in any::<i64>()) {
        let f = move |v: i64| v.wrapping_add(a);
        let g = move |v: i64| v.wrapping_mul(b);

        let chained = Deferred::known(x).resolve(f).resolve(g);
        let composed = Deferred::known(x).resolve(move |v| g(f(v)));

        prop_assert_eq!(block_on(chained.value()), block_on(composed.value()));
    }

    /// Property: combining known values preserves order
    #[test]
    fn prop_combine_known(xs in values()) {
        let joined = combine(xs.iter().copied().map(Deferred::known).collect());
        prop_assert_eq!(block_on(joined.value()), Ok(xs));
    }

    /// Property: one failed input fails the join and skips the continuation
    #[test]
    fn prop_combine_fails_fast(xs in prop::collection::vec(any::<i64>(), 1..20), pick in any::<prop::sample::Index>()) {
        let failing = pick.index(xs.len());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let inputs = xs
            .iter()
            .enumerate()
            .map(|(i, x)| {
                if i == failing {
                    Deferred::failed(upstream(i))
                } else {
                    Deferred::known(*x)
                }
            })
            .collect();
        let sum = combine(inputs).resolve(move |all| {
            counter.fetch_add(1, Ordering::SeqCst);
            all.iter().fold(0i64, |acc, v| acc.wrapping_add(*v))
        });

        prop_assert_eq!(block_on(sum.value()), Err(upstream(failing)));
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    /// Property: a join depends on the union of its inputs' dependencies
    #[test]
    fn prop_combine_unions_dependencies(sets in dependency_sets()) {
        let mut resolvers = Vec::new();
        let mut inputs = Vec::new();
        for set in &sets {
            let (resolver, value) = Deferred::<u8>::pending(set.iter().cloned());
            resolvers.push(resolver);
            inputs.push(value);
        }

        let joined = combine(inputs);
        let expected: BTreeSet<String> = sets.iter().flatten().cloned().collect();
        prop_assert_eq!(joined.dependencies(), &expected);

        for (i, resolver) in resolvers.into_iter().enumerate() {
            resolver.resolve(i as u8);
        }
        let settled = block_on(joined.value()).expect("all inputs resolved");
        prop_assert_eq!(settled.len(), sets.len());
    }

    /// Property: a continuation runs once however many consumers await it
    #[test]
    fn prop_continuation_runs_once(x in any::<i64>(), consumers in 1usize..10) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let (resolver, source) = Deferred::<i64>::pending(["producer"]);
        let doubled = source.resolve(move |v| {
            counter.fetch_add(1, Ordering::SeqCst);
            v.wrapping_mul(2)
        });

        let handles: Vec<Deferred<i64>> = (0..consumers).map(|_| doubled.clone()).collect();
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);

        resolver.resolve(x);
        for handle in &handles {
            prop_assert_eq!(block_on(handle.value()), Ok(x.wrapping_mul(2)));
        }
        prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Property: a dropped resolver abandons every consumer
    #[test]
    fn prop_dropped_resolver_abandons(origin in "[a-z]{1,8}") {
        let (resolver, value) = Deferred::<String>::pending([origin.clone()]);
        let derived = value.resolve(|s| s.len());
        drop(resolver);

        prop_assert_eq!(
            block_on(derived.value()),
            Err(DeferredError::Abandoned { origin })
        );
    }
}
