// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! - `topology_counts` - resource counts scale with the subnet pair count
//! - `deferred_laws` - functor and join laws of deferred values

mod deferred_laws;
mod topology_counts;
