// Copyright (c) 2025 - Cowboy AI, Inc.
//! Reusable Constructs
//!
//! A construct inserts a small group of related nodes into a
//! [`DeploymentGraph`](crate::graph::DeploymentGraph) and hands back a typed
//! handle. Later wiring goes through the handle, never through name lookups.

pub mod aurora;
pub mod cdn;

pub use aurora::{DatabaseProps, InstanceRegistry, ScalableDatabaseCluster, CREDENTIAL_FIELDS};
pub use cdn::{EdgeRouter, EdgeRouterProps, UNCACHED_PATHS};
