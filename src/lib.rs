// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment topology composition for the Composable Information Machine
//!
//! Assembles a multi-tier deployment (network, elastic database, object
//! store, authenticated container service, edge distribution) into a
//! dependency-ordered graph that a provisioning backend can realize.
//!
//! ```rust
//! use cim_topology::{ParameterSet, TopologyBuilder};
//!
//! let graph = TopologyBuilder::default()
//!     .build(&ParameterSet::standard().with("ClientId", "abc"))
//!     .unwrap();
//! let plan = graph.plan().unwrap();
//! assert_eq!(plan.creation_order.len(), graph.len());
//! ```

pub mod builder;
pub mod config;
pub mod constructs;
pub mod domain;
pub mod errors;
pub mod graph;
pub mod publish;
pub mod token;

// Re-export commonly used types
pub use builder::TopologyBuilder;
pub use config::{NatsConfig, TopologyConfig};
pub use domain::{NodeId, ParameterSet, ResourceKind, ResourceNode};
pub use errors::{
    ConfigError, DependencyCycleError, PublishError, SynthesisError, SynthesisResult,
    TokenError, TopologyError, ValidationError,
};
pub use graph::{DeploymentGraph, Patch, ProvisioningPlan};
pub use publish::{GraphPublisher, NatsGraphPublisher};
