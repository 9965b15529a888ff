// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Models
//!
//! Core concepts for describing a deployment topology: typed resource nodes,
//! their configuration payloads, and the value objects those payloads are
//! built from.
//!
//! # Value Objects with Invariants
//!
//! - [`NodeId`] - path-like node identifiers (`Database/Instance1`)
//! - [`Cidr`] - IPv4 blocks with host bits cleared
//! - [`ScalingConfiguration`] - elastic capacity bounds (`0 < min <= max`)
//! - [`Sensitive`] - values that never print
//! - [`ResourceKind`] - node taxonomy
//!
//! # Entities
//!
//! - [`ResourceNode`] - one unit of infrastructure with dependency and access edges
//! - [`SecretEntry`] - named secret material and its consumers
//! - [`ContainerSpec`] - container owned by a service
//! - [`DistributionSpec`] - edge layer with path-scoped behaviors

pub mod compute;
pub mod container;
pub mod database;
pub mod edge;
pub mod function;
pub mod invariants;
pub mod network;
pub mod node;
pub mod parameters;
pub mod resource_kind;
pub mod secret;
pub mod storage;

// Re-export value objects
pub use compute::{
    ClusterSpec, CpuArchitecture, HealthCheck, LoadBalancerSpec, LogGroupSpec, ServiceSpec,
};
pub use container::{ContainerSpec, ImageRef, LogSink, SecretRef};
pub use database::{
    DatabaseClusterSpec, DatabaseEngine, DatabaseInstanceSpec, ScalingConfiguration,
    DEFAULT_INSTANCE_CLASS, SERVERLESS_INSTANCE_CLASS,
};
pub use edge::{
    AllowedMethods, BehaviorRule, CachePolicy, DistributionSpec, HttpVersion, Origin,
    OriginProtocolPolicy, OriginRequestPolicy, PathBehavior, ResponseHeadersPolicy,
    ViewerProtocolPolicy,
};
pub use function::{FunctionSpec, FunctionUrlAuth, InvocationConfig};
pub use invariants::{ValidationError, ValidationResult};
pub use network::{Cidr, NetworkFabric, Subnet, SubnetTier, DEFAULT_NETWORK_CIDR};
pub use node::{Access, AccessEdge, AttrRef, GrantLevel, NodeId, NodePayload, ResourceNode};
pub use parameters::{Parameter, ParameterSet, ParameterType, ResolvedParameters, Sensitive};
pub use resource_kind::ResourceKind;
pub use secret::{GeneratorPolicy, SecretBinding, SecretEntry, SecretSource, SecretValue};
pub use storage::{BlockPublicAccess, BucketEncryption, BucketSpec};
