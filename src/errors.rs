// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for topology synthesis
//!
//! Three failure classes can stop a build, and all of them stop it before a
//! graph is handed out:
//!
//! - [`ValidationError`] - a supplied value broke a declared constraint
//! - [`TopologyError`] - a structural assumption about the graph does not hold
//! - [`DependencyCycleError`] - the dependency edges do not form a DAG
//!
//! [`SynthesisError`] wraps all three for the builder's public surface.

use std::fmt;

use thiserror::Error;

use crate::domain::{NodeId, ResourceKind};

pub use crate::domain::invariants::ValidationError;

/// Structural assumptions about the graph that did not hold
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// A database cluster produced no instance children to retarget
    #[error("Database cluster {cluster} has no instance children to retarget")]
    NoInstanceChildren { cluster: NodeId },

    /// A secret-bound environment key points at a secret that is not in the graph
    #[error("Container {container} binds {key} to unknown secret {secret}")]
    UnresolvedSecret {
        container: NodeId,
        key: String,
        secret: NodeId,
    },

    /// A secret-bound environment key asks for a field the secret does not expose
    #[error("Secret {secret} has no field {field}")]
    UnknownSecretField { secret: NodeId, field: String },

    /// Node referenced but never added
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// Node id registered twice
    #[error("Duplicate node: {0}")]
    DuplicateNode(NodeId),

    /// An object store is unencrypted or open to the public
    #[error("Object store {0} must be encrypted and block public access")]
    ExposedStore(NodeId),

    /// An operation expected a node of a different kind
    #[error("Node {node} is a {actual}, expected {expected}")]
    WrongKind {
        node: NodeId,
        expected: ResourceKind,
        actual: ResourceKind,
    },
}

/// The dependency relation contains a cycle
///
/// Carries every node the sort could not place. The builder's own wiring
/// never produces one, so seeing this error means a wiring rule is broken.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub struct DependencyCycleError {
    pub nodes: Vec<NodeId>,
}

impl fmt::Display for DependencyCycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.nodes.iter().map(NodeId::as_str).collect();
        write!(f, "Dependency cycle among: {}", names.join(", "))
    }
}

/// Errors returned while synthesizing a deployment graph
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Parameter or value constraint violated
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Structural assumption violated
    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    /// Dependency edges form a cycle
    #[error(transparent)]
    DependencyCycle(#[from] DependencyCycleError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for synthesis operations
pub type SynthesisResult<T> = Result<T, SynthesisError>;

impl From<serde_json::Error> for SynthesisError {
    fn from(err: serde_json::Error) -> Self {
        SynthesisError::Serialization(err.to_string())
    }
}

/// Configuration could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Environment variable {variable} has unparseable value {value:?}")]
    InvalidVariable { variable: String, value: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failures of the token-issuing function
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The capability is declared but has no active implementation
    #[error("Capability {0} is not active")]
    Inert(&'static str),

    #[error("Invocation context is missing {0}")]
    MissingContext(&'static str),

    #[error("Secret retrieval failed: {0}")]
    SecretRetrieval(String),

    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Failures handing a plan to the provisioning side
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("NATS connection error: {0}")]
    Connection(String),

    #[error("NATS publish error: {0}")]
    Publish(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_nodes() {
        let err = DependencyCycleError {
            nodes: vec![NodeId::new("A").unwrap(), NodeId::new("B").unwrap()],
        };
        assert_eq!(err.to_string(), "Dependency cycle among: A, B");

        let wrapped: SynthesisError = err.into();
        assert_eq!(wrapped.to_string(), "Dependency cycle among: A, B");
    }

    #[test]
    fn test_validation_converts() {
        let err: SynthesisError = ValidationError::UnknownParameter("Region".into()).into();
        assert!(matches!(err, SynthesisError::Validation(_)));
        assert_eq!(err.to_string(), "Validation error: Unknown parameter: Region");
    }
}
