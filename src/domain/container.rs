// Copyright (c) 2025 - Cowboy AI, Inc.
//! Container Specifications
//!
//! A container belongs to exactly one service. Its environment is split in
//! two: literal values, and keys bound to a secret entry that the runtime
//! resolves at start-up.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::NodeId;

/// Where a container image comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ImageRef {
    /// Pulled from a public registry
    Registry { reference: String },
    /// Built from a local directory by the packaging step
    Asset { directory: String, platform: String },
}

impl ImageRef {
    pub fn registry(reference: impl Into<String>) -> Self {
        Self::Registry {
            reference: reference.into(),
        }
    }

    pub fn asset(directory: impl Into<String>, platform: impl Into<String>) -> Self {
        Self::Asset {
            directory: directory.into(),
            platform: platform.into(),
        }
    }
}

/// Reference to a secret, or one field of it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretRef {
    pub secret: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl SecretRef {
    pub fn whole(secret: NodeId) -> Self {
        Self {
            secret,
            field: None,
        }
    }

    pub fn field(secret: NodeId, field: impl Into<String>) -> Self {
        Self {
            secret,
            field: Some(field.into()),
        }
    }
}

/// Log destination for container output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSink {
    pub log_group: NodeId,
    pub stream_prefix: String,
}

/// Container definition
///
/// # Invariants
/// - Owned by exactly one service (`service`)
/// - Every key in `secrets` must resolve to a secret entry in the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub service: NodeId,
    pub image: ImageRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub essential: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    #[serde(default)]
    pub secrets: BTreeMap<String, SecretRef>,
    pub logging: LogSink,
}

impl ContainerSpec {
    pub fn new(
        name: impl Into<String>,
        service: NodeId,
        image: ImageRef,
        logging: LogSink,
    ) -> Self {
        Self {
            name: name.into(),
            service,
            image,
            port: None,
            essential: true,
            command: Vec::new(),
            environment: BTreeMap::new(),
            secrets: BTreeMap::new(),
            logging,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_command<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set a literal environment value, replacing any previous one
    pub fn add_environment(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.environment.insert(key.into(), value.into());
    }

    /// Bind an environment key to a secret
    pub fn add_secret(&mut self, key: impl Into<String>, secret: SecretRef) {
        self.secrets.insert(key.into(), secret);
    }

    /// Secrets this container reads, deduplicated
    pub fn referenced_secrets(&self) -> impl Iterator<Item = &NodeId> {
        let mut seen: Vec<&NodeId> = self.secrets.values().map(|r| &r.secret).collect();
        seen.sort();
        seen.dedup();
        seen.into_iter()
    }
}
