// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Kind Taxonomy
//!
//! The closed set of node kinds a deployment graph can contain. Each kind
//! maps to exactly one payload variant in [`NodePayload`](super::NodePayload).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a [`ResourceNode`](super::ResourceNode)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    // Foundation
    /// Isolated address space with its subnet partition
    Network,

    // Data
    /// Relational database cluster
    Database,
    /// Single engine instance inside a database cluster
    DatabaseInstance,
    /// Durable object store
    Store,
    /// Named secret material
    Secret,

    // Compute
    /// Container cluster
    Cluster,
    /// Long-running multi-container service
    Service,
    /// Container definition owned by a service
    Container,
    /// Load balancer fronting a service
    LoadBalancer,
    /// Log sink for container output
    LogGroup,
    /// Independently invocable function
    Function,

    // Edge
    /// Content-delivery layer in front of a load balancer
    EdgeRouter,
}

impl ResourceKind {
    /// Get the canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Database => "database",
            Self::DatabaseInstance => "database_instance",
            Self::Store => "store",
            Self::Secret => "secret",
            Self::Cluster => "cluster",
            Self::Service => "service",
            Self::Container => "container",
            Self::LoadBalancer => "load_balancer",
            Self::LogGroup => "log_group",
            Self::Function => "function",
            Self::EdgeRouter => "edge_router",
        }
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Network => "Network",
            Self::Database => "Database Cluster",
            Self::DatabaseInstance => "Database Instance",
            Self::Store => "Object Store",
            Self::Secret => "Secret",
            Self::Cluster => "Compute Cluster",
            Self::Service => "Service",
            Self::Container => "Container",
            Self::LoadBalancer => "Load Balancer",
            Self::LogGroup => "Log Group",
            Self::Function => "Function",
            Self::EdgeRouter => "Edge Router",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "network" | "vpc" => Ok(Self::Network),
            "database" | "db" => Ok(Self::Database),
            "database_instance" | "instance" => Ok(Self::DatabaseInstance),
            "store" | "bucket" => Ok(Self::Store),
            "secret" => Ok(Self::Secret),
            "cluster" => Ok(Self::Cluster),
            "service" => Ok(Self::Service),
            "container" => Ok(Self::Container),
            "load_balancer" | "lb" => Ok(Self::LoadBalancer),
            "log_group" | "logs" => Ok(Self::LogGroup),
            "function" => Ok(Self::Function),
            "edge_router" | "cdn" | "distribution" => Ok(Self::EdgeRouter),
            other => Err(format!("unknown resource kind: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_kind_parsing() {
        assert_eq!("vpc".parse::<ResourceKind>(), Ok(ResourceKind::Network));
        assert_eq!("bucket".parse::<ResourceKind>(), Ok(ResourceKind::Store));
        assert_eq!("CDN".parse::<ResourceKind>(), Ok(ResourceKind::EdgeRouter));
        assert!("router".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_canonical_round_trip() {
        for kind in [
            ResourceKind::Network,
            ResourceKind::DatabaseInstance,
            ResourceKind::LoadBalancer,
            ResourceKind::EdgeRouter,
        ] {
            assert_eq!(kind.as_str().parse::<ResourceKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(ResourceKind::Store.to_string(), "Object Store");
        assert_eq!(ResourceKind::EdgeRouter.display_name(), "Edge Router");
    }
}
