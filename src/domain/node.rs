// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Nodes, Identifiers and Edges
//!
//! A [`ResourceNode`] is one unit of infrastructure in the deployment graph.
//! It carries a typed configuration payload, the nodes that must be ready
//! before it (dependency edges), and the permissions it holds on other nodes
//! (access edges).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::compute::{ClusterSpec, LoadBalancerSpec, LogGroupSpec, ServiceSpec};
use super::container::ContainerSpec;
use super::database::{DatabaseClusterSpec, DatabaseInstanceSpec};
use super::edge::DistributionSpec;
use super::function::FunctionSpec;
use super::invariants::{validate_identifier, ValidationError};
use super::network::NetworkFabric;
use super::secret::SecretEntry;
use super::storage::BucketSpec;
use super::ResourceKind;

/// Stable node identifier
///
/// Path-like: child constructs are named `<parent>/<child>`, e.g.
/// `Database/Instance1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        validate_identifier(&id)?;
        Ok(Self(id))
    }

    /// Identifier of a child construct
    pub fn child(&self, name: &str) -> Result<Self, ValidationError> {
        Self::new(format!("{}/{}", self.0, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Enclosing construct, if any
    pub fn parent(&self) -> Option<NodeId> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| NodeId(parent.to_string()))
    }

    /// Late-bound reference to one of this node's attributes
    pub fn attr(&self, attribute: impl Into<String>) -> AttrRef {
        AttrRef {
            node: self.clone(),
            attribute: attribute.into(),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for NodeId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Reference to an attribute only known once the backend has provisioned
/// the node (an endpoint hostname, a generated bucket name, a domain).
///
/// Renders as `${<node>.<attribute>}` so it can be embedded in plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttrRef {
    pub node: NodeId,
    pub attribute: String,
}

impl fmt::Display for AttrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}.{}}}", self.node, self.attribute)
    }
}

/// Permission held by one node on another
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Access {
    /// The source's network identity may open connections to `port` on the target
    Network { port: u16 },
    /// The source's execution identity holds `level` on the target
    Grant { level: GrantLevel },
}

/// Grant level on a storage resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantLevel {
    Read,
    Write,
    ReadWrite,
}

/// Directional access edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessEdge {
    pub target: NodeId,
    pub access: Access,
}

/// Typed configuration payload, one variant per [`ResourceKind`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "config", rename_all = "snake_case")]
pub enum NodePayload {
    Network(NetworkFabric),
    Database(DatabaseClusterSpec),
    DatabaseInstance(DatabaseInstanceSpec),
    Store(BucketSpec),
    Secret(SecretEntry),
    Cluster(ClusterSpec),
    Service(ServiceSpec),
    Container(ContainerSpec),
    LoadBalancer(LoadBalancerSpec),
    LogGroup(LogGroupSpec),
    Function(FunctionSpec),
    EdgeRouter(DistributionSpec),
}

impl NodePayload {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Network(_) => ResourceKind::Network,
            Self::Database(_) => ResourceKind::Database,
            Self::DatabaseInstance(_) => ResourceKind::DatabaseInstance,
            Self::Store(_) => ResourceKind::Store,
            Self::Secret(_) => ResourceKind::Secret,
            Self::Cluster(_) => ResourceKind::Cluster,
            Self::Service(_) => ResourceKind::Service,
            Self::Container(_) => ResourceKind::Container,
            Self::LoadBalancer(_) => ResourceKind::LoadBalancer,
            Self::LogGroup(_) => ResourceKind::LogGroup,
            Self::Function(_) => ResourceKind::Function,
            Self::EdgeRouter(_) => ResourceKind::EdgeRouter,
        }
    }
}

/// One unit of infrastructure in the deployment graph
///
/// # Invariants
/// - `id` is unique within its graph
/// - `depends_on` never contains `id` itself (enforced by the graph)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub id: NodeId,
    pub payload: NodePayload,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub depends_on: BTreeSet<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access: Vec<AccessEdge>,
}

impl ResourceNode {
    pub fn new(id: NodeId, payload: NodePayload) -> Self {
        Self {
            id,
            payload,
            depends_on: BTreeSet::new(),
            access: Vec::new(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.payload.kind()
    }

    /// Whether this node carries a dependency edge onto `other`
    pub fn has_dependency(&self, other: &NodeId) -> bool {
        self.depends_on.contains(other)
    }

    /// Access edges pointing at `target`
    pub fn access_to<'a>(&'a self, target: &NodeId) -> impl Iterator<Item = &'a Access> + 'a {
        let target = target.clone();
        self.access
            .iter()
            .filter(move |edge| edge.target == target)
            .map(|edge| &edge.access)
    }
}
