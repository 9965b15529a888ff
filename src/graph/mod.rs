// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Graph
//!
//! The graph owns every [`ResourceNode`] of a topology. Nodes enter it once
//! during assembly; afterwards they change only through named [`Patch`]es,
//! which are recorded so a reader can see every post-construction mutation.
//!
//! # Edge Discipline
//!
//! ```text
//! dependency edge:  dependent ──depends_on──▶ dependency   (must be ready first)
//! access edge:      source ──access──▶ target              (permission only)
//! ```
//!
//! Dependency edges are checked on insertion: an edge that would close a
//! cycle is refused with [`DependencyCycleError`]. Access edges never affect
//! ordering.

pub mod ordering;
pub mod patch;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    Access, AccessEdge, ContainerSpec, DatabaseClusterSpec, DatabaseInstanceSpec,
    DistributionSpec, NodeId, NodePayload, ResourceKind, ResourceNode, SecretEntry, ServiceSpec,
};
use crate::errors::{DependencyCycleError, SynthesisResult, TopologyError};

pub use ordering::{creation_order, provisioning_waves, teardown_order};
pub use patch::Patch;

/// Named value published once the graph is realized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackOutput {
    pub value: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub description: String,
}

/// Nodes, edges, outputs and the applied-patch log of one topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentGraph {
    /// Stable identity derived from the stack name
    pub id: Uuid,
    pub stack_name: String,
    nodes: BTreeMap<NodeId, ResourceNode>,
    #[serde(default)]
    outputs: BTreeMap<String, StackOutput>,
    #[serde(default)]
    patches: Vec<Patch>,
}

macro_rules! typed_accessors {
    ($get:ident, $get_mut:ident, $variant:ident, $ty:ty, $kind:expr) => {
        pub fn $get(&self, id: &NodeId) -> Result<&$ty, TopologyError> {
            match &self.require(id)?.payload {
                NodePayload::$variant(spec) => Ok(spec),
                other => Err(TopologyError::WrongKind {
                    node: id.clone(),
                    expected: $kind,
                    actual: other.kind(),
                }),
            }
        }

        pub fn $get_mut(&mut self, id: &NodeId) -> Result<&mut $ty, TopologyError> {
            match &mut self.require_mut(id)?.payload {
                NodePayload::$variant(spec) => Ok(spec),
                other => Err(TopologyError::WrongKind {
                    node: id.clone(),
                    expected: $kind,
                    actual: other.kind(),
                }),
            }
        }
    };
}

impl DeploymentGraph {
    pub fn new(stack_name: impl Into<String>) -> Self {
        let stack_name = stack_name.into();
        let id = Uuid::new_v5(
            &Uuid::NAMESPACE_URL,
            format!("cim-topology:{stack_name}").as_bytes(),
        );
        Self {
            id,
            stack_name,
            nodes: BTreeMap::new(),
            outputs: BTreeMap::new(),
            patches: Vec::new(),
        }
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Insert a node
    ///
    /// # Invariant
    /// - Ids are unique
    pub fn add_node(
        &mut self,
        id: NodeId,
        payload: NodePayload,
    ) -> Result<&mut ResourceNode, TopologyError> {
        if self.nodes.contains_key(&id) {
            return Err(TopologyError::DuplicateNode(id));
        }
        debug!(node = %id, kind = payload.kind().as_str(), "adding node");
        Ok(self
            .nodes
            .entry(id.clone())
            .or_insert_with(|| ResourceNode::new(id, payload)))
    }

    pub fn node(&self, id: &NodeId) -> Option<&ResourceNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn require(&self, id: &NodeId) -> Result<&ResourceNode, TopologyError> {
        self.nodes
            .get(id)
            .ok_or_else(|| TopologyError::UnknownNode(id.clone()))
    }

    pub fn require_mut(&mut self, id: &NodeId) -> Result<&mut ResourceNode, TopologyError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| TopologyError::UnknownNode(id.clone()))
    }

    /// Nodes in identifier order
    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values()
    }

    pub fn nodes_of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values().filter(move |n| n.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    typed_accessors!(container, container_mut, Container, ContainerSpec, ResourceKind::Container);
    typed_accessors!(secret, secret_mut, Secret, SecretEntry, ResourceKind::Secret);
    typed_accessors!(service, service_mut, Service, ServiceSpec, ResourceKind::Service);
    typed_accessors!(database, database_mut, Database, DatabaseClusterSpec, ResourceKind::Database);
    typed_accessors!(
        database_instance,
        database_instance_mut,
        DatabaseInstance,
        DatabaseInstanceSpec,
        ResourceKind::DatabaseInstance
    );
    typed_accessors!(
        distribution,
        distribution_mut,
        EdgeRouter,
        DistributionSpec,
        ResourceKind::EdgeRouter
    );

    // ========================================================================
    // Edges
    // ========================================================================

    /// Record that `dependent` must wait for `dependency`
    ///
    /// # Invariants
    /// - Both nodes exist
    /// - The edge does not close a cycle (self-edges included)
    pub fn add_dependency(
        &mut self,
        dependent: &NodeId,
        dependency: &NodeId,
    ) -> SynthesisResult<()> {
        self.require(dependency)?;
        self.require(dependent)?;

        if dependent == dependency || self.reaches(dependency, dependent) {
            return Err(DependencyCycleError {
                nodes: vec![dependent.clone(), dependency.clone()],
            }
            .into());
        }

        self.require_mut(dependent)?
            .depends_on
            .insert(dependency.clone());
        debug!(%dependent, %dependency, "dependency edge");
        Ok(())
    }

    /// Whether `from` transitively depends on `to`
    pub fn reaches(&self, from: &NodeId, to: &NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = std::collections::BTreeSet::new();
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.depends_on.iter());
            }
        }
        false
    }

    /// Grant `source` an access permission on `target`; repeated grants are no-ops
    pub fn add_access(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        access: Access,
    ) -> Result<(), TopologyError> {
        self.require(target)?;
        let edge = AccessEdge {
            target: target.clone(),
            access,
        };
        let node = self.require_mut(source)?;
        if !node.access.contains(&edge) {
            debug!(%source, %target, "access edge");
            node.access.push(edge);
        }
        Ok(())
    }

    // ========================================================================
    // Outputs and patches
    // ========================================================================

    pub fn add_output(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        description: impl Into<String>,
    ) {
        self.outputs.insert(
            name.into(),
            StackOutput {
                value: value.into(),
                description: description.into(),
            },
        );
    }

    pub fn outputs(&self) -> &BTreeMap<String, StackOutput> {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs.get(name).map(|o| o.value.as_str())
    }

    /// Patches applied so far, in application order
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Apply a post-construction patch and record it
    ///
    /// A patch identical to the latest logged patch of the same name on the
    /// same target is not logged twice, so replaying the log in order always
    /// reproduces the current state.
    pub fn apply_patch(&mut self, patch: Patch) -> SynthesisResult<()> {
        patch.apply_to(self)?;
        let latest = self
            .patches
            .iter()
            .rev()
            .find(|logged| logged.name() == patch.name() && logged.target() == patch.target());
        if latest != Some(&patch) {
            self.patches.push(patch);
        }
        Ok(())
    }

    // ========================================================================
    // Verification
    // ========================================================================

    /// Every edge points at a node in the graph
    pub fn validate_references(&self) -> Result<(), TopologyError> {
        for node in self.nodes.values() {
            let targets = node
                .depends_on
                .iter()
                .chain(node.access.iter().map(|edge| &edge.target));
            for target in targets {
                self.require(target)?;
            }
        }
        Ok(())
    }

    /// Every secret-bound environment key resolves to a secret entry
    /// (and to a field that entry exposes)
    pub fn validate_secret_bindings(&self) -> Result<(), TopologyError> {
        for node in self.nodes.values() {
            let NodePayload::Container(container) = &node.payload else {
                continue;
            };
            for (key, secret_ref) in &container.secrets {
                let secret = match self.nodes.get(&secret_ref.secret).map(|n| &n.payload) {
                    Some(NodePayload::Secret(secret)) => secret,
                    _ => {
                        return Err(TopologyError::UnresolvedSecret {
                            container: node.id.clone(),
                            key: key.clone(),
                            secret: secret_ref.secret.clone(),
                        })
                    }
                };
                if !secret.has_field(secret_ref.field.as_deref()) {
                    return Err(TopologyError::UnknownSecretField {
                        secret: secret_ref.secret.clone(),
                        field: secret_ref.field.clone().unwrap_or_default(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Every object store is encrypted and blocks public access
    pub fn validate_storage(&self) -> Result<(), TopologyError> {
        for node in self.nodes.values() {
            if let NodePayload::Store(spec) = &node.payload {
                if !spec.is_locked_down() {
                    return Err(TopologyError::ExposedStore(node.id.clone()));
                }
            }
        }
        Ok(())
    }

    /// All structural checks; a graph that passes can be handed to a backend
    pub fn verify(&self) -> SynthesisResult<()> {
        self.validate_references()?;
        self.validate_secret_bindings()?;
        self.validate_storage()?;
        provisioning_waves(self.nodes())?;
        Ok(())
    }

    /// Ordering metadata for the backend
    pub fn plan(&self) -> SynthesisResult<ProvisioningPlan> {
        self.verify()?;
        let waves = provisioning_waves(self.nodes())?;
        let creation_order: Vec<NodeId> = waves.iter().flatten().cloned().collect();
        let teardown_order = creation_order.iter().rev().cloned().collect();

        Ok(ProvisioningPlan {
            graph: self.clone(),
            creation_order,
            teardown_order,
            waves,
        })
    }

    pub fn to_json(&self) -> SynthesisResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A verified graph plus the orderings a backend needs
///
/// `waves[i]` only depends on nodes in `waves[..i]`, so each wave can be
/// provisioned in parallel. Teardown runs creation order in reverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisioningPlan {
    pub graph: DeploymentGraph,
    pub creation_order: Vec<NodeId>,
    pub teardown_order: Vec<NodeId>,
    pub waves: Vec<Vec<NodeId>>,
}

impl ProvisioningPlan {
    pub fn to_json(&self) -> SynthesisResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
