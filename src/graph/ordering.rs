// Copyright (c) 2025 - Cowboy AI, Inc.
//! Dependency Ordering
//!
//! Kahn's algorithm, run level by level so the result doubles as a
//! parallel provisioning schedule. Ties are broken by node id, which makes
//! every ordering deterministic for a given graph.
//!
//! Dependencies on nodes outside the iterated set are ignored here;
//! [`DeploymentGraph::validate_references`](super::DeploymentGraph::validate_references)
//! reports them.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::domain::{NodeId, ResourceNode};
use crate::errors::DependencyCycleError;

/// Group nodes into waves; every dependency of a node in wave `i` lies in an
/// earlier wave
pub fn provisioning_waves<'a, I>(nodes: I) -> Result<Vec<Vec<NodeId>>, DependencyCycleError>
where
    I: IntoIterator<Item = &'a ResourceNode>,
{
    let nodes: BTreeMap<&NodeId, &ResourceNode> = nodes.into_iter().map(|n| (&n.id, n)).collect();

    let mut pending: BTreeMap<&NodeId, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<&NodeId, Vec<&NodeId>> = BTreeMap::new();

    for (id, node) in &nodes {
        let known: Vec<&NodeId> = node
            .depends_on
            .iter()
            .filter(|dep| nodes.contains_key(dep))
            .collect();
        pending.insert(*id, known.len());
        for dep in known {
            dependents.entry(dep).or_default().push(*id);
        }
    }

    let mut ready: BTreeSet<&NodeId> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut waves = Vec::new();
    let mut placed = 0;

    while !ready.is_empty() {
        let wave: Vec<&NodeId> = std::mem::take(&mut ready).into_iter().collect();
        for id in &wave {
            pending.remove(id);
            for dependent in dependents.get(id).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }
        placed += wave.len();
        waves.push(wave.into_iter().cloned().collect());
    }

    if placed < nodes.len() {
        let cycle: Vec<NodeId> = pending.keys().map(|id| (*id).clone()).collect();
        warn!(nodes = ?cycle, "dependency cycle detected");
        return Err(DependencyCycleError { nodes: cycle });
    }

    Ok(waves)
}

/// Order in which nodes can be created
pub fn creation_order<'a, I>(nodes: I) -> Result<Vec<NodeId>, DependencyCycleError>
where
    I: IntoIterator<Item = &'a ResourceNode>,
{
    Ok(provisioning_waves(nodes)?.into_iter().flatten().collect())
}

/// Order in which nodes can be destroyed
pub fn teardown_order<'a, I>(nodes: I) -> Result<Vec<NodeId>, DependencyCycleError>
where
    I: IntoIterator<Item = &'a ResourceNode>,
{
    let mut order = creation_order(nodes)?;
    order.reverse();
    Ok(order)
}
