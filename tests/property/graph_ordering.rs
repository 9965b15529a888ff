// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Dependency Ordering
//!
//! Random DAGs are generated by only letting node `i` depend on nodes with a
//! smaller index; the sorter never sees that order.

use cim_topology::domain::{LogGroupSpec, NodePayload};
use cim_topology::graph::{creation_order, provisioning_waves, teardown_order};
use cim_topology::{DeploymentGraph, NodeId, ResourceNode, SynthesisError};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn node_id(i: usize) -> NodeId {
    NodeId::new(format!("Node{i}")).unwrap()
}

fn payload() -> NodePayload {
    NodePayload::LogGroup(LogGroupSpec { retention_days: 1 })
}

/// Nodes `0..n` with edges only from higher to lower indices
fn arb_dag() -> impl Strategy<Value = Vec<ResourceNode>> {
    (1usize..24).prop_flat_map(|n| {
        prop::collection::vec(prop::collection::vec(any::<bool>(), n), n).prop_map(move |matrix| {
            (0..n)
                .map(|i| {
                    let mut node = ResourceNode::new(node_id(i), payload());
                    node.depends_on = (0..i).filter(|&j| matrix[i][j]).map(node_id).collect();
                    node
                })
                .rev()
                .collect()
        })
    })
}

proptest! {
    /// Every dependency lands in an earlier wave, every node exactly once
    #[test]
    fn prop_waves_respect_dependencies(nodes in arb_dag()) {
        let waves = provisioning_waves(&nodes).unwrap();

        let mut wave_of = BTreeMap::new();
        for (index, wave) in waves.iter().enumerate() {
            for id in wave {
                prop_assert!(wave_of.insert(id.clone(), index).is_none());
            }
        }
        prop_assert_eq!(wave_of.len(), nodes.len());

        for node in &nodes {
            for dep in &node.depends_on {
                prop_assert!(wave_of[dep] < wave_of[&node.id]);
            }
        }
    }

    /// Teardown is creation reversed
    #[test]
    fn prop_teardown_reverses_creation(nodes in arb_dag()) {
        let mut creation = creation_order(&nodes).unwrap();
        creation.reverse();
        prop_assert_eq!(creation, teardown_order(&nodes).unwrap());
    }

    /// Input order does not change the result
    #[test]
    fn prop_ordering_is_deterministic(nodes in arb_dag()) {
        let mut shuffled = nodes.clone();
        shuffled.reverse();
        prop_assert_eq!(
            provisioning_waves(&nodes).unwrap(),
            provisioning_waves(&shuffled).unwrap()
        );
    }

    /// A back edge from the lowest node to the highest closes a cycle
    #[test]
    fn prop_back_edge_is_detected(nodes in arb_dag()) {
        let mut nodes = nodes;
        let count = nodes.len();
        prop_assume!(count > 1);

        // Chain every node to its predecessor, then close the loop
        for node in nodes.iter_mut() {
            let index: usize = node.id.as_str()["Node".len()..].parse().unwrap();
            if index > 0 {
                node.depends_on.insert(node_id(index - 1));
            } else {
                node.depends_on.insert(node_id(count - 1));
            }
        }

        let err = provisioning_waves(&nodes).unwrap_err();
        prop_assert_eq!(err.nodes.len(), count);
    }

    /// Edges accepted one at a time never produce a cyclic graph
    #[test]
    fn prop_graph_refuses_cycles(
        edges in prop::collection::vec((0usize..12, 0usize..12), 0..48)
    ) {
        let mut graph = DeploymentGraph::new("Random");
        for i in 0..12 {
            graph.add_node(node_id(i), payload()).unwrap();
        }

        for (from, to) in edges {
            match graph.add_dependency(&node_id(from), &node_id(to)) {
                Ok(()) => {}
                Err(SynthesisError::DependencyCycle(_)) => {
                    prop_assert!(from == to || graph.reaches(&node_id(to), &node_id(from)));
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }

        prop_assert!(graph.verify().is_ok());
    }
}
