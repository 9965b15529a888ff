// Copyright (c) 2025 - Cowboy AI, Inc.
//! Post-Construction Patches
//!
//! Assembly is two-phase. Phase 1 inserts nodes with provisional
//! configuration; phase 2 applies a bounded set of named patches. Each patch:
//!
//! - targets exactly one node of a known kind
//! - is idempotent (applying it twice leaves the graph as applying it once)
//! - overwrites rather than merges, so a later patch of the same kind wins
//!
//! Patches never add dependency edges. A value that a patch injects may
//! contain late-bound attribute references; the backend resolves those
//! after the referenced node exists.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{HealthCheck, NodeId, ScalingConfiguration};
use crate::errors::SynthesisResult;

use super::DeploymentGraph;

/// Named post-construction mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "patch", rename_all = "snake_case")]
pub enum Patch {
    /// Overwrite a database instance's class
    RetargetInstanceClass {
        instance: NodeId,
        instance_class: String,
    },
    /// Write elastic capacity bounds onto a database cluster
    ConfigureScaling {
        cluster: NodeId,
        scaling: ScalingConfiguration,
    },
    /// Replace a service's load-balancer health check
    OverrideHealthCheck {
        service: NodeId,
        health_check: HealthCheck,
    },
    /// Set one literal environment value on a container
    AddContainerEnvironment {
        container: NodeId,
        key: String,
        value: String,
    },
}

impl Patch {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RetargetInstanceClass { .. } => "retarget_instance_class",
            Self::ConfigureScaling { .. } => "configure_scaling",
            Self::OverrideHealthCheck { .. } => "override_health_check",
            Self::AddContainerEnvironment { .. } => "add_container_environment",
        }
    }

    /// Node the patch mutates
    pub fn target(&self) -> &NodeId {
        match self {
            Self::RetargetInstanceClass { instance, .. } => instance,
            Self::ConfigureScaling { cluster, .. } => cluster,
            Self::OverrideHealthCheck { service, .. } => service,
            Self::AddContainerEnvironment { container, .. } => container,
        }
    }

    /// Apply without recording; use [`DeploymentGraph::apply_patch`]
    pub(crate) fn apply_to(&self, graph: &mut DeploymentGraph) -> SynthesisResult<()> {
        match self {
            Self::RetargetInstanceClass {
                instance,
                instance_class,
            } => {
                graph.database_instance_mut(instance)?.instance_class = instance_class.clone();
            }
            Self::ConfigureScaling { cluster, scaling } => {
                scaling.validate()?;
                graph.database_mut(cluster)?.serverless_v2_scaling = Some(*scaling);
            }
            Self::OverrideHealthCheck {
                service,
                health_check,
            } => {
                graph.service_mut(service)?.health_check = health_check.clone();
            }
            Self::AddContainerEnvironment {
                container,
                key,
                value,
            } => {
                graph.container_mut(container)?.add_environment(key, value);
            }
        }

        debug!(patch = self.name(), target = %self.target(), "patch applied");
        Ok(())
    }
}
