// Copyright (c) 2025 - Cowboy AI, Inc.
//! Relational Database Cluster Specifications

use serde::{Deserialize, Serialize};

use super::invariants::{validate_scaling, ValidationResult};
use super::NodeId;

/// Instance class that scales within a capacity-unit range
pub const SERVERLESS_INSTANCE_CLASS: &str = "db.serverless";

/// Engine-provided shape assigned before retargeting
pub const DEFAULT_INSTANCE_CLASS: &str = "db.t3.medium";

/// Elastic capacity bounds, in capacity units
///
/// # Invariants
/// - `0 < min_capacity <= max_capacity`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingConfiguration {
    pub min_capacity: f64,
    pub max_capacity: f64,
}

impl ScalingConfiguration {
    pub fn new(min_capacity: f64, max_capacity: f64) -> Result<Self, super::ValidationError> {
        let scaling = Self {
            min_capacity,
            max_capacity,
        };
        scaling.validate()?;
        Ok(scaling)
    }

    pub fn validate(&self) -> ValidationResult {
        validate_scaling(self.min_capacity, self.max_capacity)
    }
}

impl Default for ScalingConfiguration {
    fn default() -> Self {
        Self {
            min_capacity: 0.5,
            max_capacity: 32.0,
        }
    }
}

/// Database engine and version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseEngine {
    pub family: String,
    pub version: String,
}

impl DatabaseEngine {
    pub fn aurora_mysql(version: impl Into<String>) -> Self {
        Self {
            family: "aurora-mysql".to_string(),
            version: version.into(),
        }
    }
}

/// Cluster wrapper around one or more engine instances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseClusterSpec {
    pub engine: DatabaseEngine,
    pub network: NodeId,
    pub port: u16,
    pub storage_encrypted: bool,
    pub default_database_name: String,
    /// Generated credentials owned by this cluster
    pub credentials: NodeId,
    /// Instance children, primary first
    pub instances: Vec<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serverless_v2_scaling: Option<ScalingConfiguration>,
}

/// One engine instance inside a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInstanceSpec {
    pub cluster: NodeId,
    /// 1-based position within the cluster
    pub ordinal: u32,
    pub instance_class: String,
    pub performance_insights: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scaling() {
        let scaling = ScalingConfiguration::default();
        assert_eq!(scaling.min_capacity, 0.5);
        assert_eq!(scaling.max_capacity, 32.0);
        assert!(scaling.validate().is_ok());
    }

    #[test]
    fn test_scaling_validation() {
        assert!(ScalingConfiguration::new(1.0, 16.0).is_ok());
        assert!(ScalingConfiguration::new(0.0, 16.0).is_err());
        assert!(ScalingConfiguration::new(8.0, 4.0).is_err());
    }
}
