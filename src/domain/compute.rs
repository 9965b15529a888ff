// Copyright (c) 2025 - Cowboy AI, Inc.
//! Compute Cluster, Service, Load Balancer and Log Sink Specifications

use serde::{Deserialize, Serialize};

use super::NodeId;

/// Processor architecture for tasks and functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpuArchitecture {
    X86_64,
    Arm64,
}

impl CpuArchitecture {
    /// Container platform string for image builds
    pub fn platform(&self) -> &'static str {
        match self {
            Self::X86_64 => "linux/amd64",
            Self::Arm64 => "linux/arm64",
        }
    }
}

/// Container cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub network: NodeId,
    pub fargate_capacity_providers: bool,
}

/// Load balancer target health check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub path: String,
    pub interval_secs: u32,
    pub timeout_secs: u32,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            interval_secs: 30,
            timeout_secs: 5,
        }
    }
}

/// Public application load balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerSpec {
    pub network: NodeId,
    pub internet_facing: bool,
    pub listener_port: u16,
}

/// Multi-container service behind a load balancer
///
/// The first entry in `containers` is the default container; it receives
/// load-balancer traffic on `target_port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub cluster: NodeId,
    pub load_balancer: NodeId,
    pub cpu: u32,
    pub memory_mib: u32,
    pub cpu_architecture: CpuArchitecture,
    pub desired_count: u32,
    pub containers: Vec<NodeId>,
    pub target_port: u16,
    pub health_check: HealthCheck,
}

impl ServiceSpec {
    /// Container that receives load-balancer traffic
    pub fn default_container(&self) -> Option<&NodeId> {
        self.containers.first()
    }
}

/// Log group for container output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogGroupSpec {
    pub retention_days: u32,
}
