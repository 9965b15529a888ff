// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-topology
//!
//! Deterministic parameters and node ids shared by the integration suites.
//! Every graph built here uses the default configuration unless a test says
//! otherwise.

#![allow(dead_code)]

use cim_topology::domain::parameters::{CLIENT_ID, CLIENT_SECRET, JWT_ISSUER, OAUTH_PROVIDER};
use cim_topology::{DeploymentGraph, NodeId, ParameterSet, TopologyBuilder, TopologyConfig};

pub const CLIENT_ID_VALUE: &str = "abc";
pub const CLIENT_SECRET_VALUE: &str = "xyz";
pub const JWT_ISSUER_VALUE: &str = "https://issuer.example.com=audience-1";

pub const SERVICE: &str = "Service";
pub const PROXY: &str = "Service/oauth2-proxy";
pub const APPLICATION: &str = "Service/mlflow";
pub const DATABASE: &str = "Database";
pub const PRIMARY_INSTANCE: &str = "Database/Instance1";
pub const OAUTH_SECRET: &str = "OauthSecret";
pub const CDN: &str = "CDN";

pub fn id(s: &str) -> NodeId {
    NodeId::new(s).expect("fixture node id is valid")
}

/// Parameters with client credentials set
pub fn credentials() -> ParameterSet {
    ParameterSet::standard()
        .with(OAUTH_PROVIDER, "github")
        .with(CLIENT_ID, CLIENT_ID_VALUE)
        .with(CLIENT_SECRET, CLIENT_SECRET_VALUE)
        .with(JWT_ISSUER, JWT_ISSUER_VALUE)
}

pub fn build(parameters: &ParameterSet) -> DeploymentGraph {
    TopologyBuilder::default()
        .build(parameters)
        .expect("default topology builds")
}

pub fn build_with(config: TopologyConfig) -> DeploymentGraph {
    TopologyBuilder::new(config)
        .build(&credentials())
        .expect("configured topology builds")
}
