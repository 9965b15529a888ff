// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Synthesizer
//!
//! Builds the deployment graph, prints its provisioning plan as JSON and,
//! when `NATS_URL` is set, publishes the plan for a provisioning backend.
//!
//! Run with: cargo run --bin topology-synth
//!
//! Environment:
//! - `OAUTH_PROVIDER`, `CLIENT_ID`, `CLIENT_SECRET`, `JWT_ISSUER` - parameters
//! - `TOPOLOGY_CONFIG` - optional JSON configuration file
//! - `TOPOLOGY_*` - individual overrides (see `TopologyConfig::from_env`)
//! - `NATS_URL` - publish target

use anyhow::{Context, Result};
use cim_topology::domain::parameters::{CLIENT_ID, CLIENT_SECRET, JWT_ISSUER, OAUTH_PROVIDER};
use cim_topology::{
    GraphPublisher, NatsConfig, NatsGraphPublisher, ParameterSet, TopologyBuilder,
    TopologyConfig,
};
use tracing::info;

/// Parameter values supplied through the environment
fn parameters_from_env() -> ParameterSet {
    let mut parameters = ParameterSet::standard();
    for (variable, parameter) in [
        ("OAUTH_PROVIDER", OAUTH_PROVIDER),
        ("CLIENT_ID", CLIENT_ID),
        ("CLIENT_SECRET", CLIENT_SECRET),
        ("JWT_ISSUER", JWT_ISSUER),
    ] {
        if let Ok(value) = std::env::var(variable) {
            parameters.set(parameter, value);
        }
    }
    parameters
}

fn load_config() -> Result<TopologyConfig> {
    let config = match std::env::var("TOPOLOGY_CONFIG") {
        Ok(path) => TopologyConfig::from_json_file(&path)
            .with_context(|| format!("Failed to load configuration from {path}"))?
            .with_overrides(|key| std::env::var(key).ok())?,
        Err(_) => TopologyConfig::from_env()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("🚀 Starting topology synthesis");

    let config = load_config().context("Invalid topology configuration")?;
    info!("📋 Configuration loaded:");
    info!("  - Stack: {}", config.stack_name);
    info!("  - Region: {}", config.region);
    info!(
        "  - Database capacity: {} - {}",
        config.database.scaling.min_capacity, config.database.scaling.max_capacity
    );

    let graph = TopologyBuilder::new(config)
        .build(&parameters_from_env())
        .context("Failed to build topology")?;
    let plan = graph.plan().context("Failed to order topology")?;
    info!(
        "✅ Plan ready: {} nodes in {} waves",
        plan.creation_order.len(),
        plan.waves.len()
    );

    println!("{}", plan.to_json()?);

    if let Ok(nats_url) = std::env::var("NATS_URL") {
        info!("🔌 Connecting to NATS at {}", nats_url);
        let nats = NatsConfig {
            servers: vec![nats_url],
            ..NatsConfig::default()
        };
        let publisher = NatsGraphPublisher::connect(&nats)
            .await
            .context("Failed to connect to NATS")?;
        publisher
            .publish(&plan)
            .await
            .context("Failed to publish plan")?;
        info!("📡 Plan published");
    }

    Ok(())
}
