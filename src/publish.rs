// Copyright (c) 2025 - Cowboy AI, Inc.
//! Plan Hand-off over NATS
//!
//! A verified [`ProvisioningPlan`] is published as JSON for whatever backend
//! realizes it.
//!
//! # Subject Pattern
//!
//! ```text
//! {prefix}.{stack}.plan.synthesized
//! ```
//!
//! The stack token is lowercased and stripped of characters NATS treats as
//! separators or wildcards. Each message carries a `Nats-Msg-Id` header with a
//! time-ordered UUID so JetStream deduplicates redeliveries.

use async_nats::{Client, ConnectOptions, HeaderMap};
use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::NatsConfig;
use crate::errors::PublishError;
use crate::graph::ProvisioningPlan;

/// Subject for a synthesized plan of `stack`
pub fn plan_subject(prefix: &str, stack: &str) -> String {
    let token: String = stack
        .chars()
        .map(|c| match c {
            '.' | '*' | '>' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect();
    format!("{prefix}.{token}.plan.synthesized")
}

/// Destination for synthesized plans
#[async_trait]
pub trait GraphPublisher: Send + Sync {
    async fn publish(&self, plan: &ProvisioningPlan) -> Result<(), PublishError>;
}

/// Publishes plans on a NATS connection
#[derive(Clone)]
pub struct NatsGraphPublisher {
    client: Client,
    subject_prefix: String,
}

impl NatsGraphPublisher {
    pub async fn connect(config: &NatsConfig) -> Result<Self, PublishError> {
        let options = ConnectOptions::new()
            .name(&config.name)
            .connection_timeout(config.connect_timeout())
            .request_timeout(Some(config.request_timeout()));

        let client = async_nats::connect_with_options(config.servers.join(","), options)
            .await
            .map_err(|e| PublishError::Connection(e.to_string()))?;

        info!("Connected to NATS at {:?}", config.servers);
        Ok(Self::new(client, &config.subject_prefix))
    }

    pub fn new(client: Client, subject_prefix: impl Into<String>) -> Self {
        Self {
            client,
            subject_prefix: subject_prefix.into(),
        }
    }
}

#[async_trait]
impl GraphPublisher for NatsGraphPublisher {
    async fn publish(&self, plan: &ProvisioningPlan) -> Result<(), PublishError> {
        let subject = plan_subject(&self.subject_prefix, &plan.graph.stack_name);
        let payload = serde_json::to_vec(plan)?;

        let mut headers = HeaderMap::new();
        headers.insert("Nats-Msg-Id", Uuid::now_v7().to_string().as_str());

        self.client
            .publish_with_headers(subject.clone(), headers, payload.into())
            .await
            .map_err(|e| PublishError::Publish(e.to_string()))?;
        self.client
            .flush()
            .await
            .map_err(|e| PublishError::Publish(e.to_string()))?;

        debug!("Published plan to subject: {}", subject);
        Ok(())
    }
}
