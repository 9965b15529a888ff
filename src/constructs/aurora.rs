// Copyright (c) 2025 - Cowboy AI, Inc.
//! Scalable Database Cluster
//!
//! Inserts a relational cluster, its generated credentials and its instance
//! nodes, then retargets every instance to the elastic class and writes the
//! capacity bounds. Both mutations go through [`Patch`]es so they appear in
//! the graph's patch log.
//!
//! ```text
//! Database/Secret ◀── Database ──▶ Network
//!                        ▲
//!          Database/Instance1 .. Database/InstanceN
//! ```
//!
//! The instances are returned in an [`InstanceRegistry`]; callers never look
//! them up by name.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::domain::{
    AttrRef, DatabaseClusterSpec, DatabaseEngine, DatabaseInstanceSpec, GeneratorPolicy, NodeId,
    NodePayload, ScalingConfiguration, SecretEntry, SERVERLESS_INSTANCE_CLASS,
};
use crate::errors::{SynthesisResult, TopologyError};
use crate::graph::{DeploymentGraph, Patch};

/// Fields exposed by the generated credential secret
pub const CREDENTIAL_FIELDS: [&str; 6] =
    ["username", "password", "dbname", "host", "port", "engine"];

/// Shape of the cluster before the elastic retarget
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseProps {
    pub engine: DatabaseEngine,
    pub instances: u32,
    pub port: u16,
    pub default_database_name: String,
    pub master_username: String,
    pub provisional_instance_class: String,
    pub performance_insights: bool,
    pub storage_encrypted: bool,
    pub scaling: ScalingConfiguration,
}

/// Instance nodes owned by one cluster, in ordinal order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstanceRegistry {
    instances: Vec<NodeId>,
}

impl InstanceRegistry {
    /// The writer instance; gate readiness on this one
    pub fn primary(&self) -> Option<&NodeId> {
        self.instances.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.instances.iter()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    fn register(&mut self, id: NodeId) {
        self.instances.push(id);
    }
}

/// Handle to a database cluster already in the graph
#[derive(Debug, Clone)]
pub struct ScalableDatabaseCluster {
    cluster: NodeId,
    credentials: NodeId,
    instances: InstanceRegistry,
    port: u16,
}

impl ScalableDatabaseCluster {
    /// Insert the cluster under `id`, attached to `network`
    ///
    /// # Errors
    /// - [`TopologyError::NoInstanceChildren`] when `props.instances` is zero
    /// - [`ValidationError`](crate::domain::ValidationError) when the scaling bounds are invalid
    pub fn attach(
        graph: &mut DeploymentGraph,
        id: NodeId,
        network: &NodeId,
        props: &DatabaseProps,
    ) -> SynthesisResult<Self> {
        let credentials = id.child("Secret")?;
        graph.add_node(
            credentials.clone(),
            NodePayload::Secret(SecretEntry::generated(
                format!("Generated credentials for {id}"),
                credential_policy(&props.master_username),
            )),
        )?;

        graph.add_node(
            id.clone(),
            NodePayload::Database(DatabaseClusterSpec {
                engine: props.engine.clone(),
                network: network.clone(),
                port: props.port,
                storage_encrypted: props.storage_encrypted,
                default_database_name: props.default_database_name.clone(),
                credentials: credentials.clone(),
                instances: Vec::new(),
                serverless_v2_scaling: None,
            }),
        )?;
        graph.add_dependency(&id, network)?;
        graph.add_dependency(&id, &credentials)?;

        let mut instances = InstanceRegistry::default();
        for ordinal in 1..=props.instances {
            let instance = id.child(&format!("Instance{ordinal}"))?;
            graph.add_node(
                instance.clone(),
                NodePayload::DatabaseInstance(DatabaseInstanceSpec {
                    cluster: id.clone(),
                    ordinal,
                    instance_class: props.provisional_instance_class.clone(),
                    performance_insights: props.performance_insights,
                }),
            )?;
            graph.add_dependency(&instance, &id)?;
            instances.register(instance);
        }

        if instances.is_empty() {
            return Err(TopologyError::NoInstanceChildren { cluster: id }.into());
        }
        graph.database_mut(&id)?.instances = instances.iter().cloned().collect();

        let handle = Self {
            cluster: id,
            credentials,
            instances,
            port: props.port,
        };
        handle.retarget_instances(graph)?;
        handle.configure_scaling(graph, props.scaling)?;

        info!(
            cluster = %handle.cluster,
            instances = handle.instances.len(),
            "database cluster attached"
        );
        Ok(handle)
    }

    fn retarget_instances(&self, graph: &mut DeploymentGraph) -> SynthesisResult<()> {
        for instance in self.instances.iter() {
            debug!(%instance, class = SERVERLESS_INSTANCE_CLASS, "retargeting instance");
            graph.apply_patch(Patch::RetargetInstanceClass {
                instance: instance.clone(),
                instance_class: SERVERLESS_INSTANCE_CLASS.to_string(),
            })?;
        }
        Ok(())
    }

    /// Write capacity bounds onto the cluster, replacing earlier ones
    pub fn configure_scaling(
        &self,
        graph: &mut DeploymentGraph,
        scaling: ScalingConfiguration,
    ) -> SynthesisResult<()> {
        graph.apply_patch(Patch::ConfigureScaling {
            cluster: self.cluster.clone(),
            scaling,
        })
    }

    pub fn id(&self) -> &NodeId {
        &self.cluster
    }

    pub fn credentials(&self) -> &NodeId {
        &self.credentials
    }

    pub fn instances(&self) -> &InstanceRegistry {
        &self.instances
    }

    /// Readiness gate for consumers of the database
    pub fn primary_instance(&self) -> Result<&NodeId, TopologyError> {
        self.instances
            .primary()
            .ok_or_else(|| TopologyError::NoInstanceChildren {
                cluster: self.cluster.clone(),
            })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn endpoint_address(&self) -> AttrRef {
        self.cluster.attr("Endpoint.Address")
    }

    pub fn endpoint_port(&self) -> AttrRef {
        self.cluster.attr("Endpoint.Port")
    }
}

fn credential_policy(username: &str) -> GeneratorPolicy {
    let mut template = BTreeMap::new();
    template.insert("username".to_string(), username.to_string());

    GeneratorPolicy {
        template,
        generate_key: Some("password".to_string()),
        attached_fields: CREDENTIAL_FIELDS[2..]
            .iter()
            .map(|f| f.to_string())
            .collect(),
        length: 30,
        exclude_punctuation: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cidr, NetworkFabric, DEFAULT_INSTANCE_CLASS};
    use crate::errors::SynthesisError;

    fn id(s: &str) -> NodeId {
        NodeId::new(s).unwrap()
    }

    fn props(instances: u32) -> DatabaseProps {
        DatabaseProps {
            engine: DatabaseEngine::aurora_mysql("8.0.mysql_aurora.3.02.1"),
            instances,
            port: 3306,
            default_database_name: "mlflow".into(),
            master_username: "admin".into(),
            provisional_instance_class: DEFAULT_INSTANCE_CLASS.into(),
            performance_insights: true,
            storage_encrypted: true,
            scaling: ScalingConfiguration::default(),
        }
    }

    fn graph() -> DeploymentGraph {
        let mut graph = DeploymentGraph::new("Test");
        let fabric =
            NetworkFabric::partition(Cidr::new("10.0.0.0/16").unwrap(), 2, 1).unwrap();
        graph.add_node(id("VPC"), NodePayload::Network(fabric)).unwrap();
        graph
    }

    #[test]
    fn test_instances_retargeted_to_elastic_class() {
        let mut graph = graph();
        let db = ScalableDatabaseCluster::attach(&mut graph, id("Database"), &id("VPC"), &props(2))
            .unwrap();

        assert_eq!(db.instances().len(), 2);
        for instance in db.instances().iter() {
            let spec = graph.database_instance(instance).unwrap();
            assert_eq!(spec.instance_class, SERVERLESS_INSTANCE_CLASS);
        }
        assert_eq!(db.primary_instance().unwrap(), &id("Database/Instance1"));
        assert_eq!(
            graph.database(db.id()).unwrap().instances,
            vec![id("Database/Instance1"), id("Database/Instance2")]
        );
    }

    #[test]
    fn test_default_scaling_applied() {
        let mut graph = graph();
        let db = ScalableDatabaseCluster::attach(&mut graph, id("Database"), &id("VPC"), &props(1))
            .unwrap();

        let scaling = graph.database(db.id()).unwrap().serverless_v2_scaling.unwrap();
        assert_eq!(scaling, ScalingConfiguration::default());
        assert_eq!(scaling.min_capacity, 0.5);
        assert_eq!(scaling.max_capacity, 32.0);
    }

    #[test]
    fn test_configure_scaling_overwrites() {
        let mut graph = graph();
        let db = ScalableDatabaseCluster::attach(&mut graph, id("Database"), &id("VPC"), &props(1))
            .unwrap();

        let scaling = ScalingConfiguration::new(1.0, 4.0).unwrap();
        db.configure_scaling(&mut graph, scaling).unwrap();
        db.configure_scaling(&mut graph, scaling).unwrap();
        assert_eq!(
            graph.database(db.id()).unwrap().serverless_v2_scaling,
            Some(scaling)
        );

        let invalid = ScalingConfiguration {
            min_capacity: 8.0,
            max_capacity: 4.0,
        };
        assert!(matches!(
            db.configure_scaling(&mut graph, invalid),
            Err(SynthesisError::Validation(_))
        ));
        assert_eq!(
            graph.database(db.id()).unwrap().serverless_v2_scaling,
            Some(scaling)
        );
    }

    #[test]
    fn test_patch_log_replays_to_current_scaling() {
        let mut graph = graph();
        let db = ScalableDatabaseCluster::attach(&mut graph, id("Database"), &id("VPC"), &props(1))
            .unwrap();

        let narrow = ScalingConfiguration::new(1.0, 4.0).unwrap();
        let wide = ScalingConfiguration::new(2.0, 8.0).unwrap();
        for scaling in [narrow, wide, narrow, narrow] {
            db.configure_scaling(&mut graph, scaling).unwrap();
        }

        let logged: Vec<ScalingConfiguration> = graph
            .patches()
            .iter()
            .filter_map(|patch| match patch {
                Patch::ConfigureScaling { scaling, .. } => Some(*scaling),
                _ => None,
            })
            .collect();
        assert_eq!(
            logged,
            vec![ScalingConfiguration::default(), narrow, wide, narrow]
        );

        let mut replayed = self::graph();
        ScalableDatabaseCluster::attach(&mut replayed, id("Database"), &id("VPC"), &props(1))
            .unwrap();
        for patch in graph.patches() {
            replayed.apply_patch(patch.clone()).unwrap();
        }
        assert_eq!(
            replayed.database(db.id()).unwrap(),
            graph.database(db.id()).unwrap()
        );
        assert_eq!(
            graph.database(db.id()).unwrap().serverless_v2_scaling,
            Some(narrow)
        );
    }

    #[test]
    fn test_zero_instances_is_topology_error() {
        let mut graph = graph();
        let err = ScalableDatabaseCluster::attach(&mut graph, id("Database"), &id("VPC"), &props(0))
            .unwrap_err();
        assert!(matches!(
            err,
            SynthesisError::Topology(TopologyError::NoInstanceChildren { .. })
        ));
    }

    #[test]
    fn test_credentials_expose_connection_fields() {
        let mut graph = graph();
        let db = ScalableDatabaseCluster::attach(&mut graph, id("Database"), &id("VPC"), &props(1))
            .unwrap();

        let secret = graph.secret(db.credentials()).unwrap();
        for field in CREDENTIAL_FIELDS {
            assert!(secret.has_field(Some(field)), "missing {field}");
        }
        assert_eq!(db.endpoint_address().to_string(), "${Database.Endpoint.Address}");
    }
}
