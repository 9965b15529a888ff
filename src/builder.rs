// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Builder
//!
//! Assembles the full deployment graph in two phases:
//!
//! 1. **Construction** - nodes are inserted leaves first with provisional
//!    configuration, and dependency, access and secret edges are wired as each
//!    consumer appears.
//! 2. **Patching** - named [`Patch`]es overwrite what only became known later:
//!    the elastic instance class, capacity bounds, the proxy health check and
//!    the edge callback URL.
//!
//! ```text
//! Parameters ─▶ Database, Secrets ─▶ Service (+ containers) ─▶ CDN ─▶ Url
//!                                        ▲                      │
//!                                        └── redirect URL patch ┘
//! ```
//!
//! The callback URL flows from the CDN back into the proxy container as a
//! late-bound value. The graph records no edge for it, so the CDN can depend
//! on the service without closing a cycle.

use tracing::{debug, info};

use crate::config::TopologyConfig;
use crate::constructs::{EdgeRouter, ScalableDatabaseCluster};
use crate::domain::parameters::{CLIENT_ID, CLIENT_SECRET, JWT_ISSUER, OAUTH_PROVIDER};
use crate::domain::{
    Access, ClusterSpec, ContainerSpec, FunctionSpec, GeneratorPolicy, GrantLevel, HealthCheck,
    ImageRef, InvocationConfig, LoadBalancerSpec, LogGroupSpec, LogSink, NetworkFabric, NodeId,
    NodePayload, ParameterSet, ResolvedParameters, SecretBinding, SecretEntry, SecretRef,
    SecretValue, ServiceSpec,
};
use crate::errors::{SynthesisResult, TopologyError};
use crate::graph::{DeploymentGraph, Patch};

/// Environment key the proxy reads its OAuth2 callback from
pub const REDIRECT_URL_ENV: &str = "OAUTH2_PROXY_REDIRECT_URL";

/// Name of the published entry point
pub const URL_OUTPUT: &str = "Url";

/// Orchestrates assembly of one topology
#[derive(Debug, Clone, Default)]
pub struct TopologyBuilder {
    config: TopologyConfig,
}

/// Nodes later wiring steps need to reach
struct Wiring {
    network: NodeId,
    database: ScalableDatabaseCluster,
    bucket: NodeId,
    cluster: NodeId,
    cookie_secret: NodeId,
    oauth_secret: NodeId,
    token_function: NodeId,
    logs: NodeId,
}

impl TopologyBuilder {
    pub fn new(config: TopologyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    /// Build and verify the deployment graph
    ///
    /// Parameters are resolved before any node exists; any failure returns
    /// an error and no graph.
    pub fn build(&self, parameters: &ParameterSet) -> SynthesisResult<DeploymentGraph> {
        let resolved = parameters.resolve()?;
        info!(
            stack = %self.config.stack_name,
            provider = resolved.display(OAUTH_PROVIDER).unwrap_or_default(),
            "🏗️  Building deployment topology"
        );

        let mut graph = DeploymentGraph::new(&self.config.stack_name);

        // Phase 1: leaves
        let wiring = self.add_foundation(&mut graph, &resolved)?;

        // Phase 1: service and its containers
        let service = NodeId::new("Service")?;
        let load_balancer = service.child("LB")?;
        let proxy = service.child(&self.config.proxy.container_name)?;
        let application = service.child(&self.config.application.container_name)?;

        self.add_load_balancer(&mut graph, &load_balancer, &wiring)?;
        self.add_proxy_container(&mut graph, &proxy, &service, &wiring, &resolved)?;
        self.add_application_container(&mut graph, &application, &service, &wiring)?;
        self.add_service(
            &mut graph,
            &service,
            &load_balancer,
            vec![proxy.clone(), application],
            &wiring,
        )?;

        // Phase 2: patches
        graph.apply_patch(Patch::OverrideHealthCheck {
            service: service.clone(),
            health_check: self.health_check(),
        })?;

        let cdn = EdgeRouter::attach(
            &mut graph,
            NodeId::new("CDN")?,
            &load_balancer,
            &service,
            &self.config.edge,
        )?;
        graph.apply_patch(Patch::AddContainerEnvironment {
            container: proxy,
            key: REDIRECT_URL_ENV.to_string(),
            value: format!("{}/oauth2/callback", cdn.url()),
        })?;

        graph.add_output(URL_OUTPUT, cdn.url(), "Public entry point");

        graph.verify()?;
        info!(
            nodes = graph.len(),
            patches = graph.patches().len(),
            "✅ Topology assembled"
        );
        Ok(graph)
    }

    fn add_foundation(
        &self,
        graph: &mut DeploymentGraph,
        resolved: &ResolvedParameters,
    ) -> SynthesisResult<Wiring> {
        let network = NodeId::new("VPC")?;
        let fabric = NetworkFabric::partition(
            self.config.network.cidr,
            self.config.network.max_azs,
            self.config.network.nat_gateways,
        )?;
        graph.add_node(network.clone(), NodePayload::Network(fabric))?;

        let database = ScalableDatabaseCluster::attach(
            graph,
            NodeId::new("Database")?,
            &network,
            &self.config.database.props(),
        )?;

        let bucket = NodeId::new("Bucket")?;
        graph.add_node(bucket.clone(), NodePayload::Store(self.config.bucket.clone()))?;

        let cluster = NodeId::new("Cluster")?;
        graph.add_node(
            cluster.clone(),
            NodePayload::Cluster(ClusterSpec {
                network: network.clone(),
                fargate_capacity_providers: true,
            }),
        )?;
        graph.add_dependency(&cluster, &network)?;

        let cookie_secret = NodeId::new("CookieSecret")?;
        graph.add_node(
            cookie_secret.clone(),
            NodePayload::Secret(SecretEntry::generated(
                "Cookie secret for oauth2-proxy",
                GeneratorPolicy {
                    exclude_punctuation: true,
                    ..GeneratorPolicy::random_string()
                },
            )),
        )?;

        let oauth_secret = NodeId::new("OauthSecret")?;
        graph.add_node(
            oauth_secret.clone(),
            NodePayload::Secret(oauth_entry(resolved)?),
        )?;

        let token_function = self.add_token_function(graph, &oauth_secret)?;

        let logs = NodeId::new("Logs")?;
        graph.add_node(
            logs.clone(),
            NodePayload::LogGroup(LogGroupSpec {
                retention_days: self.config.logging.retention_days,
            }),
        )?;

        Ok(Wiring {
            network,
            database,
            bucket,
            cluster,
            cookie_secret,
            oauth_secret,
            token_function,
            logs,
        })
    }

    fn add_token_function(
        &self,
        graph: &mut DeploymentGraph,
        oauth_secret: &NodeId,
    ) -> SynthesisResult<NodeId> {
        let function = NodeId::new("TokenGenerator")?;
        let config = &self.config.token_function;
        graph.add_node(
            function.clone(),
            NodePayload::Function(FunctionSpec {
                description: "Bearer token generator".to_string(),
                entry: config.entry.clone(),
                runtime: config.runtime.clone(),
                architecture: config.architecture,
                url_auth: config.url_auth,
                invocation: InvocationConfig {
                    region: self.config.region.clone(),
                    secret_id: Some(oauth_secret.to_string()),
                },
            }),
        )?;
        graph.add_dependency(&function, oauth_secret)?;
        graph.add_access(
            &function,
            oauth_secret,
            Access::Grant {
                level: GrantLevel::Read,
            },
        )?;
        Ok(function)
    }

    fn add_load_balancer(
        &self,
        graph: &mut DeploymentGraph,
        load_balancer: &NodeId,
        wiring: &Wiring,
    ) -> SynthesisResult<()> {
        graph.add_node(
            load_balancer.clone(),
            NodePayload::LoadBalancer(LoadBalancerSpec {
                network: wiring.network.clone(),
                internet_facing: true,
                listener_port: self.config.service.listener_port,
            }),
        )?;
        graph.add_dependency(load_balancer, &wiring.network)
    }

    fn log_sink(&self, wiring: &Wiring) -> LogSink {
        LogSink {
            log_group: wiring.logs.clone(),
            stream_prefix: self.config.logging.stream_prefix.clone(),
        }
    }

    fn add_proxy_container(
        &self,
        graph: &mut DeploymentGraph,
        proxy: &NodeId,
        service: &NodeId,
        wiring: &Wiring,
        resolved: &ResolvedParameters,
    ) -> SynthesisResult<()> {
        let config = &self.config.proxy;
        let upstream = wiring.token_function.attr("FunctionUrl").to_string();

        let mut spec = ContainerSpec::new(
            &config.container_name,
            service.clone(),
            ImageRef::registry(&config.image),
            self.log_sink(wiring),
        )
        .with_port(config.port)
        .with_command([
            "--http-address".to_string(),
            format!("0.0.0.0:{}", config.port),
            "--reverse-proxy".to_string(),
            "true".to_string(),
            "--pass-host-header".to_string(),
            "false".to_string(),
            "--upstream".to_string(),
            upstream,
            "--ping-path".to_string(),
            self.config.service.health_check.path.clone(),
            "--silence-ping-logging".to_string(),
            "true".to_string(),
            "--custom-sign-in-logo".to_string(),
            config.sign_in_logo.clone(),
            "--banner".to_string(),
            config.banner.clone(),
            "--footer".to_string(),
            config.footer.clone(),
        ]);

        let provider = resolved.get(OAUTH_PROVIDER).unwrap_or_default();
        spec.add_environment("OAUTH2_PROXY_PROVIDER", provider);
        spec.add_environment("OAUTH2_PROXY_EMAIL_DOMAINS", &config.email_domains);
        spec.add_environment(
            "OAUTH2_PROXY_SKIP_JWT_BEARER_TOKENS",
            config.skip_jwt_bearer_tokens.to_string(),
        );

        graph.add_node(proxy.clone(), NodePayload::Container(spec))?;
        graph.add_dependency(proxy, &wiring.logs)?;
        graph.add_dependency(proxy, &wiring.token_function)?;

        let oauth = &wiring.oauth_secret;
        bind_secret(
            graph,
            proxy,
            "OAUTH2_PROXY_CLIENT_ID",
            SecretRef::field(oauth.clone(), "client_id"),
        )?;
        bind_secret(
            graph,
            proxy,
            "OAUTH2_PROXY_CLIENT_SECRET",
            SecretRef::field(oauth.clone(), "client_secret"),
        )?;
        bind_secret(
            graph,
            proxy,
            "OAUTH2_PROXY_EXTRA_JWT_ISSUERS",
            SecretRef::field(oauth.clone(), "jwt_issuer"),
        )?;
        bind_secret(
            graph,
            proxy,
            "OAUTH2_PROXY_COOKIE_SECRET",
            SecretRef::whole(wiring.cookie_secret.clone()),
        )
    }

    fn add_application_container(
        &self,
        graph: &mut DeploymentGraph,
        application: &NodeId,
        service: &NodeId,
        wiring: &Wiring,
    ) -> SynthesisResult<()> {
        let config = &self.config.application;
        let mut spec = ContainerSpec::new(
            &config.container_name,
            service.clone(),
            ImageRef::asset(
                &config.asset_directory,
                self.config.service.cpu_architecture.platform(),
            ),
            self.log_sink(wiring),
        );

        let database = &wiring.database;
        spec.add_environment(
            "BUCKET_NAME",
            format!("s3://{}", wiring.bucket.attr("BucketName")),
        );
        spec.add_environment("DB_HOST", database.endpoint_address().to_string());
        spec.add_environment("DB_PORT", database.endpoint_port().to_string());

        graph.add_node(application.clone(), NodePayload::Container(spec))?;
        graph.add_dependency(application, &wiring.logs)?;

        let credentials = database.credentials();
        for (key, field) in [
            ("DB_USER", "username"),
            ("DB_PASSWORD", "password"),
            ("DB_NAME", "dbname"),
        ] {
            bind_secret(
                graph,
                application,
                key,
                SecretRef::field(credentials.clone(), field),
            )?;
        }
        Ok(())
    }

    fn add_service(
        &self,
        graph: &mut DeploymentGraph,
        service: &NodeId,
        load_balancer: &NodeId,
        containers: Vec<NodeId>,
        wiring: &Wiring,
    ) -> SynthesisResult<()> {
        let config = &self.config.service;
        graph.add_node(
            service.clone(),
            NodePayload::Service(ServiceSpec {
                cluster: wiring.cluster.clone(),
                load_balancer: load_balancer.clone(),
                cpu: config.cpu,
                memory_mib: config.memory_mib,
                cpu_architecture: config.cpu_architecture,
                desired_count: config.desired_count,
                containers: containers.clone(),
                target_port: self.config.proxy.port,
                health_check: HealthCheck::default(),
            }),
        )?;

        graph.add_dependency(service, &wiring.cluster)?;
        graph.add_dependency(service, load_balancer)?;
        for container in &containers {
            graph.add_dependency(service, container)?;
        }

        // Readiness is gated on the writer instance, not the cluster wrapper
        let primary = wiring.database.primary_instance()?;
        graph.add_dependency(service, primary)?;

        graph.add_access(
            service,
            wiring.database.id(),
            Access::Network {
                port: wiring.database.port(),
            },
        )?;
        graph.add_access(
            service,
            &wiring.bucket,
            Access::Grant {
                level: GrantLevel::ReadWrite,
            },
        )?;

        debug!(%service, containers = containers.len(), "service wired");
        Ok(())
    }

    fn health_check(&self) -> HealthCheck {
        self.config.service.health_check.clone()
    }
}

/// OAuth client material supplied through parameters
///
/// The client id is not secret and is stored plainly; the client secret and
/// the issuer list stay protected and never serialize.
fn oauth_entry(resolved: &ResolvedParameters) -> SynthesisResult<SecretEntry> {
    let client_id = resolved.get(CLIENT_ID).unwrap_or_default();
    let client_secret = resolved
        .sensitive(CLIENT_SECRET)
        .ok_or_else(|| crate::domain::ValidationError::MissingValue {
            parameter: CLIENT_SECRET.to_string(),
        })?;
    let jwt_issuer = resolved
        .sensitive(JWT_ISSUER)
        .ok_or_else(|| crate::domain::ValidationError::MissingValue {
            parameter: JWT_ISSUER.to_string(),
        })?;

    Ok(SecretEntry::supplied(
        "OAuth 2.0 client credentials",
        [
            ("client_id".to_string(), SecretValue::plain(client_id)),
            (
                "client_secret".to_string(),
                SecretValue::protected(CLIENT_SECRET, client_secret),
            ),
            (
                "jwt_issuer".to_string(),
                SecretValue::protected(JWT_ISSUER, jwt_issuer),
            ),
        ],
    ))
}

/// Bind `env_key` of `container` to a secret and record the consumer
fn bind_secret(
    graph: &mut DeploymentGraph,
    container: &NodeId,
    env_key: &str,
    secret_ref: SecretRef,
) -> SynthesisResult<()> {
    let secret = match graph.secret_mut(&secret_ref.secret) {
        Ok(secret) => secret,
        Err(TopologyError::UnknownNode(_)) | Err(TopologyError::WrongKind { .. }) => {
            return Err(TopologyError::UnresolvedSecret {
                container: container.clone(),
                key: env_key.to_string(),
                secret: secret_ref.secret,
            }
            .into())
        }
        Err(other) => return Err(other.into()),
    };
    if !secret.has_field(secret_ref.field.as_deref()) {
        return Err(TopologyError::UnknownSecretField {
            secret: secret_ref.secret,
            field: secret_ref.field.unwrap_or_default(),
        }
        .into());
    }
    secret.bind(SecretBinding {
        container: container.clone(),
        env_key: env_key.to_string(),
        field: secret_ref.field.clone(),
    });

    let dependency = secret_ref.secret.clone();
    graph.container_mut(container)?.add_secret(env_key, secret_ref);
    graph.add_dependency(container, &dependency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ResourceKind, SERVERLESS_INSTANCE_CLASS};

    fn id(s: &str) -> NodeId {
        NodeId::new(s).unwrap()
    }

    fn build() -> DeploymentGraph {
        TopologyBuilder::default()
            .build(&ParameterSet::standard())
            .unwrap()
    }

    #[test]
    fn test_node_inventory() {
        let graph = build();
        for name in [
            "VPC",
            "Database",
            "Database/Secret",
            "Database/Instance1",
            "Bucket",
            "Cluster",
            "CookieSecret",
            "OauthSecret",
            "TokenGenerator",
            "Logs",
            "Service",
            "Service/LB",
            "Service/oauth2-proxy",
            "Service/mlflow",
            "CDN",
        ] {
            assert!(graph.contains(&id(name)), "missing {name}");
        }
        assert_eq!(graph.nodes_of_kind(ResourceKind::Container).count(), 2);

        let NodePayload::Store(bucket) = &graph.node(&id("Bucket")).unwrap().payload else {
            panic!("Bucket is not an object store");
        };
        assert!(bucket.is_locked_down());
    }

    #[test]
    fn test_proxy_is_default_container() {
        let graph = build();
        let service = graph.service(&id("Service")).unwrap();
        assert_eq!(service.default_container(), Some(&id("Service/oauth2-proxy")));
        assert_eq!(service.target_port, 4180);
    }

    #[test]
    fn test_patch_log() {
        let graph = build();
        let names: Vec<&str> = graph.patches().iter().map(Patch::name).collect();
        assert_eq!(
            names,
            vec![
                "retarget_instance_class",
                "configure_scaling",
                "override_health_check",
                "add_container_environment",
            ]
        );
        assert_eq!(
            graph
                .database_instance(&id("Database/Instance1"))
                .unwrap()
                .instance_class,
            SERVERLESS_INSTANCE_CLASS
        );
    }

    #[test]
    fn test_redirect_url_adds_no_edge() {
        let graph = build();
        let proxy = graph.node(&id("Service/oauth2-proxy")).unwrap();
        assert!(!proxy.has_dependency(&id("CDN")));

        let NodePayload::Container(spec) = &proxy.payload else {
            panic!("proxy is not a container");
        };
        assert_eq!(
            spec.environment[REDIRECT_URL_ENV],
            "https://${CDN.DomainName}/oauth2/callback"
        );
    }

    #[test]
    fn test_upstream_is_token_function_url() {
        let graph = build();
        let proxy = graph.container(&id("Service/oauth2-proxy")).unwrap();
        let upstream = proxy
            .command
            .iter()
            .position(|arg| arg == "--upstream")
            .map(|i| proxy.command[i + 1].as_str());
        assert_eq!(upstream, Some("${TokenGenerator.FunctionUrl}"));
    }

    #[test]
    fn test_bind_unknown_secret() {
        let mut graph = build();
        let err = bind_secret(
            &mut graph,
            &id("Service/mlflow"),
            "API_KEY",
            SecretRef::whole(id("ApiKey")),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::errors::SynthesisError::Topology(TopologyError::UnresolvedSecret { .. })
        ));
    }
}
