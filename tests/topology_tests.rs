// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Builder Integration Tests
//!
//! Builds the full topology through the public API and checks the
//! relationships a provisioning backend relies on.

mod fixtures;

use fixtures::*;
use pretty_assertions::assert_eq;
use test_case::test_case;

use cim_topology::constructs::ScalableDatabaseCluster;
use cim_topology::domain::parameters::{CLIENT_ID, CLIENT_SECRET, OAUTH_PROVIDER};
use cim_topology::domain::{
    Access, CachePolicy, GrantLevel, NodePayload, ResourceKind, ScalingConfiguration, SecretValue,
};
use cim_topology::graph::provisioning_waves;
use cim_topology::{
    DeploymentGraph, NodeId, ParameterSet, SynthesisError, TopologyBuilder, TopologyConfig,
    ValidationError,
};

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_built_graph_is_acyclic() {
    let graph = build(&credentials());
    let waves = provisioning_waves(graph.nodes()).unwrap();
    assert_eq!(waves.iter().map(Vec::len).sum::<usize>(), graph.len());

    let plan = graph.plan().unwrap();
    for node in graph.nodes() {
        let position = |id: &NodeId| {
            plan.creation_order
                .iter()
                .position(|x| x == id)
                .unwrap()
        };
        for dependency in &node.depends_on {
            assert!(
                position(dependency) < position(&node.id),
                "{} created before its dependency {}",
                node.id,
                dependency
            );
        }
    }
}

#[test]
fn test_service_waits_for_primary_instance() {
    let graph = build(&credentials());
    let service = graph.node(&id(SERVICE)).unwrap();

    assert!(service.has_dependency(&id(PRIMARY_INSTANCE)));
    assert!(!service.has_dependency(&id(DATABASE)));
    assert_eq!(
        graph.node(&id(PRIMARY_INSTANCE)).unwrap().kind(),
        ResourceKind::DatabaseInstance
    );
}

#[test]
fn test_edge_router_is_last() {
    let graph = build(&credentials());
    let plan = graph.plan().unwrap();

    assert_eq!(plan.creation_order.last(), Some(&id(CDN)));
    assert_eq!(plan.teardown_order.first(), Some(&id(CDN)));
}

#[test]
fn test_build_is_deterministic() {
    let first = build(&credentials()).plan().unwrap().to_json().unwrap();
    let second = build(&credentials()).plan().unwrap().to_json().unwrap();
    assert_eq!(first, second);
}

// ============================================================================
// Secrets
// ============================================================================

#[test]
fn test_every_secret_binding_resolves() {
    let graph = build(&credentials());
    graph.validate_secret_bindings().unwrap();

    for container in graph.nodes_of_kind(ResourceKind::Container) {
        let NodePayload::Container(spec) = &container.payload else {
            unreachable!();
        };
        for (key, secret_ref) in &spec.secrets {
            let secret = graph.secret(&secret_ref.secret).unwrap();
            assert!(
                secret.has_field(secret_ref.field.as_deref()),
                "{key} points at a missing field"
            );
            assert!(container.has_dependency(&secret_ref.secret));
        }
    }
}

#[test]
fn test_client_credentials_storage() {
    let graph = build(&credentials());
    let oauth = graph.secret(&id(OAUTH_SECRET)).unwrap();

    assert_eq!(
        oauth.binding_value("OAUTH2_PROXY_CLIENT_ID"),
        Some(&SecretValue::plain(CLIENT_ID_VALUE))
    );

    let client_secret = oauth.binding_value("OAUTH2_PROXY_CLIENT_SECRET").unwrap();
    assert!(client_secret.is_protected());
    assert_eq!(client_secret.expose(), CLIENT_SECRET_VALUE);
}

#[test]
fn test_protected_values_never_serialize() {
    let graph = build(&credentials());
    let json = graph.plan().unwrap().to_json().unwrap();

    assert!(json.contains(CLIENT_ID_VALUE));
    assert!(!json.contains(CLIENT_SECRET_VALUE));
    assert!(!json.contains(JWT_ISSUER_VALUE));
    assert!(!format!("{:?}", graph).contains(CLIENT_SECRET_VALUE));
}

#[test]
fn test_application_database_credentials() {
    let graph = build(&credentials());
    let app = graph.container(&id(APPLICATION)).unwrap();

    let keys: Vec<&str> = app.secrets.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["DB_NAME", "DB_PASSWORD", "DB_USER"]);
    assert!(app.secrets.values().all(|r| r.secret == id("Database/Secret")));
    assert_eq!(app.environment["DB_HOST"], "${Database.Endpoint.Address}");
    assert_eq!(app.environment["BUCKET_NAME"], "s3://${Bucket.BucketName}");
}

// ============================================================================
// Parameters
// ============================================================================

#[test_case("google" ; "google")]
#[test_case("github" ; "github")]
#[test_case("okta" ; "okta")]
fn test_allowed_providers(provider: &str) {
    let graph = build(&ParameterSet::standard().with(OAUTH_PROVIDER, provider));
    let proxy = graph.container(&id(PROXY)).unwrap();
    assert_eq!(proxy.environment["OAUTH2_PROXY_PROVIDER"], provider);
}

#[test]
fn test_unknown_provider_fails_before_nodes() {
    let result = TopologyBuilder::default()
        .build(&ParameterSet::standard().with(OAUTH_PROVIDER, "bing"));

    match result {
        Err(SynthesisError::Validation(ValidationError::NotAllowed { parameter, value, .. })) => {
            assert_eq!(parameter, OAUTH_PROVIDER);
            assert_eq!(value, "bing");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_sensitive_violation_is_redacted() {
    let parameters = ParameterSet::standard()
        .declare(
            cim_topology::domain::Parameter::string(CLIENT_SECRET)
                .no_echo()
                .allowed_values(["only-this"]),
        )
        .with(CLIENT_SECRET, CLIENT_SECRET_VALUE)
        .with(CLIENT_ID, CLIENT_ID_VALUE);

    let err = TopologyBuilder::default().build(&parameters).unwrap_err();
    assert!(!err.to_string().contains(CLIENT_SECRET_VALUE));
}

// ============================================================================
// Patches
// ============================================================================

#[test]
fn test_health_check_override() {
    let graph = build(&credentials());
    let service = graph.service(&id(SERVICE)).unwrap();

    assert_eq!(service.health_check.path, "/ping");
    assert_eq!(service.health_check.interval_secs, 5);
    assert_eq!(service.health_check.timeout_secs, 3);
}

#[test]
fn test_default_scaling() {
    let graph = build(&credentials());
    let scaling = graph
        .database(&id(DATABASE))
        .unwrap()
        .serverless_v2_scaling
        .unwrap();
    assert_eq!(
        scaling,
        ScalingConfiguration {
            min_capacity: 0.5,
            max_capacity: 32.0
        }
    );
}

#[test]
fn test_configured_scaling_replaces_default() {
    let mut config = TopologyConfig::default();
    config.database.scaling = ScalingConfiguration::new(2.0, 16.0).unwrap();
    let graph = build_with(config);

    assert_eq!(
        graph.database(&id(DATABASE)).unwrap().serverless_v2_scaling,
        Some(ScalingConfiguration {
            min_capacity: 2.0,
            max_capacity: 16.0
        })
    );
}

#[test_case(0.0, 4.0 ; "zero minimum")]
#[test_case(-1.0, 4.0 ; "negative minimum")]
#[test_case(8.0, 4.0 ; "minimum above maximum")]
fn test_invalid_scaling_fails_build(min: f64, max: f64) {
    let mut config = TopologyConfig::default();
    config.database.scaling = ScalingConfiguration {
        min_capacity: min,
        max_capacity: max,
    };

    let err = TopologyBuilder::new(config).build(&credentials()).unwrap_err();
    assert!(matches!(
        err,
        SynthesisError::Validation(ValidationError::InvalidScaling { .. })
    ));
}

#[test]
fn test_scaling_reconfigured_after_build() {
    let mut graph = DeploymentGraph::new("Scaling");
    let config = TopologyConfig::default();
    graph
        .add_node(
            id("VPC"),
            NodePayload::Network(
                cim_topology::domain::NetworkFabric::partition(config.network.cidr, 2, 1).unwrap(),
            ),
        )
        .unwrap();
    let db = ScalableDatabaseCluster::attach(
        &mut graph,
        id(DATABASE),
        &id("VPC"),
        &config.database.props(),
    )
    .unwrap();

    let scaling = ScalingConfiguration::new(1.0, 1.0).unwrap();
    db.configure_scaling(&mut graph, scaling).unwrap();
    let once = graph.clone();
    db.configure_scaling(&mut graph, scaling).unwrap();
    assert_eq!(graph, once);
}

#[test]
fn test_redirect_url_points_at_edge_domain() {
    let graph = build(&credentials());
    let proxy = graph.container(&id(PROXY)).unwrap();

    assert_eq!(
        proxy.environment["OAUTH2_PROXY_REDIRECT_URL"],
        "https://${CDN.DomainName}/oauth2/callback"
    );
    assert_eq!(graph.output("Url"), Some("https://${CDN.DomainName}"));
}

// ============================================================================
// Access and edge routing
// ============================================================================

#[test]
fn test_service_access_edges() {
    let graph = build(&credentials());
    let service = graph.node(&id(SERVICE)).unwrap();

    let db_access: Vec<&Access> = service.access_to(&id(DATABASE)).collect();
    assert_eq!(db_access, vec![&Access::Network { port: 3306 }]);

    let bucket_access: Vec<&Access> = service.access_to(&id("Bucket")).collect();
    assert_eq!(
        bucket_access,
        vec![&Access::Grant {
            level: GrantLevel::ReadWrite
        }]
    );
}

#[test_case("/api/users", CachePolicy::CachingDisabled ; "api")]
#[test_case("/ajax-api/2.0/mlflow/experiments/list", CachePolicy::CachingDisabled ; "ajax api")]
#[test_case("/oauth2/callback", CachePolicy::CachingDisabled ; "oauth2 callback")]
#[test_case("/static/logo.png", CachePolicy::CachingOptimized ; "static asset")]
#[test_case("/", CachePolicy::CachingOptimized ; "root")]
fn test_edge_routing(path: &str, expected: CachePolicy) {
    let graph = build(&credentials());
    let distribution = graph.distribution(&id(CDN)).unwrap();
    assert_eq!(distribution.resolve(path).cache_policy, expected);
}

#[test]
fn test_api_path_matches_api_rule() {
    let graph = build(&credentials());
    let distribution = graph.distribution(&id(CDN)).unwrap();

    let matched = distribution.resolve_pattern("/api/users").unwrap();
    assert_eq!(matched.path_pattern, "/api/*");
    assert!(distribution.resolve_pattern("/static/logo.png").is_none());
}
