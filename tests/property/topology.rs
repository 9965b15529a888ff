// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Built Topologies

use cim_topology::domain::parameters::{CLIENT_ID, CLIENT_SECRET, OAUTH_PROVIDER};
use cim_topology::domain::{ParameterSet, ScalingConfiguration, SERVERLESS_INSTANCE_CLASS};
use cim_topology::graph::provisioning_waves;
use cim_topology::{NodeId, SynthesisError, TopologyBuilder, TopologyConfig, ValidationError};
use proptest::prelude::*;

fn arb_provider() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("google"), Just("github"), Just("okta")]
}

fn arb_scaling() -> impl Strategy<Value = ScalingConfiguration> {
    (1u32..=64, 0u32..=64).prop_map(|(min, extra)| ScalingConfiguration {
        min_capacity: f64::from(min) * 0.5,
        max_capacity: f64::from(min) * 0.5 + f64::from(extra) * 0.5,
    })
}

proptest! {
    /// Scaling bounds are accepted exactly when 0 < min <= max
    #[test]
    fn prop_scaling_validation(min in -8.0f64..64.0, max in -8.0f64..64.0) {
        let result = ScalingConfiguration::new(min, max);
        prop_assert_eq!(result.is_ok(), min > 0.0 && min <= max);
    }

    /// Every valid input yields an acyclic, fully bound graph
    #[test]
    fn prop_built_topology_is_sound(
        provider in arb_provider(),
        client_id in "[a-z0-9]{0,16}",
        client_secret in "[A-Za-z0-9]{0,32}",
        scaling in arb_scaling(),
        instances in 1u32..4,
    ) {
        let mut config = TopologyConfig::default();
        config.database.scaling = scaling;
        config.database.instances = instances;

        let parameters = ParameterSet::standard()
            .with(OAUTH_PROVIDER, provider)
            .with(CLIENT_ID, client_id)
            .with(CLIENT_SECRET, client_secret);
        let graph = TopologyBuilder::new(config).build(&parameters).unwrap();

        prop_assert!(provisioning_waves(graph.nodes()).is_ok());
        prop_assert!(graph.validate_secret_bindings().is_ok());

        let service = graph.node(&NodeId::new("Service").unwrap()).unwrap();
        prop_assert!(service.has_dependency(&NodeId::new("Database/Instance1").unwrap()));

        let database = graph.database(&NodeId::new("Database").unwrap()).unwrap();
        prop_assert_eq!(database.instances.len(), instances as usize);
        prop_assert_eq!(database.serverless_v2_scaling, Some(scaling));
        for instance in &database.instances {
            prop_assert_eq!(
                graph.database_instance(instance).unwrap().instance_class.as_str(),
                SERVERLESS_INSTANCE_CLASS
            );
        }
    }

    /// Providers outside the allowed set never produce a graph
    #[test]
    fn prop_unknown_provider_rejected(provider in "[a-z]{1,12}") {
        prop_assume!(!["google", "github", "okta"].contains(&provider.as_str()));

        let parameters = ParameterSet::standard().with(OAUTH_PROVIDER, provider);
        let err = TopologyBuilder::default().build(&parameters).unwrap_err();
        let is_not_allowed = matches!(
            err,
            SynthesisError::Validation(ValidationError::NotAllowed { .. })
        );
        prop_assert!(is_not_allowed);
    }
}
