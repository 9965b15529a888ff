// Copyright (c) 2025 - Cowboy AI, Inc.
//! Edge Router
//!
//! A content-delivery distribution in front of one load balancer. TLS ends at
//! the edge, so the origin is reached over plain HTTP. Static content is
//! cached; API, AJAX and OAuth2 callback paths always reach the origin.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{
    AllowedMethods, AttrRef, BehaviorRule, CachePolicy, DistributionSpec, HttpVersion, NodeId,
    NodePayload, Origin, OriginProtocolPolicy, OriginRequestPolicy, PathBehavior, ResourceKind,
    ResponseHeadersPolicy, ViewerProtocolPolicy,
};
use crate::errors::{SynthesisResult, TopologyError};
use crate::graph::DeploymentGraph;

/// Paths that must never be served from cache
pub const UNCACHED_PATHS: [&str; 3] = ["/api/*", "/ajax-api/*", "/oauth2/*"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeRouterProps {
    pub comment: String,
    pub uncached_paths: Vec<String>,
    pub http_version: HttpVersion,
    pub enable_ipv6: bool,
}

impl Default for EdgeRouterProps {
    fn default() -> Self {
        Self {
            comment: "CDN/Distribution".to_string(),
            uncached_paths: UNCACHED_PATHS.iter().map(|p| p.to_string()).collect(),
            http_version: HttpVersion::Http2And3,
            enable_ipv6: true,
        }
    }
}

/// Handle to a distribution already in the graph
#[derive(Debug, Clone)]
pub struct EdgeRouter {
    id: NodeId,
}

impl EdgeRouter {
    /// Insert a distribution fronting `load_balancer`
    ///
    /// The distribution depends on both the load balancer and the service
    /// behind it; it is the last node a topology adds.
    pub fn attach(
        graph: &mut DeploymentGraph,
        id: NodeId,
        load_balancer: &NodeId,
        service: &NodeId,
        props: &EdgeRouterProps,
    ) -> SynthesisResult<Self> {
        let origin_kind = graph.require(load_balancer)?.kind();
        if origin_kind != ResourceKind::LoadBalancer {
            return Err(TopologyError::WrongKind {
                node: load_balancer.clone(),
                expected: ResourceKind::LoadBalancer,
                actual: origin_kind,
            }
            .into());
        }

        graph.add_node(
            id.clone(),
            NodePayload::EdgeRouter(distribution(load_balancer, props)),
        )?;
        graph.add_dependency(&id, load_balancer)?;
        graph.add_dependency(&id, service)?;

        info!(distribution = %id, origin = %load_balancer, "edge router attached");
        Ok(Self { id })
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Public domain, known once the distribution is provisioned
    pub fn domain_name(&self) -> AttrRef {
        self.id.attr("DomainName")
    }

    pub fn url(&self) -> String {
        format!("https://{}", self.domain_name())
    }
}

fn rule(origin: &NodeId, cache_policy: CachePolicy) -> BehaviorRule {
    BehaviorRule {
        viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
        allowed_methods: AllowedMethods::AllowAll,
        cache_policy,
        origin_request_policy: OriginRequestPolicy::AllViewer,
        response_headers_policy: ResponseHeadersPolicy::CorsAllowAllOrigins,
        origin: origin.clone(),
    }
}

/// Distribution with a cached default and uncached overrides
pub fn distribution(load_balancer: &NodeId, props: &EdgeRouterProps) -> DistributionSpec {
    DistributionSpec {
        comment: props.comment.clone(),
        origin: Origin {
            load_balancer: load_balancer.clone(),
            protocol_policy: OriginProtocolPolicy::HttpOnly,
        },
        default_behavior: rule(load_balancer, CachePolicy::CachingOptimized),
        additional_behaviors: props
            .uncached_paths
            .iter()
            .map(|pattern| PathBehavior {
                path_pattern: pattern.clone(),
                rule: rule(load_balancer, CachePolicy::CachingDisabled),
            })
            .collect(),
        http_version: props.http_version,
        enable_ipv6: props.enable_ipv6,
    }
}
