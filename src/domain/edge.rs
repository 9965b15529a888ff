// Copyright (c) 2025 - Cowboy AI, Inc.
//! Edge Distribution and Behavior Rules
//!
//! A distribution holds one default behavior plus an ordered list of
//! path-scoped overrides. Patterns are literal prefixes with a trailing `*`
//! (`/api/*`); they are not a routing language.
//!
//! # Matching
//!
//! ```text
//! /api/users        → /api/*    (most specific prefix wins)
//! /static/logo.png  → default
//! ```

use serde::{Deserialize, Serialize};

use super::NodeId;

/// Viewer-side protocol handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerProtocolPolicy {
    AllowAll,
    RedirectToHttps,
    HttpsOnly,
}

/// HTTP methods forwarded to the origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowedMethods {
    GetHead,
    GetHeadOptions,
    AllowAll,
}

/// Edge caching policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Cache with compression and long TTLs
    CachingOptimized,
    /// Every request reaches the origin
    CachingDisabled,
}

impl CachePolicy {
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Self::CachingOptimized)
    }
}

/// Which viewer request attributes are forwarded to the origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginRequestPolicy {
    AllViewer,
    CorsS3Origin,
    UserAgentRefererHeaders,
}

/// Response headers attached at the edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseHeadersPolicy {
    CorsAllowAllOrigins,
    SecurityHeaders,
}

/// Protocol used between the edge and the origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginProtocolPolicy {
    HttpOnly,
    HttpsOnly,
    MatchViewer,
}

/// HTTP versions offered to viewers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HttpVersion {
    Http1_1,
    Http2,
    Http2And3,
}

/// The single origin behind the distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub load_balancer: NodeId,
    pub protocol_policy: OriginProtocolPolicy,
}

/// Routing and caching policy for a set of paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorRule {
    pub viewer_protocol_policy: ViewerProtocolPolicy,
    pub allowed_methods: AllowedMethods,
    pub cache_policy: CachePolicy,
    pub origin_request_policy: OriginRequestPolicy,
    pub response_headers_policy: ResponseHeadersPolicy,
    pub origin: NodeId,
}

/// A behavior scoped to a path pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathBehavior {
    pub path_pattern: String,
    pub rule: BehaviorRule,
}

impl PathBehavior {
    /// Literal prefix the pattern stands for
    pub fn prefix(&self) -> &str {
        self.path_pattern
            .strip_suffix('*')
            .unwrap_or(&self.path_pattern)
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.path_pattern.ends_with('*') {
            path.starts_with(self.prefix())
        } else {
            path == self.path_pattern
        }
    }
}

/// Content-delivery distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSpec {
    pub comment: String,
    pub origin: Origin,
    pub default_behavior: BehaviorRule,
    pub additional_behaviors: Vec<PathBehavior>,
    pub http_version: HttpVersion,
    pub enable_ipv6: bool,
}

impl DistributionSpec {
    /// Behavior that serves `path`
    ///
    /// The matching pattern with the longest literal prefix wins; ties keep
    /// declaration order. Nothing matches → default behavior.
    pub fn resolve(&self, path: &str) -> &BehaviorRule {
        self.resolve_pattern(path)
            .map(|b| &b.rule)
            .unwrap_or(&self.default_behavior)
    }

    /// Path behavior that serves `path`, `None` for the default
    pub fn resolve_pattern(&self, path: &str) -> Option<&PathBehavior> {
        self.additional_behaviors
            .iter()
            .filter(|b| b.matches(path))
            .fold(None, |best: Option<&PathBehavior>, candidate| match best {
                Some(current) if current.prefix().len() >= candidate.prefix().len() => {
                    Some(current)
                }
                _ => Some(candidate),
            })
    }
}
