// Copyright (c) 2025 - Cowboy AI, Inc.
//! Token-Issuing Function Specification
//!
//! Only the deploy-time shape lives here. The runtime handler is in
//! [`crate::token`].

use serde::{Deserialize, Serialize};

use super::compute::CpuArchitecture;

/// Authentication required on the public invocation URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionUrlAuth {
    None,
    Iam,
}

/// Values handed to the function at deploy time instead of being read from
/// the process environment
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvocationConfig {
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_id: Option<String>,
}

/// Independently invocable function with a public URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub description: String,
    pub entry: String,
    pub runtime: String,
    pub architecture: CpuArchitecture,
    pub url_auth: FunctionUrlAuth,
    pub invocation: InvocationConfig,
}
