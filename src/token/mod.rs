// Copyright (c) 2025 - Cowboy AI, Inc.
//! Token-Issuing Function
//!
//! The function behind the proxy's upstream URL. Its outside effects are
//! behind [`TokenCapabilities`], and everything it would otherwise read from
//! a process environment arrives in an [`InvocationContext`].
//!
//! Two handlers exist:
//!
//! - [`TokenHandler::PassThrough`] - the active behavior, echoes the event
//! - [`TokenHandler::SignBearerToken`] - retrieves a signing key, signs a
//!   bearer token issued by the invoked function, returns `{"token": ...}`
//!
//! [`InertCapabilities`] backs deployments where signing is not wired up;
//! both of its operations fail with [`TokenError::Inert`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::domain::{InvocationConfig, Sensitive};
pub use crate::errors::TokenError;

/// Ten years of 365.25 days
pub const TOKEN_LIFETIME_SECS: i64 = 315_576_000;

/// Deploy-time facts handed to each invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationContext {
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_id: Option<String>,
    pub invoked_function_arn: String,
}

impl InvocationContext {
    pub fn new(config: &InvocationConfig, invoked_function_arn: impl Into<String>) -> Self {
        Self {
            region: config.region.clone(),
            secret_id: config.secret_id.clone(),
            invoked_function_arn: invoked_function_arn.into(),
        }
    }
}

/// Claims carried by an issued bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    pub fn issued_by(issuer: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        let exp = issued_at + Duration::seconds(TOKEN_LIFETIME_SECS);
        Self {
            iss: issuer.into(),
            iat: issued_at.timestamp(),
            exp: exp.timestamp(),
        }
    }
}

/// Outside effects of the token function
#[async_trait]
pub trait TokenCapabilities: Send + Sync {
    /// Fetch secret material by id
    async fn retrieve_secret(&self, region: &str, secret_id: &str) -> Result<Sensitive, TokenError>;

    /// Sign `claims` with `key`, returning the encoded token
    async fn sign_token(&self, claims: &TokenClaims, key: &Sensitive) -> Result<String, TokenError>;
}

/// Capabilities with no implementation behind them
#[derive(Debug, Clone, Copy, Default)]
pub struct InertCapabilities;

#[async_trait]
impl TokenCapabilities for InertCapabilities {
    async fn retrieve_secret(
        &self,
        _region: &str,
        _secret_id: &str,
    ) -> Result<Sensitive, TokenError> {
        Err(TokenError::Inert("retrieve_secret"))
    }

    async fn sign_token(
        &self,
        _claims: &TokenClaims,
        _key: &Sensitive,
    ) -> Result<String, TokenError> {
        Err(TokenError::Inert("sign_token"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenHandler {
    #[default]
    PassThrough,
    SignBearerToken,
}

impl TokenHandler {
    pub async fn handle<C>(
        &self,
        event: Value,
        context: &InvocationContext,
        capabilities: &C,
    ) -> Result<Value, TokenError>
    where
        C: TokenCapabilities + ?Sized,
    {
        debug!(handler = ?self, %event, "token function invoked");

        match self {
            Self::PassThrough => Ok(event),
            Self::SignBearerToken => {
                let secret_id = context
                    .secret_id
                    .as_deref()
                    .ok_or(TokenError::MissingContext("secret_id"))?;
                let key = capabilities
                    .retrieve_secret(&context.region, secret_id)
                    .await?;

                let claims = TokenClaims::issued_by(&context.invoked_function_arn, Utc::now());
                let token = capabilities.sign_token(&claims, &key).await?;

                info!(issuer = %claims.iss, expires = claims.exp, "bearer token issued");
                Ok(json!({ "token": token }))
            }
        }
    }
}
