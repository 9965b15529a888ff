// Copyright (c) 2025 - Cowboy AI, Inc.
//! Parameter Set - Declared, Validated External Inputs
//!
//! Parameters are declared with a type, a default, an optional allowed-value
//! set and a sensitivity flag. [`ParameterSet::resolve`] checks every value
//! against its declaration before anything consumes it; one violation fails
//! the whole resolution.
//!
//! # Examples
//!
//! ```rust
//! use cim_topology::domain::parameters::{ParameterSet, OAUTH_PROVIDER};
//!
//! let params = ParameterSet::standard().with(OAUTH_PROVIDER, "github");
//! let resolved = params.resolve().unwrap();
//! assert_eq!(resolved.get(OAUTH_PROVIDER), Some("github"));
//!
//! let bad = ParameterSet::standard().with(OAUTH_PROVIDER, "bing");
//! assert!(bad.resolve().is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::invariants::{validate_allowed_value, ValidationError};

/// OAuth identity provider used by the authenticating proxy
pub const OAUTH_PROVIDER: &str = "OauthProvider";
/// OAuth 2.0 client id
pub const CLIENT_ID: &str = "ClientId";
/// OAuth 2.0 client secret
pub const CLIENT_SECRET: &str = "ClientSecret";
/// Extra JWT issuer accepted for bearer tokens
pub const JWT_ISSUER: &str = "JwtIssuer";

/// Placeholder issuer used until a real one is supplied
pub const DEFAULT_JWT_ISSUER: &str =
    "https://accounts.google.com=123456789012.apps.googleusercontent.com";

/// Replacement text for values that must never be displayed
pub const REDACTED: &str = "***";

/// String that never prints its contents
///
/// `Debug` and `Display` both render [`REDACTED`]; the value is only
/// reachable through [`Sensitive::expose`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Sensitive(String);

impl Sensitive {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

/// Declared parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    String,
    Number,
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
        }
    }
}

/// Parameter declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub description: String,
    pub param_type: ParameterType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
    /// Never echoed back in output, logs or errors
    #[serde(default)]
    pub no_echo: bool,
    /// Empty values are rejected
    #[serde(default)]
    pub required: bool,
}

impl Parameter {
    pub fn string(name: impl Into<String>) -> Self {
        Self::typed(name, ParameterType::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::typed(name, ParameterType::Number)
    }

    fn typed(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            param_type,
            default: None,
            allowed_values: None,
            no_echo: false,
            required: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn no_echo(mut self) -> Self {
        self.no_echo = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Validate one candidate value against this declaration
    fn validate(&self, value: &str) -> Result<(), ValidationError> {
        let display = if self.no_echo { REDACTED } else { value };

        if self.required && value.is_empty() {
            return Err(ValidationError::MissingValue {
                parameter: self.name.clone(),
            });
        }

        if self.param_type == ParameterType::Number && value.parse::<f64>().is_err() {
            return Err(ValidationError::InvalidType {
                parameter: self.name.clone(),
                expected: self.param_type.to_string(),
            });
        }

        validate_allowed_value(&self.name, value, display, self.allowed_values.as_deref())
    }
}

/// Declarations plus supplied values, not yet validated
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    declared: Vec<Parameter>,
    supplied: BTreeMap<String, Sensitive>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four parameters the deployment exposes
    pub fn standard() -> Self {
        Self::new()
            .declare(
                Parameter::string(OAUTH_PROVIDER)
                    .description("Oauth Provider")
                    .default_value("google")
                    .allowed_values(["google", "github", "okta"]),
            )
            .declare(
                Parameter::string(CLIENT_ID)
                    .description("Oauth 2.0 Client ID")
                    .default_value(""),
            )
            .declare(
                Parameter::string(CLIENT_SECRET)
                    .description("Oauth 2.0 Client Secret")
                    .default_value("")
                    .no_echo(),
            )
            .declare(
                Parameter::string(JWT_ISSUER)
                    .description("JWT Issuer for Bearer Tokens")
                    .default_value(DEFAULT_JWT_ISSUER),
            )
    }

    /// Add (or replace) a declaration
    pub fn declare(mut self, parameter: Parameter) -> Self {
        self.declared.retain(|p| p.name != parameter.name);
        self.declared.push(parameter);
        self
    }

    /// Supply a value
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.supplied.insert(name.into(), Sensitive::new(value));
    }

    pub fn declarations(&self) -> &[Parameter] {
        &self.declared
    }

    /// Validate every declaration against its supplied or default value
    ///
    /// # Rules
    /// - Values for undeclared names are rejected
    /// - A declaration with neither a supplied value nor a default is missing
    /// - Each value must satisfy its declaration's type and allowed set
    pub fn resolve(&self) -> Result<ResolvedParameters, ValidationError> {
        if let Some(unknown) = self
            .supplied
            .keys()
            .find(|name| !self.declared.iter().any(|p| &p.name == *name))
        {
            return Err(ValidationError::UnknownParameter(unknown.clone()));
        }

        let mut values = BTreeMap::new();
        for parameter in &self.declared {
            let value = match self.supplied.get(&parameter.name) {
                Some(value) => value.clone(),
                None => match &parameter.default {
                    Some(default) => Sensitive::new(default.clone()),
                    None => {
                        return Err(ValidationError::MissingValue {
                            parameter: parameter.name.clone(),
                        })
                    }
                },
            };

            parameter.validate(value.expose())?;
            values.insert(
                parameter.name.clone(),
                ResolvedValue {
                    value,
                    no_echo: parameter.no_echo,
                },
            );
        }

        Ok(ResolvedParameters { values })
    }
}

#[derive(Clone)]
struct ResolvedValue {
    value: Sensitive,
    no_echo: bool,
}

/// Validated parameter values
#[derive(Clone)]
pub struct ResolvedParameters {
    values: BTreeMap<String, ResolvedValue>,
}

impl ResolvedParameters {
    /// Raw value, sensitive or not
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|v| v.value.expose())
    }

    /// Value as a redacting wrapper
    pub fn sensitive(&self, name: &str) -> Option<Sensitive> {
        self.values.get(name).map(|v| v.value.clone())
    }

    pub fn is_no_echo(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(|v| v.no_echo)
    }

    /// Value as it may be shown to a human
    pub fn display(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|v| {
            if v.no_echo {
                REDACTED
            } else {
                v.value.expose()
            }
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl fmt::Debug for ResolvedParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.values.keys().map(|k| (k, self.display(k).unwrap_or(REDACTED))))
            .finish()
    }
}
