// Copyright (c) 2025 - Cowboy AI, Inc.
//! Secret Entries
//!
//! A secret is either generated by the backend from a [`GeneratorPolicy`] or
//! assembled from supplied field values. Supplied fields are stored plain
//! (safe to show) or protected (held in memory only, never serialized).
//!
//! Each entry records which container environment keys consume it, so the
//! graph can answer "what does this key resolve to" without walking every
//! container.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::parameters::Sensitive;
use super::NodeId;

/// Backend-side generation rules for a secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorPolicy {
    /// Fixed fields rendered into the generated document (e.g. `username`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub template: BTreeMap<String, String>,
    /// Field that receives the generated string; `None` generates a bare string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_key: Option<String>,
    /// Fields the owner fills in after creation (host, port, ...)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attached_fields: Vec<String>,
    pub length: u32,
    pub exclude_punctuation: bool,
}

impl GeneratorPolicy {
    /// Bare random string, no fields
    pub fn random_string() -> Self {
        Self {
            template: BTreeMap::new(),
            generate_key: None,
            attached_fields: Vec::new(),
            length: 32,
            exclude_punctuation: false,
        }
    }

    /// Every field a consumer may reference
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.template
            .keys()
            .map(String::as_str)
            .chain(self.generate_key.as_deref())
            .chain(self.attached_fields.iter().map(String::as_str))
    }
}

/// Stored value of a supplied field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "storage", rename_all = "snake_case")]
pub enum SecretValue {
    /// Non-secret material, kept in the graph as-is
    Plain { value: String },
    /// Secret material sourced from a no-echo parameter; only the parameter
    /// name is serialized
    Protected {
        parameter: String,
        #[serde(skip)]
        value: Sensitive,
    },
}

impl SecretValue {
    pub fn plain(value: impl Into<String>) -> Self {
        Self::Plain {
            value: value.into(),
        }
    }

    pub fn protected(parameter: impl Into<String>, value: Sensitive) -> Self {
        Self::Protected {
            parameter: parameter.into(),
            value,
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Self::Protected { .. })
    }

    /// Underlying value regardless of storage class
    pub fn expose(&self) -> &str {
        match self {
            Self::Plain { value } => value,
            Self::Protected { value, .. } => value.expose(),
        }
    }
}

/// Where a secret's material comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SecretSource {
    Generated { policy: GeneratorPolicy },
    Supplied { fields: BTreeMap<String, SecretValue> },
}

/// A container environment key that reads this secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretBinding {
    pub container: NodeId,
    pub env_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Named, independently lifecycled secret material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretEntry {
    pub description: String,
    pub source: SecretSource,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumers: Vec<SecretBinding>,
}

impl SecretEntry {
    pub fn generated(description: impl Into<String>, policy: GeneratorPolicy) -> Self {
        Self {
            description: description.into(),
            source: SecretSource::Generated { policy },
            consumers: Vec::new(),
        }
    }

    pub fn supplied(
        description: impl Into<String>,
        fields: impl IntoIterator<Item = (String, SecretValue)>,
    ) -> Self {
        Self {
            description: description.into(),
            source: SecretSource::Supplied {
                fields: fields.into_iter().collect(),
            },
            consumers: Vec::new(),
        }
    }

    /// Whether `field` can be referenced; `None` means the whole secret
    pub fn has_field(&self, field: Option<&str>) -> bool {
        let Some(field) = field else {
            return true;
        };
        match &self.source {
            SecretSource::Generated { policy } => policy.fields().any(|f| f == field),
            SecretSource::Supplied { fields } => fields.contains_key(field),
        }
    }

    /// Supplied value of a field
    pub fn field(&self, field: &str) -> Option<&SecretValue> {
        match &self.source {
            SecretSource::Supplied { fields } => fields.get(field),
            SecretSource::Generated { .. } => None,
        }
    }

    /// Record a consumer; rebinding the same container key replaces it
    pub fn bind(&mut self, binding: SecretBinding) {
        self.consumers
            .retain(|b| !(b.container == binding.container && b.env_key == binding.env_key));
        self.consumers.push(binding);
    }

    /// Value a consumer key resolves to, for supplied secrets
    pub fn binding_value(&self, env_key: &str) -> Option<&SecretValue> {
        self.consumers
            .iter()
            .find(|b| b.env_key == env_key)
            .and_then(|b| b.field.as_deref())
            .and_then(|field| self.field(field))
    }
}
