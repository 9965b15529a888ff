// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Configuration
//!
//! Every literal the topology uses lives here, so the builder itself holds no
//! magic values. Defaults reproduce the reference deployment; a JSON document
//! or a handful of environment variables can override them.
//!
//! | Variable                      | Field                         |
//! |-------------------------------|-------------------------------|
//! | `TOPOLOGY_STACK_NAME`         | `stack_name`                  |
//! | `TOPOLOGY_DB_MIN_CAPACITY`    | `database.scaling.min_capacity` |
//! | `TOPOLOGY_DB_MAX_CAPACITY`    | `database.scaling.max_capacity` |
//! | `TOPOLOGY_NAT_GATEWAYS`       | `network.nat_gateways`        |
//! | `TOPOLOGY_LOG_RETENTION_DAYS` | `logging.retention_days`      |

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::constructs::{DatabaseProps, EdgeRouterProps};
use crate::domain::{
    BucketSpec, Cidr, CpuArchitecture, DatabaseEngine, FunctionUrlAuth, HealthCheck,
    ScalingConfiguration, DEFAULT_INSTANCE_CLASS, DEFAULT_NETWORK_CIDR,
};
use crate::errors::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub cidr: Cidr,
    pub max_azs: u8,
    pub nat_gateways: u8,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            cidr: DEFAULT_NETWORK_CIDR,
            max_azs: 2,
            nat_gateways: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub engine_version: String,
    pub instances: u32,
    pub port: u16,
    pub default_database_name: String,
    pub master_username: String,
    pub provisional_instance_class: String,
    pub performance_insights: bool,
    pub storage_encrypted: bool,
    pub scaling: ScalingConfiguration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            engine_version: "8.0.mysql_aurora.3.02.1".to_string(),
            instances: 1,
            port: 3306,
            default_database_name: "mlflow".to_string(),
            master_username: "admin".to_string(),
            provisional_instance_class: DEFAULT_INSTANCE_CLASS.to_string(),
            performance_insights: true,
            storage_encrypted: true,
            scaling: ScalingConfiguration::default(),
        }
    }
}

impl DatabaseConfig {
    pub fn props(&self) -> DatabaseProps {
        DatabaseProps {
            engine: DatabaseEngine::aurora_mysql(&self.engine_version),
            instances: self.instances,
            port: self.port,
            default_database_name: self.default_database_name.clone(),
            master_username: self.master_username.clone(),
            provisional_instance_class: self.provisional_instance_class.clone(),
            performance_insights: self.performance_insights,
            storage_encrypted: self.storage_encrypted,
            scaling: self.scaling,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub cpu: u32,
    pub memory_mib: u32,
    pub cpu_architecture: CpuArchitecture,
    pub desired_count: u32,
    pub listener_port: u16,
    /// Replaces the load balancer's default check once the service exists
    pub health_check: HealthCheck,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cpu: 2048,
            memory_mib: 4096,
            cpu_architecture: CpuArchitecture::Arm64,
            desired_count: 1,
            listener_port: 80,
            health_check: HealthCheck {
                path: "/ping".to_string(),
                interval_secs: 5,
                timeout_secs: 3,
            },
        }
    }
}

/// Authenticating reverse proxy, the service's ingress container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub container_name: String,
    pub image: String,
    pub port: u16,
    pub email_domains: String,
    pub skip_jwt_bearer_tokens: bool,
    pub sign_in_logo: String,
    pub banner: String,
    pub footer: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            container_name: "oauth2-proxy".to_string(),
            image: "quay.io/oauth2-proxy/oauth2-proxy:v7.4.0-arm64".to_string(),
            port: 4180,
            email_domains: "*".to_string(),
            skip_jwt_bearer_tokens: true,
            sign_in_logo: "https://mlflow.org/docs/latest/_static/MLflow-logo-final-black.png"
                .to_string(),
            banner: "Machine Learning Lifecycle Platform".to_string(),
            footer: "Turing Motors, Inc.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub container_name: String,
    pub asset_directory: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            container_name: "mlflow".to_string(),
            asset_directory: "containers/mlflow".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub retention_days: u32,
    pub stream_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            retention_days: 14,
            stream_prefix: "ecs".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenFunctionConfig {
    pub entry: String,
    pub runtime: String,
    pub architecture: CpuArchitecture,
    pub url_auth: FunctionUrlAuth,
}

impl Default for TokenFunctionConfig {
    fn default() -> Self {
        Self {
            entry: "src/functions/generate-bearer-token.ts".to_string(),
            runtime: "nodejs18.x".to_string(),
            architecture: CpuArchitecture::Arm64,
            url_auth: FunctionUrlAuth::None,
        }
    }
}

/// Literal values for one topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub stack_name: String,
    pub region: String,
    pub network: NetworkConfig,
    pub database: DatabaseConfig,
    pub bucket: BucketSpec,
    pub service: ServiceConfig,
    pub proxy: ProxyConfig,
    pub application: ApplicationConfig,
    pub logging: LoggingConfig,
    pub token_function: TokenFunctionConfig,
    pub edge: EdgeRouterProps,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            stack_name: "MLflow".to_string(),
            region: "us-east-1".to_string(),
            network: NetworkConfig::default(),
            database: DatabaseConfig::default(),
            bucket: BucketSpec::default(),
            service: ServiceConfig::default(),
            proxy: ProxyConfig::default(),
            application: ApplicationConfig::default(),
            logging: LoggingConfig::default(),
            token_function: TokenFunctionConfig::default(),
            edge: EdgeRouterProps::default(),
        }
    }
}

impl TopologyConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Load a full document; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from any key lookup (the environment in production)
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("TOPOLOGY_STACK_NAME") {
            self.stack_name = name;
        }
        if let Some(min) = parse_var(&lookup, "TOPOLOGY_DB_MIN_CAPACITY")? {
            self.database.scaling.min_capacity = min;
        }
        if let Some(max) = parse_var(&lookup, "TOPOLOGY_DB_MAX_CAPACITY")? {
            self.database.scaling.max_capacity = max;
        }
        if let Some(nat) = parse_var(&lookup, "TOPOLOGY_NAT_GATEWAYS")? {
            self.network.nat_gateways = nat;
        }
        if let Some(days) = parse_var(&lookup, "TOPOLOGY_LOG_RETENTION_DAYS")? {
            self.logging.retention_days = days;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.scaling.validate()?;
        if self.network.nat_gateways > self.network.max_azs {
            return Err(ConfigError::Invalid(format!(
                "{} NAT gateways exceed {} availability zones",
                self.network.nat_gateways, self.network.max_azs
            )));
        }
        if self.stack_name.is_empty() {
            return Err(ConfigError::Invalid("stack name cannot be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVariable {
                variable: key.to_string(),
                value,
            }),
    }
}

/// Connection settings for the graph publisher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    /// NATS server URLs
    pub servers: Vec<String>,
    /// Client name
    pub name: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// First subject token for published plans
    pub subject_prefix: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            name: "cim-topology".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 5,
            subject_prefix: "topology".to_string(),
        }
    }
}

impl NatsConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
