// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Operator configuration.
//!
//! Command-line flags (with environment fallbacks) are parsed by `clap` into
//! [`OperatorArgs`], then validated once into the immutable [`OperatorConfig`]
//! that every reconciliation pass receives. Nothing reads the environment after
//! startup, so a pass only depends on its inputs.
//!
//! # Example
//!
//! ```rust
//! use keycloak_operator::config::{OperatorArgs, OperatorConfig};
//! use keycloak_operator::variant::ServerFlavor;
//! use clap::Parser;
//!
//! #[derive(Parser)]
//! struct Cli {
//!     #[command(flatten)]
//!     operator: OperatorArgs,
//! }
//!
//! let cli = Cli::parse_from(["keycloak-operator", "--compliance-mode", "vendor-certified"]);
//! let config = OperatorConfig::try_from(&cli.operator).unwrap();
//! assert_eq!(config.flavor, ServerFlavor::VendorCertified);
//! ```

use crate::constants::{
    DEFAULT_IMAGE_VERSION, DEFAULT_SCHEMA_JOB_TIMEOUT_SECS, METRICS_SERVER_PORT,
};
use crate::errors::ConfigError;
use crate::variant::ServerFlavor;
use std::time::Duration;

/// Default controller namespace when none is configured
pub const DEFAULT_CONTROLLER_NAMESPACE: &str = "keycloak-operator";

/// Raw operator flags.
#[derive(Debug, Clone, PartialEq, Eq, clap::Args)]
#[command(next_help_heading = "Operator Options")]
pub struct OperatorArgs {
    /// Image flavor: `community` or `vendor-certified`.
    #[arg(
        long,
        env = "KEYCLOAK_OPERATOR_COMPLIANCE_MODE",
        default_value = "community"
    )]
    pub compliance_mode: String,

    /// Version tag of the identity server and schema job images.
    #[arg(
        long,
        env = "KEYCLOAK_OPERATOR_IMAGE_VERSION_FALLBACK",
        default_value = DEFAULT_IMAGE_VERSION
    )]
    pub image_version_fallback: String,

    /// Registry replacing `docker.io` for the operator's own images.
    #[arg(long, env = "KEYCLOAK_OPERATOR_IMAGE_REGISTRY_OVERRIDE")]
    pub image_registry_override: Option<String>,

    /// Set `fsGroup` on pods (needed on clusters that do not assign one).
    #[arg(
        long,
        env = "KEYCLOAK_OPERATOR_REQUIRES_FILESYSTEM_GROUP_OVERRIDE",
        action = clap::ArgAction::Set,
        default_value_t = false
    )]
    pub requires_filesystem_group_override: bool,

    /// Namespace the operator runs in; holds CA secrets and admin secret copies.
    #[arg(
        long,
        env = "KEYCLOAK_OPERATOR_NAMESPACE",
        default_value = DEFAULT_CONTROLLER_NAMESPACE
    )]
    pub controller_namespace: String,

    /// Comma separated CA secrets (in the controller namespace) to trust.
    #[arg(long, env = "KEYCLOAK_OPERATOR_CA_SECRET_NAMES", value_delimiter = ',')]
    pub ca_secret_names: Vec<String>,

    /// TLS secret used by ingresses that do not name their own.
    #[arg(long, env = "KEYCLOAK_OPERATOR_TLS_SECRET_NAME")]
    pub tls_secret_name: Option<String>,

    /// Domain suffix used to derive ingress hosts.
    #[arg(long, env = "KEYCLOAK_OPERATOR_ROUTING_SUFFIX")]
    pub routing_suffix: Option<String>,

    /// Seconds to wait for the schema preparation pod.
    #[arg(
        long,
        env = "KEYCLOAK_OPERATOR_SCHEMA_JOB_TIMEOUT_SECS",
        default_value_t = DEFAULT_SCHEMA_JOB_TIMEOUT_SECS
    )]
    pub schema_job_timeout_secs: u64,

    /// Only watch this namespace (all namespaces when unset).
    #[arg(long, env = "KEYCLOAK_OPERATOR_WATCH_NAMESPACE")]
    pub watch_namespace: Option<String>,

    /// Port of the Prometheus metrics endpoint.
    #[arg(
        long,
        env = "KEYCLOAK_OPERATOR_METRICS_PORT",
        default_value_t = METRICS_SERVER_PORT
    )]
    pub metrics_port: u16,
}

/// Validated, immutable operator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorConfig {
    /// Image flavor selected by the compliance mode.
    pub flavor: ServerFlavor,
    /// Version tag of the identity server and schema job images.
    pub image_version_fallback: String,
    /// Registry replacing `docker.io` for the operator's own images.
    pub image_registry_override: Option<String>,
    /// Whether pods get an explicit `fsGroup`.
    pub requires_filesystem_group_override: bool,
    /// Namespace the operator runs in.
    pub controller_namespace: String,
    /// CA secrets mounted into every identity server.
    pub ca_secret_names: Vec<String>,
    /// Fallback TLS secret for ingresses.
    pub tls_secret_name: Option<String>,
    /// Domain suffix used to derive ingress hosts.
    pub routing_suffix: Option<String>,
    /// Upper bound on the schema preparation wait.
    pub schema_job_timeout: Duration,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            flavor: ServerFlavor::Community,
            image_version_fallback: DEFAULT_IMAGE_VERSION.to_string(),
            image_registry_override: None,
            requires_filesystem_group_override: false,
            controller_namespace: DEFAULT_CONTROLLER_NAMESPACE.to_string(),
            ca_secret_names: Vec::new(),
            tls_secret_name: None,
            routing_suffix: None,
            schema_job_timeout: Duration::from_secs(DEFAULT_SCHEMA_JOB_TIMEOUT_SECS),
        }
    }
}

impl TryFrom<&OperatorArgs> for OperatorConfig {
    type Error = ConfigError;

    fn try_from(args: &OperatorArgs) -> Result<Self, Self::Error> {
        let flavor = args.compliance_mode.parse::<ServerFlavor>()?;

        let controller_namespace = args.controller_namespace.trim();
        if controller_namespace.is_empty() {
            return Err(ConfigError::EmptyControllerNamespace);
        }

        if args.schema_job_timeout_secs == 0 {
            return Err(ConfigError::InvalidSchemaJobTimeout);
        }

        let ca_secret_names = args
            .ca_secret_names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            flavor,
            image_version_fallback: args.image_version_fallback.clone(),
            image_registry_override: non_blank(args.image_registry_override.as_deref()),
            requires_filesystem_group_override: args.requires_filesystem_group_override,
            controller_namespace: controller_namespace.to_string(),
            ca_secret_names,
            tls_secret_name: non_blank(args.tls_secret_name.as_deref()),
            routing_suffix: non_blank(args.routing_suffix.as_deref()),
            schema_job_timeout: Duration::from_secs(args.schema_job_timeout_secs),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
