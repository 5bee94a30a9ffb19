// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definition for Keycloak / SSO servers.
//!
//! A [`KeycloakServer`] describes one identity server together with the
//! relational database backing it. The operator derives every other resource
//! (secrets, deployments, services, ingress, volume claim, schema job) from it.
//!
//! # Example
//!
//! ```rust,no_run
//! use keycloak_operator::crd::{KeycloakServerSpec, ResourceRequirementsSpec};
//!
//! let spec = KeycloakServerSpec {
//!     ingress_host_name: Some("sso.example.com".to_string()),
//!     resource_requirements: Some(ResourceRequirementsSpec {
//!         memory_limit: Some("4Gi".to_string()),
//!         ..Default::default()
//!     }),
//!     ..Default::default()
//! };
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Relational database vendor backing the identity server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseVendor {
    /// MySQL 8
    #[default]
    Mysql,
    /// PostgreSQL 12
    Postgresql,
}

impl DatabaseVendor {
    /// Vendor tag understood by the schema preparation image.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Postgresql => "postgresql",
        }
    }
}

impl fmt::Display for DatabaseVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute and storage overrides for the identity server.
///
/// Quantities use Kubernetes notation (`"7Gi"`, `"500m"`) and are passed through verbatim.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirementsSpec {
    /// Memory limit of the identity server container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<String>,

    /// Memory request of the identity server container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_request: Option<String>,

    /// CPU limit of the identity server container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<String>,

    /// CPU request of the identity server container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_request: Option<String>,

    /// Size of the database volume claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_request: Option<String>,
}

/// `KeycloakServer` runs a Keycloak (or Red Hat SSO) identity server backed by a
/// dedicated database.
///
/// # Example
///
/// ```yaml
/// apiVersion: sso.firestoned.io/v1alpha1
/// kind: KeycloakServer
/// metadata:
///   name: my-keycloak
///   namespace: sso
/// spec:
///   dbms: mysql
///   ingressHostName: access.192.168.0.100.nip.io
///   resourceRequirements:
///     memoryLimit: 7Gi
/// ```
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "sso.firestoned.io",
    version = "v1alpha1",
    kind = "KeycloakServer",
    namespaced,
    shortname = "kcs",
    doc = "KeycloakServer deploys an identity server and its database, prepares the database schema and exposes the server through an Ingress under /auth.",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"URL","type":"string","jsonPath":".status.baseUrl"}"#
)]
#[kube(status = "KeycloakServerStatus")]
#[serde(rename_all = "camelCase")]
pub struct KeycloakServerSpec {
    /// Database vendor. Defaults to `mysql`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbms: Option<DatabaseVendor>,

    /// Host name of the ingress rule.
    ///
    /// Defaults to `<name>-<namespace>.<routing suffix>` when the operator has a
    /// routing suffix configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_host_name: Option<String>,

    /// TLS secret used by the ingress. Defaults to the operator-wide TLS secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_secret_name: Option<String>,

    /// Full image reference replacing the resolved identity server image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_override: Option<String>,

    /// Number of identity server replicas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 0, max = 100))]
    pub replicas: Option<i32>,

    /// Resource overrides for the identity server and the database claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_requirements: Option<ResourceRequirementsSpec>,

    /// Storage class of the database volume claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,

    /// Register this server as the operator-wide default identity server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

impl KeycloakServerSpec {
    /// Database vendor, falling back to MySQL.
    #[must_use]
    pub fn database_vendor(&self) -> DatabaseVendor {
        self.dbms.unwrap_or_default()
    }
}

/// Condition represents an observation of a resource's current state.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (`Ready`, `SchemaPrepared`).
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// Coarse lifecycle of a `KeycloakServer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum DeploymentPhase {
    /// A pass is in progress
    Requested,
    /// The last pass reached the end of the state machine
    Successful,
    /// The last pass aborted
    Failed,
}

/// Live state of one derived resource, as last reloaded from the cluster.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObservedResource {
    /// Kind of the derived resource (`Service`, `Deployment`, ...).
    pub kind: String,

    /// Name of the derived resource.
    pub name: String,

    /// Whether the resource was found on its most recent reload.
    pub observed: bool,

    /// The `status` block of the resource when it was last observed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<BTreeMap<String, serde_json::Value>>")]
    pub status: Option<serde_json::Value>,

    /// RFC3339 time of the last successful observation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_observed_time: Option<String>,
}

/// `KeycloakServer` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeycloakServerStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<DeploymentPhase>,

    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Derived resources keyed by `<Kind>/<name>`.
    #[serde(default)]
    pub resources: BTreeMap<String, ObservedResource>,

    /// External base URL of the identity server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Secret holding the administrator credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_secret_name: Option<String>,

    /// Last reconciliation step that completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed_step: Option<String>,
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
