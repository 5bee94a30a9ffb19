// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Deterministic names for every resource derived from a `KeycloakServer`.
//!
//! A derived name is `<owner-name><role-suffix>`. The same owner and role always
//! produce the same name, which is what makes every provisioning step safe to
//! repeat: a second pass targets the objects the first pass created.
//!
//! # Example
//!
//! ```rust
//! use keycloak_operator::naming::{resource_name, ResourceRole};
//!
//! assert_eq!(resource_name("my-keycloak", ResourceRole::DbService), "my-keycloak-db-service");
//! ```

use crate::constants::CLUSTER_DNS_SUFFIX;

/// Logical purpose of a derived resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceRole {
    /// Database deployment role (`-db`), also the database pod label value
    Db,
    /// Identity server deployment role (`-server`), also the server pod label value
    Server,
    ServerService,
    ServerDeployment,
    DbService,
    DbDeployment,
    DbPvc,
    /// Credentials of the schema owner
    DbSecret,
    /// Credentials of the identity server administrator
    AdminSecret,
    /// Credentials of the database superuser
    DbAdminSecret,
    Ingress,
    ConnectionConfig,
    SchemaJob,
}

impl ResourceRole {
    /// Suffix appended to the owner name.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Db => "-db",
            Self::Server => "-server",
            Self::ServerService => "-server-service",
            Self::ServerDeployment => "-server-deployment",
            Self::DbService => "-db-service",
            Self::DbDeployment => "-db-deployment",
            Self::DbPvc => "-db-pvc",
            Self::DbSecret => "-db-secret",
            Self::AdminSecret => "-admin-secret",
            Self::DbAdminSecret => "-db-admin-secret",
            Self::Ingress => "-ingress",
            Self::ConnectionConfig => "-connection-config",
            Self::SchemaJob => "-db-preparation-job",
        }
    }

    /// Service fronting the pods of a deployment role.
    #[must_use]
    pub const fn service(self) -> Self {
        match self {
            Self::Db => Self::DbService,
            Self::Server => Self::ServerService,
            other => other,
        }
    }

    /// Deployment running the pods of a deployment role.
    #[must_use]
    pub const fn deployment(self) -> Self {
        match self {
            Self::Db => Self::DbDeployment,
            Self::Server => Self::ServerDeployment,
            other => other,
        }
    }
}

/// Name of the resource playing `role` for the owner called `owner_name`.
#[must_use]
pub fn resource_name(owner_name: &str, role: ResourceRole) -> String {
    format!("{owner_name}{}", role.suffix())
}

/// Database schema owned by the identity server, e.g. `my-keycloak` -> `my_keycloak_db`.
///
/// Hyphens are not valid in unquoted SQL identifiers, so they become underscores.
#[must_use]
pub fn schema_name(owner_name: &str) -> String {
    format!("{}_db", owner_name.replace('-', "_"))
}

/// Init container creating `schema`, e.g. `my_keycloak_db` -> `my-keycloak-db-schema-creation-job`.
#[must_use]
pub fn schema_init_container_name(schema: &str) -> String {
    format!("{}-schema-creation-job", schema.replace('_', "-"))
}

/// Cluster-internal DNS name of a Service.
#[must_use]
pub fn service_host(service_name: &str, namespace: &str) -> String {
    format!("{service_name}.{namespace}.{CLUSTER_DNS_SUFFIX}")
}

/// Default ingress host when the owner does not specify one.
#[must_use]
pub fn default_ingress_host(owner_name: &str, namespace: &str, routing_suffix: &str) -> String {
    format!("{owner_name}-{namespace}.{routing_suffix}")
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod naming_tests;
