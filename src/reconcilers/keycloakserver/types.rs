// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared types and imports for `KeycloakServer` reconciliation.
//!
//! Besides the common re-exports, this module defines [`ReconcilePass`], the
//! state every step of one pass reads from and writes to.

#![allow(clippy::wildcard_imports)]

// Re-export commonly used types from parent modules
pub use crate::cluster::{ClusterClient, ClusterResource, ResourceClient};
pub use crate::config::OperatorConfig;
pub use crate::context::Context;
pub use crate::crd::{DeploymentPhase, KeycloakServer, KeycloakServerStatus};
pub use crate::errors::KeycloakError;
pub use crate::keycloak_resources::*;
pub use crate::metrics::Metrics;
pub use crate::naming::{resource_name, schema_name, service_host, ResourceRole};
pub use crate::status_reasons::*;
pub use crate::variant::ResolvedVariant;

// Re-export commonly used Kubernetes types
pub use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{ConfigMap, PersistentVolumeClaim, Pod, Secret, Service},
    networking::v1::Ingress,
};

// Re-export kube-rs types
pub use kube::ResourceExt;

// Re-export common utilities
pub use anyhow::Result;
pub use std::sync::Arc;
pub use tracing::{debug, error, info, warn};

use super::status_helpers::StatusAggregator;

/// Everything one reconciliation pass of a single `KeycloakServer` works with.
///
/// A pass is created from the shared [`Context`] and lives only as long as the
/// pass itself; nothing here survives into the next one.
pub struct ReconcilePass<'a> {
    pub cluster: &'a dyn ClusterClient,
    pub config: &'a OperatorConfig,
    pub metrics: &'a Metrics,
    pub owner: &'a KeycloakServer,
    pub name: String,
    pub namespace: String,
    pub variant: ResolvedVariant,
    /// CA secrets available in the owner namespace, in configured order
    pub trust_store_secrets: Vec<String>,
    /// TLS secret for the ingress, once known to exist in the owner namespace
    pub tls_secret: Option<String>,
    pub status: StatusAggregator,
}

impl<'a> ReconcilePass<'a> {
    #[must_use]
    pub fn new(
        ctx: &'a Context,
        owner: &'a KeycloakServer,
        namespace: String,
        variant: ResolvedVariant,
    ) -> Self {
        Self {
            cluster: ctx.cluster.as_ref(),
            config: ctx.config.as_ref(),
            metrics: &ctx.metrics,
            owner,
            name: owner.name_any(),
            namespace,
            variant,
            trust_store_secrets: Vec::new(),
            tls_secret: None,
            status: StatusAggregator::new(owner),
        }
    }

    /// Name of the derived resource playing `role`.
    #[must_use]
    pub fn resource_name(&self, role: ResourceRole) -> String {
        resource_name(&self.name, role)
    }

    /// Whether the owner lives in the controller namespace.
    #[must_use]
    pub fn in_controller_namespace(&self) -> bool {
        self.namespace == self.config.controller_namespace
    }

    /// Count a write against the metrics.
    pub fn record_write<K: ClusterResource>(&self, operation: &str) {
        self.metrics.record_resource_write(&K::kind(&()), operation);
    }

    /// Write the aggregated status to the owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the status subresource cannot be updated.
    pub async fn flush_status(&self) -> Result<()> {
        self.status
            .flush(self.cluster.keycloak_servers(), self.owner)
            .await
    }
}
