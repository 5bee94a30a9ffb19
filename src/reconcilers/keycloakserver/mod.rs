// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `KeycloakServer` reconciliation logic.
//!
//! One pass drives a strictly sequential state machine:
//!
//! ```text
//! Started -> SecretsProvisioned -> ServicesCreated -> DeploymentsApplied
//!         -> SchemaPrepared -> IngressCreated -> StatusReconciled
//! ```
//!
//! Every step is idempotent on deterministic names, so an aborted pass is simply
//! run again by the controller. The status is written after every step and on
//! failure.
//!
//! ## Module Structure
//!
//! - [`secrets`] - Credential, trust-store and TLS secrets
//! - [`network`] - Services, ingress, connection details
//! - [`deployments`] - Database storage and Deployments
//! - [`schema_job`] - Schema preparation pod
//! - [`status_helpers`] - Status aggregation
//! - [`types`] - Shared types and imports

pub mod deployments;
pub mod network;
pub mod schema_job;
pub mod secrets;
pub mod status_helpers;
pub mod types;

#[cfg(test)]
pub(crate) mod test_fixtures;

#[allow(clippy::wildcard_imports)]
use types::*;

use crate::variant::resolve_variant;

/// Position of a pass in the reconciliation state machine.
///
/// Each variant names the state reached after the step before it completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReconcilePhase {
    Started,
    SecretsProvisioned,
    ServicesCreated,
    DeploymentsApplied,
    SchemaPrepared,
    IngressCreated,
    StatusReconciled,
}

impl ReconcilePhase {
    /// Every state in execution order.
    pub const ALL: [Self; 7] = [
        Self::Started,
        Self::SecretsProvisioned,
        Self::ServicesCreated,
        Self::DeploymentsApplied,
        Self::SchemaPrepared,
        Self::IngressCreated,
        Self::StatusReconciled,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "Started",
            Self::SecretsProvisioned => "SecretsProvisioned",
            Self::ServicesCreated => "ServicesCreated",
            Self::DeploymentsApplied => "DeploymentsApplied",
            Self::SchemaPrepared => "SchemaPrepared",
            Self::IngressCreated => "IngressCreated",
            Self::StatusReconciled => "StatusReconciled",
        }
    }

    /// State following this one; `StatusReconciled` is terminal.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Started => Self::SecretsProvisioned,
            Self::SecretsProvisioned => Self::ServicesCreated,
            Self::ServicesCreated => Self::DeploymentsApplied,
            Self::DeploymentsApplied => Self::SchemaPrepared,
            Self::SchemaPrepared => Self::IngressCreated,
            Self::IngressCreated | Self::StatusReconciled => Self::StatusReconciled,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::StatusReconciled)
    }
}

impl std::fmt::Display for ReconcilePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run the step leaving `phase` and return the state reached.
async fn step(pass: &mut ReconcilePass<'_>, phase: ReconcilePhase) -> Result<ReconcilePhase> {
    match phase {
        ReconcilePhase::Started => secrets::provision_secrets(pass).await?,
        ReconcilePhase::SecretsProvisioned => network::create_services(pass).await?,
        ReconcilePhase::ServicesCreated => deployments::apply_deployments(pass).await?,
        ReconcilePhase::DeploymentsApplied => schema_job::prepare_schema(pass).await?,
        ReconcilePhase::SchemaPrepared => network::expose_server(pass).await?,
        ReconcilePhase::IngressCreated => network::publish_connection(pass).await?,
        ReconcilePhase::StatusReconciled => {}
    }
    Ok(phase.next())
}

/// Status condition reason describing why a pass failed.
#[must_use]
pub fn failure_reason(error: &anyhow::Error) -> &'static str {
    match error.downcast_ref::<KeycloakError>() {
        Some(KeycloakError::SchemaJobFailed { .. }) => REASON_SCHEMA_JOB_FAILED,
        Some(KeycloakError::SchemaJobTimedOut { .. }) => REASON_SCHEMA_JOB_TIMED_OUT,
        _ => REASON_RECONCILE_FAILED,
    }
}

/// Record a failed pass in the status. A failing status write is only logged.
async fn record_failure(
    pass: &mut ReconcilePass<'_>,
    phase: ReconcilePhase,
    error: &anyhow::Error,
) {
    pass.status.set_phase(DeploymentPhase::Failed);
    pass.status.set_condition(
        CONDITION_TYPE_READY,
        STATUS_FALSE,
        failure_reason(error),
        &format!("Failed after {phase}: {error:#}"),
    );

    if let Err(status_error) = pass.flush_status().await {
        error!(
            "Failed to record failure of KeycloakServer {}/{}: {}",
            pass.namespace, pass.name, status_error
        );
    }
}

/// Reconcile a `KeycloakServer` into its derived resources.
///
/// # Errors
///
/// Returns an error when any step fails. The failure has already been recorded
/// in the owner's status by then.
pub async fn reconcile_keycloakserver(ctx: Arc<Context>, server: KeycloakServer) -> Result<()> {
    let name = server.name_any();
    let namespace = server
        .namespace()
        .ok_or_else(|| KeycloakError::MissingNamespace { name: name.clone() })?;

    info!("Reconciling KeycloakServer: {}/{}", namespace, name);

    let variant = resolve_variant(&ctx.config, server.spec.database_vendor());
    debug!(
        flavor = ?variant.flavor,
        vendor = variant.vendor.as_str(),
        server_image = %variant.server_image,
        "Resolved deployment variant"
    );

    let mut pass = ReconcilePass::new(&ctx, &server, namespace, variant);
    pass.status.set_observed_generation(server.metadata.generation);
    pass.status.set_phase(DeploymentPhase::Requested);
    pass.status.set_condition(
        CONDITION_TYPE_READY,
        STATUS_UNKNOWN,
        REASON_RECONCILING,
        "Reconciliation in progress",
    );
    pass.flush_status().await?;

    let mut phase = ReconcilePhase::Started;
    while !phase.is_terminal() {
        debug!(step = %phase, "Running reconciliation step for {}/{}", pass.namespace, name);
        match step(&mut pass, phase).await {
            Ok(next) => {
                pass.status.set_last_completed_step(next.as_str());
                pass.flush_status().await?;
                phase = next;
            }
            Err(e) => {
                warn!(
                    "Reconciliation of KeycloakServer {}/{} failed at {}: {:#}",
                    pass.namespace, name, phase, e
                );
                record_failure(&mut pass, phase, &e).await;
                return Err(e);
            }
        }
    }

    info!(
        "Successfully reconciled KeycloakServer {}/{}",
        pass.namespace, name
    );
    Ok(())
}
