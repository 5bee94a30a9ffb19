// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Database storage and the two Deployments of a `KeycloakServer`.

use super::status_helpers::reload;
use super::types::*;

/// Step `ServicesCreated`: database PVC, database and server Deployments.
///
/// The PVC is only ever created, never updated: a bound claim cannot be resized
/// or moved to another storage class by a patch. Deployments are merge-patched
/// so fields set by other controllers (e.g. autoscaled replicas) survive.
///
/// # Errors
///
/// Returns an error if a resource cannot be written.
pub async fn apply_deployments(pass: &mut ReconcilePass<'_>) -> Result<()> {
    ensure_db_storage(pass).await?;

    let db = build_db_deployment(pass.owner, &pass.namespace, &pass.variant);
    apply_deployment(pass, &db, ResourceRole::DbDeployment).await?;

    let server = build_server_deployment(
        pass.owner,
        &pass.namespace,
        &pass.variant,
        &pass.trust_store_secrets,
    );
    apply_deployment(pass, &server, ResourceRole::ServerDeployment).await?;
    Ok(())
}

async fn ensure_db_storage(pass: &mut ReconcilePass<'_>) -> Result<()> {
    let claims = pass.cluster.persistent_volume_claims();
    let name = pass.resource_name(ResourceRole::DbPvc);

    claims
        .create_if_absent(&build_db_pvc(pass.owner, &pass.namespace))
        .await?;
    pass.record_write::<PersistentVolumeClaim>("create_if_absent");
    reload(claims, &mut pass.status, &pass.namespace, &name).await;
    Ok(())
}

async fn apply_deployment(
    pass: &mut ReconcilePass<'_>,
    deployment: &Deployment,
    role: ResourceRole,
) -> Result<()> {
    let deployments = pass.cluster.deployments();
    let name = pass.resource_name(role);

    deployments.create_or_patch(deployment).await?;
    pass.record_write::<Deployment>("create_or_patch");
    reload(deployments, &mut pass.status, &pass.namespace, &name).await;
    Ok(())
}

#[cfg(test)]
#[path = "deployments_tests.rs"]
mod deployments_tests;
