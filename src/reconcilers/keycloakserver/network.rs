// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Services, ingress and connection details of a `KeycloakServer`.

use super::status_helpers::reload;
use super::types::*;
use crate::constants::{
    AUTH_WEB_CONTEXT, DB_PORT_NAME, DEFAULT_CAPABILITIES_CONFIGMAP, SERVER_PORT,
    SERVER_PORT_NAME,
};
use crate::naming::default_ingress_host;
use k8s_openapi::api::core::v1::ServiceStatus;
use k8s_openapi::api::networking::v1::IngressStatus;

/// Step `SecretsProvisioned`: database and server services.
///
/// # Errors
///
/// Returns an error if a service cannot be written.
pub async fn create_services(pass: &mut ReconcilePass<'_>) -> Result<()> {
    let db_port = pass.variant.db().port;
    ensure_service(pass, ResourceRole::Db, DB_PORT_NAME, db_port).await?;
    ensure_service(pass, ResourceRole::Server, SERVER_PORT_NAME, SERVER_PORT).await?;
    Ok(())
}

/// Create or replace the ClusterIP service in front of `role`, then reload it.
///
/// # Errors
///
/// Returns an error if the service cannot be written.
pub async fn ensure_service(
    pass: &mut ReconcilePass<'_>,
    role: ResourceRole,
    port_name: &str,
    port: i32,
) -> Result<Option<ServiceStatus>> {
    let services = pass.cluster.services();
    let service = build_service(pass.owner, &pass.namespace, role, port_name, port);
    let name = pass.resource_name(role.service());

    services.create_or_replace(&service).await?;
    pass.record_write::<Service>("create_or_replace");

    let live = reload(services, &mut pass.status, &pass.namespace, &name).await;
    Ok(live.and_then(|service| service.status))
}

/// Host the ingress routes, if one can be resolved.
///
/// The owner's own host wins; otherwise one is derived from the routing suffix.
#[must_use]
pub fn resolve_ingress_host(pass: &ReconcilePass<'_>) -> Option<String> {
    pass.owner
        .spec
        .ingress_host_name
        .clone()
        .filter(|host| !host.is_empty())
        .or_else(|| {
            pass.config
                .routing_suffix
                .as_deref()
                .map(|suffix| default_ingress_host(&pass.name, &pass.namespace, suffix))
        })
}

/// Step `SchemaPrepared`: route `/auth` to the server service.
///
/// # Errors
///
/// Returns an error if the ingress cannot be read or written.
pub async fn expose_server(pass: &mut ReconcilePass<'_>) -> Result<()> {
    let backend = pass.resource_name(ResourceRole::ServerService);
    ensure_ingress_path(pass, AUTH_WEB_CONTEXT, &backend, SERVER_PORT).await?;
    Ok(())
}

/// Make the ingress route `context` to `backend_service`.
///
/// A missing ingress is created with the resolved host and TLS secret; an
/// existing ingress without the path gets the path patched in. The ingress is
/// reloaded afterwards.
///
/// # Errors
///
/// Returns an error if the ingress cannot be read or written.
pub async fn ensure_ingress_path(
    pass: &mut ReconcilePass<'_>,
    context: &str,
    backend_service: &str,
    port: i32,
) -> Result<Option<IngressStatus>> {
    let ingresses = pass.cluster.ingresses();
    let name = pass.resource_name(ResourceRole::Ingress);
    let path = build_ingress_path(context, backend_service, port);

    match ingresses.load(&pass.namespace, &name).await? {
        None => {
            let host = resolve_ingress_host(pass);
            let ingress = build_ingress(
                pass.owner,
                &pass.namespace,
                host.as_deref(),
                pass.tls_secret.as_deref(),
                path,
            );
            ingresses.create_if_absent(&ingress).await?;
            pass.record_write::<Ingress>("create_if_absent");
        }
        Some(existing) if !ingress_has_path(&existing, context) => {
            info!(
                "Adding path {} to ingress {}/{}",
                context, pass.namespace, name
            );
            ingresses
                .create_or_patch(&with_ingress_path(&existing, path))
                .await?;
            pass.record_write::<Ingress>("create_or_patch");
        }
        Some(_) => debug!(
            "Ingress {}/{} already routes {}",
            pass.namespace, name, context
        ),
    }

    let live = reload(ingresses, &mut pass.status, &pass.namespace, &name).await;
    Ok(live.and_then(|ingress| ingress.status))
}

/// Step `IngressCreated`: publish connection details and complete the status.
///
/// # Errors
///
/// Returns an error if a ConfigMap cannot be read or written.
pub async fn publish_connection(pass: &mut ReconcilePass<'_>) -> Result<()> {
    let config_maps = pass.cluster.config_maps();
    let host = resolve_ingress_host(pass);
    let tls = host.is_some() && pass.tls_secret.is_some();

    let internal_url = internal_base_url(&pass.name, &pass.namespace);
    let url = external_base_url(host.as_deref(), tls, &internal_url);

    let connection = build_connection_config_map(pass.owner, &pass.namespace, &url, &internal_url);
    let connection_name = pass.resource_name(ResourceRole::ConnectionConfig);
    config_maps.create_or_replace(&connection).await?;
    pass.record_write::<ConfigMap>("create_or_replace");
    reload(config_maps, &mut pass.status, &pass.namespace, &connection_name).await;

    register_default(pass).await?;

    info!(
        "KeycloakServer {}/{} is reachable at {}",
        pass.namespace, pass.name, url
    );
    pass.status.set_base_url(url);
    pass.status.set_phase(DeploymentPhase::Successful);
    pass.status.set_condition(
        CONDITION_TYPE_READY,
        STATUS_TRUE,
        REASON_RECONCILED,
        "All derived resources are in place",
    );
    Ok(())
}

/// Register the owner as the operator-wide default identity server.
///
/// An owner flagged as default always takes over; any other owner only claims
/// the slot while it is empty.
///
/// # Errors
///
/// Returns an error if the ConfigMap cannot be read or written.
pub async fn register_default(pass: &ReconcilePass<'_>) -> Result<()> {
    let config_maps = pass.cluster.config_maps();
    let controller_namespace = &pass.config.controller_namespace;
    let registration =
        build_default_capabilities_config_map(pass.owner, controller_namespace, &pass.namespace);

    if pass.owner.spec.is_default == Some(true) {
        config_maps.create_or_replace(&registration).await?;
        pass.record_write::<ConfigMap>("create_or_replace");
        info!(
            "Registered KeycloakServer {}/{} as the default",
            pass.namespace, pass.name
        );
    } else if config_maps
        .load(controller_namespace, DEFAULT_CAPABILITIES_CONFIGMAP)
        .await?
        .is_none()
    {
        config_maps.create_if_absent(&registration).await?;
        pass.record_write::<ConfigMap>("create_if_absent");
        info!(
            "No default KeycloakServer registered yet, using {}/{}",
            pass.namespace, pass.name
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod network_tests;
