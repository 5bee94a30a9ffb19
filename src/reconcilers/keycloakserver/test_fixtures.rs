// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Fixtures shared by the `KeycloakServer` reconciler tests.

use super::types::*;
use crate::cluster::memory::InMemoryCluster;
use crate::crd::{KeycloakServerSpec, ResourceRequirementsSpec};
use crate::variant::resolve_variant;
use std::collections::BTreeMap;
use std::time::Duration;

pub const OWNER_NAMESPACE: &str = "keycloak-namespace";
pub const CONTROLLER_NAMESPACE: &str = "keycloak-operator";
pub const CA_SECRET: &str = "ca-cert-secret";
pub const HOST: &str = "access.192.168.0.100.nip.io";
pub const TLS_SECRET: &str = "tls-secret";

pub fn server(name: &str, spec: KeycloakServerSpec) -> KeycloakServer {
    let mut server = KeycloakServer::new(name, spec);
    server.metadata.namespace = Some(OWNER_NAMESPACE.to_string());
    server.metadata.uid = Some(format!("{name}-uid"));
    server.metadata.generation = Some(1);
    server
}

/// `my-keycloak` with a 7Gi memory limit, a host and a TLS secret.
pub fn my_keycloak() -> KeycloakServer {
    server(
        "my-keycloak",
        KeycloakServerSpec {
            ingress_host_name: Some(HOST.to_string()),
            tls_secret_name: Some(TLS_SECRET.to_string()),
            resource_requirements: Some(ResourceRequirementsSpec {
                memory_limit: Some("7Gi".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        },
    )
}

pub fn config() -> OperatorConfig {
    OperatorConfig {
        controller_namespace: CONTROLLER_NAMESPACE.to_string(),
        ca_secret_names: vec![CA_SECRET.to_string()],
        schema_job_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

pub fn context(cluster: &Arc<InMemoryCluster>, config: OperatorConfig) -> Arc<Context> {
    Arc::new(Context::new(
        cluster.clone(),
        config,
        Metrics::new().unwrap(),
    ))
}

pub fn pass<'a>(ctx: &'a Context, owner: &'a KeycloakServer) -> ReconcilePass<'a> {
    let namespace = owner.namespace().unwrap();
    let variant = resolve_variant(&ctx.config, owner.spec.database_vendor());
    ReconcilePass::new(ctx, owner, namespace, variant)
}

pub fn ca_secret() -> Secret {
    let mut string_data = BTreeMap::new();
    string_data.insert("ca.crt".to_string(), "-----BEGIN CERTIFICATE-----".to_string());
    Secret {
        metadata: kube::api::ObjectMeta {
            name: Some(CA_SECRET.to_string()),
            namespace: Some(CONTROLLER_NAMESPACE.to_string()),
            ..Default::default()
        },
        string_data: Some(string_data),
        ..Default::default()
    }
}

pub fn credential_secret(namespace: &str, name: &str, username: &str, password: &str) -> Secret {
    let mut string_data = BTreeMap::new();
    string_data.insert("username".to_string(), username.to_string());
    string_data.insert("password".to_string(), password.to_string());
    Secret {
        metadata: kube::api::ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        string_data: Some(string_data),
        ..Default::default()
    }
}

pub fn stored_credentials(
    cluster: &InMemoryCluster,
    namespace: &str,
    name: &str,
) -> Option<Credentials> {
    cluster
        .secrets
        .get(namespace, name)
        .as_ref()
        .and_then(read_credentials)
}
