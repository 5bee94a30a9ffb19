// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Capability interfaces over the Kubernetes API.
//!
//! The reconciliation engine never talks to `kube::Api` directly. It uses one
//! narrow client per resource kind, bundled behind [`ClusterClient`]:
//!
//! - [`ResourceClient`] - load / create-if-absent / create-or-replace / create-or-patch / delete
//! - [`PodClient`] - adds run-to-completion waiting for one-shot pods
//! - [`KeycloakServerClient`] - reads the owning resource and writes its status
//!
//! Two implementations exist: [`kube_client::KubeCluster`] for a live cluster and
//! [`memory::InMemoryCluster`], a recording double used by the tests.

pub mod kube_client;
pub mod memory;

use crate::crd::{KeycloakServer, KeycloakServerStatus};
use crate::errors::KeycloakError;
use anyhow::Result;
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{ConfigMap, PersistentVolumeClaim, Pod, Secret, Service},
    networking::v1::Ingress,
};
use kube::core::NamespaceResourceScope;
use kube::Resource;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// Namespaced Kubernetes object the cluster clients can manage.
pub trait ClusterResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<T> ClusterResource for T where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Provisioning primitives for one resource kind.
///
/// Writes take the target namespace and name from the object's metadata.
#[async_trait::async_trait]
pub trait ResourceClient<K: ClusterResource>: Send + Sync {
    /// Current state of the object, `None` when it does not exist.
    async fn load(&self, namespace: &str, name: &str) -> Result<Option<K>>;

    /// Create the object unless one with the same name exists; returns the stored object.
    async fn create_if_absent(&self, resource: &K) -> Result<K>;

    /// Create the object, or replace every field the operator manages on the existing one.
    async fn create_or_replace(&self, resource: &K) -> Result<K>;

    /// Create the object, or merge the given fields into the existing one.
    async fn create_or_patch(&self, resource: &K) -> Result<K>;

    /// Delete the object; deleting a missing object succeeds.
    async fn delete(&self, namespace: &str, name: &str) -> Result<()>;
}

/// Pods additionally support waiting for run-to-completion.
#[async_trait::async_trait]
pub trait PodClient: ResourceClient<Pod> {
    /// Block until the pod reaches `Succeeded` or `Failed` and return it.
    ///
    /// Callers bound the wait with their own timeout.
    async fn wait_for_completion(&self, namespace: &str, name: &str) -> Result<Pod>;
}

/// Access to the owning custom resource.
#[async_trait::async_trait]
pub trait KeycloakServerClient: Send + Sync {
    /// Current state of the owning resource.
    async fn load(&self, namespace: &str, name: &str) -> Result<Option<KeycloakServer>>;

    /// Replace the status subresource of `server` with `status`.
    async fn update_status(
        &self,
        server: &KeycloakServer,
        status: &KeycloakServerStatus,
    ) -> Result<()>;
}

/// One client per resource kind the operator touches.
pub trait ClusterClient: Send + Sync {
    fn secrets(&self) -> &dyn ResourceClient<Secret>;
    fn config_maps(&self) -> &dyn ResourceClient<ConfigMap>;
    fn services(&self) -> &dyn ResourceClient<Service>;
    fn deployments(&self) -> &dyn ResourceClient<Deployment>;
    fn ingresses(&self) -> &dyn ResourceClient<Ingress>;
    fn persistent_volume_claims(&self) -> &dyn ResourceClient<PersistentVolumeClaim>;
    fn pods(&self) -> &dyn PodClient;
    fn keycloak_servers(&self) -> &dyn KeycloakServerClient;
}

/// Namespace and name of an object about to be written.
///
/// # Errors
///
/// Returns [`KeycloakError::MissingMetadata`] when either is unset.
pub fn object_ref<K: ClusterResource>(resource: &K) -> Result<(String, String)> {
    let meta = resource.meta();
    let namespace = meta
        .namespace
        .clone()
        .ok_or_else(|| KeycloakError::MissingMetadata {
            kind: K::kind(&()).to_string(),
            field: "namespace",
        })?;
    let name = meta.name.clone().ok_or_else(|| KeycloakError::MissingMetadata {
        kind: K::kind(&()).to_string(),
        field: "name",
    })?;
    Ok((namespace, name))
}
