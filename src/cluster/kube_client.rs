// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster clients backed by the Kubernetes API server.
//!
//! # Strategies
//!
//! - **Create if absent**: read, create when missing; a concurrent create (409) yields the winner
//! - **Replace**: forced server-side apply, the operator owns every field it sends
//! - **Patch**: JSON merge patch, fields the operator does not send are left alone
//!
//! Status writes go through the status subresource with a merge patch.

use super::{
    object_ref, ClusterClient, ClusterResource, KeycloakServerClient, PodClient, ResourceClient,
};
use crate::constants::FIELD_MANAGER;
use crate::crd::{KeycloakServer, KeycloakServerStatus};
use crate::errors::KeycloakError;
use anyhow::{anyhow, Result};
use either::Either;
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{ConfigMap, PersistentVolumeClaim, Pod, Secret, Service},
    networking::v1::Ingress,
};
use kube::api::{DeleteParams, Patch, PatchParams, PostParams};
use kube::runtime::wait::{await_condition, conditions, Condition};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use std::marker::PhantomData;
use tracing::{debug, info};

/// Client for one namespaced resource kind.
pub struct KubeResources<K> {
    client: Client,
    kind: PhantomData<fn() -> K>,
}

impl<K> KubeResources<K> {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            kind: PhantomData,
        }
    }
}

impl<K: ClusterResource> KubeResources<K> {
    fn api(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn create(&self, api: &Api<K>, resource: &K, namespace: &str, name: &str) -> Result<K> {
        match api.create(&PostParams::default(), resource).await {
            Ok(created) => {
                info!("Created {} {}/{}", K::kind(&()), namespace, name);
                Ok(created)
            }
            Err(kube::Error::Api(api_err)) if api_err.code == 409 => {
                debug!(
                    "{} {}/{} was created concurrently, loading it",
                    K::kind(&()),
                    namespace,
                    name
                );
                Ok(api.get(name).await?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait::async_trait]
impl<K: ClusterResource> ResourceClient<K> for KubeResources<K> {
    async fn load(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        Ok(self.api(namespace).get_opt(name).await?)
    }

    async fn create_if_absent(&self, resource: &K) -> Result<K> {
        let (namespace, name) = object_ref(resource)?;
        let api = self.api(&namespace);

        if let Some(existing) = api.get_opt(&name).await? {
            debug!(
                "{} {}/{} already exists, keeping it",
                K::kind(&()),
                namespace,
                name
            );
            return Ok(existing);
        }

        self.create(&api, resource, &namespace, &name).await
    }

    async fn create_or_replace(&self, resource: &K) -> Result<K> {
        let (namespace, name) = object_ref(resource)?;
        let api = self.api(&namespace);

        debug!(
            namespace = %namespace,
            name = %name,
            kind = %K::kind(&()),
            "Creating or replacing resource with Apply strategy"
        );

        if api.get_opt(&name).await?.is_none() {
            return self.create(&api, resource, &namespace, &name).await;
        }

        let applied = api
            .patch(
                &name,
                &PatchParams::apply(FIELD_MANAGER).force(),
                &Patch::Apply(resource),
            )
            .await?;
        info!("Replaced {} {}/{}", K::kind(&()), namespace, name);
        Ok(applied)
    }

    async fn create_or_patch(&self, resource: &K) -> Result<K> {
        let (namespace, name) = object_ref(resource)?;
        let api = self.api(&namespace);

        if api.get_opt(&name).await?.is_none() {
            return self.create(&api, resource, &namespace, &name).await;
        }

        let patched = api
            .patch(&name, &PatchParams::default(), &Patch::Merge(resource))
            .await?;
        info!("Patched {} {}/{}", K::kind(&()), namespace, name);
        Ok(patched)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        let api = self.api(namespace);
        match api.delete(name, &DeleteParams::default()).await {
            Ok(Either::Left(terminating)) => {
                // Wait until the name is free again so it can be recreated
                if let Some(uid) = terminating.uid() {
                    await_condition(api, name, conditions::is_deleted(&uid)).await?;
                }
                info!("Deleted {} {}/{}", K::kind(&()), namespace, name);
                Ok(())
            }
            Ok(Either::Right(_)) => {
                info!("Deleted {} {}/{}", K::kind(&()), namespace, name);
                Ok(())
            }
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Matches pods in a terminal phase.
fn is_pod_completed() -> impl Condition<Pod> {
    |pod: Option<&Pod>| {
        pod.and_then(|p| p.status.as_ref())
            .and_then(|s| s.phase.as_deref())
            .is_some_and(|phase| phase == "Succeeded" || phase == "Failed")
    }
}

#[async_trait::async_trait]
impl PodClient for KubeResources<Pod> {
    async fn wait_for_completion(&self, namespace: &str, name: &str) -> Result<Pod> {
        debug!("Waiting for pod {}/{} to complete", namespace, name);
        let pod = await_condition(self.api(namespace), name, is_pod_completed()).await?;
        pod.ok_or_else(|| anyhow!("Pod {namespace}/{name} was deleted before it completed"))
    }
}

/// Access to `KeycloakServer` resources and their status subresource.
pub struct KubeKeycloakServers {
    client: Client,
}

#[async_trait::async_trait]
impl KeycloakServerClient for KubeKeycloakServers {
    async fn load(&self, namespace: &str, name: &str) -> Result<Option<KeycloakServer>> {
        let api: Api<KeycloakServer> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn update_status(
        &self,
        server: &KeycloakServer,
        status: &KeycloakServerStatus,
    ) -> Result<()> {
        let name = server.name_any();
        let namespace = server
            .namespace()
            .ok_or_else(|| KeycloakError::MissingNamespace { name: name.clone() })?;
        let api: Api<KeycloakServer> = Api::namespaced(self.client.clone(), &namespace);

        let status_patch = json!({ "status": status });
        api.patch_status(&name, &PatchParams::default(), &Patch::Merge(&status_patch))
            .await?;

        debug!(
            "Updated status of KeycloakServer {}/{} to phase {:?}",
            namespace, name, status.phase
        );
        Ok(())
    }
}

/// Every per-kind client, sharing one `kube::Client`.
pub struct KubeCluster {
    secrets: KubeResources<Secret>,
    config_maps: KubeResources<ConfigMap>,
    services: KubeResources<Service>,
    deployments: KubeResources<Deployment>,
    ingresses: KubeResources<Ingress>,
    persistent_volume_claims: KubeResources<PersistentVolumeClaim>,
    pods: KubeResources<Pod>,
    keycloak_servers: KubeKeycloakServers,
}

impl KubeCluster {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            secrets: KubeResources::new(client.clone()),
            config_maps: KubeResources::new(client.clone()),
            services: KubeResources::new(client.clone()),
            deployments: KubeResources::new(client.clone()),
            ingresses: KubeResources::new(client.clone()),
            persistent_volume_claims: KubeResources::new(client.clone()),
            pods: KubeResources::new(client.clone()),
            keycloak_servers: KubeKeycloakServers { client },
        }
    }
}

impl ClusterClient for KubeCluster {
    fn secrets(&self) -> &dyn ResourceClient<Secret> {
        &self.secrets
    }

    fn config_maps(&self) -> &dyn ResourceClient<ConfigMap> {
        &self.config_maps
    }

    fn services(&self) -> &dyn ResourceClient<Service> {
        &self.services
    }

    fn deployments(&self) -> &dyn ResourceClient<Deployment> {
        &self.deployments
    }

    fn ingresses(&self) -> &dyn ResourceClient<Ingress> {
        &self.ingresses
    }

    fn persistent_volume_claims(&self) -> &dyn ResourceClient<PersistentVolumeClaim> {
        &self.persistent_volume_claims
    }

    fn pods(&self) -> &dyn PodClient {
        &self.pods
    }

    fn keycloak_servers(&self) -> &dyn KeycloakServerClient {
        &self.keycloak_servers
    }
}
