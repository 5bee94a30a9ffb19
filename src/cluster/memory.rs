// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory cluster that records every call.
//!
//! Mimics the parts of API server behavior the engine relies on: writes do not
//! touch `status`, merge patches follow RFC 7386, and pods complete with a
//! configurable outcome. Tests seed objects with [`MemoryResources::insert`],
//! script failures with [`MemoryResources::fail`] and assert on
//! [`InMemoryCluster::calls`].

use super::{
    object_ref, ClusterClient, ClusterResource, KeycloakServerClient, PodClient, ResourceClient,
};
use crate::crd::{KeycloakServer, KeycloakServerStatus};
use anyhow::{anyhow, Result};
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{
        ConfigMap, ContainerState, ContainerStateTerminated, ContainerStatus,
        PersistentVolumeClaim, Pod, PodStatus, Secret, Service,
    },
    networking::v1::Ingress,
};
use kube::ResourceExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One recorded client call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientCall {
    pub operation: &'static str,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

type CallLog = Arc<Mutex<Vec<ClientCall>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn record(log: &CallLog, operation: &'static str, kind: &str, namespace: &str, name: &str) {
    lock(log).push(ClientCall {
        operation,
        kind: kind.to_string(),
        namespace: namespace.to_string(),
        name: name.to_string(),
    });
}

/// RFC 7386 JSON merge patch.
fn merge_json(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge_json(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

/// Scripted failure of one client operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// The call returns an error
    Error,
    /// The call never resolves
    Hang,
}

/// Store of one resource kind keyed by `(namespace, name)`.
pub struct MemoryResources<K> {
    objects: Mutex<BTreeMap<(String, String), K>>,
    faults: Mutex<BTreeMap<&'static str, Fault>>,
    calls: CallLog,
}

impl<K: ClusterResource> MemoryResources<K> {
    fn new(calls: CallLog) -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            faults: Mutex::new(BTreeMap::new()),
            calls,
        }
    }

    /// Make every later `operation` call on this kind fail with `fault`.
    pub fn fail(&self, operation: &'static str, fault: Fault) {
        lock(&self.faults).insert(operation, fault);
    }

    /// Remove every scripted failure.
    pub fn heal(&self) {
        lock(&self.faults).clear();
    }

    /// Seed an object without recording a call.
    ///
    /// # Errors
    ///
    /// Fails when the object has no name or namespace.
    pub fn insert(&self, resource: K) -> Result<()> {
        let key = object_ref(&resource)?;
        lock(&self.objects).insert(key, resource);
        Ok(())
    }

    /// Stored object, without recording a call.
    #[must_use]
    pub fn get(&self, namespace: &str, name: &str) -> Option<K> {
        lock(&self.objects)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Every stored object.
    #[must_use]
    pub fn all(&self) -> Vec<K> {
        lock(&self.objects).values().cloned().collect()
    }

    /// Record the call, then apply its scripted failure if any.
    async fn call(&self, operation: &'static str, namespace: &str, name: &str) -> Result<()> {
        record(&self.calls, operation, &K::kind(&()), namespace, name);
        let fault = lock(&self.faults).get(operation).copied();
        match fault {
            None => Ok(()),
            Some(Fault::Error) => Err(anyhow!(
                "injected {operation} failure for {} {namespace}/{name}",
                K::kind(&())
            )),
            Some(Fault::Hang) => futures::future::pending().await,
        }
    }

    /// Carry the stored `status` over onto `resource`, like the API server does
    /// for writes outside the status subresource.
    fn with_status_of(existing: &K, resource: &K) -> Result<K> {
        let mut replacement = serde_json::to_value(resource)?;
        let existing = serde_json::to_value(existing)?;
        if let (Some(status), Value::Object(map)) = (existing.get("status"), &mut replacement) {
            map.insert("status".to_string(), status.clone());
        }
        Ok(serde_json::from_value(replacement)?)
    }

    fn merged(existing: &K, resource: &K) -> Result<K> {
        let mut target = serde_json::to_value(existing)?;
        let mut patch = serde_json::to_value(resource)?;
        if let Value::Object(map) = &mut patch {
            map.remove("status");
        }
        merge_json(&mut target, &patch);
        Ok(serde_json::from_value(target)?)
    }
}

#[async_trait::async_trait]
impl<K: ClusterResource> ResourceClient<K> for MemoryResources<K> {
    async fn load(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        self.call("load", namespace, name).await?;
        Ok(self.get(namespace, name))
    }

    async fn create_if_absent(&self, resource: &K) -> Result<K> {
        let (namespace, name) = object_ref(resource)?;
        self.call("create_if_absent", &namespace, &name).await?;
        let mut objects = lock(&self.objects);
        let stored = objects
            .entry((namespace, name))
            .or_insert_with(|| resource.clone());
        Ok(stored.clone())
    }

    async fn create_or_replace(&self, resource: &K) -> Result<K> {
        let (namespace, name) = object_ref(resource)?;
        self.call("create_or_replace", &namespace, &name).await?;
        let mut objects = lock(&self.objects);
        let key = (namespace, name);
        let stored = match objects.get(&key) {
            Some(existing) => Self::with_status_of(existing, resource)?,
            None => resource.clone(),
        };
        objects.insert(key, stored.clone());
        Ok(stored)
    }

    async fn create_or_patch(&self, resource: &K) -> Result<K> {
        let (namespace, name) = object_ref(resource)?;
        self.call("create_or_patch", &namespace, &name).await?;
        let mut objects = lock(&self.objects);
        let key = (namespace, name);
        let stored = match objects.get(&key) {
            Some(existing) => Self::merged(existing, resource)?,
            None => resource.clone(),
        };
        objects.insert(key, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        self.call("delete", namespace, name).await?;
        lock(&self.objects).remove(&(namespace.to_string(), name.to_string()));
        Ok(())
    }
}

/// How submitted pods finish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PodBehavior {
    Succeeded,
    /// The pod fails with the given init container exit code
    Failed(i32),
    /// The pod never reaches a terminal phase
    Hangs,
}

/// Pod store whose pods complete according to a configured [`PodBehavior`].
pub struct MemoryPods {
    resources: MemoryResources<Pod>,
    behavior: Mutex<PodBehavior>,
}

impl MemoryPods {
    /// Make every later pod `operation` call fail with `fault`.
    pub fn fail(&self, operation: &'static str, fault: Fault) {
        self.resources.fail(operation, fault);
    }

    /// Outcome of pods waited on from now on.
    pub fn set_behavior(&self, outcome: PodBehavior) {
        *lock(&self.behavior) = outcome;
    }

    /// Seed a pod without recording a call.
    ///
    /// # Errors
    ///
    /// Fails when the pod has no name or namespace.
    pub fn insert(&self, pod: Pod) -> Result<()> {
        self.resources.insert(pod)
    }

    #[must_use]
    pub fn get(&self, namespace: &str, name: &str) -> Option<Pod> {
        self.resources.get(namespace, name)
    }

    fn completed(pod: Pod, outcome: &PodBehavior) -> Pod {
        let (phase, exit_code) = match outcome {
            PodBehavior::Failed(code) => ("Failed", *code),
            PodBehavior::Succeeded | PodBehavior::Hangs => ("Succeeded", 0),
        };
        let init_container_statuses = pod
            .spec
            .as_ref()
            .and_then(|spec| spec.init_containers.as_ref())
            .map(|containers| {
                containers
                    .iter()
                    .map(|container| ContainerStatus {
                        name: container.name.clone(),
                        image: container.image.clone().unwrap_or_default(),
                        state: Some(ContainerState {
                            terminated: Some(ContainerStateTerminated {
                                exit_code,
                                ..Default::default()
                            }),
                            ..Default::default()
                        }),
                        ..Default::default()
                    })
                    .collect()
            });
        Pod {
            status: Some(PodStatus {
                phase: Some(phase.to_string()),
                init_container_statuses,
                ..Default::default()
            }),
            ..pod
        }
    }
}

#[async_trait::async_trait]
impl ResourceClient<Pod> for MemoryPods {
    async fn load(&self, namespace: &str, name: &str) -> Result<Option<Pod>> {
        self.resources.load(namespace, name).await
    }

    async fn create_if_absent(&self, resource: &Pod) -> Result<Pod> {
        self.resources.create_if_absent(resource).await
    }

    async fn create_or_replace(&self, resource: &Pod) -> Result<Pod> {
        self.resources.create_or_replace(resource).await
    }

    async fn create_or_patch(&self, resource: &Pod) -> Result<Pod> {
        self.resources.create_or_patch(resource).await
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        self.resources.delete(namespace, name).await
    }
}

#[async_trait::async_trait]
impl PodClient for MemoryPods {
    async fn wait_for_completion(&self, namespace: &str, name: &str) -> Result<Pod> {
        self.resources
            .call("wait_for_completion", namespace, name)
            .await?;
        let outcome = lock(&self.behavior).clone();
        if outcome == PodBehavior::Hangs {
            futures::future::pending::<()>().await;
        }

        let pod = self
            .resources
            .get(namespace, name)
            .ok_or_else(|| anyhow!("Pod {namespace}/{name} not found"))?;
        let completed = Self::completed(pod, &outcome);
        lock(&self.resources.objects).insert(
            (namespace.to_string(), name.to_string()),
            completed.clone(),
        );
        Ok(completed)
    }
}

/// `KeycloakServer` store that keeps every status written to it.
pub struct MemoryKeycloakServers {
    objects: Mutex<BTreeMap<(String, String), KeycloakServer>>,
    status_history: Mutex<Vec<KeycloakServerStatus>>,
    calls: CallLog,
}

impl MemoryKeycloakServers {
    /// Seed an owning resource.
    pub fn insert(&self, server: KeycloakServer) {
        let key = (server.namespace().unwrap_or_default(), server.name_any());
        lock(&self.objects).insert(key, server);
    }

    #[must_use]
    pub fn get(&self, namespace: &str, name: &str) -> Option<KeycloakServer> {
        lock(&self.objects)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Every status written, oldest first.
    #[must_use]
    pub fn status_history(&self) -> Vec<KeycloakServerStatus> {
        lock(&self.status_history).clone()
    }

    /// The most recently written status.
    #[must_use]
    pub fn last_status(&self) -> Option<KeycloakServerStatus> {
        lock(&self.status_history).last().cloned()
    }
}

#[async_trait::async_trait]
impl KeycloakServerClient for MemoryKeycloakServers {
    async fn load(&self, namespace: &str, name: &str) -> Result<Option<KeycloakServer>> {
        record(&self.calls, "load", "KeycloakServer", namespace, name);
        Ok(self.get(namespace, name))
    }

    async fn update_status(
        &self,
        server: &KeycloakServer,
        status: &KeycloakServerStatus,
    ) -> Result<()> {
        let namespace = server.namespace().unwrap_or_default();
        let name = server.name_any();
        record(&self.calls, "update_status", "KeycloakServer", &namespace, &name);

        let mut objects = lock(&self.objects);
        let stored = objects
            .entry((namespace, name))
            .or_insert_with(|| server.clone());
        stored.status = Some(status.clone());
        lock(&self.status_history).push(status.clone());
        Ok(())
    }
}

/// Recording in-memory implementation of [`ClusterClient`].
pub struct InMemoryCluster {
    pub secrets: MemoryResources<Secret>,
    pub config_maps: MemoryResources<ConfigMap>,
    pub services: MemoryResources<Service>,
    pub deployments: MemoryResources<Deployment>,
    pub ingresses: MemoryResources<Ingress>,
    pub persistent_volume_claims: MemoryResources<PersistentVolumeClaim>,
    pub pods: MemoryPods,
    pub keycloak_servers: MemoryKeycloakServers,
    calls: CallLog,
}

impl Default for InMemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCluster {
    #[must_use]
    pub fn new() -> Self {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        Self {
            secrets: MemoryResources::new(calls.clone()),
            config_maps: MemoryResources::new(calls.clone()),
            services: MemoryResources::new(calls.clone()),
            deployments: MemoryResources::new(calls.clone()),
            ingresses: MemoryResources::new(calls.clone()),
            persistent_volume_claims: MemoryResources::new(calls.clone()),
            pods: MemoryPods {
                resources: MemoryResources::new(calls.clone()),
                behavior: Mutex::new(PodBehavior::Succeeded),
            },
            keycloak_servers: MemoryKeycloakServers {
                objects: Mutex::new(BTreeMap::new()),
                status_history: Mutex::new(Vec::new()),
                calls: calls.clone(),
            },
            calls,
        }
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ClientCall> {
        lock(&self.calls).clone()
    }

    /// Calls of `operation` against `<kind>/<name>`.
    #[must_use]
    pub fn count_calls(&self, operation: &str, kind: &str, name: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| call.operation == operation && call.kind == kind && call.name == name)
            .count()
    }

    /// Forget the recorded calls, keeping the stored objects.
    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }
}

impl ClusterClient for InMemoryCluster {
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

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
