// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status aggregation for `KeycloakServer` reconciliation.
//!
//! The aggregator starts from the status already stored on the owner and
//! accumulates what the pass learns: the phase, conditions, and the live state
//! of every derived resource reloaded after a write. It is written back with
//! [`StatusAggregator::flush`] after every completed step.

use super::types::*;
use crate::cluster::KeycloakServerClient;
use crate::crd::ObservedResource;
use crate::reconcilers::status::update_condition_in_memory;
use chrono::Utc;

/// Key of a derived resource in `status.resources`.
#[must_use]
pub fn resource_key(kind: &str, name: &str) -> String {
    format!("{kind}/{name}")
}

/// Accumulates the status of one reconciliation pass.
#[derive(Clone, Debug, Default)]
pub struct StatusAggregator {
    status: KeycloakServerStatus,
}

impl StatusAggregator {
    #[must_use]
    pub fn new(owner: &KeycloakServer) -> Self {
        Self {
            status: owner.status.clone().unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn status(&self) -> &KeycloakServerStatus {
        &self.status
    }

    /// Record the live state of a derived resource.
    ///
    /// `None` marks the resource as not observed; what was recorded about it
    /// earlier is kept.
    pub fn observe<K: ClusterResource>(&mut self, name: &str, live: Option<&K>) {
        let kind = K::kind(&()).to_string();
        let entry = self
            .status
            .resources
            .entry(resource_key(&kind, name))
            .or_insert_with(|| ObservedResource {
                kind,
                name: name.to_string(),
                ..Default::default()
            });

        match live {
            Some(resource) => {
                entry.observed = true;
                entry.status = serde_json::to_value(resource)
                    .ok()
                    .and_then(|value| value.get("status").cloned())
                    .filter(|status| !status.is_null());
                entry.last_observed_time = Some(Utc::now().to_rfc3339());
            }
            None => entry.observed = false,
        }
    }

    pub fn set_condition(
        &mut self,
        condition_type: &str,
        status: &str,
        reason: &str,
        message: &str,
    ) {
        update_condition_in_memory(
            &mut self.status.conditions,
            condition_type,
            status,
            reason,
            message,
        );
    }

    pub fn set_phase(&mut self, phase: DeploymentPhase) {
        self.status.phase = Some(phase);
    }

    pub fn set_observed_generation(&mut self, generation: Option<i64>) {
        self.status.observed_generation = generation;
    }

    pub fn set_last_completed_step(&mut self, step: &str) {
        self.status.last_completed_step = Some(step.to_string());
    }

    pub fn set_base_url(&mut self, url: String) {
        self.status.base_url = Some(url);
    }

    pub fn set_admin_secret_name(&mut self, name: String) {
        self.status.admin_secret_name = Some(name);
    }

    /// Write the accumulated status to the owner's status subresource.
    ///
    /// # Errors
    ///
    /// Returns an error if the status update is rejected.
    pub async fn flush(
        &self,
        client: &dyn KeycloakServerClient,
        owner: &KeycloakServer,
    ) -> Result<()> {
        client.update_status(owner, &self.status).await
    }
}

/// Reload a derived resource and record its live state.
///
/// A failed reload is logged and recorded as not observed; it never fails the
/// pass.
pub async fn reload<K: ClusterResource>(
    client: &dyn ResourceClient<K>,
    status: &mut StatusAggregator,
    namespace: &str,
    name: &str,
) -> Option<K> {
    let live = match client.load(namespace, name).await {
        Ok(live) => live,
        Err(e) => {
            warn!(
                "Failed to reload {} {}/{}: {}",
                K::kind(&()),
                namespace,
                name,
                e
            );
            None
        }
    };
    status.observe(name, live.as_ref());
    live
}

#[cfg(test)]
#[path = "status_helpers_tests.rs"]
mod status_helpers_tests;
