// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the `KeycloakServer` controller.
//!
//! Every reconciliation pass receives an `Arc<Context>` holding:
//! - the cluster capability clients
//! - the validated operator configuration
//! - the metrics registry

use crate::cluster::ClusterClient;
use crate::config::OperatorConfig;
use crate::metrics::Metrics;
use std::sync::Arc;

/// Shared context passed to the controller.
#[derive(Clone)]
pub struct Context {
    /// Per-kind cluster clients
    pub cluster: Arc<dyn ClusterClient>,

    /// Immutable operator configuration
    pub config: Arc<OperatorConfig>,

    /// Metrics for observability
    pub metrics: Metrics,
}

impl Context {
    #[must_use]
    pub fn new(cluster: Arc<dyn ClusterClient>, config: OperatorConfig, metrics: Metrics) -> Self {
        Self {
            cluster,
            config: Arc::new(config),
            metrics,
        }
    }
}
