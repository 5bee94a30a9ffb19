// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the Keycloak operator.
//!
//! This module provides specialized error types for:
//! - Operator configuration problems detected at startup
//! - Reconciliation failures that must surface as status conditions
//!
//! Cluster API failures are carried as `anyhow::Error` and are not modelled here.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while turning CLI arguments and environment into an `OperatorConfig`.
///
/// All of these are fatal: the operator refuses to start rather than reconcile
/// with a configuration it cannot interpret.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Compliance mode is neither `community` nor `vendor-certified`
    #[error("Unknown compliance mode '{0}' (expected 'community' or 'vendor-certified')")]
    UnknownComplianceMode(String),

    /// The controller namespace could not be determined
    #[error("Controller namespace must not be empty")]
    EmptyControllerNamespace,

    /// The schema job timeout is zero
    #[error("Schema job timeout must be greater than zero")]
    InvalidSchemaJobTimeout,
}

/// Domain errors raised during a reconciliation pass.
///
/// These are wrapped in `anyhow::Error` as they travel through the steps; the
/// reconciliation engine downcasts them to pick the status condition reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeycloakError {
    /// The schema preparation pod completed unsuccessfully
    ///
    /// The database is not usable by the identity server, so the pass halts
    /// before exposing the server through the ingress.
    #[error("Schema preparation pod {namespace}/{pod} failed: {reason}")]
    SchemaJobFailed {
        /// Namespace of the pod
        namespace: String,
        /// Name of the pod
        pod: String,
        /// Exit code or pod reason reported by the cluster
        reason: String,
    },

    /// The schema preparation pod did not complete in time
    ///
    /// Retryable: the next pass reuses or recreates the pod.
    #[error("Schema preparation pod {namespace}/{pod} did not complete within {timeout:?}")]
    SchemaJobTimedOut {
        /// Namespace of the pod
        namespace: String,
        /// Name of the pod
        pod: String,
        /// Timeout that expired
        timeout: Duration,
    },

    /// The owning resource has no namespace
    #[error("KeycloakServer {name} has no namespace")]
    MissingNamespace {
        /// Name of the owning resource
        name: String,
    },

    /// A resource handed to the cluster client has no name or namespace
    #[error("{kind} is missing metadata.{field}")]
    MissingMetadata {
        /// Kind of the resource
        kind: String,
        /// Missing metadata field
        field: &'static str,
    },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
