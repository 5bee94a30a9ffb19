// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes reconciliation logic for identity server resources.
//!
//! # Reconciliation Architecture
//!
//! The operator follows the standard Kubernetes controller pattern:
//!
//! 1. **Watch** - `KeycloakServer` resources and the resources derived from them
//! 2. **Reconcile** - Drive every derived resource towards the desired state
//! 3. **Status** - Report progress and outcome on the `KeycloakServer` status
//!
//! A pass never remembers anything between runs except what it wrote to the
//! cluster, so it can be aborted and repeated at any point.
//!
//! # Available Reconcilers
//!
//! - [`reconcile_keycloakserver`] - Provisions secrets, services, deployments,
//!   the database schema and the ingress of an identity server
//!
//! # Example: Using a Reconciler
//!
//! ```rust,no_run
//! use keycloak_operator::context::Context;
//! use keycloak_operator::crd::KeycloakServer;
//! use keycloak_operator::reconcilers::reconcile_keycloakserver;
//! use std::sync::Arc;
//!
//! async fn reconcile(ctx: Arc<Context>, server: KeycloakServer) -> anyhow::Result<()> {
//!     reconcile_keycloakserver(ctx, server).await
//! }
//! ```

pub mod keycloakserver;
pub mod status;

pub use keycloakserver::{failure_reason, reconcile_keycloakserver, ReconcilePhase};
