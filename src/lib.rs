// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Keycloak Operator - Keycloak / SSO servers on Kubernetes
//!
//! A Kubernetes operator written in Rust that deploys Keycloak-compatible
//! identity servers, together with their database, from a single
//! `KeycloakServer` custom resource.
//!
//! ## Overview
//!
//! For every `KeycloakServer` the operator:
//!
//! - Generates and mirrors the database and admin credentials
//! - Creates the database and server services and deployments
//! - Runs a one-shot pod that prepares the database schema
//! - Exposes the server through an ingress and publishes its URLs
//!
//! Each step is recorded in the resource status so an interrupted pass can be
//! repeated without side effects.
//!
//! ## Modules
//!
//! - [`crd`] - The `KeycloakServer` custom resource
//! - [`config`] - Operator flags and validated configuration
//! - [`variant`] - Image flavor and database vendor resolution
//! - [`keycloak_resources`] - Builders for every derived Kubernetes object
//! - [`cluster`] - Cluster access behind a trait, with a `kube` and an in-memory backend
//! - [`reconcilers`] - Reconciliation logic
//! - [`metrics`] - Prometheus metrics and their HTTP endpoint
//!
//! ## Example
//!
//! ```rust,no_run
//! use keycloak_operator::crd::{KeycloakServer, KeycloakServerSpec};
//!
//! let server = KeycloakServer::new(
//!     "my-keycloak",
//!     KeycloakServerSpec {
//!         ingress_host_name: Some("sso.example.com".to_string()),
//!         ..Default::default()
//!     },
//! );
//! ```

pub mod cluster;
pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod errors;
pub mod keycloak_resources;
pub mod labels;
pub mod metrics;
pub mod naming;
pub mod reconcilers;
pub mod status_reasons;
pub mod variant;
