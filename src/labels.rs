// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label constants used across all reconcilers.
//!
//! Every resource derived from a `KeycloakServer` carries the owner label, and
//! resources that belong to one deployment role also carry the deployment label.
//! Services select pods through exactly these two labels.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the component name within the architecture (e.g., "identity-server")
pub const K8S_COMPONENT: &str = "app.kubernetes.io/component";

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of the application (e.g., "keycloak")
pub const K8S_NAME: &str = "app.kubernetes.io/name";

/// Standard label for a unique name identifying the instance of an application
pub const K8S_INSTANCE: &str = "app.kubernetes.io/instance";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

// ============================================================================
// Kubernetes Standard Label Values
// ============================================================================

/// Value for `app.kubernetes.io/part-of`
pub const PART_OF_KEYCLOAK_OPERATOR: &str = "keycloak-operator";

/// Value for `app.kubernetes.io/managed-by`
pub const MANAGED_BY_KEYCLOAK_SERVER: &str = "KeycloakServer";

/// Application name of every derived resource
pub const APP_NAME_KEYCLOAK: &str = "keycloak";

/// Component value for the identity server
pub const COMPONENT_IDENTITY_SERVER: &str = "identity-server";

/// Component value for the database
pub const COMPONENT_DATABASE: &str = "database";

/// Component value for the schema preparation pod
pub const COMPONENT_SCHEMA_JOB: &str = "schema-preparation";

/// Component value for credential secrets
pub const COMPONENT_CREDENTIALS: &str = "credentials";

// ============================================================================
// Operator-Specific Labels
// ============================================================================

/// Label naming the owning `KeycloakServer`
pub const KEYCLOAK_SERVER_LABEL: &str = "sso.firestoned.io/keycloak-server";

/// Label naming the deployment role a pod or claim belongs to (`<name>-db`, `<name>-server`)
pub const DEPLOYMENT_LABEL: &str = "sso.firestoned.io/deployment";

/// Label marking the kind of job a pod runs
pub const JOB_KIND_LABEL: &str = "sso.firestoned.io/job-kind";

/// Label naming the deployment a job pod prepares
pub const DEPLOYMENT_QUALIFIER_LABEL: &str = "sso.firestoned.io/deployment-qualifier";
