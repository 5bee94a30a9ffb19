// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Keycloak operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "sso.firestoned.io/v1alpha1";

/// Kind name for `KeycloakServer` resource
pub const KIND_KEYCLOAK_SERVER: &str = "KeycloakServer";

/// Field manager used for server-side apply and status patches
pub const FIELD_MANAGER: &str = "keycloak-operator";

// ============================================================================
// Network Constants
// ============================================================================

/// Port the identity server listens on
pub const SERVER_PORT: i32 = 8080;

/// Named port of the identity server container and Service
pub const SERVER_PORT_NAME: &str = "server-port";

/// Named port of the database container and Service
pub const DB_PORT_NAME: &str = "db-port";

/// Web context the identity server is served under
pub const AUTH_WEB_CONTEXT: &str = "/auth";

/// Cluster-internal DNS suffix appended to `<service>.<namespace>`
pub const CLUSTER_DNS_SUFFIX: &str = "svc.cluster.local";

/// Ingress path type for the identity server path
pub const INGRESS_PATH_TYPE: &str = "Prefix";

// ============================================================================
// Credential Constants
// ============================================================================

/// Secret key holding the username of a credential secret
pub const USERNAME_KEY: &str = "username";

/// Secret key holding the password of a credential secret
pub const PASSWORD_KEY: &str = "password";

/// Length of generated passwords
pub const GENERATED_PASSWORD_LENGTH: usize = 32;

/// Username of the identity-server administrator
pub const KEYCLOAK_ADMIN_USERNAME: &str = "admin";

// ============================================================================
// Image Constants
// ============================================================================

/// Registry host of the default entando images
pub const DEFAULT_IMAGE_REGISTRY: &str = "docker.io";

/// Image version used when no explicit version is configured
pub const DEFAULT_IMAGE_VERSION: &str = "6.0.0";

/// Community identity server image repository (without registry)
pub const KEYCLOAK_IMAGE_REPOSITORY: &str = "entando/entando-keycloak";

/// Vendor-certified identity server image repository (without registry)
pub const REDHAT_SSO_IMAGE_REPOSITORY: &str = "entando/entando-redhat-sso";

/// Schema preparation job image repository (without registry)
pub const DB_JOB_IMAGE_REPOSITORY: &str = "entando/entando-k8s-dbjob";

/// Community MySQL image
pub const MYSQL_COMMUNITY_IMAGE: &str = "docker.io/centos/mysql-80-centos7:latest";

/// Vendor-certified MySQL image
pub const MYSQL_REDHAT_IMAGE: &str = "registry.redhat.io/rhel8/mysql-80:latest";

/// Community PostgreSQL image
pub const POSTGRESQL_COMMUNITY_IMAGE: &str = "docker.io/centos/postgresql-12-centos7:latest";

/// Vendor-certified PostgreSQL image
pub const POSTGRESQL_REDHAT_IMAGE: &str = "registry.redhat.io/rhel8/postgresql-12:latest";

/// Default user id of the community identity server image
pub const KEYCLOAK_IMAGE_DEFAULT_USERID: i64 = 1000;

/// Default user id of the vendor-certified identity server image
pub const REDHAT_SSO_IMAGE_DEFAULT_USERID: i64 = 185;

/// Default user id of the MySQL images
pub const MYSQL_IMAGE_DEFAULT_USERID: i64 = 27;

/// Default user id of the PostgreSQL images
pub const POSTGRESQL_IMAGE_DEFAULT_USERID: i64 = 26;

// ============================================================================
// Container Constants
// ============================================================================

/// Name of the identity server container
pub const CONTAINER_NAME_SERVER: &str = "server-container";

/// Name of the database container
pub const CONTAINER_NAME_DB: &str = "db-container";

/// Name of the placeholder main container of the schema job pod
pub const CONTAINER_NAME_SCHEMA_JOB_DONE: &str = "db-preparation-done";

/// Root path under which trust-store secrets are mounted
pub const CERT_SECRET_MOUNT_ROOT: &str = "/etc/keycloak/certs";

/// File name of the CA bundle inside a trust-store secret
pub const CA_BUNDLE_FILE: &str = "ca.crt";

/// Suffix appended to a secret name to form its volume name
pub const VOLUME_SUFFIX: &str = "-volume";

/// Environment variable carrying the concatenated CA bundle paths
pub const ENV_X509_CA_BUNDLE: &str = "X509_CA_BUNDLE";

/// Name of the database data volume
pub const VOLUME_DB_DATA: &str = "db-data";

// ============================================================================
// Resource Defaults
// ============================================================================

/// Default memory limit of the identity server
pub const DEFAULT_SERVER_MEMORY_LIMIT: &str = "2Gi";

/// Default CPU limit of the identity server
pub const DEFAULT_SERVER_CPU_LIMIT: &str = "1000m";

/// Default memory limit of the database
pub const DEFAULT_DB_MEMORY_LIMIT: &str = "2Gi";

/// Default CPU limit of the database
pub const DEFAULT_DB_CPU_LIMIT: &str = "1000m";

/// Default size of the database volume claim
pub const DEFAULT_DB_STORAGE_REQUEST: &str = "2Gi";

/// Access mode of the database volume claim
pub const DB_PVC_ACCESS_MODE: &str = "ReadWriteOnce";

/// Replicas of the database Deployment
pub const DB_REPLICAS: i32 = 1;

// ============================================================================
// Schema Job Constants
// ============================================================================

/// Command token instructing the job image to create a schema
pub const SCHEMA_COMMAND_CREATE: &str = "CREATE_SCHEMA";

/// Label value identifying database preparation pods
pub const JOB_KIND_DB_PREPARATION: &str = "db-preparation-job";

/// Deployment qualifier of the schema job pod
pub const SCHEMA_JOB_QUALIFIER: &str = "server";

/// Default timeout for the schema job to complete (10 minutes)
pub const DEFAULT_SCHEMA_JOB_TIMEOUT_SECS: u64 = 600;

// ============================================================================
// Probe Constants
// ============================================================================

/// Readiness probe initial delay (the server takes a while to boot)
pub const READINESS_INITIAL_DELAY_SECS: i32 = 30;

/// Readiness probe period
pub const READINESS_PERIOD_SECS: i32 = 10;

/// Readiness probe failure threshold
pub const READINESS_FAILURE_THRESHOLD: i32 = 6;

/// Liveness probe initial delay
pub const LIVENESS_INITIAL_DELAY_SECS: i32 = 120;

/// Liveness probe period
pub const LIVENESS_PERIOD_SECS: i32 = 20;

/// Liveness probe failure threshold
pub const LIVENESS_FAILURE_THRESHOLD: i32 = 3;

// ============================================================================
// Controller Namespace Constants
// ============================================================================

/// Name of the `ConfigMap` advertising the default identity server
pub const DEFAULT_CAPABILITIES_CONFIGMAP: &str = "keycloak-operator-default-capabilities";

/// Key holding the name of the default identity server
pub const DEFAULT_KEYCLOAK_NAME_KEY: &str = "default-keycloak-server-name";

/// Key holding the namespace of the default identity server
pub const DEFAULT_KEYCLOAK_NAMESPACE_KEY: &str = "default-keycloak-server-namespace";

/// Connection `ConfigMap` key holding the external base URL
pub const URL_KEY: &str = "url";

/// Connection `ConfigMap` key holding the cluster-internal base URL
pub const INTERNAL_URL_KEY: &str = "internalUrl";

// ============================================================================
// Controller Constants
// ============================================================================

/// Requeue interval once the server is ready (5 minutes)
pub const REQUEUE_WHEN_READY_SECS: u64 = 300;

/// Requeue interval while the server is not ready yet
pub const REQUEUE_WHEN_NOT_READY_SECS: u64 = 30;

/// Requeue interval after a failed reconciliation
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Tokio worker threads of the operator runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
