// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Standard Kubernetes status condition types and reasons for `KeycloakServer`.
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   phase: Failed
//!   conditions:
//!     - type: Ready
//!       status: "False"
//!       reason: SchemaJobFailed
//!       message: "Schema preparation pod sso/my-keycloak-db-preparation-job failed: exit code 1"
//!     - type: SchemaPrepared
//!       status: "False"
//!       reason: SchemaJobFailed
//! ```

// ============================================================================
// Condition Types
// ============================================================================

/// Encompassing condition of the whole server.
pub const CONDITION_TYPE_READY: &str = "Ready";

/// The database schema has been created.
pub const CONDITION_TYPE_SCHEMA_PREPARED: &str = "SchemaPrepared";

// ============================================================================
// Condition Status Values
// ============================================================================

pub const STATUS_TRUE: &str = "True";
pub const STATUS_FALSE: &str = "False";
pub const STATUS_UNKNOWN: &str = "Unknown";

// ============================================================================
// Reasons
// ============================================================================

/// A reconciliation pass is running.
pub const REASON_RECONCILING: &str = "Reconciling";

/// Every step of the pass completed.
pub const REASON_RECONCILED: &str = "Reconciled";

/// The schema preparation pod completed successfully.
pub const REASON_SCHEMA_CREATED: &str = "SchemaCreated";

/// The schema preparation pod terminated unsuccessfully.
///
/// Requires user intervention (database credentials, vendor mismatch).
pub const REASON_SCHEMA_JOB_FAILED: &str = "SchemaJobFailed";

/// The schema preparation pod did not finish in time; the next pass retries.
pub const REASON_SCHEMA_JOB_TIMED_OUT: &str = "SchemaJobTimedOut";

/// Any other failure, typically a cluster API error.
pub const REASON_RECONCILE_FAILED: &str = "ReconcileFailed";

#[cfg(test)]
#[path = "status_reasons_tests.rs"]
mod status_reasons_tests;
