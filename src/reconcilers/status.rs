// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers.
//!
//! Conditions follow the Kubernetes conventions:
//! - `type`: the aspect being reported (`Ready`, `SchemaPrepared`)
//! - `status`: `True`, `False` or `Unknown`
//! - `reason`: a `CamelCase` identifier
//! - `message`: a human-readable explanation
//! - `lastTransitionTime`: RFC3339 time the status last changed
//!
//! # Example
//!
//! ```rust
//! use keycloak_operator::reconcilers::status::{find_condition, update_condition_in_memory};
//!
//! let mut conditions = Vec::new();
//! update_condition_in_memory(&mut conditions, "Ready", "False", "Reconciling", "Pass started");
//! update_condition_in_memory(&mut conditions, "Ready", "True", "Reconciled", "Pass completed");
//!
//! assert_eq!(conditions.len(), 1);
//! assert_eq!(find_condition(&conditions, "Ready").unwrap().status, "True");
//! ```

use crate::crd::Condition;
use crate::status_reasons::{CONDITION_TYPE_READY, STATUS_TRUE};
use chrono::Utc;

/// New condition stamped with the current time.
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Condition of the given type, if any.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Update or add a condition in place (no API call).
///
/// `lastTransitionTime` is kept when the status value does not change.
pub fn update_condition_in_memory(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        let last_transition_time = if existing.status == status {
            existing
                .last_transition_time
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339())
        } else {
            Utc::now().to_rfc3339()
        };

        existing.status = status.to_string();
        existing.reason = Some(reason.to_string());
        existing.message = Some(message.to_string());
        existing.last_transition_time = Some(last_transition_time);
    } else {
        conditions.push(create_condition(condition_type, status, reason, message));
    }
}

/// Whether the `Ready` condition is `True`.
#[must_use]
pub fn is_ready(conditions: &[Condition]) -> bool {
    find_condition(conditions, CONDITION_TYPE_READY).is_some_and(|c| c.status == STATUS_TRUE)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
