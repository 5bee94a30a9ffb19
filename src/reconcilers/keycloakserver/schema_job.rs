// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Database schema preparation through a one-shot pod.
//!
//! The pod name is deterministic, so a pass finding a `Succeeded` pod knows the
//! schema already exists. A `Failed` pod is deleted and submitted again; a pod
//! that is still running is waited on rather than duplicated.

use super::status_helpers::reload;
use super::types::*;
use k8s_openapi::api::core::v1::ContainerStatus;

const PHASE_SUCCEEDED: &str = "Succeeded";
const PHASE_FAILED: &str = "Failed";

/// How a schema preparation run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PodOutcome {
    /// The pod ran to completion in this pass
    Succeeded,
    /// A pod from an earlier pass had already succeeded
    Reused,
    Failed(String),
}

fn pod_phase(pod: &Pod) -> Option<&str> {
    pod.status.as_ref().and_then(|s| s.phase.as_deref())
}

fn terminated_with_error(status: &ContainerStatus) -> Option<String> {
    let terminated = status.state.as_ref()?.terminated.as_ref()?;
    (terminated.exit_code != 0).then(|| {
        format!(
            "container {} exited with code {}",
            status.name, terminated.exit_code
        )
    })
}

/// Human-readable reason a schema pod failed.
///
/// The first init container with a non-zero exit code is reported; otherwise
/// the pod's own reason or message.
#[must_use]
pub fn failure_reason(pod: &Pod) -> String {
    let Some(status) = pod.status.as_ref() else {
        return "pod has no status".to_string();
    };

    status
        .init_container_statuses
        .iter()
        .chain(status.container_statuses.iter())
        .flatten()
        .find_map(terminated_with_error)
        .or_else(|| status.reason.clone())
        .or_else(|| status.message.clone())
        .unwrap_or_else(|| format!("pod phase {}", status.phase.as_deref().unwrap_or("unknown")))
}

/// Submit the schema pod unless it already ran, then wait for it to complete.
///
/// # Errors
///
/// Returns [`KeycloakError::SchemaJobTimedOut`] when replacing a failed pod
/// and waiting for the new one do not finish within the configured timeout, or
/// a cluster error.
pub async fn run_schema_job(
    pass: &mut ReconcilePass<'_>,
    request: &SchemaJobRequest,
) -> Result<PodOutcome> {
    let pods = pass.cluster.pods();
    let name = pass.resource_name(ResourceRole::SchemaJob);

    let existing = pods.load(&pass.namespace, &name).await?;
    let (replace, submit) = match existing.as_ref().map(|pod| pod_phase(pod)) {
        Some(Some(PHASE_SUCCEEDED)) => {
            debug!(
                "Schema pod {}/{} already succeeded, nothing to do",
                pass.namespace, name
            );
            pass.status.observe(&name, existing.as_ref());
            pass.metrics.record_schema_job("reused");
            return Ok(PodOutcome::Reused);
        }
        Some(Some(PHASE_FAILED)) => {
            info!(
                "Schema pod {}/{} failed earlier, submitting it again",
                pass.namespace, name
            );
            (true, true)
        }
        Some(_) => (false, false),
        None => (false, true),
    };

    // One deadline covers replacing a failed pod and waiting for completion
    let timeout = pass.config.schema_job_timeout;
    let run = {
        let pass = &*pass;
        let name = &name;
        async move {
            if replace {
                pods.delete(&pass.namespace, name).await?;
                pass.record_write::<Pod>("delete");
            }
            if submit {
                let pod = build_schema_job_pod(pass.owner, &pass.namespace, request);
                pods.create_if_absent(&pod).await?;
                pass.record_write::<Pod>("create_if_absent");
            }
            pods.wait_for_completion(&pass.namespace, name).await
        }
    };
    let completed = match tokio::time::timeout(timeout, run).await {
        Ok(completed) => completed?,
        Err(_) => {
            pass.metrics.record_schema_job("timed_out");
            reload(pods, &mut pass.status, &pass.namespace, &name).await;
            return Err(KeycloakError::SchemaJobTimedOut {
                namespace: pass.namespace.clone(),
                pod: name,
                timeout,
            }
            .into());
        }
    };
    pass.status.observe(&name, Some(&completed));

    if pod_phase(&completed) == Some(PHASE_SUCCEEDED) {
        pass.metrics.record_schema_job("succeeded");
        Ok(PodOutcome::Succeeded)
    } else {
        pass.metrics.record_schema_job("failed");
        Ok(PodOutcome::Failed(failure_reason(&completed)))
    }
}

/// Request creating the owner's schema on its database service.
#[must_use]
pub fn schema_request(pass: &ReconcilePass<'_>) -> SchemaJobRequest {
    SchemaJobRequest {
        schemas: vec![schema_name(&pass.name)],
        vendor: pass.variant.vendor,
        host: service_host(
            &pass.resource_name(ResourceRole::DbService),
            &pass.namespace,
        ),
        port: pass.variant.db().port,
        admin_secret: pass.resource_name(ResourceRole::DbAdminSecret),
        user_secret: pass.resource_name(ResourceRole::DbSecret),
        image: pass.variant.schema_job_image.clone(),
    }
}

/// Step `DeploymentsApplied`: make sure the schema exists.
///
/// # Errors
///
/// Returns [`KeycloakError::SchemaJobFailed`] when the pod fails, which halts
/// the pass before the server is exposed.
pub async fn prepare_schema(pass: &mut ReconcilePass<'_>) -> Result<()> {
    let request = schema_request(pass);
    match run_schema_job(pass, &request).await? {
        PodOutcome::Succeeded | PodOutcome::Reused => {
            pass.status.set_condition(
                CONDITION_TYPE_SCHEMA_PREPARED,
                STATUS_TRUE,
                REASON_SCHEMA_CREATED,
                &format!("Schema {} is ready", request.schemas.join(", ")),
            );
            Ok(())
        }
        PodOutcome::Failed(reason) => {
            pass.status.set_condition(
                CONDITION_TYPE_SCHEMA_PREPARED,
                STATUS_FALSE,
                REASON_SCHEMA_JOB_FAILED,
                &reason,
            );
            Err(KeycloakError::SchemaJobFailed {
                namespace: pass.namespace.clone(),
                pod: pass.resource_name(ResourceRole::SchemaJob),
                reason,
            }
            .into())
        }
    }
}

#[cfg(test)]
#[path = "schema_job_tests.rs"]
mod schema_job_tests;
