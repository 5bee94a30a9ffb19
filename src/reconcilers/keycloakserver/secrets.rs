// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Credential and certificate provisioning for `KeycloakServer` resources.
//!
//! Credential secrets are generated at most once: an existing secret is always
//! returned unchanged, so passwords survive any number of passes.

use super::types::*;
use crate::constants::{GENERATED_PASSWORD_LENGTH, KEYCLOAK_ADMIN_USERNAME};
use rand::distr::{Alphanumeric, SampleString};

/// How the username of a generated credential is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsernameRule {
    Static(&'static str),
    /// The database schema of the owner, e.g. `my_keycloak_db`
    SchemaName,
}

impl UsernameRule {
    #[must_use]
    pub fn username(self, owner_name: &str) -> String {
        match self {
            Self::Static(username) => username.to_string(),
            Self::SchemaName => schema_name(owner_name),
        }
    }
}

/// Random alphanumeric password.
#[must_use]
pub fn generate_password() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), GENERATED_PASSWORD_LENGTH)
}

/// Step `Started`: every credential, the trust stores and the TLS secret.
///
/// # Errors
///
/// Returns an error if a secret cannot be read or written.
pub async fn provision_secrets(pass: &mut ReconcilePass<'_>) -> Result<()> {
    let db_admin_username = pass.variant.db().admin_username;
    ensure_secret(
        pass,
        ResourceRole::DbAdminSecret,
        UsernameRule::Static(db_admin_username),
    )
    .await?;
    ensure_secret(pass, ResourceRole::DbSecret, UsernameRule::SchemaName).await?;
    ensure_admin_secret(pass).await?;

    pass.trust_store_secrets = copy_trust_stores(pass).await?;
    pass.tls_secret = resolve_tls_secret(pass).await?;
    Ok(())
}

/// Load the credential secret of `role`, creating it with a fresh password when
/// it does not exist.
///
/// # Errors
///
/// Returns an error if the secret store cannot be read or written.
pub async fn ensure_secret(
    pass: &mut ReconcilePass<'_>,
    role: ResourceRole,
    rule: UsernameRule,
) -> Result<Secret> {
    let secrets = pass.cluster.secrets();
    let name = pass.resource_name(role);

    if let Some(existing) = secrets.load(&pass.namespace, &name).await? {
        debug!("Secret {}/{} already exists, keeping it", pass.namespace, name);
        pass.status.observe(&name, Some(&existing));
        return Ok(existing);
    }

    let credentials = Credentials {
        username: rule.username(&pass.name),
        password: generate_password(),
    };
    let secret = build_credential_secret(pass.owner, &pass.namespace, &name, &credentials);
    let stored = secrets.create_if_absent(&secret).await?;
    pass.record_write::<Secret>("create_if_absent");
    pass.status.observe(&name, Some(&stored));

    info!(
        "Generated credentials for {} in secret {}/{}",
        credentials.username, pass.namespace, name
    );
    Ok(stored)
}

/// Identity-admin credentials, kept identical in the owner and controller
/// namespaces.
///
/// The owner-namespace copy wins when present, then a pre-seeded controller copy;
/// only when neither exists is a password generated.
///
/// # Errors
///
/// Returns an error if either secret store cannot be read or written.
pub async fn ensure_admin_secret(pass: &mut ReconcilePass<'_>) -> Result<Credentials> {
    let secrets = pass.cluster.secrets();
    let name = pass.resource_name(ResourceRole::AdminSecret);
    let controller_namespace = pass.config.controller_namespace.clone();

    let local = secrets.load(&pass.namespace, &name).await?;
    let local_credentials = local.as_ref().and_then(read_credentials);

    let credentials = if let Some(credentials) = local_credentials.clone() {
        credentials
    } else if let Some(mirrored) = secrets
        .load(&controller_namespace, &name)
        .await?
        .as_ref()
        .and_then(read_credentials)
    {
        debug!(
            "Using pre-seeded admin credentials from {}/{}",
            controller_namespace, name
        );
        mirrored
    } else {
        Credentials {
            username: KEYCLOAK_ADMIN_USERNAME.to_string(),
            password: generate_password(),
        }
    };

    if local_credentials.is_none() {
        let secret = build_credential_secret(pass.owner, &pass.namespace, &name, &credentials);
        let stored = if local.is_some() {
            // Present but unreadable, rewrite it with the resolved credentials
            pass.record_write::<Secret>("create_or_replace");
            secrets.create_or_replace(&secret).await?
        } else {
            pass.record_write::<Secret>("create_if_absent");
            secrets.create_if_absent(&secret).await?
        };
        pass.status.observe(&name, Some(&stored));
    } else if let Some(existing) = local.as_ref() {
        pass.status.observe(&name, Some(existing));
    }

    if !pass.in_controller_namespace() {
        mirror_admin_secret(pass, &controller_namespace, &name, &credentials).await?;
    }

    pass.status.set_admin_secret_name(name);
    Ok(credentials)
}

async fn mirror_admin_secret(
    pass: &ReconcilePass<'_>,
    controller_namespace: &str,
    name: &str,
    credentials: &Credentials,
) -> Result<()> {
    let secrets = pass.cluster.secrets();
    let mirror = build_credential_secret(pass.owner, controller_namespace, name, credentials);

    match secrets.load(controller_namespace, name).await? {
        None => {
            secrets.create_if_absent(&mirror).await?;
            pass.record_write::<Secret>("create_if_absent");
        }
        Some(existing) if read_credentials(&existing).as_ref() != Some(credentials) => {
            info!(
                "Admin secret {}/{} is out of date, replacing it",
                controller_namespace, name
            );
            secrets.create_or_replace(&mirror).await?;
            pass.record_write::<Secret>("create_or_replace");
        }
        Some(_) => {}
    }
    Ok(())
}

/// Copy a secret from the controller namespace into the owner namespace.
///
/// Returns `false` when the source does not exist.
async fn copy_from_controller_namespace(
    pass: &mut ReconcilePass<'_>,
    secret_name: &str,
) -> Result<bool> {
    let secrets = pass.cluster.secrets();
    let controller_namespace = &pass.config.controller_namespace;

    let Some(source) = secrets.load(controller_namespace, secret_name).await? else {
        return Ok(false);
    };
    if pass.in_controller_namespace() {
        return Ok(true);
    }

    let copy = build_trust_store_copy(pass.owner, &pass.namespace, &source);
    let stored = secrets.create_if_absent(&copy).await?;
    pass.record_write::<Secret>("create_if_absent");
    pass.status.observe(secret_name, Some(&stored));
    Ok(true)
}

/// Copy every configured CA secret into the owner namespace.
///
/// Returns the names available for mounting, in configured order. Missing CA
/// secrets are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the secret store cannot be read or written.
pub async fn copy_trust_stores(pass: &mut ReconcilePass<'_>) -> Result<Vec<String>> {
    let mut available = Vec::new();
    for secret_name in pass.config.ca_secret_names.clone() {
        if copy_from_controller_namespace(pass, &secret_name).await? {
            available.push(secret_name);
        } else {
            warn!(
                "CA secret {}/{} not found, it will not be mounted",
                pass.config.controller_namespace, secret_name
            );
        }
    }
    Ok(available)
}

/// TLS secret of the ingress.
///
/// The owner's own secret is used as is. The operator-wide secret is copied
/// from the controller namespace and dropped with a warning when it is missing.
///
/// # Errors
///
/// Returns an error if the secret store cannot be read or written.
pub async fn resolve_tls_secret(pass: &mut ReconcilePass<'_>) -> Result<Option<String>> {
    if let Some(own) = pass.owner.spec.tls_secret_name.clone() {
        return Ok(Some(own));
    }
    let Some(shared) = pass.config.tls_secret_name.clone() else {
        return Ok(None);
    };

    if copy_from_controller_namespace(pass, &shared).await? {
        Ok(Some(shared))
    } else {
        warn!(
            "TLS secret {}/{} not found, the ingress will serve plain HTTP",
            pass.config.controller_namespace, shared
        );
        Ok(None)
    }
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod secrets_tests;
