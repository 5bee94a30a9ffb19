// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Deployment flavors and database vendor conventions.
//!
//! The orchestration is the same for every flavor; only images, environment
//! variable names and filesystem ownership differ. [`resolve_variant`] maps the
//! operator configuration and the owner's database vendor onto those values.

use crate::config::OperatorConfig;
use crate::constants::{
    DB_JOB_IMAGE_REPOSITORY, DEFAULT_IMAGE_REGISTRY, KEYCLOAK_IMAGE_DEFAULT_USERID,
    KEYCLOAK_IMAGE_REPOSITORY, MYSQL_COMMUNITY_IMAGE, MYSQL_IMAGE_DEFAULT_USERID,
    MYSQL_REDHAT_IMAGE, POSTGRESQL_COMMUNITY_IMAGE, POSTGRESQL_IMAGE_DEFAULT_USERID,
    POSTGRESQL_REDHAT_IMAGE, REDHAT_SSO_IMAGE_DEFAULT_USERID, REDHAT_SSO_IMAGE_REPOSITORY,
};
use crate::crd::DatabaseVendor;
use crate::errors::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Image flavor selected by the operator's compliance mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ServerFlavor {
    /// Upstream Keycloak with community database images
    #[default]
    Community,
    /// Red Hat SSO with certified database images
    VendorCertified,
}

impl FromStr for ServerFlavor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "community" => Ok(Self::Community),
            "vendor-certified" | "redhat" => Ok(Self::VendorCertified),
            _ => Err(ConfigError::UnknownComplianceMode(s.to_string())),
        }
    }
}

impl fmt::Display for ServerFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Community => f.write_str("community"),
            Self::VendorCertified => f.write_str("vendor-certified"),
        }
    }
}

/// Fixed facts about a database vendor's images.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VendorConventions {
    /// Port the database listens on
    pub port: i32,
    /// Superuser of the database image
    pub admin_username: &'static str,
    /// Variable the image reads the superuser password from
    pub admin_password_var: &'static str,
    /// Directory holding the database files
    pub data_path: &'static str,
    /// Vendor tag Keycloak uses in `DB_VENDOR`
    pub keycloak_vendor_tag: &'static str,
    /// Uppercase vendor name used in vendor-certified service variables
    pub service_prefix: &'static str,
    /// Default user id of the vendor's images
    pub default_fs_group: i64,
}

/// Conventions of `vendor`'s database images.
#[must_use]
pub const fn vendor_conventions(vendor: DatabaseVendor) -> VendorConventions {
    match vendor {
        DatabaseVendor::Mysql => VendorConventions {
            port: 3306,
            admin_username: "root",
            admin_password_var: "MYSQL_ROOT_PASSWORD",
            data_path: "/var/lib/mysql/data",
            keycloak_vendor_tag: "mysql",
            service_prefix: "MYSQL",
            default_fs_group: MYSQL_IMAGE_DEFAULT_USERID,
        },
        DatabaseVendor::Postgresql => VendorConventions {
            port: 5432,
            admin_username: "postgres",
            admin_password_var: "POSTGRESQL_ADMIN_PASSWORD",
            data_path: "/var/lib/pgsql/data",
            keycloak_vendor_tag: "postgres",
            service_prefix: "POSTGRESQL",
            default_fs_group: POSTGRESQL_IMAGE_DEFAULT_USERID,
        },
    }
}

/// Names of the environment variables the identity server image reads.
///
/// Both flavors carry the same semantic fields under different names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvVarConvention {
    pub admin_username: String,
    pub admin_password: String,
    pub db_host: String,
    pub db_port: String,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
}

impl EnvVarConvention {
    fn for_flavor(flavor: ServerFlavor, vendor: DatabaseVendor) -> Self {
        match flavor {
            ServerFlavor::Community => Self {
                admin_username: "KEYCLOAK_USER".into(),
                admin_password: "KEYCLOAK_PASSWORD".into(),
                db_host: "DB_ADDR".into(),
                db_port: "DB_PORT".into(),
                db_name: "DB_DATABASE".into(),
                db_user: "DB_USER".into(),
                db_password: "DB_PASSWORD".into(),
            },
            ServerFlavor::VendorCertified => {
                let prefix = vendor_conventions(vendor).service_prefix;
                Self {
                    admin_username: "SSO_ADMIN_USERNAME".into(),
                    admin_password: "SSO_ADMIN_PASSWORD".into(),
                    db_host: format!("DB_{prefix}_SERVICE_HOST"),
                    db_port: format!("DB_{prefix}_SERVICE_PORT"),
                    db_name: "DB_DATABASE".into(),
                    db_user: "DB_USERNAME".into(),
                    db_password: "DB_PASSWORD".into(),
                }
            }
        }
    }
}

/// Everything the deployment planner needs to know about the active variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedVariant {
    pub flavor: ServerFlavor,
    pub vendor: DatabaseVendor,
    pub server_image: String,
    pub db_image: String,
    pub schema_job_image: String,
    pub env: EnvVarConvention,
    /// `fsGroup` of identity server pods, when the override is required
    pub server_fs_group: Option<i64>,
    /// `fsGroup` of database pods, when the override is required
    pub db_fs_group: Option<i64>,
}

impl ResolvedVariant {
    /// Database conventions of the resolved vendor.
    #[must_use]
    pub const fn db(&self) -> VendorConventions {
        vendor_conventions(self.vendor)
    }

    /// Flavor-specific variable telling the server which database it talks to.
    ///
    /// Community images take the vendor tag directly; vendor-certified images map
    /// a service prefix onto the `DB_` variable family.
    #[must_use]
    pub fn vendor_env(&self, owner_name: &str) -> (&'static str, String) {
        let db = self.db();
        match self.flavor {
            ServerFlavor::Community => ("DB_VENDOR", db.keycloak_vendor_tag.to_string()),
            ServerFlavor::VendorCertified => (
                "DB_SERVICE_PREFIX_MAPPING",
                format!("{owner_name}-db-{}=DB", self.vendor.as_str()),
            ),
        }
    }
}

/// Resolve images, variable names and filesystem groups.
#[must_use]
pub fn resolve_variant(config: &OperatorConfig, vendor: DatabaseVendor) -> ResolvedVariant {
    let registry = config
        .image_registry_override
        .as_deref()
        .unwrap_or(DEFAULT_IMAGE_REGISTRY);
    let version = &config.image_version_fallback;

    let (server_repository, server_fs_group, db_image) = match (config.flavor, vendor) {
        (ServerFlavor::Community, DatabaseVendor::Mysql) => (
            KEYCLOAK_IMAGE_REPOSITORY,
            KEYCLOAK_IMAGE_DEFAULT_USERID,
            MYSQL_COMMUNITY_IMAGE,
        ),
        (ServerFlavor::Community, DatabaseVendor::Postgresql) => (
            KEYCLOAK_IMAGE_REPOSITORY,
            KEYCLOAK_IMAGE_DEFAULT_USERID,
            POSTGRESQL_COMMUNITY_IMAGE,
        ),
        (ServerFlavor::VendorCertified, DatabaseVendor::Mysql) => (
            REDHAT_SSO_IMAGE_REPOSITORY,
            REDHAT_SSO_IMAGE_DEFAULT_USERID,
            MYSQL_REDHAT_IMAGE,
        ),
        (ServerFlavor::VendorCertified, DatabaseVendor::Postgresql) => (
            REDHAT_SSO_IMAGE_REPOSITORY,
            REDHAT_SSO_IMAGE_DEFAULT_USERID,
            POSTGRESQL_REDHAT_IMAGE,
        ),
    };

    let fs_group_override = config.requires_filesystem_group_override;

    ResolvedVariant {
        flavor: config.flavor,
        vendor,
        server_image: format!("{registry}/{server_repository}:{version}"),
        db_image: db_image.to_string(),
        schema_job_image: format!("{registry}/{DB_JOB_IMAGE_REPOSITORY}:{version}"),
        env: EnvVarConvention::for_flavor(config.flavor, vendor),
        server_fs_group: fs_group_override.then_some(server_fs_group),
        db_fs_group: fs_group_override.then_some(vendor_conventions(vendor).default_fs_group),
    }
}

#[cfg(test)]
#[path = "variant_tests.rs"]
mod variant_tests;
