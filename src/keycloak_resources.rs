// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes resource builders for `KeycloakServer`.
//!
//! Every function here is pure: given the owner, its namespace and the resolved
//! variant it returns the desired object. Names come from [`crate::naming`],
//! so building twice yields the same object.

use crate::constants::{
    API_GROUP_VERSION, AUTH_WEB_CONTEXT, CA_BUNDLE_FILE, CERT_SECRET_MOUNT_ROOT,
    CONTAINER_NAME_DB, CONTAINER_NAME_SCHEMA_JOB_DONE, CONTAINER_NAME_SERVER, DB_PORT_NAME,
    DB_REPLICAS,
    DB_PVC_ACCESS_MODE, DEFAULT_CAPABILITIES_CONFIGMAP, DEFAULT_DB_CPU_LIMIT,
    DEFAULT_DB_MEMORY_LIMIT, DEFAULT_DB_STORAGE_REQUEST, DEFAULT_KEYCLOAK_NAMESPACE_KEY,
    DEFAULT_KEYCLOAK_NAME_KEY, DEFAULT_SERVER_CPU_LIMIT, DEFAULT_SERVER_MEMORY_LIMIT,
    ENV_X509_CA_BUNDLE, INGRESS_PATH_TYPE, INTERNAL_URL_KEY,
    JOB_KIND_DB_PREPARATION, KIND_KEYCLOAK_SERVER, LIVENESS_FAILURE_THRESHOLD,
    LIVENESS_INITIAL_DELAY_SECS, LIVENESS_PERIOD_SECS, PASSWORD_KEY, READINESS_FAILURE_THRESHOLD,
    READINESS_INITIAL_DELAY_SECS, READINESS_PERIOD_SECS, SCHEMA_COMMAND_CREATE,
    SCHEMA_JOB_QUALIFIER, SERVER_PORT, SERVER_PORT_NAME, URL_KEY, USERNAME_KEY, VOLUME_DB_DATA,
    VOLUME_SUFFIX,
};
use crate::crd::{DatabaseVendor, KeycloakServer};
use crate::labels::{
    APP_NAME_KEYCLOAK, COMPONENT_CREDENTIALS, COMPONENT_DATABASE, COMPONENT_IDENTITY_SERVER,
    COMPONENT_SCHEMA_JOB, DEPLOYMENT_LABEL, DEPLOYMENT_QUALIFIER_LABEL, JOB_KIND_LABEL,
    K8S_COMPONENT, K8S_INSTANCE, K8S_MANAGED_BY, K8S_NAME, K8S_PART_OF, KEYCLOAK_SERVER_LABEL,
    MANAGED_BY_KEYCLOAK_SERVER, PART_OF_KEYCLOAK_OPERATOR,
};
use crate::naming::{
    resource_name, schema_init_container_name, schema_name, service_host, ResourceRole,
};
use crate::variant::ResolvedVariant;
use k8s_openapi::api::{
    apps::v1::{Deployment, DeploymentSpec, DeploymentStrategy},
    core::v1::{
        ConfigMap, Container, ContainerPort, EnvVar, EnvVarSource, HTTPGetAction,
        PersistentVolumeClaim, PersistentVolumeClaimSpec, PersistentVolumeClaimVolumeSource, Pod,
        PodSecurityContext, PodSpec, PodTemplateSpec, Probe, ResourceRequirements,
        SecretKeySelector, SecretVolumeSource, Service, ServicePort, ServiceSpec,
        TCPSocketAction, Volume, VolumeMount, VolumeResourceRequirements,
    },
    core::v1::Secret,
    networking::v1::{
        HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
        IngressServiceBackend, IngressSpec, IngressTLS, ServiceBackendPort,
    },
};
use k8s_openapi::apimachinery::pkg::{
    api::resource::Quantity,
    apis::meta::v1::{LabelSelector, ObjectMeta, OwnerReference},
    util::intstr::IntOrString,
};
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::debug;

/// Username and password held by a credential secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything the schema preparation pod needs to reach the database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaJobRequest {
    /// One init container is created per schema
    pub schemas: Vec<String>,
    pub vendor: DatabaseVendor,
    pub host: String,
    pub port: i32,
    /// Secret holding the database superuser credentials
    pub admin_secret: String,
    /// Secret holding the schema owner credentials
    pub user_secret: String,
    pub image: String,
}

/// Labels shared by every resource derived from `owner_name`.
#[must_use]
pub fn build_labels(owner_name: &str, component: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(K8S_NAME.into(), APP_NAME_KEYCLOAK.into());
    labels.insert(K8S_INSTANCE.into(), owner_name.into());
    labels.insert(K8S_COMPONENT.into(), component.into());
    labels.insert(K8S_MANAGED_BY.into(), MANAGED_BY_KEYCLOAK_SERVER.into());
    labels.insert(K8S_PART_OF.into(), PART_OF_KEYCLOAK_OPERATOR.into());
    labels.insert(KEYCLOAK_SERVER_LABEL.into(), owner_name.into());
    labels
}

/// Labels tying pods of a deployment role to its Service.
///
/// `role` is [`ResourceRole::Db`] or [`ResourceRole::Server`]; the Deployment
/// selector and the Service selector are exactly this map.
#[must_use]
pub fn build_selector_labels(owner_name: &str, role: ResourceRole) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(DEPLOYMENT_LABEL.into(), resource_name(owner_name, role));
    labels.insert(KEYCLOAK_SERVER_LABEL.into(), owner_name.into());
    labels
}

/// Controller owner reference pointing at `owner`.
#[must_use]
pub fn build_owner_references(owner: &KeycloakServer) -> Vec<OwnerReference> {
    vec![OwnerReference {
        api_version: API_GROUP_VERSION.to_string(),
        kind: KIND_KEYCLOAK_SERVER.to_string(),
        name: owner.name_any(),
        uid: owner.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }]
}

/// Metadata for a derived object in `namespace`.
///
/// Owner references are only valid inside the owner's namespace; objects placed
/// elsewhere (the controller namespace) carry labels only.
fn derived_metadata(
    owner: &KeycloakServer,
    namespace: &str,
    name: String,
    labels: BTreeMap<String, String>,
) -> ObjectMeta {
    let same_namespace = owner.metadata.namespace.as_deref() == Some(namespace);
    ObjectMeta {
        name: Some(name),
        namespace: Some(namespace.into()),
        labels: Some(labels),
        owner_references: same_namespace.then(|| build_owner_references(owner)),
        ..Default::default()
    }
}

fn quantity(value: &str) -> Quantity {
    Quantity(value.to_string())
}

fn literal_env(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.into(),
        value: Some(value.into()),
        ..Default::default()
    }
}

fn secret_env(name: &str, secret: &str, key: &str) -> EnvVar {
    EnvVar {
        name: name.into(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: secret.into(),
                key: key.into(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

// ============================================================================
// Secrets
// ============================================================================

/// Credential secret `name` in `namespace` holding `username` and `password`.
#[must_use]
pub fn build_credential_secret(
    owner: &KeycloakServer,
    namespace: &str,
    name: &str,
    credentials: &Credentials,
) -> Secret {
    let mut string_data = BTreeMap::new();
    string_data.insert(USERNAME_KEY.to_string(), credentials.username.clone());
    string_data.insert(PASSWORD_KEY.to_string(), credentials.password.clone());

    Secret {
        metadata: derived_metadata(
            owner,
            namespace,
            name.to_string(),
            build_labels(&owner.name_any(), COMPONENT_CREDENTIALS),
        ),
        string_data: Some(string_data),
        type_: Some("Opaque".into()),
        ..Default::default()
    }
}

/// Reads `key` from a secret, whether it was written as `stringData` or `data`.
#[must_use]
pub fn secret_value(secret: &Secret, key: &str) -> Option<String> {
    if let Some(value) = secret.string_data.as_ref().and_then(|d| d.get(key)) {
        return Some(value.clone());
    }
    secret
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .and_then(|bytes| String::from_utf8(bytes.0.clone()).ok())
}

/// Username and password of a credential secret, if both are present.
#[must_use]
pub fn read_credentials(secret: &Secret) -> Option<Credentials> {
    Some(Credentials {
        username: secret_value(secret, USERNAME_KEY)?,
        password: secret_value(secret, PASSWORD_KEY)?,
    })
}

/// Copy of a CA secret from the controller namespace into `namespace`.
#[must_use]
pub fn build_trust_store_copy(owner: &KeycloakServer, namespace: &str, source: &Secret) -> Secret {
    Secret {
        metadata: derived_metadata(
            owner,
            namespace,
            source.name_any(),
            build_labels(&owner.name_any(), COMPONENT_CREDENTIALS),
        ),
        data: source.data.clone(),
        string_data: source.string_data.clone(),
        type_: source.type_.clone(),
        ..Default::default()
    }
}

// ============================================================================
// Services and Ingress
// ============================================================================

/// ClusterIP Service in front of the pods of `role` (`Db` or `Server`).
#[must_use]
pub fn build_service(
    owner: &KeycloakServer,
    namespace: &str,
    role: ResourceRole,
    port_name: &str,
    port: i32,
) -> Service {
    let owner_name = owner.name_any();
    let component = if role == ResourceRole::Db {
        COMPONENT_DATABASE
    } else {
        COMPONENT_IDENTITY_SERVER
    };

    Service {
        metadata: derived_metadata(
            owner,
            namespace,
            resource_name(&owner_name, role.service()),
            build_labels(&owner_name, component),
        ),
        spec: Some(ServiceSpec {
            selector: Some(build_selector_labels(&owner_name, role)),
            ports: Some(vec![ServicePort {
                name: Some(port_name.into()),
                port,
                target_port: Some(IntOrString::Int(port)),
                protocol: Some("TCP".into()),
                ..Default::default()
            }]),
            type_: Some("ClusterIP".into()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Ingress path routing `context` to `backend_service:port`.
#[must_use]
pub fn build_ingress_path(context: &str, backend_service: &str, port: i32) -> HTTPIngressPath {
    HTTPIngressPath {
        path: Some(context.into()),
        path_type: INGRESS_PATH_TYPE.into(),
        backend: IngressBackend {
            service: Some(IngressServiceBackend {
                name: backend_service.into(),
                port: Some(ServiceBackendPort {
                    number: Some(port),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        },
    }
}

/// Ingress of the identity server with a single path.
///
/// The rule has no host when none can be resolved; TLS is only set up when
/// both a host and a TLS secret are known.
#[must_use]
pub fn build_ingress(
    owner: &KeycloakServer,
    namespace: &str,
    host: Option<&str>,
    tls_secret_name: Option<&str>,
    path: HTTPIngressPath,
) -> Ingress {
    let owner_name = owner.name_any();
    let tls = match (host, tls_secret_name) {
        (Some(host), Some(secret)) => Some(vec![IngressTLS {
            hosts: Some(vec![host.into()]),
            secret_name: Some(secret.into()),
        }]),
        _ => None,
    };

    Ingress {
        metadata: derived_metadata(
            owner,
            namespace,
            resource_name(&owner_name, ResourceRole::Ingress),
            build_labels(&owner_name, COMPONENT_IDENTITY_SERVER),
        ),
        spec: Some(IngressSpec {
            rules: Some(vec![IngressRule {
                host: host.map(str::to_string),
                http: Some(HTTPIngressRuleValue { paths: vec![path] }),
            }]),
            tls,
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Whether any rule of `ingress` already routes `context`.
#[must_use]
pub fn ingress_has_path(ingress: &Ingress, context: &str) -> bool {
    ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.rules.as_ref())
        .into_iter()
        .flatten()
        .filter_map(|rule| rule.http.as_ref())
        .flat_map(|http| http.paths.iter())
        .any(|path| path.path.as_deref() == Some(context))
}

/// Patch adding `path` to the first rule of `ingress`.
///
/// Only the identity and the spec are carried, so the result can be sent as a
/// merge patch. A rule is created when the ingress has none.
#[must_use]
pub fn with_ingress_path(ingress: &Ingress, path: HTTPIngressPath) -> Ingress {
    let mut spec = ingress.spec.clone().unwrap_or_default();
    let rules = spec.rules.get_or_insert_with(Vec::new);
    if rules.is_empty() {
        rules.push(IngressRule::default());
    }
    if let Some(rule) = rules.first_mut() {
        rule.http
            .get_or_insert_with(HTTPIngressRuleValue::default)
            .paths
            .push(path);
    }

    Ingress {
        metadata: ObjectMeta {
            name: ingress.metadata.name.clone(),
            namespace: ingress.metadata.namespace.clone(),
            ..Default::default()
        },
        spec: Some(spec),
        ..Default::default()
    }
}

// ============================================================================
// Storage and Deployments
// ============================================================================

/// Volume claim holding the database files.
#[must_use]
pub fn build_db_pvc(owner: &KeycloakServer, namespace: &str) -> PersistentVolumeClaim {
    let owner_name = owner.name_any();
    let storage = owner
        .spec
        .resource_requirements
        .as_ref()
        .and_then(|r| r.storage_request.as_deref())
        .unwrap_or(DEFAULT_DB_STORAGE_REQUEST);

    let mut requests = BTreeMap::new();
    requests.insert("storage".to_string(), quantity(storage));

    PersistentVolumeClaim {
        metadata: derived_metadata(
            owner,
            namespace,
            resource_name(&owner_name, ResourceRole::DbPvc),
            build_labels(&owner_name, COMPONENT_DATABASE),
        ),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec![DB_PVC_ACCESS_MODE.into()]),
            storage_class_name: owner.spec.storage_class.clone(),
            resources: Some(VolumeResourceRequirements {
                requests: Some(requests),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn build_deployment(
    owner: &KeycloakServer,
    namespace: &str,
    role: ResourceRole,
    component: &str,
    replicas: Option<i32>,
    pod_spec: PodSpec,
) -> Deployment {
    let owner_name = owner.name_any();
    let selector = build_selector_labels(&owner_name, role);
    let mut template_labels = build_labels(&owner_name, component);
    template_labels.extend(selector.clone());

    Deployment {
        metadata: derived_metadata(
            owner,
            namespace,
            resource_name(&owner_name, role.deployment()),
            build_labels(&owner_name, component),
        ),
        spec: Some(DeploymentSpec {
            replicas,
            selector: LabelSelector {
                match_labels: Some(selector),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(template_labels),
                    ..Default::default()
                }),
                spec: Some(pod_spec),
            },
            strategy: (role == ResourceRole::Db).then(|| DeploymentStrategy {
                type_: Some("Recreate".into()),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn pod_security_context(fs_group: Option<i64>) -> Option<PodSecurityContext> {
    fs_group.map(|group| PodSecurityContext {
        fs_group: Some(group),
        ..Default::default()
    })
}

/// Database Deployment for the resolved vendor.
#[must_use]
pub fn build_db_deployment(
    owner: &KeycloakServer,
    namespace: &str,
    variant: &ResolvedVariant,
) -> Deployment {
    let owner_name = owner.name_any();
    let db = variant.db();
    debug!(
        name = %owner_name,
        namespace = %namespace,
        vendor = %variant.vendor,
        "Building database Deployment"
    );

    let mut limits = BTreeMap::new();
    limits.insert("memory".to_string(), quantity(DEFAULT_DB_MEMORY_LIMIT));
    limits.insert("cpu".to_string(), quantity(DEFAULT_DB_CPU_LIMIT));

    let container = Container {
        name: CONTAINER_NAME_DB.into(),
        image: Some(variant.db_image.clone()),
        image_pull_policy: Some("IfNotPresent".into()),
        ports: Some(vec![ContainerPort {
            name: Some(DB_PORT_NAME.into()),
            container_port: db.port,
            protocol: Some("TCP".into()),
            ..Default::default()
        }]),
        env: Some(vec![secret_env(
            db.admin_password_var,
            &resource_name(&owner_name, ResourceRole::DbAdminSecret),
            PASSWORD_KEY,
        )]),
        volume_mounts: Some(vec![VolumeMount {
            name: VOLUME_DB_DATA.into(),
            mount_path: db.data_path.into(),
            ..Default::default()
        }]),
        readiness_probe: Some(Probe {
            tcp_socket: Some(TCPSocketAction {
                port: IntOrString::Int(db.port),
                ..Default::default()
            }),
            initial_delay_seconds: Some(READINESS_INITIAL_DELAY_SECS),
            period_seconds: Some(READINESS_PERIOD_SECS),
            failure_threshold: Some(READINESS_FAILURE_THRESHOLD),
            ..Default::default()
        }),
        resources: Some(ResourceRequirements {
            limits: Some(limits),
            ..Default::default()
        }),
        ..Default::default()
    };

    let pod_spec = PodSpec {
        containers: vec![container],
        volumes: Some(vec![Volume {
            name: VOLUME_DB_DATA.into(),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: resource_name(&owner_name, ResourceRole::DbPvc),
                ..Default::default()
            }),
            ..Default::default()
        }]),
        security_context: pod_security_context(variant.db_fs_group),
        ..Default::default()
    };

    build_deployment(
        owner,
        namespace,
        ResourceRole::Db,
        COMPONENT_DATABASE,
        Some(DB_REPLICAS),
        pod_spec,
    )
}

/// Mount point of a trust-store secret.
#[must_use]
pub fn trust_store_mount_path(secret_name: &str) -> String {
    format!("{CERT_SECRET_MOUNT_ROOT}/{secret_name}")
}

/// Space separated CA bundle paths of every trust-store secret.
#[must_use]
pub fn ca_bundle_paths(trust_store_secret_names: &[String]) -> String {
    trust_store_secret_names
        .iter()
        .map(|name| format!("{}/{CA_BUNDLE_FILE}", trust_store_mount_path(name)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn server_resources(owner: &KeycloakServer) -> ResourceRequirements {
    let overrides = owner.spec.resource_requirements.clone().unwrap_or_default();

    let mut limits = BTreeMap::new();
    limits.insert(
        "memory".to_string(),
        quantity(
            overrides
                .memory_limit
                .as_deref()
                .unwrap_or(DEFAULT_SERVER_MEMORY_LIMIT),
        ),
    );
    limits.insert(
        "cpu".to_string(),
        quantity(overrides.cpu_limit.as_deref().unwrap_or(DEFAULT_SERVER_CPU_LIMIT)),
    );

    let mut requests = BTreeMap::new();
    if let Some(memory) = overrides.memory_request.as_deref() {
        requests.insert("memory".to_string(), quantity(memory));
    }
    if let Some(cpu) = overrides.cpu_request.as_deref() {
        requests.insert("cpu".to_string(), quantity(cpu));
    }

    ResourceRequirements {
        limits: Some(limits),
        requests: (!requests.is_empty()).then_some(requests),
        ..Default::default()
    }
}

/// Identity server Deployment.
///
/// Credentials reach the container through secret references only; trust-store
/// secrets are mounted read-only and listed in `X509_CA_BUNDLE`. Replicas are
/// left to the API server default (and any autoscaler) unless the spec sets them.
#[must_use]
pub fn build_server_deployment(
    owner: &KeycloakServer,
    namespace: &str,
    variant: &ResolvedVariant,
    trust_store_secret_names: &[String],
) -> Deployment {
    let owner_name = owner.name_any();
    let admin_secret = resource_name(&owner_name, ResourceRole::AdminSecret);
    let db_secret = resource_name(&owner_name, ResourceRole::DbSecret);
    let db_host = service_host(
        &resource_name(&owner_name, ResourceRole::DbService),
        namespace,
    );
    let names = &variant.env;
    let (vendor_var, vendor_value) = variant.vendor_env(&owner_name);

    let mut env = vec![
        secret_env(&names.admin_username, &admin_secret, USERNAME_KEY),
        secret_env(&names.admin_password, &admin_secret, PASSWORD_KEY),
        literal_env(&names.db_host, db_host),
        literal_env(&names.db_port, variant.db().port.to_string()),
        literal_env(&names.db_name, schema_name(&owner_name)),
        secret_env(&names.db_user, &db_secret, USERNAME_KEY),
        secret_env(&names.db_password, &db_secret, PASSWORD_KEY),
        literal_env(vendor_var, vendor_value),
    ];
    if !trust_store_secret_names.is_empty() {
        env.push(literal_env(
            ENV_X509_CA_BUNDLE,
            ca_bundle_paths(trust_store_secret_names),
        ));
    }

    let volume_mounts: Vec<VolumeMount> = trust_store_secret_names
        .iter()
        .map(|name| VolumeMount {
            name: format!("{name}{VOLUME_SUFFIX}"),
            mount_path: trust_store_mount_path(name),
            read_only: Some(true),
            ..Default::default()
        })
        .collect();
    let volumes: Vec<Volume> = trust_store_secret_names
        .iter()
        .map(|name| Volume {
            name: format!("{name}{VOLUME_SUFFIX}"),
            secret: Some(SecretVolumeSource {
                secret_name: Some(name.clone()),
                ..Default::default()
            }),
            ..Default::default()
        })
        .collect();

    let image = owner
        .spec
        .image_override
        .clone()
        .unwrap_or_else(|| variant.server_image.clone());

    let container = Container {
        name: CONTAINER_NAME_SERVER.into(),
        image: Some(image),
        image_pull_policy: Some("IfNotPresent".into()),
        ports: Some(vec![ContainerPort {
            name: Some(SERVER_PORT_NAME.into()),
            container_port: SERVER_PORT,
            protocol: Some("TCP".into()),
            ..Default::default()
        }]),
        env: Some(env),
        volume_mounts: (!volume_mounts.is_empty()).then_some(volume_mounts),
        readiness_probe: Some(Probe {
            http_get: Some(HTTPGetAction {
                path: Some(AUTH_WEB_CONTEXT.into()),
                port: IntOrString::Int(SERVER_PORT),
                ..Default::default()
            }),
            initial_delay_seconds: Some(READINESS_INITIAL_DELAY_SECS),
            period_seconds: Some(READINESS_PERIOD_SECS),
            failure_threshold: Some(READINESS_FAILURE_THRESHOLD),
            ..Default::default()
        }),
        liveness_probe: Some(Probe {
            tcp_socket: Some(TCPSocketAction {
                port: IntOrString::Int(SERVER_PORT),
                ..Default::default()
            }),
            initial_delay_seconds: Some(LIVENESS_INITIAL_DELAY_SECS),
            period_seconds: Some(LIVENESS_PERIOD_SECS),
            failure_threshold: Some(LIVENESS_FAILURE_THRESHOLD),
            ..Default::default()
        }),
        resources: Some(server_resources(owner)),
        ..Default::default()
    };

    let pod_spec = PodSpec {
        containers: vec![container],
        volumes: (!volumes.is_empty()).then_some(volumes),
        security_context: pod_security_context(variant.server_fs_group),
        ..Default::default()
    };

    build_deployment(
        owner,
        namespace,
        ResourceRole::Server,
        COMPONENT_IDENTITY_SERVER,
        owner.spec.replicas,
        pod_spec,
    )
}

// ============================================================================
// Schema preparation
// ============================================================================

fn schema_init_container(request: &SchemaJobRequest, schema: &str) -> Container {
    Container {
        name: schema_init_container_name(schema),
        image: Some(request.image.clone()),
        image_pull_policy: Some("IfNotPresent".into()),
        env: Some(vec![
            literal_env("DATABASE_SCHEMA_COMMAND", SCHEMA_COMMAND_CREATE),
            literal_env("DATABASE_NAME", schema),
            literal_env("DATABASE_VENDOR", request.vendor.as_str()),
            literal_env("DATABASE_SERVER_HOST", request.host.clone()),
            literal_env("DATABASE_SERVER_PORT", request.port.to_string()),
            secret_env("DATABASE_ADMIN_USER", &request.admin_secret, USERNAME_KEY),
            secret_env("DATABASE_ADMIN_PASSWORD", &request.admin_secret, PASSWORD_KEY),
            secret_env("DATABASE_USER", &request.user_secret, USERNAME_KEY),
            secret_env("DATABASE_PASSWORD", &request.user_secret, PASSWORD_KEY),
        ]),
        ..Default::default()
    }
}

/// One-shot pod creating every requested schema in its init containers.
#[must_use]
pub fn build_schema_job_pod(
    owner: &KeycloakServer,
    namespace: &str,
    request: &SchemaJobRequest,
) -> Pod {
    let owner_name = owner.name_any();
    let mut labels = build_labels(&owner_name, COMPONENT_SCHEMA_JOB);
    labels.insert(JOB_KIND_LABEL.into(), JOB_KIND_DB_PREPARATION.into());
    labels.insert(DEPLOYMENT_QUALIFIER_LABEL.into(), SCHEMA_JOB_QUALIFIER.into());

    Pod {
        metadata: derived_metadata(
            owner,
            namespace,
            resource_name(&owner_name, ResourceRole::SchemaJob),
            labels,
        ),
        spec: Some(PodSpec {
            init_containers: Some(
                request
                    .schemas
                    .iter()
                    .map(|schema| schema_init_container(request, schema))
                    .collect(),
            ),
            containers: vec![Container {
                name: CONTAINER_NAME_SCHEMA_JOB_DONE.into(),
                image: Some(request.image.clone()),
                image_pull_policy: Some("IfNotPresent".into()),
                command: Some(vec!["echo".into(), "schema preparation complete".into()]),
                ..Default::default()
            }],
            restart_policy: Some("Never".into()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

// ============================================================================
// ConfigMaps
// ============================================================================

/// Cluster-internal base URL of the identity server.
#[must_use]
pub fn internal_base_url(owner_name: &str, namespace: &str) -> String {
    format!(
        "http://{}:{SERVER_PORT}{AUTH_WEB_CONTEXT}",
        service_host(
            &resource_name(owner_name, ResourceRole::ServerService),
            namespace
        )
    )
}

/// External base URL; falls back to `internal_url` without a host.
#[must_use]
pub fn external_base_url(host: Option<&str>, tls: bool, internal_url: &str) -> String {
    match host {
        Some(host) if tls => format!("https://{host}{AUTH_WEB_CONTEXT}"),
        Some(host) => format!("http://{host}{AUTH_WEB_CONTEXT}"),
        None => internal_url.to_string(),
    }
}

/// ConfigMap telling clients where the identity server lives.
#[must_use]
pub fn build_connection_config_map(
    owner: &KeycloakServer,
    namespace: &str,
    url: &str,
    internal_url: &str,
) -> ConfigMap {
    let owner_name = owner.name_any();
    let mut data = BTreeMap::new();
    data.insert(URL_KEY.to_string(), url.to_string());
    data.insert(INTERNAL_URL_KEY.to_string(), internal_url.to_string());

    ConfigMap {
        metadata: derived_metadata(
            owner,
            namespace,
            resource_name(&owner_name, ResourceRole::ConnectionConfig),
            build_labels(&owner_name, COMPONENT_IDENTITY_SERVER),
        ),
        data: Some(data),
        ..Default::default()
    }
}

/// Operator-wide registration of the default identity server.
#[must_use]
pub fn build_default_capabilities_config_map(
    owner: &KeycloakServer,
    controller_namespace: &str,
    owner_namespace: &str,
) -> ConfigMap {
    let owner_name = owner.name_any();
    let mut data = BTreeMap::new();
    data.insert(DEFAULT_KEYCLOAK_NAME_KEY.to_string(), owner_name.clone());
    data.insert(
        DEFAULT_KEYCLOAK_NAMESPACE_KEY.to_string(),
        owner_namespace.to_string(),
    );

    ConfigMap {
        metadata: derived_metadata(
            owner,
            controller_namespace,
            DEFAULT_CAPABILITIES_CONFIGMAP.to_string(),
            build_labels(&owner_name, COMPONENT_IDENTITY_SERVER),
        ),
        data: Some(data),
        ..Default::default()
    }
}

#[cfg(test)]
#[path = "keycloak_resources_tests.rs"]
mod keycloak_resources_tests;
