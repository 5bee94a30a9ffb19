// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `crd.rs`

#[cfg(test)]
mod tests {
    use crate::constants::{API_GROUP_VERSION, KIND_KEYCLOAK_SERVER};
    use crate::crd::*;
    use kube::CustomResourceExt;
    use serde_json::json;

    #[test]
    fn test_database_vendor_defaults_to_mysql() {
        let spec = KeycloakServerSpec::default();
        assert_eq!(spec.database_vendor(), DatabaseVendor::Mysql);
        assert_eq!(spec.database_vendor().as_str(), "mysql");
    }

    #[test]
    fn test_database_vendor_serializes_lowercase() {
        let value = serde_json::to_value(DatabaseVendor::Postgresql).unwrap();
        assert_eq!(value, json!("postgresql"));
        assert_eq!(DatabaseVendor::Postgresql.to_string(), "postgresql");
    }

    #[test]
    fn test_spec_deserializes_camel_case() {
        let spec: KeycloakServerSpec = serde_json::from_value(json!({
            "dbms": "postgresql",
            "ingressHostName": "access.192.168.0.100.nip.io",
            "tlsSecretName": "sso-tls",
            "resourceRequirements": { "memoryLimit": "7Gi", "storageRequest": "5Gi" },
            "isDefault": true
        }))
        .unwrap();

        assert_eq!(spec.dbms, Some(DatabaseVendor::Postgresql));
        assert_eq!(
            spec.ingress_host_name.as_deref(),
            Some("access.192.168.0.100.nip.io")
        );
        assert_eq!(spec.tls_secret_name.as_deref(), Some("sso-tls"));
        let requirements = spec.resource_requirements.unwrap();
        assert_eq!(requirements.memory_limit.as_deref(), Some("7Gi"));
        assert_eq!(requirements.storage_request.as_deref(), Some("5Gi"));
        assert_eq!(spec.is_default, Some(true));
    }

    #[test]
    fn test_empty_spec_deserializes() {
        let spec: KeycloakServerSpec = serde_json::from_value(json!({})).unwrap();
        assert_eq!(spec, KeycloakServerSpec::default());
    }

    #[test]
    fn test_status_round_trips_observed_resources() {
        let mut status = KeycloakServerStatus {
            phase: Some(DeploymentPhase::Successful),
            ..Default::default()
        };
        status.resources.insert(
            "Service/my-keycloak-db-service".to_string(),
            ObservedResource {
                kind: "Service".to_string(),
                name: "my-keycloak-db-service".to_string(),
                observed: true,
                status: Some(json!({ "loadBalancer": {} })),
                last_observed_time: None,
            },
        );

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["phase"], json!("Successful"));
        assert_eq!(
            value["resources"]["Service/my-keycloak-db-service"]["status"],
            json!({ "loadBalancer": {} })
        );

        let parsed: KeycloakServerStatus = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, status);
    }

    #[test]
    fn test_crd_metadata() {
        let crd = KeycloakServer::crd();
        assert_eq!(
            crd.metadata.name.as_deref(),
            Some("keycloakservers.sso.firestoned.io")
        );
        assert_eq!(
            format!("{}/{}", crd.spec.group, crd.spec.versions[0].name),
            API_GROUP_VERSION
        );
        assert_eq!(crd.spec.names.kind, KIND_KEYCLOAK_SERVER);
        assert_eq!(crd.spec.scope, "Namespaced");
    }
}
