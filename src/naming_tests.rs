// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `naming.rs`

#[cfg(test)]
mod tests {
    use crate::naming::{
        default_ingress_host, resource_name, schema_init_container_name, schema_name,
        service_host, ResourceRole,
    };

    const OWNER: &str = "my-keycloak";

    #[test]
    fn test_suffixes_match_naming_convention() {
        let cases = [
            (ResourceRole::Db, "my-keycloak-db"),
            (ResourceRole::Server, "my-keycloak-server"),
            (ResourceRole::ServerService, "my-keycloak-server-service"),
            (ResourceRole::ServerDeployment, "my-keycloak-server-deployment"),
            (ResourceRole::DbService, "my-keycloak-db-service"),
            (ResourceRole::DbDeployment, "my-keycloak-db-deployment"),
            (ResourceRole::DbPvc, "my-keycloak-db-pvc"),
            (ResourceRole::DbSecret, "my-keycloak-db-secret"),
            (ResourceRole::AdminSecret, "my-keycloak-admin-secret"),
            (ResourceRole::DbAdminSecret, "my-keycloak-db-admin-secret"),
            (ResourceRole::Ingress, "my-keycloak-ingress"),
        ];

        for (role, expected) in cases {
            assert_eq!(resource_name(OWNER, role), expected, "role {role:?}");
        }
    }

    #[test]
    fn test_resource_name_is_stable() {
        let first = resource_name(OWNER, ResourceRole::AdminSecret);
        let second = resource_name(OWNER, ResourceRole::AdminSecret);
        assert_eq!(first, second);
    }

    #[test]
    fn test_schema_name_replaces_hyphens() {
        assert_eq!(schema_name(OWNER), "my_keycloak_db");
        assert_eq!(schema_name("sso"), "sso_db");
    }

    #[test]
    fn test_service_host() {
        assert_eq!(
            service_host("my-keycloak-db-service", "keycloak-namespace"),
            "my-keycloak-db-service.keycloak-namespace.svc.cluster.local"
        );
    }

    #[test]
    fn test_default_ingress_host() {
        assert_eq!(
            default_ingress_host(OWNER, "sso", "apps.example.com"),
            "my-keycloak-sso.apps.example.com"
        );
    }

    #[test]
    fn test_deployment_roles_map_to_services_and_deployments() {
        assert_eq!(ResourceRole::Db.service(), ResourceRole::DbService);
        assert_eq!(ResourceRole::Server.service(), ResourceRole::ServerService);
        assert_eq!(ResourceRole::Db.deployment(), ResourceRole::DbDeployment);
        assert_eq!(
            ResourceRole::Server.deployment(),
            ResourceRole::ServerDeployment
        );
        assert_eq!(ResourceRole::Ingress.service(), ResourceRole::Ingress);
    }

    #[test]
    fn test_schema_init_container_name() {
        assert_eq!(
            schema_init_container_name(&schema_name(OWNER)),
            format!("{OWNER}-db-schema-creation-job")
        );
    }
}
