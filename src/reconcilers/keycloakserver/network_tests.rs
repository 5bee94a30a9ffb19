// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `network.rs`

#[cfg(test)]
mod tests {
    use crate::cluster::memory::InMemoryCluster;
    use crate::constants::{DEFAULT_CAPABILITIES_CONFIGMAP, DEFAULT_KEYCLOAK_NAME_KEY};
    use crate::crd::KeycloakServerSpec;
    use crate::keycloak_resources::{build_ingress, build_ingress_path, ingress_has_path};
    use crate::naming::ResourceRole;
    use crate::reconcilers::keycloakserver::network::{
        create_services, ensure_ingress_path, ensure_service, publish_connection,
        register_default, resolve_ingress_host,
    };
    use crate::reconcilers::keycloakserver::test_fixtures::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_services_use_vendor_and_server_ports() {
        let cluster = Arc::new(InMemoryCluster::new());
        let ctx = context(&cluster, config());
        let owner = my_keycloak();
        let mut pass = pass(&ctx, &owner);

        create_services(&mut pass).await.unwrap();

        let db = cluster
            .services
            .get(OWNER_NAMESPACE, "my-keycloak-db-service")
            .unwrap();
        let db_ports = db.spec.unwrap().ports.unwrap();
        assert_eq!(db_ports[0].port, 3306);
        assert_eq!(db_ports[0].name.as_deref(), Some("db-port"));

        let server = cluster
            .services
            .get(OWNER_NAMESPACE, "my-keycloak-server-service")
            .unwrap();
        assert_eq!(server.spec.unwrap().ports.unwrap()[0].port, 8080);

        let resources = &pass.status.status().resources;
        assert!(resources["Service/my-keycloak-db-service"].observed);
        assert!(resources["Service/my-keycloak-server-service"].observed);
    }

    #[tokio::test]
    async fn test_ensure_service_is_idempotent() {
        let cluster = Arc::new(InMemoryCluster::new());
        let ctx = context(&cluster, config());
        let owner = my_keycloak();
        let mut pass = pass(&ctx, &owner);

        ensure_service(&mut pass, ResourceRole::Server, "server-port", 8080)
            .await
            .unwrap();
        ensure_service(&mut pass, ResourceRole::Server, "server-port", 8080)
            .await
            .unwrap();

        assert_eq!(cluster.services.all().len(), 1);
    }

    #[test]
    fn test_ingress_host_resolution() {
        let cluster = Arc::new(InMemoryCluster::new());
        let mut with_suffix = config();
        with_suffix.routing_suffix = Some("apps.example.com".to_string());
        let ctx = context(&cluster, with_suffix);

        let explicit = my_keycloak();
        assert_eq!(
            resolve_ingress_host(&pass(&ctx, &explicit)).as_deref(),
            Some(HOST)
        );

        let derived = server("sso", KeycloakServerSpec::default());
        assert_eq!(
            resolve_ingress_host(&pass(&ctx, &derived)).as_deref(),
            Some("sso-keycloak-namespace.apps.example.com")
        );

        let no_suffix_ctx = context(&cluster, config());
        assert_eq!(resolve_ingress_host(&pass(&no_suffix_ctx, &derived)), None);
    }

    #[tokio::test]
    async fn test_ingress_created_with_tls() {
        let cluster = Arc::new(InMemoryCluster::new());
        let ctx = context(&cluster, config());
        let owner = my_keycloak();
        let mut pass = pass(&ctx, &owner);
        pass.tls_secret = Some(TLS_SECRET.to_string());

        ensure_ingress_path(&mut pass, "/auth", "my-keycloak-server-service", 8080)
            .await
            .unwrap();

        let ingress = cluster
            .ingresses
            .get(OWNER_NAMESPACE, "my-keycloak-ingress")
            .unwrap();
        assert!(ingress_has_path(&ingress, "/auth"));
        let spec = ingress.spec.unwrap();
        assert_eq!(spec.rules.unwrap()[0].host.as_deref(), Some(HOST));
        assert_eq!(
            spec.tls.unwrap()[0].secret_name.as_deref(),
            Some(TLS_SECRET)
        );
    }

    #[tokio::test]
    async fn test_existing_ingress_gets_missing_path() {
        let cluster = Arc::new(InMemoryCluster::new());
        let owner = my_keycloak();
        let existing = build_ingress(
            &owner,
            OWNER_NAMESPACE,
            Some(HOST),
            None,
            build_ingress_path("/other", "other-service", 80),
        );
        cluster.ingresses.insert(existing).unwrap();
        let ctx = context(&cluster, config());
        let mut pass = pass(&ctx, &owner);

        ensure_ingress_path(&mut pass, "/auth", "my-keycloak-server-service", 8080)
            .await
            .unwrap();
        ensure_ingress_path(&mut pass, "/auth", "my-keycloak-server-service", 8080)
            .await
            .unwrap();

        let ingress = cluster
            .ingresses
            .get(OWNER_NAMESPACE, "my-keycloak-ingress")
            .unwrap();
        assert!(ingress_has_path(&ingress, "/auth"));
        assert!(ingress_has_path(&ingress, "/other"));
        assert_eq!(
            cluster.count_calls("create_or_patch", "Ingress", "my-keycloak-ingress"),
            1
        );
    }

    #[tokio::test]
    async fn test_publish_connection_writes_urls_and_completes_status() {
        let cluster = Arc::new(InMemoryCluster::new());
        let ctx = context(&cluster, config());
        let owner = my_keycloak();
        let mut pass = pass(&ctx, &owner);
        pass.tls_secret = Some(TLS_SECRET.to_string());

        publish_connection(&mut pass).await.unwrap();

        let connection = cluster
            .config_maps
            .get(OWNER_NAMESPACE, "my-keycloak-connection-config")
            .unwrap();
        let data = connection.data.unwrap();
        assert_eq!(data["url"], "https://access.192.168.0.100.nip.io/auth");
        assert_eq!(
            data["internalUrl"],
            "http://my-keycloak-server-service.keycloak-namespace.svc.cluster.local:8080/auth"
        );
        assert_eq!(
            pass.status.status().base_url.as_deref(),
            Some("https://access.192.168.0.100.nip.io/auth")
        );
    }

    #[tokio::test]
    async fn test_connection_falls_back_to_internal_url() {
        let cluster = Arc::new(InMemoryCluster::new());
        let ctx = context(&cluster, config());
        let owner = server("internal", KeycloakServerSpec::default());
        let mut pass = pass(&ctx, &owner);

        publish_connection(&mut pass).await.unwrap();

        let data = cluster
            .config_maps
            .get(OWNER_NAMESPACE, "internal-connection-config")
            .unwrap()
            .data
            .unwrap();
        assert_eq!(data["url"], data["internalUrl"]);
    }

    #[tokio::test]
    async fn test_default_registration() {
        let cluster = Arc::new(InMemoryCluster::new());
        let ctx = context(&cluster, config());
        fn default_name(cluster: &InMemoryCluster) -> Option<String> {
            cluster
                .config_maps
                .get(CONTROLLER_NAMESPACE, DEFAULT_CAPABILITIES_CONFIGMAP)
                .and_then(|cm| cm.data)
                .map(|data| data[DEFAULT_KEYCLOAK_NAME_KEY].clone())
        }

        let first = server("first", KeycloakServerSpec::default());
        register_default(&pass(&ctx, &first)).await.unwrap();
        assert_eq!(default_name(&cluster).as_deref(), Some("first"));

        let second = server("second", KeycloakServerSpec::default());
        register_default(&pass(&ctx, &second)).await.unwrap();
        assert_eq!(default_name(&cluster).as_deref(), Some("first"));

        let flagged = server(
            "flagged",
            KeycloakServerSpec {
                is_default: Some(true),
                ..Default::default()
            },
        );
        register_default(&pass(&ctx, &flagged)).await.unwrap();
        assert_eq!(default_name(&cluster).as_deref(), Some("flagged"));

        let registration = cluster
            .config_maps
            .get(CONTROLLER_NAMESPACE, DEFAULT_CAPABILITIES_CONFIGMAP)
            .unwrap();
        assert!(registration.metadata.owner_references.is_none());
    }
}
