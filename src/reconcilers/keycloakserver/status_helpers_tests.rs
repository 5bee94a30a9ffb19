// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `status_helpers.rs`

#[cfg(test)]
mod tests {
    use crate::cluster::memory::{Fault, InMemoryCluster};
    use crate::crd::{DeploymentPhase, KeycloakServerStatus, ObservedResource};
    use crate::reconcilers::keycloakserver::status_helpers::{
        reload, resource_key, StatusAggregator,
    };
    use crate::reconcilers::keycloakserver::test_fixtures::*;
    use crate::status_reasons::{CONDITION_TYPE_READY, REASON_RECONCILING, STATUS_UNKNOWN};
    use k8s_openapi::api::core::v1::{Service, ServiceStatus};
    use k8s_openapi::api::networking::v1::Ingress;
    use kube::api::ObjectMeta;
    use std::sync::Arc;

    fn service_with_status(name: &str) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(OWNER_NAMESPACE.to_string()),
                ..Default::default()
            },
            status: Some(ServiceStatus {
                conditions: Some(vec![]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_resource_key() {
        assert_eq!(
            resource_key("Service", "my-keycloak-db-service"),
            "Service/my-keycloak-db-service"
        );
    }

    #[test]
    fn test_starts_from_existing_status() {
        let mut owner = my_keycloak();
        owner.status = Some(KeycloakServerStatus {
            phase: Some(DeploymentPhase::Successful),
            base_url: Some("https://old/auth".to_string()),
            ..Default::default()
        });

        let aggregator = StatusAggregator::new(&owner);
        assert_eq!(aggregator.status().phase, Some(DeploymentPhase::Successful));
        assert_eq!(
            aggregator.status().base_url.as_deref(),
            Some("https://old/auth")
        );
    }

    #[test]
    fn test_observe_records_live_status() {
        let mut aggregator = StatusAggregator::new(&my_keycloak());
        let service = service_with_status("svc");

        aggregator.observe("svc", Some(&service));

        let entry = &aggregator.status().resources["Service/svc"];
        assert_eq!(entry.kind, "Service");
        assert_eq!(entry.name, "svc");
        assert!(entry.observed);
        assert!(entry.status.is_some());
        assert!(entry.last_observed_time.is_some());
    }

    #[test]
    fn test_missing_resource_keeps_previous_fields() {
        let mut owner = my_keycloak();
        let mut resources = std::collections::BTreeMap::new();
        resources.insert(
            "Ingress/my-keycloak-ingress".to_string(),
            ObservedResource {
                kind: "Ingress".to_string(),
                name: "my-keycloak-ingress".to_string(),
                observed: true,
                status: Some(serde_json::json!({"loadBalancer": {}})),
                last_observed_time: Some("2025-01-01T00:00:00+00:00".to_string()),
            },
        );
        owner.status = Some(KeycloakServerStatus {
            resources,
            ..Default::default()
        });
        let mut aggregator = StatusAggregator::new(&owner);

        aggregator.observe::<Ingress>("my-keycloak-ingress", None);

        let entry = &aggregator.status().resources["Ingress/my-keycloak-ingress"];
        assert!(!entry.observed);
        assert_eq!(entry.status, Some(serde_json::json!({"loadBalancer": {}})));
        assert_eq!(
            entry.last_observed_time.as_deref(),
            Some("2025-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_latest_observation_wins() {
        let mut aggregator = StatusAggregator::new(&my_keycloak());
        aggregator.observe::<Service>("svc", None);
        aggregator.observe("svc", Some(&service_with_status("svc")));

        assert_eq!(aggregator.status().resources.len(), 1);
        assert!(aggregator.status().resources["Service/svc"].observed);
    }

    #[tokio::test]
    async fn test_reload_marks_missing_resource() {
        let cluster = InMemoryCluster::new();
        let mut aggregator = StatusAggregator::new(&my_keycloak());

        let live = reload(
            &cluster.services,
            &mut aggregator,
            OWNER_NAMESPACE,
            "not-there",
        )
        .await;

        assert!(live.is_none());
        assert!(!aggregator.status().resources["Service/not-there"].observed);
    }

    #[tokio::test]
    async fn test_failed_reload_is_not_observed() {
        let cluster = InMemoryCluster::new();
        cluster.services.insert(service_with_status("svc")).unwrap();
        let mut aggregator = StatusAggregator::new(&my_keycloak());
        reload(&cluster.services, &mut aggregator, OWNER_NAMESPACE, "svc").await;
        assert!(aggregator.status().resources["Service/svc"].observed);

        cluster.services.fail("load", Fault::Error);
        let live = reload(&cluster.services, &mut aggregator, OWNER_NAMESPACE, "svc").await;

        assert!(live.is_none());
        let entry = &aggregator.status().resources["Service/svc"];
        assert!(!entry.observed);
        assert!(entry.status.is_some());
    }

    #[tokio::test]
    async fn test_flush_writes_status() {
        let cluster = Arc::new(InMemoryCluster::new());
        let owner = my_keycloak();
        let mut aggregator = StatusAggregator::new(&owner);
        aggregator.set_phase(DeploymentPhase::Requested);
        aggregator.set_condition(
            CONDITION_TYPE_READY,
            STATUS_UNKNOWN,
            REASON_RECONCILING,
            "Reconciliation in progress",
        );

        aggregator
            .flush(&cluster.keycloak_servers, &owner)
            .await
            .unwrap();

        let written = cluster.keycloak_servers.last_status().unwrap();
        assert_eq!(written.phase, Some(DeploymentPhase::Requested));
        assert_eq!(written.conditions.len(), 1);
    }
}
