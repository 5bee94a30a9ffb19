// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `memory.rs`

#[cfg(test)]
mod tests {
    use crate::cluster::memory::{Fault, InMemoryCluster, PodBehavior};
    use crate::cluster::{ClusterClient, ResourceClient};
    use k8s_openapi::api::core::v1::{
        ConfigMap, Container, Pod, PodSpec, Service, ServiceSpec, ServiceStatus,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    const NAMESPACE: &str = "sso";

    fn meta(name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..Default::default()
        }
    }

    fn config_map(name: &str, entries: &[(&str, &str)]) -> ConfigMap {
        ConfigMap {
            metadata: meta(name),
            data: Some(
                entries
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect::<BTreeMap<_, _>>(),
            ),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_if_absent_keeps_existing() {
        let cluster = InMemoryCluster::new();
        cluster
            .config_maps
            .insert(config_map("settings", &[("key", "original")]))
            .unwrap();

        let stored = cluster
            .config_maps()
            .create_if_absent(&config_map("settings", &[("key", "new")]))
            .await
            .unwrap();

        assert_eq!(stored.data.unwrap()["key"], "original");
    }

    #[tokio::test]
    async fn test_patch_merges_maps() {
        let cluster = InMemoryCluster::new();
        cluster
            .config_maps
            .insert(config_map("settings", &[("a", "1"), ("b", "2")]))
            .unwrap();

        cluster
            .config_maps()
            .create_or_patch(&config_map("settings", &[("b", "3"), ("c", "4")]))
            .await
            .unwrap();

        let data = cluster.config_maps.get(NAMESPACE, "settings").unwrap().data.unwrap();
        assert_eq!(data["a"], "1");
        assert_eq!(data["b"], "3");
        assert_eq!(data["c"], "4");
    }

    #[tokio::test]
    async fn test_replace_keeps_status() {
        let cluster = InMemoryCluster::new();
        cluster
            .services
            .insert(Service {
                metadata: meta("svc"),
                status: Some(ServiceStatus::default()),
                ..Default::default()
            })
            .unwrap();

        let replaced = cluster
            .services()
            .create_or_replace(&Service {
                metadata: meta("svc"),
                spec: Some(ServiceSpec {
                    type_: Some("ClusterIP".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(replaced.status.is_some());
        assert_eq!(
            replaced.spec.unwrap().type_.as_deref(),
            Some("ClusterIP")
        );
    }

    #[tokio::test]
    async fn test_missing_namespace_is_rejected() {
        let cluster = InMemoryCluster::new();
        let nameless = ConfigMap {
            metadata: ObjectMeta {
                name: Some("orphan".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let err = cluster
            .config_maps()
            .create_if_absent(&nameless)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("metadata.namespace"));
    }

    #[tokio::test]
    async fn test_pod_outcome() {
        let cluster = InMemoryCluster::new();
        let pod = Pod {
            metadata: meta("job"),
            spec: Some(PodSpec {
                init_containers: Some(vec![Container {
                    name: "init".to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        };
        cluster.pods().create_if_absent(&pod).await.unwrap();
        cluster.pods.set_behavior(PodBehavior::Failed(3));

        let completed = cluster
            .pods()
            .wait_for_completion(NAMESPACE, "job")
            .await
            .unwrap();

        let status = completed.status.unwrap();
        assert_eq!(status.phase.as_deref(), Some("Failed"));
        let exit_code = status.init_container_statuses.unwrap()[0]
            .state
            .as_ref()
            .and_then(|s| s.terminated.as_ref())
            .map(|t| t.exit_code);
        assert_eq!(exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_calls_are_recorded_in_order() {
        let cluster = InMemoryCluster::new();
        cluster
            .config_maps()
            .create_or_replace(&config_map("a", &[]))
            .await
            .unwrap();
        cluster.config_maps().load(NAMESPACE, "a").await.unwrap();
        cluster.config_maps().delete(NAMESPACE, "a").await.unwrap();

        let operations: Vec<_> = cluster.calls().iter().map(|c| c.operation).collect();
        assert_eq!(operations, vec!["create_or_replace", "load", "delete"]);
        assert_eq!(cluster.count_calls("load", "ConfigMap", "a"), 1);
        assert!(cluster.config_maps.get(NAMESPACE, "a").is_none());
    }

    #[tokio::test]
    async fn test_injected_error_is_scoped_to_kind_and_operation() {
        let cluster = InMemoryCluster::new();
        cluster.config_maps.fail("create_or_replace", Fault::Error);

        let err = cluster
            .config_maps
            .create_or_replace(&config_map("a", &[]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ConfigMap sso/a"));
        assert!(cluster.config_maps.get(NAMESPACE, "a").is_none());
        assert_eq!(cluster.count_calls("create_or_replace", "ConfigMap", "a"), 1);

        cluster
            .config_maps
            .create_if_absent(&config_map("a", &[]))
            .await
            .unwrap();
        assert!(cluster.services.load(NAMESPACE, "a").await.unwrap().is_none());

        cluster.config_maps.heal();
        cluster
            .config_maps
            .create_or_replace(&config_map("a", &[("k", "v")]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_injected_hang_never_resolves() {
        let cluster = InMemoryCluster::new();
        cluster.pods.fail("delete", Fault::Hang);

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            cluster.pods().delete(NAMESPACE, "job"),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(cluster.count_calls("delete", "Pod", "job"), 1);
    }
}
