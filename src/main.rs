// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use futures::StreamExt;
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{ConfigMap, PersistentVolumeClaim, Pod, Secret, Service},
    networking::v1::Ingress,
};
use keycloak_operator::{
    cluster::kube_client::KubeCluster,
    config::{OperatorArgs, OperatorConfig},
    constants::{
        ERROR_REQUEUE_DURATION_SECS, REQUEUE_WHEN_NOT_READY_SECS, REQUEUE_WHEN_READY_SECS,
        TOKIO_WORKER_THREADS,
    },
    context::Context,
    crd::KeycloakServer,
    metrics::{serve_metrics, Metrics},
    reconcilers::{failure_reason, reconcile_keycloakserver, status::is_ready},
    status_reasons::REASON_RECONCILE_FAILED,
};
use kube::{
    runtime::{
        controller::Action, metadata_watcher, predicates, reflector, watcher,
        watcher::Config, Controller, PredicateConfig, WatchStreamExt,
    },
    Api, Client, CustomResourceExt, Resource, ResourceExt,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

/// Kubernetes operator for Keycloak / SSO servers.
#[derive(Debug, Parser)]
#[command(name = "keycloak-operator", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    operator: OperatorArgs,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the controller (default)
    Run,
    /// Print the KeycloakServer CRD as YAML
    Crd,
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Crd) => {
            print!("{}", serde_yaml::to_string(&KeycloakServer::crd())?);
            Ok(())
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "keycloak-operator",
                &mut std::io::stdout(),
            );
            Ok(())
        }
        Some(Commands::Run) | None => {
            // Invalid configuration is fatal before anything touches the cluster
            let config = OperatorConfig::try_from(&cli.operator)?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(TOKIO_WORKER_THREADS)
                .thread_name("keycloak-controller")
                .enable_all()
                .build()?;

            runtime.block_on(async_main(config, cli.operator))
        }
    }
}

fn init_logging() {
    // Respects RUST_LOG (default: info) and RUST_LOG_FORMAT (json or text)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(config: OperatorConfig, args: OperatorArgs) -> Result<()> {
    init_logging();

    info!("Starting Keycloak operator");
    debug!(
        "Flavor: {}, controller namespace: {}",
        config.flavor, config.controller_namespace
    );

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let metrics = Metrics::new()?;
    let cluster = Arc::new(KubeCluster::new(client.clone()));
    let ctx = Arc::new(Context::new(cluster, config, metrics.clone()));

    let watch_namespace = args.watch_namespace.as_deref();
    match watch_namespace {
        Some(ns) => info!("Watching KeycloakServers in namespace {}", ns),
        None => info!("Watching KeycloakServers in all namespaces"),
    }

    tokio::select! {
        result = run_keycloakserver_controller(client, watch_namespace, ctx) => {
            error!("CRITICAL: KeycloakServer controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("KeycloakServer controller exited unexpectedly without error")
        }
        result = serve_metrics(metrics, args.metrics_port) => {
            error!("CRITICAL: metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Metrics server exited unexpectedly without error")
        }
        result = shutdown_signal() => {
            result?;
            info!("Graceful shutdown completed successfully");
            Ok(())
        }
    }
}

/// Resolves on SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM (pod termination), initiating graceful shutdown...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C, initiating graceful shutdown...");
    }
    Ok(())
}

fn scoped_api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    K::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

/// Run the `KeycloakServer` controller
///
/// Status-only updates of a `KeycloakServer` are filtered out by the generation
/// predicate, otherwise every status write would schedule another pass.
///
/// The controller queue keeps passes of one owner sequential within this
/// process only. There is no leader election, so run a single replica with the
/// `Recreate` strategy.
async fn run_keycloakserver_controller(
    client: Client,
    namespace: Option<&str>,
    ctx: Arc<Context>,
) -> Result<()> {
    info!("Starting KeycloakServer controller");

    let api = scoped_api::<KeycloakServer>(&client, namespace);
    let (reader, writer) = reflector::store();
    let servers = reflector(writer, watcher(api, Config::default()))
        .default_backoff()
        .applied_objects()
        .predicate_filter(predicates::generation, PredicateConfig::default());

    let owned = Config::default();
    Controller::for_stream(servers, reader)
        .owns(scoped_api::<Deployment>(&client, namespace), owned.clone())
        .owns(scoped_api::<Pod>(&client, namespace), owned.clone())
        .owns_stream(
            metadata_watcher(scoped_api::<Secret>(&client, namespace), owned.clone())
                .touched_objects(),
        )
        .owns_stream(
            metadata_watcher(scoped_api::<Service>(&client, namespace), owned.clone())
                .touched_objects(),
        )
        .owns_stream(
            metadata_watcher(
                scoped_api::<PersistentVolumeClaim>(&client, namespace),
                owned.clone(),
            )
            .touched_objects(),
        )
        .owns_stream(
            metadata_watcher(scoped_api::<Ingress>(&client, namespace), owned.clone())
                .touched_objects(),
        )
        .owns_stream(
            metadata_watcher(scoped_api::<ConfigMap>(&client, namespace), owned)
                .touched_objects(),
        )
        .run(reconcile_keycloakserver_wrapper, error_policy, ctx)
        .for_each(|result| async move {
            if let Err(e) = result {
                debug!("KeycloakServer controller event error: {}", e);
            }
        })
        .await;

    Ok(())
}

/// Requeue interval after a pass, depending on whether the server ended Ready.
fn requeue_after(ready: bool) -> Duration {
    if ready {
        Duration::from_secs(REQUEUE_WHEN_READY_SECS)
    } else {
        Duration::from_secs(REQUEUE_WHEN_NOT_READY_SECS)
    }
}

/// Wrapper function for `KeycloakServer` reconciliation
async fn reconcile_keycloakserver_wrapper(
    server: Arc<KeycloakServer>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();
    let name = server.name_any();
    let namespace = server.namespace().unwrap_or_default();
    info!("Reconciling KeycloakServer: {}/{}", namespace, name);

    match reconcile_keycloakserver(ctx.clone(), (*server).clone()).await {
        Ok(()) => {
            ctx.metrics.record_reconciliation_success(start.elapsed());
            info!("Successfully reconciled KeycloakServer: {}/{}", namespace, name);
            let ready = match ctx.cluster.keycloak_servers().load(&namespace, &name).await {
                Ok(Some(current)) => current
                    .status
                    .as_ref()
                    .is_some_and(|status| is_ready(&status.conditions)),
                Ok(None) => false,
                Err(e) => {
                    debug!("Could not read back KeycloakServer {}/{}: {}", namespace, name, e);
                    false
                }
            };
            Ok(Action::requeue(requeue_after(ready)))
        }
        Err(e) => {
            let reason = failure_reason(&e);
            ctx.metrics.record_reconciliation_error(start.elapsed(), reason);
            if reason == REASON_RECONCILE_FAILED {
                error!("Failed to reconcile KeycloakServer {}/{}: {:#}", namespace, name, e);
            } else {
                warn!(
                    "Reconciliation of KeycloakServer {}/{} stopped ({}): {:#}",
                    namespace, name, reason, e
                );
            }
            Err(e.into())
        }
    }
}

/// Error policy for the `KeycloakServer` controller
fn error_policy(
    _resource: Arc<KeycloakServer>,
    _err: &ReconcileError,
    _ctx: Arc<Context>,
) -> Action {
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}
