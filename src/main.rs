use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use auto_ingress_operator::app_state::build_app_state;
use auto_ingress_operator::cli::{run_check_manifest, Cli, Command};
use auto_ingress_operator::config::OperatorConfig;
use auto_ingress_operator::controller::service_controller::{
    run_deletion_watcher, run_service_controller,
};
use auto_ingress_operator::core::client::kube_client::build_kube_client;
use auto_ingress_operator::core::state::runtime::ingress::ingress_runtime_state_manager::IngressRuntimeStateManager;
use auto_ingress_operator::core::state::runtime::ingress::ingress_runtime_state_repository::IngressRuntimeStateRepository;
use auto_ingress_operator::logging::init_tracing;
use auto_ingress_operator::routes::app_router;
use auto_ingress_operator::debug;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(Command::CheckManifest { file, annotation }) = &cli.command {
        return run_check_manifest(file, annotation);
    }

    let config = OperatorConfig::from_env()?;
    let _log_guard = init_tracing(config.log_dir.as_deref())?;

    let client = build_kube_client().await?;

    match cli.command.unwrap_or(Command::Run) {
        Command::DryRun => debug::run_debug(&client, &config).await,
        Command::Run if config.debug_mode => debug::run_debug(&client, &config).await,
        _ => run_operator(client, config).await,
    }
}

async fn run_operator(client: kube::Client, config: OperatorConfig) -> Result<()> {
    info!(
        "Starting auto-ingress-operator v{} (scope: {}, annotation: '{}', entrypoints: '{}')",
        env!("CARGO_PKG_VERSION"),
        config.watch_scope(),
        config.annotation_key,
        config.entrypoints
    );

    let ingress_state = Arc::new(IngressRuntimeStateManager::new(
        IngressRuntimeStateRepository::new().shared(),
    ));

    let app = app_router().with_state(build_app_state(&config, ingress_state.clone()));
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!("HTTP server listening on {}", config.http_addr);

    let server = async {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    };

    tokio::select! {
        result = run_service_controller(client.clone(), &config, ingress_state.clone()) => {
            info!("Service controller exited");
            result
        }
        result = run_deletion_watcher(client.clone(), &config, ingress_state.clone()) => {
            error!("Service deletion watcher exited unexpectedly");
            result
        }
        result = server => {
            info!("HTTP server stopped");
            result.map_err(Into::into)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
