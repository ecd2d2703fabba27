//! Lead Scoring Server Entry Point

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use lead_scoring_config::{load_settings, ScoringConfig, Settings};
use lead_scoring_core::{ConversationStore, LeadStore, SystemClock};
use lead_scoring_engine::ScoringEngine;
use lead_scoring_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("LEAD_SCORING_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized
            eprintln!(
                "Loaded configuration from files (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        }
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&config);

    tracing::info!("Starting Lead Scoring Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_path = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    // An invalid scoring table is fatal; a missing one falls back to defaults
    let scoring_config = ScoringConfig::load_or_default(&config.scoring_config_path)?;
    tracing::info!(
        path = %config.scoring_config_path,
        threshold = scoring_config.qualification.threshold,
        "Scoring configuration loaded"
    );
    let engine = Arc::new(ScoringEngine::new(Arc::new(scoring_config)));

    if config.observability.metrics_enabled && init_metrics().is_some() {
        tracing::info!("Initialized Prometheus metrics at /metrics");
    }

    let state = if config.persistence.enabled {
        tracing::info!("Initializing ScyllaDB persistence layer...");
        match init_persistence(&config).await {
            Ok(persistence) => {
                tracing::info!(
                    hosts = ?config.persistence.scylla_hosts,
                    keyspace = %config.persistence.keyspace,
                    "ScyllaDB persistence initialized"
                );
                let leads: Arc<dyn LeadStore> = Arc::new(persistence.leads);
                let conversations: Arc<dyn ConversationStore> =
                    Arc::new(persistence.conversations);
                AppState::with_stores(
                    config.clone(),
                    engine,
                    leads,
                    conversations,
                    Arc::new(SystemClock),
                )
            }
            Err(e) => {
                tracing::error!(
                    "Failed to initialize ScyllaDB: {}. Falling back to in-memory.",
                    e
                );
                AppState::new(config.clone(), engine)
            }
        }
    } else {
        tracing::info!("Persistence disabled, using in-memory stores");
        AppState::new(config.clone(), engine)
    };
    let state = state.with_env(env);

    let app = create_router(state.clone());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            state.begin_shutdown();
        })
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!(
            "lead_scoring={level},lead_scoring_server={level},lead_scoring_engine={level},\
             lead_scoring_persistence={level},tower_http=debug"
        )
        .into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}

async fn init_persistence(
    config: &Settings,
) -> Result<lead_scoring_persistence::PersistenceLayer, lead_scoring_persistence::PersistenceError>
{
    let scylla_config = lead_scoring_persistence::ScyllaConfig {
        hosts: config.persistence.scylla_hosts.clone(),
        keyspace: config.persistence.keyspace.clone(),
        replication_factor: config.persistence.replication_factor,
    };

    lead_scoring_persistence::init(scylla_config).await
}
