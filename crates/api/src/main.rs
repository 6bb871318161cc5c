use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tyria_api::config::ServerConfig;
use tyria_api::router::build_app_router;
use tyria_api::state::AppState;
use tyria_events::{ChatPlatform, DiscordRest};
use tyria_gateway::Gateway;
use tyria_pipeline::{PgCatalogSink, Rebuilder, ServiceStatus};
use tyria_worker::{Fleet, WorkerContext};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tyria_api=debug,tyria_worker=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        gw2_api = %config.gw2_api_base,
        owner_configured = config.owner_user_id.is_some(),
        dpsreport_configured = config.dpsreport_token.is_some(),
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = tyria_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    tyria_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    tyria_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Outbound clients ---
    let gateway = Gateway::new(config.gateway_config()).expect("Failed to build API gateway client");
    let chat: Arc<dyn ChatPlatform> =
        Arc::new(DiscordRest::new(config.discord_config()).expect("Failed to build chat client"));

    // --- Rebuild pipeline ---
    let rebuilder = Arc::new(Rebuilder::new(
        Arc::new(gateway.clone()),
        Arc::new(PgCatalogSink::new(pool.clone())),
        ServiceStatus::new(),
    ));

    // --- Synchronizer fleet ---
    let worker_ctx = WorkerContext::new(
        pool.clone(),
        gateway.clone(),
        Arc::clone(&chat),
        Arc::clone(&rebuilder),
        config.worker_config(),
    );
    let fleet = Fleet::start(&worker_ctx, CancellationToken::new());

    // --- App state ---
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        gateway,
        chat,
        rebuilder,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    fleet
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await;

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
