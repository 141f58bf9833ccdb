use cinema_server::{build_router, ServerConfig};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let server_config = ServerConfig::from_env();

    // Database connection
    let db_config = cinema_db::DatabaseConfig::from_env();
    tracing::info!("connecting to database...");
    let db = cinema_db::connect(&db_config)
        .await
        .expect("failed to connect to database");

    if server_config.run_migrations {
        tracing::info!("running database migrations...");
        cinema_migration::Migrator::up(&db, None)
            .await
            .expect("failed to run migrations");
        tracing::info!("migrations complete");
    } else {
        tracing::info!("DB_RUN_MIGRATIONS=false, assuming schema is in place");
    }

    let state = Arc::new(cinema_db::AppState { db });
    let app = build_router(state, &server_config);

    let addr = server_config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));
    tracing::info!(%addr, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl-C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
