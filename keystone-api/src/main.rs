use anyhow::Context;
use keystone_api::{
    app,
    metrics::Metrics,
    state::{AppState, AuthConfig},
    store_metrics::InstrumentedUserRepository,
};
use keystone_core::repository::UserRepository;
use keystone_order::OrderWorkflow;
use keystone_providers::ProviderFactory;
use keystone_store::{app_config::Config, DbClient, InMemoryUserRepository};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "keystone_api=debug,keystone_order=debug,keystone_providers=debug,tower_http=debug,axum::rejection=trace"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::debug!(?config, "Loaded configuration");
    tracing::info!("Starting Keystone API on port {}", config.server.port);

    let metrics = Arc::new(Metrics::new().context("Failed to register metrics")?);

    let store: Arc<dyn UserRepository> = match &config.database.url {
        Some(url) => {
            let db = DbClient::connect(url.expose(), &config.database)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            spawn_pool_gauge(db.clone(), metrics.clone());
            Arc::new(db.user_repository())
        }
        None => {
            tracing::warn!("No database url configured, using the in-memory user store");
            Arc::new(InMemoryUserRepository::new())
        }
    };
    let users: Arc<dyn UserRepository> =
        Arc::new(InstrumentedUserRepository::new(store, metrics.clone()));

    let factory = ProviderFactory::new(config.providers.clone());
    factory.validate().context("Invalid provider configuration")?;
    let payments = factory
        .create_payment_adapter()
        .context("Failed to create payment adapter")?;
    let notifications = factory
        .create_notification_adapter()
        .context("Failed to create notification adapter")?;

    let orders = Arc::new(OrderWorkflow::new(users.clone(), payments, notifications));
    let app_state = AppState::new(
        users,
        orders,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        &config.rate_limit,
        metrics,
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server host/port")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Refresh `database_connections_active` from the pool every few seconds.
fn spawn_pool_gauge(db: DbClient, metrics: Arc<Metrics>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(5));
        loop {
            ticker.tick().await;
            metrics.set_db_connections(db.active_connections());
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl-C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
