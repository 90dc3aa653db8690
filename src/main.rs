use userhub::{
    config::ServiceConfig,
    db,
    services::{ConfirmationService, EventBus, EventLogSink},
    AppState,
};

use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "userhub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env();

    // Database connection
    let pool = db::create_pool().await?;

    // Run migrations
    db::run_migrations(&pool).await?;

    // Event bus with a logging consumer attached
    let event_bus = Arc::new(EventBus::new(config.event_bus_capacity));
    tokio::spawn(EventLogSink::run(event_bus.subscribe()));

    let (app_state, _renewal_worker) = AppState::build(pool, &config, event_bus.clone());

    if let Some(interval) = config.purge_interval {
        tokio::spawn(purge_expired_codes_periodically(
            app_state.confirmation_service.clone(),
            interval,
        ));
        tracing::info!(interval_secs = interval.as_secs(), "Expired code purge scheduled");
    }

    let app = userhub::app(app_state);

    // Start server
    let addr: SocketAddr = config.bind_address.parse()?;
    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn purge_expired_codes_periodically(service: Arc<ConfirmationService>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if let Err(e) = service.purge_expired_codes().await {
            tracing::warn!("Failed to purge expired confirmation codes: {}", e);
        }
    }
}
