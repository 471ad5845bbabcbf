use reminders::api::router;
use reminders::config::ServerConfig;
use reminders::db;
use reminders::services::DeliveryScheduler;
use reminders::state::AppState;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "reminders=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::new_from_env()?;
    let pool = db::connect(&config.database_url, 5).await?;
    let notifier = config.notifier()?;

    if config.delivery_interval_secs > 0 {
        let scheduler = DeliveryScheduler::new(pool.clone(), notifier.clone(), config.delivery_interval_secs);
        tokio::spawn(scheduler.start());
    } else {
        info!("delivery scheduler disabled");
    }

    let state = AppState { db: pool.clone(), notifier };
    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
