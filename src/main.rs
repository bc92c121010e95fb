use anyhow::Result;
use profile_publisher::{
    AppState, DraftStore, MemoryStorage, ProfileLifecycle, RateTier, RequestRateLimiter,
    SearchIndex, SessionAuthResolver, SnapshotEngine,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn tier_from_env(prefix: &str, fallback: RateTier) -> RateTier {
    let max_requests = std::env::var(format!("{prefix}_MAX_REQUESTS"))
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(fallback.max_requests);
    let window_secs = std::env::var(format!("{prefix}_WINDOW_SECS"))
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(fallback.window.as_secs());
    RateTier {
        window: Duration::from_secs(window_secs),
        max_requests,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,profile_publisher=debug"));
    fmt().with_env_filter(env_filter).with_target(true).init();

    let default_tier = tier_from_env("RATE_DEFAULT", RateTier::default_tier());
    let public_read_tier = tier_from_env("RATE_PUBLIC_READ", RateTier::public_read_tier());

    let storage = Arc::new(MemoryStorage::new());
    let search_index = Arc::new(SearchIndex::new());
    let snapshot_engine = Arc::new(SnapshotEngine::new(storage.clone(), search_index.clone()));

    let state = Arc::new(AppState {
        auth: Arc::new(SessionAuthResolver::new(storage.clone())),
        draft_store: DraftStore::new(storage.clone()),
        snapshot_engine: snapshot_engine.clone(),
        search_index: search_index.clone(),
        lifecycle: ProfileLifecycle::new(storage.clone(), snapshot_engine, search_index),
        rate_limiter: RequestRateLimiter::new(default_tier, public_read_tier),
    });

    let app = profile_publisher::router(state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let addr: SocketAddr = bind_addr.parse()?;

    println!("\nProfile Publisher starting");
    println!("Listening: http://{addr}");
    println!("\nRate tiers:");
    println!(
        "- default: {} requests / {}s",
        default_tier.max_requests,
        default_tier.window.as_secs()
    );
    println!(
        "- public read: {} requests / {}s",
        public_read_tier.max_requests,
        public_read_tier.window.as_secs()
    );

    // Handle shutdown signal
    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received, stopping server...");
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await?;

    info!("Clean shutdown complete");

    Ok(())
}
