use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use data_service::{
    AppState,
    cache::RedisStore,
    config::Config,
    middleware::RateLimiter,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let redis_client =
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client");
    let store = RedisStore::new(redis_client, config.cache_timeout());
    match store.ping().await {
        Ok(()) => tracing::info!("Redis connected"),
        // The service still starts; requests fail with CacheUnavailable
        // until the backend comes back.
        Err(_) => tracing::warn!("Redis not reachable at startup"),
    }

    let state = AppState {
        cache: Arc::new(store),
        config: config.clone(),
    };

    let rate_limiter = Arc::new(RateLimiter::new(&config));

    let router = data_service::app(state, rate_limiter);

    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install ctrl-c handler");
    tracing::info!("Shutting down");
}
