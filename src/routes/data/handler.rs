use std::time::Duration;

use axum::{Json, extract::State};

use crate::{AppState, cache::CacheStore, error::AppError};

use super::model::{DATA_CACHE_KEY, DataResponse, FreshData, Source};

pub async fn get_data(State(state): State<AppState>) -> Result<Json<DataResponse>, AppError> {
    let (data, source) =
        resolve(state.cache.as_ref(), DATA_CACHE_KEY, state.config.cache_ttl()).await?;
    Ok(Json(DataResponse { data, source }))
}

/// Cache-aside lookup: serve from the store when a live entry exists,
/// otherwise generate fresh data and populate the store with a TTL.
async fn resolve(
    store: &dyn CacheStore,
    key: &str,
    ttl: Duration,
) -> Result<(FreshData, Source), AppError> {
    if let Some(cached) = store.get(key).await? {
        match serde_json::from_str(&cached) {
            Ok(data) => return Ok((data, Source::Cache)),
            // A corrupt entry counts as a miss and gets overwritten below
            Err(e) => tracing::warn!("Discarding undecodable cache entry {}: {}", key, e),
        }
    }

    let fresh = FreshData::generate();
    let json = serde_json::to_string(&fresh).map_err(|e| {
        tracing::error!("Failed to serialize fresh data: {}", e);
        AppError::OriginFailure
    })?;
    store.set_ex(key, &json, ttl).await?;

    Ok((fresh, Source::Api))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::cache::MemoryStore;
    use crate::config::Config;
    use crate::middleware::RateLimiter;

    fn test_config() -> Config {
        Config {
            redis_url: "redis://127.0.0.1/".to_string(),
            server_host: "::".to_string(),
            server_port: 3000,
            rate_limit_window_secs: 60,
            rate_limit_requests: 5,
            cache_ttl_secs: 60,
            cache_timeout_ms: 2000,
        }
    }

    #[tokio::test]
    async fn miss_populates_then_hit_serves_from_cache() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);

        let (first, source) = resolve(&store, DATA_CACHE_KEY, ttl).await.unwrap();
        assert_eq!(source, Source::Api);

        let (second, source) = resolve(&store, DATA_CACHE_KEY, ttl).await.unwrap();
        assert_eq!(source, Source::Cache);
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn expired_entry_is_regenerated() {
        let store = MemoryStore::new();
        let ttl = Duration::from_millis(20);

        let (_, source) = resolve(&store, DATA_CACHE_KEY, ttl).await.unwrap();
        assert_eq!(source, Source::Api);

        tokio::time::sleep(Duration::from_millis(40)).await;

        let (_, source) = resolve(&store, DATA_CACHE_KEY, ttl).await.unwrap();
        assert_eq!(source, Source::Api);
    }

    #[tokio::test]
    async fn corrupt_entry_is_treated_as_miss() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);
        store
            .set_ex(DATA_CACHE_KEY, "not json", ttl)
            .await
            .unwrap();

        let (data, source) = resolve(&store, DATA_CACHE_KEY, ttl).await.unwrap();
        assert_eq!(source, Source::Api);
        assert_eq!(data, FreshData::generate());
    }

    struct DownStore;

    #[async_trait]
    impl CacheStore for DownStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, AppError> {
            Err(AppError::CacheUnavailable)
        }

        async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), AppError> {
            Err(AppError::CacheUnavailable)
        }
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_cache_unavailable() {
        let err = resolve(&DownStore, DATA_CACHE_KEY, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert_eq!(err, AppError::CacheUnavailable);
    }

    fn test_app(config: Config) -> axum::Router {
        let state = crate::AppState {
            cache: Arc::new(MemoryStore::new()),
            config: config.clone(),
        };
        let limiter = Arc::new(RateLimiter::new(&config));
        crate::app(state, limiter)
    }

    async fn get_json(app: &axum::Router, ip: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/data")
                    .header("x-real-ip", ip)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn get_data_reports_api_then_cache() {
        let app = test_app(test_config());

        let (status, body) = get_json(&app, "10.0.0.1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["message"], "Hello, fresh data!");
        assert_eq!(body["source"], "API");

        let (status, body) = get_json(&app, "10.0.0.1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["message"], "Hello, fresh data!");
        assert_eq!(body["source"], "cache");
    }

    #[tokio::test]
    async fn sixth_request_gets_429() {
        let app = test_app(test_config());

        for _ in 0..5 {
            let (status, _) = get_json(&app, "10.0.0.2").await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = get_json(&app, "10.0.0.2").await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Too many requests, please try again later.");

        // A different client is unaffected
        let (status, _) = get_json(&app, "10.0.0.3").await;
        assert_eq!(status, StatusCode::OK);
    }
}
