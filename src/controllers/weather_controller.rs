use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::ApiError;
use crate::models::weather::WeatherPayload;
use crate::shared_state::AppState;

/// Coordinates are kept as the raw strings the client sent; they double as the
/// cache key.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WeatherQuery {
    /// Latitude, e.g. "6.9271"
    pub latitude: Option<String>,
    /// Longitude, e.g. "79.8612"
    pub longitude: Option<String>,
}

/// GET /api/weather
/// Current weather and solar outlook for a location
///
/// Returns current conditions, a solar production assessment and the next 24
/// hours of cloud cover and direct radiation. Responses are cached per
/// coordinate pair for one hour; cached responses carry `cached: true`.
#[utoipa::path(
    get,
    path = "/api/weather",
    params(WeatherQuery),
    responses(
        (status = 200, description = "Weather with solar assessment", body = WeatherPayload),
        (status = 400, description = "Latitude or longitude missing", body = crate::models::weather::ErrorBody),
        (status = 500, description = "Upstream or internal failure", body = crate::models::weather::ErrorBody)
    )
)]
pub async fn get_weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherPayload>, ApiError> {
    let payload = state
        .weather
        .get_weather(query.latitude.as_deref(), query.longitude.as_deref())
        .await?;
    Ok(Json(payload))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::routes::api_routes::api_routes;
    use crate::services::record_store::SqliteRecordRepository;
    use crate::services::weather_cache::{InMemoryWeatherCache, SystemClock, DEFAULT_TTL_SECS};
    use crate::services::weather_service::test_support::CountingProvider;
    use crate::services::weather_service::WeatherService;
    use crate::shared_state::AppState;

    fn app(provider: Arc<CountingProvider>) -> axum::Router {
        let clock = Arc::new(SystemClock);
        let cache = Arc::new(InMemoryWeatherCache::new(DEFAULT_TTL_SECS, clock.clone()));
        let records = Arc::new(SqliteRecordRepository::open_in_memory().unwrap());
        api_routes(AppState::new(WeatherService::new(provider, cache, clock), records))
    }

    async fn call(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_latitude_is_400_without_fetch() {
        let provider = Arc::new(CountingProvider::ok());
        let (status, body) = call(app(provider.clone()), "/weather?longitude=79.9").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Latitude and longitude are required");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_success_then_cached() {
        let provider = Arc::new(CountingProvider::ok());
        let router = app(provider.clone());

        let (status, body) = call(router.clone(), "/weather?latitude=6.9&longitude=79.9").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timezone"], "Asia/Colombo");
        assert_eq!(body["solar"]["condition"], "GOOD");
        assert_eq!(body["hourly"]["cloudCover"].as_array().unwrap().len(), 24);
        assert!(body.get("cached").is_none());

        let (status, body) = call(router, "/weather?latitude=6.9&longitude=79.9").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cached"], true);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_500_with_message() {
        let provider = Arc::new(CountingProvider::failing("Too Many Requests"));
        let (status, body) = call(app(provider), "/weather?latitude=6.9&longitude=79.9").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch weather data");
        assert_eq!(body["message"], "Open-Meteo API error: Too Many Requests");
    }
}
