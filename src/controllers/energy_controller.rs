use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::ApiError;
use crate::models::energy::EnergyGenerationRecord;
use crate::shared_state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecordsQuery {
    /// Maximum number of records to return (all when omitted)
    pub limit: Option<u32>,
}

/// GET /api/energy-generation-records/solar-unit/{serial_number}
/// Generation history for one solar unit
///
/// Returns stored records for the unit, newest first.
#[utoipa::path(
    get,
    path = "/api/energy-generation-records/solar-unit/{serial_number}",
    params(
        ("serial_number" = String, Path, description = "Solar unit serial number"),
        RecordsQuery
    ),
    responses(
        (status = 200, description = "Records, newest first", body = Vec<EnergyGenerationRecord>),
        (status = 500, description = "Record store failure", body = crate::models::weather::ErrorBody)
    )
)]
pub async fn get_records_by_serial(
    Path(serial_number): Path<String>,
    Query(query): Query<RecordsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<EnergyGenerationRecord>>, ApiError> {
    let records = state.records.find_by_serial(&serial_number, query.limit)?;
    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use tower::ServiceExt;

    use crate::models::energy::EnergyGenerationRecord;
    use crate::routes::api_routes::api_routes;
    use crate::services::record_store::{RecordRepository, SqliteRecordRepository};
    use crate::services::weather_cache::{InMemoryWeatherCache, SystemClock, DEFAULT_TTL_SECS};
    use crate::services::weather_service::test_support::CountingProvider;
    use crate::services::weather_service::WeatherService;
    use crate::shared_state::AppState;

    #[tokio::test]
    async fn test_lists_records_newest_first() {
        let repo = Arc::new(SqliteRecordRepository::open_in_memory().unwrap());
        for (hour, wh) in [(8, 310), (10, 420), (12, 350)] {
            let ts = Utc.with_ymd_and_hms(2025, 8, 1, hour, 0, 0).unwrap();
            repo.insert(&EnergyGenerationRecord::new("SU-0001", ts, wh)).unwrap();
        }

        let clock = Arc::new(SystemClock);
        let cache = Arc::new(InMemoryWeatherCache::new(DEFAULT_TTL_SECS, clock.clone()));
        let weather = WeatherService::new(Arc::new(CountingProvider::ok()), cache, clock);
        let router = api_routes(AppState::new(weather, repo));

        let resp = router
            .oneshot(
                Request::builder()
                    .uri("/energy-generation-records/solar-unit/SU-0001?limit=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["energyGenerated"], 350);
        assert_eq!(rows[0]["serialNumber"], "SU-0001");
        assert_eq!(rows[1]["intervalHours"], 2);
    }
}
