use crate::domain::sun::{ExposureRecommendation, SkinType, UvLevel};
use crate::error::AppError;
use crate::services::weather::{current_or_default, Weather};
use crate::state::SharedState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
}

#[derive(Deserialize)]
pub struct RecommendationQuery {
    pub skin_type: Option<String>,
}

#[derive(Serialize)]
pub struct WeatherView {
    #[serde(flatten)]
    pub weather: Weather,
    pub uv_level: UvLevel,
    pub is_good_conditions: bool,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/weather", get(weather))
        .route("/skin-types", get(skin_types))
        .route("/recommendation", get(recommendation))
        .with_state(state)
}

async fn weather(
    State(state): State<SharedState>,
    Query(query): Query<WeatherQuery>,
) -> Json<WeatherView> {
    let city = query
        .city
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(&state.config.default_city);
    let weather = current_or_default(state.weather.as_ref(), city).await;
    Json(WeatherView {
        uv_level: weather.uv_level(),
        is_good_conditions: weather.is_good_conditions(),
        weather,
    })
}

async fn skin_types() -> Json<Vec<ExposureRecommendation>> {
    Json(SkinType::ALL.iter().map(SkinType::recommendation).collect())
}

async fn recommendation(
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<ExposureRecommendation>, AppError> {
    let raw = query
        .skin_type
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("skin_type is required".into()))?;
    let skin_type = SkinType::try_from(raw.as_str())
        .map_err(|_| AppError::NotFound(format!("unknown skin type {raw:?}")))?;
    tracing::debug!(skin_type = skin_type.code(), "exposure recommendation");
    Ok(Json(skin_type.recommendation()))
}
