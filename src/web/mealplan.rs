use crate::domain::meal_plan::{
    extract_items, extract_items_from_text, normalize, MealItem, MealPreferences, MealSummary,
};
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Serialize)]
pub struct MealPlanResponse {
    pub success: bool,
    pub items: Vec<MealItem>,
    pub summary: MealSummary,
    pub preferences: Value,
}

/// Model output produced elsewhere: a bare `items` list, a full payload, or raw text.
#[derive(Deserialize)]
pub struct NormalizeRequest {
    #[serde(default)]
    pub items: Option<Vec<Value>>,
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub preferences: Value,
}

#[derive(Deserialize)]
pub struct PhotoQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub diet: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/generate", post(generate))
        .route("/normalize", post(normalize_items))
        .route("/photo", get(photo))
        .with_state(state)
}

async fn generate(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<MealPlanResponse>, AppError> {
    let model = state
        .meal_model
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("meal model not configured".into()))?;

    let prefs = MealPreferences::from_json(&body);
    let payload = model
        .suggest(&prefs)
        .await
        .map_err(|e| AppError::Upstream(format!("meal model: {e}")))?;

    let raw = extract_items(&payload);
    tracing::debug!(raw_items = raw.len(), "meal model answered");
    Ok(Json(respond(&state, &raw, &prefs, body)))
}

async fn normalize_items(
    State(state): State<SharedState>,
    Json(req): Json<NormalizeRequest>,
) -> Result<Json<MealPlanResponse>, AppError> {
    let raw = match (req.items, req.payload, req.text) {
        (Some(items), _, _) => items,
        (None, Some(payload), _) => extract_items(&payload),
        (None, None, Some(text)) => extract_items_from_text(&text),
        (None, None, None) => {
            return Err(AppError::BadRequest(
                "one of items, payload or text is required".into(),
            ))
        }
    };
    let prefs = MealPreferences::from_json(&req.preferences);
    Ok(Json(respond(&state, &raw, &prefs, req.preferences)))
}

fn respond(state: &SharedState, raw: &[Value], prefs: &MealPreferences, echo: Value) -> MealPlanResponse {
    let plan = normalize(raw, prefs, state.config.normalizer);
    MealPlanResponse {
        success: true,
        items: plan.items,
        summary: plan.summary,
        preferences: echo,
    }
}

async fn photo(State(state): State<SharedState>, Query(query): Query<PhotoQuery>) -> Json<Value> {
    let url = state.photos.search(&query.q, &query.diet).await;
    Json(json!({ "url": url }))
}
