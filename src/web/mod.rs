pub mod mealplan;
pub mod questionnaire;
pub mod sun;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/questionnaire", questionnaire::router(state.clone()))
        .nest("/sun", sun::router(state.clone()))
        .nest("/mealplan", mealplan::router(state))
}
