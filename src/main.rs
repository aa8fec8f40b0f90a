mod config;
mod db;
mod domain;
mod error;
mod services;
mod state;
mod web;

use crate::config::AppConfig;
use crate::services::ai::{MealModel, OpenAiMealModel};
use crate::services::photos::PhotoSearch;
use crate::services::weather::OpenMeteoClient;
use crate::state::{AppState, SharedState};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(classifier = ?config.classifier, "Configuration loaded");

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to run database migrations: {}", e);
            e
        })?;
    tracing::info!("Database migrations completed");

    let meal_model = match &config.openai_api_key {
        Some(key) => {
            Some(Arc::new(OpenAiMealModel::new(key.clone(), config.openai_model.clone())) as Arc<dyn MealModel>)
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set, meal plan generation disabled");
            None
        }
    };
    if config.pexels_api_key.is_none() {
        tracing::warn!("PEXELS_API_KEY not set, photo search returns no results");
    }

    let shared: SharedState = Arc::new(AppState {
        pool,
        weather: Arc::new(OpenMeteoClient::new()?),
        meal_model,
        photos: Arc::new(PhotoSearch::new(config.pexels_api_key.clone())?),
        config: Arc::new(config),
    });

    let app = Router::new()
        .merge(web::routes(shared.clone()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = shared.config.bind_addr.clone();
    tracing::info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
