use crate::db::{self, NewResponse, QuestionnaireResponse};
use crate::domain::questionnaire::{
    question_count, AnswerSet, Progress, Question, QuestionnaireForm, Step, WizardAction, QUESTIONNAIRE,
};
use crate::domain::risk::{assess, RiskAssessment};
use crate::domain::weekly_plan::generate_plan;
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const FALLBACK_UV_INDEX: f64 = 5.0;
const DEFAULT_LIST_LIMIT: i64 = 20;
const MAX_LIST_LIMIT: i64 = 100;

#[derive(Serialize)]
pub struct QuestionnaireView {
    pub count: usize,
    pub questions: &'static [Question],
}

#[derive(Deserialize)]
pub struct ProgressRequest {
    #[serde(default)]
    pub progress: Option<Progress>,
    pub action: WizardAction,
    #[serde(default)]
    pub option: Option<usize>,
}

#[derive(Serialize)]
pub struct ProgressResponse {
    pub progress: Progress,
    pub step: Step,
    pub question: Option<&'static Question>,
    pub answered: usize,
    pub complete: bool,
    pub assessment: Option<RiskAssessment>,
}

#[derive(Deserialize)]
pub struct ScoreRequest {
    pub answers: Vec<Option<usize>>,
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub answers: Option<Vec<Option<usize>>>,
    #[serde(flatten)]
    pub form: QuestionnaireForm,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub uv_index: Option<f64>,
    #[serde(default)]
    pub user_uuid: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub user_uuid: Uuid,
    pub limit: Option<i64>,
}

impl ListQuery {
    pub fn clamped_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(questions))
        .route("/progress", post(progress))
        .route("/score", post(score))
        .route("/submit", post(submit))
        .route("/responses", get(list_responses))
        .route("/responses/:id", get(get_response))
        .with_state(state)
}

async fn questions() -> Json<QuestionnaireView> {
    Json(QuestionnaireView {
        count: question_count(),
        questions: QUESTIONNAIRE,
    })
}

async fn progress(
    State(state): State<SharedState>,
    Json(req): Json<ProgressRequest>,
) -> Result<Json<ProgressResponse>, AppError> {
    let mut progress = req.progress.unwrap_or_else(Progress::start);
    let step = progress.step(req.action, req.option)?;

    let (question, assessment) = match step {
        Step::Question(_) => (Some(progress.current()), None),
        Step::Finished => {
            let score = progress.answers.score();
            let assessment = RiskAssessment {
                score,
                classification: state.config.classifier.classify(score),
            };
            (None, Some(assessment))
        }
    };

    Ok(Json(ProgressResponse {
        answered: progress.answers.answered_count(),
        complete: progress.answers.is_complete(),
        progress,
        step,
        question,
        assessment,
    }))
}

async fn score(
    State(state): State<SharedState>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<RiskAssessment>, AppError> {
    Ok(Json(assess(&req.answers, state.config.classifier)?))
}

async fn submit(
    State(state): State<SharedState>,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<QuestionnaireResponse>), AppError> {
    let new = prepare_submission(&state, req).await?;
    let stored = db::insert_response(&state.pool, &new).await?;
    tracing::info!(
        id = %stored.id,
        score = stored.risk_score,
        result = %stored.result,
        "questionnaire response stored"
    );
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Scores the answers and builds the weekly plan snapshot to persist.
pub async fn prepare_submission(state: &SharedState, req: SubmitRequest) -> Result<NewResponse, AppError> {
    let answers_given = req.answers.is_some();
    let answers = match req.answers {
        Some(slots) => AnswerSet::from_slots(slots)?,
        None => AnswerSet::from_form(&req.form),
    };

    let city = req
        .city
        .or(if answers_given { req.form.location } else { None })
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| state.config.default_city.clone());

    let uv_index = match req.uv_index {
        Some(uv) => uv,
        None => match state.weather.current_for_city(&city).await {
            Ok(weather) => weather.uv_index,
            Err(e) => {
                tracing::warn!(%city, error = %e, "weather lookup failed, using fallback UV");
                FALLBACK_UV_INDEX
            }
        },
    };

    let assessment = assess(answers.slots(), state.config.classifier)?;
    let plan = generate_plan(assessment.classification, uv_index, answers.eats_vitd_foods());

    Ok(NewResponse {
        user_uuid: req.user_uuid,
        answers: serde_json::to_value(&answers).map_err(anyhow::Error::from)?,
        location: city,
        risk_score: assessment.score,
        result: assessment.classification.to_string(),
        uv_index,
        weekly_plan: serde_json::to_value(&plan).map_err(anyhow::Error::from)?,
    })
}

async fn get_response(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionnaireResponse>, AppError> {
    db::get_response(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("response {id} not found")))
}

async fn list_responses(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<QuestionnaireResponse>>, AppError> {
    let responses =
        db::list_responses_for_user(&state.pool, query.user_uuid, query.clamped_limit()).await?;
    Ok(Json(responses))
}
