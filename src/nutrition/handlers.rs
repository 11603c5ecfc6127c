use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::Value;
use tracing::instrument;

use super::dto::{BalanceQuery, DailyBalance, GoalDraft, NutritionGoal};
use super::services;
use crate::{auth::jwt::AuthUser, error::AppError, state::AppState};

pub fn goal_routes() -> Router<AppState> {
    Router::new()
        .route("/nutrition-goals", post(create_goal))
        .route("/nutrition-goals/derive", post(derive_goal))
        .route("/nutrition-goals/subject/:subject_id", patch(update_goal))
}

pub fn balance_routes() -> Router<AppState> {
    Router::new().route(
        "/nutrition-goals/subject/:subject_id/daily-balance",
        get(daily_balance),
    )
}

/// POST /nutrition-goals
#[instrument(skip(state, body))]
pub async fn create_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<Value>,
) -> Result<(StatusCode, HeaderMap, Json<NutritionGoal>), AppError> {
    let goal = services::create_goal(&state, &body).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/v1/nutrition-goals/{}", goal.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(goal)))
}

/// POST /nutrition-goals/derive: normalized and derived, nothing stored.
#[instrument(skip(body))]
pub async fn derive_goal(
    AuthUser(user_id): AuthUser,
    Json(body): Json<Value>,
) -> Result<Json<GoalDraft>, AppError> {
    services::compute_goal(&body).map(Json)
}

/// PATCH /nutrition-goals/subject/:subject_id
#[instrument(skip(state, body))]
pub async fn update_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(subject_id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<NutritionGoal>, AppError> {
    services::update_goal(&state, subject_id, &body)
        .await
        .map(Json)
}

/// GET /nutrition-goals/subject/:subject_id/daily-balance?date=YYYY-MM-DD
#[instrument(skip(state))]
pub async fn daily_balance(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(subject_id): Path<i64>,
    Query(q): Query<BalanceQuery>,
) -> Result<Json<DailyBalance>, AppError> {
    services::compute_daily_balance(&state, subject_id, q.date.as_deref())
        .await
        .map(Json)
}
