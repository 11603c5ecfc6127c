use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::instrument;

use super::dto::{MealLogCreated, MealLogRequest};
use super::services::add_meal_log;
use crate::{auth::jwt::AuthUser, error::AppError, state::AppState};

pub fn write_routes() -> Router<AppState> {
    Router::new().route("/subjects/:subject_id/meal-logs", post(create_meal_log))
}

/// POST /subjects/:subject_id/meal-logs
#[instrument(skip(state, body))]
pub async fn create_meal_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(subject_id): Path<i64>,
    Json(body): Json<MealLogRequest>,
) -> Result<(StatusCode, Json<MealLogCreated>), AppError> {
    let created = add_meal_log(&state, subject_id, body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
