use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, info};

use super::dto::{DailyBalance, GoalDraft, NutritionGoal};
use super::{aggregator, balance, dates, derivation, payload};
use crate::error::AppError;
use crate::state::AppState;

/// Normalizes a raw goal payload and fills in any missing targets.
pub fn compute_goal(raw: &Value) -> Result<GoalDraft, AppError> {
    let draft = payload::goal_draft(raw)?;
    derivation::derive(draft)
}

pub async fn create_goal(st: &AppState, raw: &Value) -> Result<NutritionGoal, AppError> {
    let draft = payload::goal_draft(raw)?;
    let subject_id = draft
        .subject_id
        .ok_or_else(|| AppError::validation("subjectId is required"))?;
    let goal = NutritionGoal::from_draft(subject_id, derivation::derive(draft)?);
    let stored = st.goals.insert(&goal).await?;
    info!(goal_id = %stored.id, subject_id, "nutrition goal created");
    Ok(stored)
}

/// Patches the subject's active goal.
///
/// Missing targets are re-derived only when a reference weight is known
/// after the merge; otherwise they stay empty instead of failing the patch.
pub async fn update_goal(
    st: &AppState,
    subject_id: i64,
    raw: &Value,
) -> Result<NutritionGoal, AppError> {
    let patch = payload::goal_draft(raw)?;
    if patch.is_empty_patch() {
        return Err(AppError::validation("no fields to update"));
    }

    let mut goal = st
        .goals
        .fetch_active_goal(subject_id)
        .await?
        .ok_or_else(|| goal_not_found(subject_id))?;
    goal.merge(patch);

    if goal.target_weight.is_some() {
        let derived = derivation::derive(goal.to_draft())?;
        goal.apply_targets(&derived);
    } else {
        debug!(subject_id, "no reference weight; missing targets left unresolved");
    }
    goal.updated_at = OffsetDateTime::now_utc();

    let stored = st.goals.update(&goal).await?;
    info!(goal_id = %stored.id, subject_id, "nutrition goal updated");
    Ok(stored)
}

/// One day's intake against the subject's active goal.
pub async fn compute_daily_balance(
    st: &AppState,
    subject_id: i64,
    date: Option<&str>,
) -> Result<DailyBalance, AppError> {
    let day = dates::normalize(date)?;

    let goal = st
        .goals
        .fetch_active_goal(subject_id)
        .await?
        .ok_or_else(|| goal_not_found(subject_id))?;
    let raw_meals = st.meal_logs.fetch_meal_records(subject_id).await?;

    let totals = aggregator::sum_for_day(raw_meals.as_ref(), &day);
    debug!(subject_id, %day, ?totals, "meal totals aggregated");
    Ok(balance::reconcile(day, &totals, &goal))
}

fn goal_not_found(subject_id: i64) -> AppError {
    AppError::not_found(format!("nutrition goal for subject {subject_id} not found"))
}
