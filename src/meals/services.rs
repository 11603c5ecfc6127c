use tracing::info;

use super::dto::{MealLogCreated, MealLogRequest};
use crate::error::AppError;
use crate::nutrition::dates;
use crate::state::AppState;

/// Validates a meal entry and appends it to the subject's meal log.
pub async fn add_meal_log(
    st: &AppState,
    subject_id: i64,
    meal: MealLogRequest,
) -> Result<MealLogCreated, AppError> {
    if meal.datetime.trim().is_empty() {
        return Err(AppError::validation("datetime is required"));
    }
    let day = dates::normalize(Some(meal.datetime.as_str()))?;
    if meal.calories.is_some_and(|c| !c.is_finite() || c < 0.0) {
        return Err(AppError::validation("calories must be a non-negative number"));
    }

    let record = serde_json::to_value(&meal).map_err(anyhow::Error::from)?;
    st.meal_logs.append_meal_record(subject_id, record).await?;
    info!(subject_id, %day, items = meal.items.len(), "meal log added");

    Ok(MealLogCreated {
        subject_id,
        day,
        meal,
    })
}
