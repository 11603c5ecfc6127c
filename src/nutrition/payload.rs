//! Typed reading of raw JSON values once aliases are resolved.

use serde_json::{Map, Value};

use super::aliases::{normalize, Canonical, GoalField, GOAL_ALIASES};
use super::dates;
use super::dto::GoalDraft;
use crate::error::AppError;

/// Numbers and numeric strings become `f64`; everything else is `None`.
pub fn lenient_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Parses a JSON string holding a structure; any other value passes through.
pub fn decode_or_default(v: Option<&Value>) -> Value {
    match v {
        Some(Value::String(s)) => serde_json::from_str(s).unwrap_or(Value::Null),
        Some(other) => other.clone(),
        None => Value::Null,
    }
}

/// A finite, non-negative amount. Covers the targets and the weight.
fn amount(c: &Canonical<'_, GoalField>, field: GoalField) -> Result<Option<f64>, AppError> {
    let Some(v) = c.get(field) else {
        return Ok(None);
    };
    let n = lenient_number(v)
        .filter(|n| n.is_finite())
        .ok_or_else(|| AppError::validation(format!("{} must be a number", field.name())))?;
    if n < 0.0 {
        return Err(AppError::validation(format!(
            "{} must not be negative",
            field.name()
        )));
    }
    Ok(Some(n))
}

fn integer(c: &Canonical<'_, GoalField>, field: GoalField) -> Result<Option<i64>, AppError> {
    let Some(v) = c.get(field) else {
        return Ok(None);
    };
    let as_int = v.as_i64().or_else(|| {
        lenient_number(v)
            .filter(|n| n.is_finite() && n.fract() == 0.0)
            .map(|n| n as i64)
    });
    as_int
        .map(Some)
        .ok_or_else(|| AppError::validation(format!("{} must be an integer", field.name())))
}

fn date_string(c: &Canonical<'_, GoalField>, field: GoalField) -> Result<Option<String>, AppError> {
    let Some(v) = c.get(field) else {
        return Ok(None);
    };
    let invalid = || AppError::validation(format!("{} must be a date string", field.name()));
    let s = v.as_str().ok_or_else(invalid)?;
    if s.trim().is_empty() {
        return Err(invalid());
    }
    // stored as the day key so start dates order correctly
    dates::normalize(Some(s)).map(Some).map_err(|_| invalid())
}

fn boolean(c: &Canonical<'_, GoalField>, field: GoalField) -> Result<Option<bool>, AppError> {
    match c.get(field) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(AppError::validation(format!(
            "{} must be a boolean",
            field.name()
        ))),
    }
}

/// Resolves aliases in a goal payload and type-checks every known field.
pub fn goal_draft(payload: &Value) -> Result<GoalDraft, AppError> {
    let empty = Map::new();
    let record = match payload {
        Value::Object(m) => m,
        Value::Null => &empty,
        _ => return Err(AppError::validation("goal payload must be an object")),
    };
    let c = normalize(record, GOAL_ALIASES);
    Ok(GoalDraft {
        subject_id: integer(&c, GoalField::SubjectId)?,
        calorie_target: amount(&c, GoalField::CalorieTarget)?,
        protein_target: amount(&c, GoalField::ProteinTarget)?,
        carb_target: amount(&c, GoalField::CarbTarget)?,
        fat_target: amount(&c, GoalField::FatTarget)?,
        fiber_target: amount(&c, GoalField::FiberTarget)?,
        water_target: amount(&c, GoalField::WaterTarget)?,
        target_weight: amount(&c, GoalField::TargetWeight)?,
        start_date: date_string(&c, GoalField::StartDate)?,
        end_date: date_string(&c, GoalField::EndDate)?,
        objective_date: date_string(&c, GoalField::ObjectiveDate)?,
        active: boolean(&c, GoalField::Active)?,
        created_by: integer(&c, GoalField::CreatedBy)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_both_spellings() {
        let d = goal_draft(&json!({
            "pacient_id": 42,
            "metaCalorias": 1800,
            "meta_proteinas": "120",
            "peso_objetivo": 72.5,
            "dataInicio": "2024-01-01",
            "ativo": true,
            "criadoPor": 7
        }))
        .unwrap();
        assert_eq!(d.subject_id, Some(42));
        assert_eq!(d.calorie_target, Some(1800.0));
        assert_eq!(d.protein_target, Some(120.0));
        assert_eq!(d.target_weight, Some(72.5));
        assert_eq!(d.start_date.as_deref(), Some("2024-01-01"));
        assert_eq!(d.active, Some(true));
        assert_eq!(d.created_by, Some(7));
        assert_eq!(d.carb_target, None);
    }

    #[test]
    fn rejects_text_in_numeric_field() {
        let err = goal_draft(&json!({ "targetWeight": "seventy" })).unwrap_err();
        assert_eq!(err.to_string(), "targetWeight must be a number");
    }

    #[test]
    fn rejects_non_finite_and_negative_amounts() {
        let err = goal_draft(&json!({ "calorieTarget": "inf" })).unwrap_err();
        assert_eq!(err.to_string(), "calorieTarget must be a number");
        assert!(goal_draft(&json!({ "metaAgua": "NaN" })).is_err());

        let err = goal_draft(&json!({ "targetWeight": -70 })).unwrap_err();
        assert_eq!(err.to_string(), "targetWeight must not be negative");
        let err = goal_draft(&json!({ "proteinTarget": "-5" })).unwrap_err();
        assert_eq!(err.to_string(), "proteinTarget must not be negative");
        assert_eq!(
            goal_draft(&json!({ "fiberTarget": 0 })).unwrap().fiber_target,
            Some(0.0)
        );
    }

    #[test]
    fn dates_are_stored_as_day_keys() {
        let d = goal_draft(&json!({
            "startDate": "02/01/2025",
            "endDate": "2025-06-30T10:00:00Z",
            "objectiveDate": "2025/12/31"
        }))
        .unwrap();
        assert_eq!(d.start_date.as_deref(), Some("2025-02-01"));
        assert_eq!(d.end_date.as_deref(), Some("2025-06-30"));
        assert_eq!(d.objective_date.as_deref(), Some("2025-12-31"));
    }

    #[test]
    fn rejects_fractional_subject() {
        let err = goal_draft(&json!({ "subjectId": 1.5 })).unwrap_err();
        assert_eq!(err.to_string(), "subjectId must be an integer");
    }

    #[test]
    fn rejects_unparseable_dates() {
        let err = goal_draft(&json!({ "endDate": "someday" })).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(goal_draft(&json!([1, 2])).is_err());
        assert_eq!(goal_draft(&Value::Null).unwrap(), GoalDraft::default());
    }

    #[test]
    fn decode_or_default_handles_strings() {
        assert_eq!(
            decode_or_default(Some(&json!("{\"protein\": 3}"))),
            json!({ "protein": 3 })
        );
        assert_eq!(decode_or_default(Some(&json!("{oops"))), Value::Null);
        assert_eq!(decode_or_default(None), Value::Null);
        assert_eq!(decode_or_default(Some(&json!([1]))), json!([1]));
    }

    #[test]
    fn lenient_number_is_lenient() {
        assert_eq!(lenient_number(&json!(" 12.5 ")), Some(12.5));
        assert_eq!(lenient_number(&json!("abc")), None);
        assert_eq!(lenient_number(&json!(true)), None);
    }
}
