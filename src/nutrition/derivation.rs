//! Fills missing daily targets from a reference body weight.
//!
//! Evaluation order is fixed: calories, protein and fat come straight from
//! weight; fiber then reads the resolved calories; water reads weight;
//! carbohydrate goes last because it spends whatever calories protein and
//! fat leave over. Supplied targets are never replaced, zero included.

use tracing::debug;

use super::dto::{GoalDraft, Nutrient};
use super::rounding::{round_to, DEFAULT_PRECISION, WATER_PRECISION};
use crate::error::AppError;

pub const KCAL_PER_KG: f64 = 30.0;
pub const PROTEIN_G_PER_KG: f64 = 2.0;
pub const FAT_G_PER_KG: f64 = 0.8;
pub const FIBER_G_PER_KCAL: f64 = 14.0 / 1000.0;
pub const WATER_L_PER_KG: f64 = 0.035;

pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARB: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

pub fn derive(mut goal: GoalDraft) -> Result<GoalDraft, AppError> {
    let supplied = goal.targets();
    if let Some(n) = Nutrient::ALL
        .into_iter()
        .find(|n| supplied.get(*n).is_some_and(|v| !v.is_finite() || v < 0.0))
    {
        return Err(AppError::validation(format!(
            "{} must be a non-negative number",
            target_key(n)
        )));
    }
    if supplied.is_complete() {
        return Ok(goal);
    }

    let weight = goal.target_weight.ok_or_else(|| {
        AppError::validation("targetWeight is required to calculate nutrition goals")
    })?;
    if !weight.is_finite() {
        return Err(AppError::validation("targetWeight must be a number"));
    }
    if weight < 0.0 {
        return Err(AppError::validation("targetWeight must not be negative"));
    }

    let r = |v: f64| round_to(v, DEFAULT_PRECISION);

    goal.calorie_target.get_or_insert_with(|| r(weight * KCAL_PER_KG));
    goal.protein_target
        .get_or_insert_with(|| r(weight * PROTEIN_G_PER_KG));
    goal.fat_target.get_or_insert_with(|| r(weight * FAT_G_PER_KG));

    if goal.fiber_target.is_none() {
        goal.fiber_target = goal.calorie_target.map(|kcal| r(kcal * FIBER_G_PER_KCAL));
    }

    goal.water_target
        .get_or_insert_with(|| round_to(weight * WATER_L_PER_KG, WATER_PRECISION));

    if goal.carb_target.is_none() {
        if let Some(kcal) = goal.calorie_target {
            let protein_kcal = goal.protein_target.unwrap_or(0.0) * KCAL_PER_G_PROTEIN;
            let fat_kcal = goal.fat_target.unwrap_or(0.0) * KCAL_PER_G_FAT;
            let left = kcal - protein_kcal - fat_kcal;
            goal.carb_target = Some(r(left.max(0.0) / KCAL_PER_G_CARB));
        }
    }

    debug!(weight, targets = ?goal.targets(), "nutrition targets derived");
    Ok(goal)
}

fn target_key(n: Nutrient) -> &'static str {
    match n {
        Nutrient::Calories => "calorieTarget",
        Nutrient::Protein => "proteinTarget",
        Nutrient::Carbs => "carbTarget",
        Nutrient::Fat => "fatTarget",
        Nutrient::Fiber => "fiberTarget",
        Nutrient::Water => "waterTarget",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight(w: f64) -> GoalDraft {
        GoalDraft {
            target_weight: Some(w),
            ..Default::default()
        }
    }

    #[test]
    fn seventy_kilos_from_scratch() {
        let g = derive(weight(70.0)).unwrap();
        assert_eq!(g.calorie_target, Some(2100.0));
        assert_eq!(g.protein_target, Some(140.0));
        assert_eq!(g.fat_target, Some(56.0));
        assert_eq!(g.fiber_target, Some(29.4));
        assert_eq!(g.water_target, Some(2.45));
        assert_eq!(g.carb_target, Some(259.0));
    }

    #[test]
    fn calories_are_thirty_per_kilo_and_carbs_never_negative() {
        for w in [0.1, 1.0, 33.3, 58.7, 70.0, 101.25, 180.0, 350.0] {
            let g = derive(weight(w)).unwrap();
            assert_eq!(g.calorie_target, Some(round_to(w * 30.0, 2)));
            assert!(g.carb_target.unwrap() >= 0.0);
        }
    }

    #[test]
    fn carbs_floor_at_zero_when_macros_overspend() {
        let g = derive(GoalDraft {
            target_weight: Some(70.0),
            protein_target: Some(400.0),
            fat_target: Some(100.0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(g.carb_target, Some(0.0));
    }

    #[test]
    fn carbs_use_supplied_protein_and_fat() {
        let g = derive(GoalDraft {
            target_weight: Some(70.0),
            calorie_target: Some(2000.0),
            protein_target: Some(100.0),
            fat_target: Some(50.0),
            ..Default::default()
        })
        .unwrap();
        // (2000 - 400 - 450) / 4
        assert_eq!(g.carb_target, Some(287.5));
        assert_eq!(g.fiber_target, Some(28.0));
    }

    #[test]
    fn explicit_targets_survive() {
        let g = derive(GoalDraft {
            target_weight: Some(70.0),
            protein_target: Some(999.0),
            fiber_target: Some(0.0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(g.protein_target, Some(999.0));
        assert_eq!(g.fiber_target, Some(0.0));
    }

    #[test]
    fn complete_goal_needs_no_weight() {
        let full = GoalDraft {
            calorie_target: Some(1800.0),
            protein_target: Some(120.0),
            carb_target: Some(200.0),
            fat_target: Some(60.0),
            fiber_target: Some(30.0),
            water_target: Some(2.5),
            ..Default::default()
        };
        assert_eq!(derive(full.clone()).unwrap(), full);
    }

    #[test]
    fn derivation_is_idempotent() {
        let once = derive(weight(82.4)).unwrap();
        let twice = derive(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_weight_is_a_validation_error() {
        let err = derive(GoalDraft {
            calorie_target: Some(2000.0),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("targetWeight is required"));
    }

    #[test]
    fn negative_weight_is_rejected() {
        let err = derive(weight(-70.0)).unwrap_err();
        assert_eq!(err.to_string(), "targetWeight must not be negative");
    }

    #[test]
    fn bad_supplied_targets_are_rejected_even_when_complete() {
        let err = derive(GoalDraft {
            target_weight: Some(70.0),
            calorie_target: Some(f64::INFINITY),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = derive(GoalDraft {
            calorie_target: Some(1800.0),
            protein_target: Some(-1.0),
            carb_target: Some(200.0),
            fat_target: Some(60.0),
            fiber_target: Some(30.0),
            water_target: Some(2.5),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "proteinTarget must be a non-negative number");
    }

    #[test]
    fn non_finite_weight_is_rejected() {
        let err = derive(weight(f64::INFINITY)).unwrap_err();
        assert_eq!(err.to_string(), "targetWeight must be a number");
        assert!(derive(weight(f64::NAN)).is_err());
    }
}
