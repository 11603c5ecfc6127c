use std::cmp::Ordering;

use super::dto::{DailyBalance, NutrientMap, NutritionGoal};
use super::rounding::round_nutrient;

/// Compares one day's totals against a goal. A target the goal does not
/// carry is reported as zero.
pub fn reconcile(date: String, totals: &NutrientMap<f64>, goal: &NutritionGoal) -> DailyBalance {
    let targets = goal.to_draft().targets();
    let goals = NutrientMap::from_fn(|n| round_nutrient(n, targets.get(n).unwrap_or(0.0)));
    let totals = NutrientMap::from_fn(|n| round_nutrient(n, totals.get(n)));
    let remaining = NutrientMap::from_fn(|n| round_nutrient(n, goals.get(n) - totals.get(n)));
    let exceeded = NutrientMap::from_fn(|n| remaining.get(n) < 0.0);

    DailyBalance {
        date,
        totals,
        goals,
        remaining,
        exceeded,
    }
}

/// The goal with the latest `start_date`; goals without one sort last.
/// Ties go to the most recently created.
pub fn select_active_goal<'a, I>(goals: I) -> Option<&'a NutritionGoal>
where
    I: IntoIterator<Item = &'a NutritionGoal>,
{
    goals.into_iter().max_by(|a, b| compare_recency(a, b))
}

fn compare_recency(a: &NutritionGoal, b: &NutritionGoal) -> Ordering {
    // Option orders None below Some, which is exactly "nulls last" for a max
    a.start_date
        .cmp(&b.start_date)
        .then_with(|| a.created_at.cmp(&b.created_at))
}
