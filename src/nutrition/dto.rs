use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// The six tracked nutrients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    Calories,
    Protein,
    Carbs,
    Fat,
    Fiber,
    Water,
}

impl Nutrient {
    pub const ALL: [Nutrient; 6] = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Carbs,
        Nutrient::Fat,
        Nutrient::Fiber,
        Nutrient::Water,
    ];
}

/// One value per nutrient. Serialized with the keys the balance report uses
/// (`calorias`, `proteinas`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientMap<T> {
    #[serde(rename = "calorias")]
    pub calories: T,
    #[serde(rename = "proteinas")]
    pub protein: T,
    #[serde(rename = "carboidratos")]
    pub carbs: T,
    #[serde(rename = "gorduras")]
    pub fat: T,
    #[serde(rename = "fibras")]
    pub fiber: T,
    #[serde(rename = "agua")]
    pub water: T,
}

impl<T: Copy> NutrientMap<T> {
    pub fn get(&self, n: Nutrient) -> T {
        match n {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Carbs => self.carbs,
            Nutrient::Fat => self.fat,
            Nutrient::Fiber => self.fiber,
            Nutrient::Water => self.water,
        }
    }

    pub fn get_mut(&mut self, n: Nutrient) -> &mut T {
        match n {
            Nutrient::Calories => &mut self.calories,
            Nutrient::Protein => &mut self.protein,
            Nutrient::Carbs => &mut self.carbs,
            Nutrient::Fat => &mut self.fat,
            Nutrient::Fiber => &mut self.fiber,
            Nutrient::Water => &mut self.water,
        }
    }

    /// Builds a map by evaluating `f` for every nutrient.
    pub fn from_fn<F: FnMut(Nutrient) -> T>(mut f: F) -> Self {
        Self {
            calories: f(Nutrient::Calories),
            protein: f(Nutrient::Protein),
            carbs: f(Nutrient::Carbs),
            fat: f(Nutrient::Fat),
            fiber: f(Nutrient::Fiber),
            water: f(Nutrient::Water),
        }
    }
}

pub type Targets = NutrientMap<Option<f64>>;

impl Targets {
    pub fn is_complete(&self) -> bool {
        Nutrient::ALL.iter().all(|n| self.get(*n).is_some())
    }
}

/// A normalized goal payload: what the caller sent, with aliases resolved.
/// After derivation all six targets are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<i64>,
    pub calorie_target: Option<f64>,
    pub protein_target: Option<f64>,
    pub carb_target: Option<f64>,
    pub fat_target: Option<f64>,
    pub fiber_target: Option<f64>,
    pub water_target: Option<f64>,
    pub target_weight: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub objective_date: Option<String>,
    pub active: Option<bool>,
    pub created_by: Option<i64>,
}

impl GoalDraft {
    pub fn targets(&self) -> Targets {
        NutrientMap {
            calories: self.calorie_target,
            protein: self.protein_target,
            carbs: self.carb_target,
            fat: self.fat_target,
            fiber: self.fiber_target,
            water: self.water_target,
        }
    }

    /// True when the patch carries nothing besides the subject.
    pub fn is_empty_patch(&self) -> bool {
        GoalDraft {
            subject_id: None,
            ..self.clone()
        } == GoalDraft::default()
    }
}

/// Stored goal row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NutritionGoal {
    pub id: Uuid,
    pub subject_id: i64,
    pub calorie_target: Option<f64>,
    pub protein_target: Option<f64>,
    pub carb_target: Option<f64>,
    pub fat_target: Option<f64>,
    pub fiber_target: Option<f64>,
    pub water_target: Option<f64>,
    pub target_weight: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub objective_date: Option<String>,
    pub active: Option<bool>,
    pub created_by: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl NutritionGoal {
    /// Builds a fresh record from a draft; `id` and timestamps are assigned here.
    pub fn from_draft(subject_id: i64, draft: GoalDraft) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            subject_id,
            calorie_target: draft.calorie_target,
            protein_target: draft.protein_target,
            carb_target: draft.carb_target,
            fat_target: draft.fat_target,
            fiber_target: draft.fiber_target,
            water_target: draft.water_target,
            target_weight: draft.target_weight,
            start_date: draft.start_date,
            end_date: draft.end_date,
            objective_date: draft.objective_date,
            active: draft.active,
            created_by: draft.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_draft(&self) -> GoalDraft {
        GoalDraft {
            subject_id: Some(self.subject_id),
            calorie_target: self.calorie_target,
            protein_target: self.protein_target,
            carb_target: self.carb_target,
            fat_target: self.fat_target,
            fiber_target: self.fiber_target,
            water_target: self.water_target,
            target_weight: self.target_weight,
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            objective_date: self.objective_date.clone(),
            active: self.active,
            created_by: self.created_by,
        }
    }

    /// Overwrites stored fields with whatever the patch carries.
    /// `id`, `subject_id` and `created_at` never change.
    pub fn merge(&mut self, patch: GoalDraft) {
        fn set<T>(slot: &mut Option<T>, v: Option<T>) {
            if v.is_some() {
                *slot = v;
            }
        }
        set(&mut self.calorie_target, patch.calorie_target);
        set(&mut self.protein_target, patch.protein_target);
        set(&mut self.carb_target, patch.carb_target);
        set(&mut self.fat_target, patch.fat_target);
        set(&mut self.fiber_target, patch.fiber_target);
        set(&mut self.water_target, patch.water_target);
        set(&mut self.target_weight, patch.target_weight);
        set(&mut self.start_date, patch.start_date);
        set(&mut self.end_date, patch.end_date);
        set(&mut self.objective_date, patch.objective_date);
        set(&mut self.active, patch.active);
        set(&mut self.created_by, patch.created_by);
    }

    /// Copies derived targets back in, leaving everything else alone.
    pub fn apply_targets(&mut self, derived: &GoalDraft) {
        self.calorie_target = derived.calorie_target;
        self.protein_target = derived.protein_target;
        self.carb_target = derived.carb_target;
        self.fat_target = derived.fat_target;
        self.fiber_target = derived.fiber_target;
        self.water_target = derived.water_target;
    }
}

/// Computed per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBalance {
    pub date: String,
    pub totals: NutrientMap<f64>,
    pub goals: NutrientMap<f64>,
    pub remaining: NutrientMap<f64>,
    pub exceeded: NutrientMap<bool>,
}

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    #[serde(default, alias = "data")]
    pub date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nutrient_map_uses_report_keys() {
        let m = NutrientMap::from_fn(|n| n == Nutrient::Water);
        let json = serde_json::to_value(m).unwrap();
        assert_eq!(json["agua"], true);
        assert_eq!(json["calorias"], false);
        assert!(json.get("water").is_none());
    }

    #[test]
    fn merge_only_touches_present_fields() {
        let mut goal = NutritionGoal::from_draft(
            7,
            GoalDraft {
                calorie_target: Some(2000.0),
                protein_target: Some(120.0),
                ..Default::default()
            },
        );
        let id = goal.id;
        goal.merge(GoalDraft {
            protein_target: Some(150.0),
            active: Some(true),
            ..Default::default()
        });
        assert_eq!(goal.id, id);
        assert_eq!(goal.calorie_target, Some(2000.0));
        assert_eq!(goal.protein_target, Some(150.0));
        assert_eq!(goal.active, Some(true));
    }

    #[test]
    fn empty_patch_ignores_subject() {
        let patch = GoalDraft {
            subject_id: Some(3),
            ..Default::default()
        };
        assert!(patch.is_empty_patch());
        let patch = GoalDraft {
            end_date: Some("2024-12-31".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty_patch());
    }

    #[test]
    fn goal_serializes_camel_case_with_rfc3339_times() {
        let goal = NutritionGoal::from_draft(42, GoalDraft::default());
        let json = serde_json::to_value(&goal).unwrap();
        assert_eq!(json["subjectId"], 42);
        assert!(json["createdAt"].as_str().unwrap().contains('T'));
        assert!(json.get("calorieTarget").is_some());
    }
}
