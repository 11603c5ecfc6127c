//! Alias resolution for loosely-keyed inbound records.
//!
//! Goal payloads and stored meal records spell the same field several ways
//! (`calorieTarget` / `meta_calorias`, `carbs` / `carboidratos`, ...). Each
//! logical field declares its accepted keys in priority order; the first key
//! present with a non-null value wins. Unknown keys are ignored.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Ordered alias list for one logical field.
pub type AliasTable<F> = [(F, &'static [&'static str])];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GoalField {
    SubjectId,
    CalorieTarget,
    ProteinTarget,
    CarbTarget,
    FatTarget,
    FiberTarget,
    WaterTarget,
    TargetWeight,
    StartDate,
    EndDate,
    ObjectiveDate,
    Active,
    CreatedBy,
}

impl GoalField {
    /// Name used in validation messages.
    pub fn name(self) -> &'static str {
        keys_for(GOAL_ALIASES, self).first().copied().unwrap_or("field")
    }
}

pub const GOAL_ALIASES: &AliasTable<GoalField> = &[
    (
        GoalField::SubjectId,
        &["subjectId", "subject_id", "pacientId", "pacient_id"],
    ),
    (
        GoalField::CalorieTarget,
        &["calorieTarget", "calorie_target", "metaCalorias", "meta_calorias"],
    ),
    (
        GoalField::ProteinTarget,
        &["proteinTarget", "protein_target", "metaProteinas", "meta_proteinas"],
    ),
    (
        GoalField::CarbTarget,
        &["carbTarget", "carb_target", "metaCarboidratos", "meta_carboidratos"],
    ),
    (
        GoalField::FatTarget,
        &["fatTarget", "fat_target", "metaGorduras", "meta_gorduras"],
    ),
    (
        GoalField::FiberTarget,
        &["fiberTarget", "fiber_target", "metaFibras", "meta_fibras"],
    ),
    (
        GoalField::WaterTarget,
        &["waterTarget", "water_target", "metaAgua", "meta_agua"],
    ),
    (
        GoalField::TargetWeight,
        &["targetWeight", "target_weight", "pesoObjetivo", "peso_objetivo"],
    ),
    (
        GoalField::StartDate,
        &["startDate", "start_date", "dataInicio", "data_inicio"],
    ),
    (
        GoalField::EndDate,
        &["endDate", "end_date", "dataFim", "data_fim"],
    ),
    (
        GoalField::ObjectiveDate,
        &["objectiveDate", "objective_date", "dataObjetivo", "data_objetivo"],
    ),
    (GoalField::Active, &["active", "ativo"]),
    (
        GoalField::CreatedBy,
        &["createdBy", "created_by", "criadoPor", "criado_por"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MealField {
    Timestamp,
    Calories,
    Macros,
    Protein,
    Carbs,
    Fat,
    Fiber,
    Water,
}

pub const MEAL_ALIASES: &AliasTable<MealField> = &[
    (
        MealField::Timestamp,
        &[
            "datetime",
            "dateTime",
            "date_time",
            "dataHora",
            "data_hora",
            "date",
            "data",
            "timestamp",
            "createdAt",
            "created_at",
        ],
    ),
    (MealField::Calories, &["calories", "calorias", "kcal"]),
    (MealField::Macros, &["macros", "macronutrientes"]),
    (MealField::Protein, &["protein", "proteinas", "proteina"]),
    (
        MealField::Carbs,
        &["carbs", "carbohydrates", "carboidratos", "carboidrato"],
    ),
    (MealField::Fat, &["fat", "fats", "gorduras", "gordura"]),
    (MealField::Fiber, &["fiber", "fibre", "fibras", "fibra"]),
    (MealField::Water, &["water", "agua"]),
];

/// Canonical view over a raw record: at most one value per logical field.
#[derive(Debug, Clone)]
pub struct Canonical<'a, F> {
    values: BTreeMap<F, &'a Value>,
}

impl<'a, F: Copy + Ord> Canonical<'a, F> {
    pub fn get(&self, field: F) -> Option<&'a Value> {
        self.values.get(&field).copied()
    }
}

/// Accepted keys for `field`, highest priority first.
pub fn keys_for<F: Copy + PartialEq>(table: &AliasTable<F>, field: F) -> &'static [&'static str] {
    table
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, keys)| *keys)
        .unwrap_or_default()
}

/// First non-null value among `keys`, in order.
pub fn first_present<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find(|v| !v.is_null())
}

pub fn normalize<'a, F: Copy + Ord>(
    record: &'a Map<String, Value>,
    table: &AliasTable<F>,
) -> Canonical<'a, F> {
    let values = table
        .iter()
        .filter_map(|(field, keys)| first_present(record, keys).map(|v| (*field, v)))
        .collect();
    Canonical { values }
}
