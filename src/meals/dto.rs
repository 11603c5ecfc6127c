use serde::{Deserialize, Serialize};

/// Body of POST /subjects/:subject_id/meal-logs, also the stored shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealLogRequest {
    pub datetime: String,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macros: Option<Macros>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Macros {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct MealLogCreated {
    pub subject_id: i64,
    pub day: String,
    pub meal: MealLogRequest,
}
