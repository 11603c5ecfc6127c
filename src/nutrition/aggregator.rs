//! Sums one day of a subject's meal log.
//!
//! Stored meal logs are loose: the container may be an array or a JSON
//! string holding one, each record may itself be a JSON string, and macros
//! may sit under `macros` (again maybe encoded) or flat on the record. A bad
//! record only loses its own contribution.

use serde_json::{Map, Value};
use tracing::debug;

use super::aliases::{first_present, keys_for, normalize, MealField, MEAL_ALIASES};
use super::dates;
use super::dto::{Nutrient, NutrientMap};
use super::payload::{decode_or_default, lenient_number};

const MACRO_FIELDS: [(Nutrient, MealField); 5] = [
    (Nutrient::Protein, MealField::Protein),
    (Nutrient::Carbs, MealField::Carbs),
    (Nutrient::Fat, MealField::Fat),
    (Nutrient::Fiber, MealField::Fiber),
    (Nutrient::Water, MealField::Water),
];

/// Unrounded running sums for every meal on `day_key`.
pub fn sum_for_day(raw: Option<&Value>, day_key: &str) -> NutrientMap<f64> {
    let mut totals = NutrientMap::<f64>::default();
    let Value::Array(records) = decode_or_default(raw) else {
        return totals;
    };

    for (idx, raw_record) in records.iter().enumerate() {
        let record = match decode_or_default(Some(raw_record)) {
            Value::Object(m) => m,
            _ => {
                debug!(idx, "meal record is not an object; skipped");
                continue;
            }
        };
        match meal_day(&record) {
            Some(day) if day == day_key => {}
            Some(_) => continue,
            None => {
                debug!(idx, "meal record has no usable date; skipped");
                continue;
            }
        }
        let contribution = contribution(&record);
        for n in Nutrient::ALL {
            *totals.get_mut(n) += contribution.get(n);
        }
    }
    totals
}

fn meal_day(record: &Map<String, Value>) -> Option<String> {
    let c = normalize(record, MEAL_ALIASES);
    match c.get(MealField::Timestamp)? {
        Value::String(s) if !s.trim().is_empty() => dates::normalize(Some(s.as_str())).ok(),
        Value::Number(n) => n.as_i64().and_then(dates::from_epoch_millis),
        _ => None,
    }
}

/// What one meal adds to the day. Missing or non-numeric values count as zero.
fn contribution(record: &Map<String, Value>) -> NutrientMap<f64> {
    let c = normalize(record, MEAL_ALIASES);
    let macros = match decode_or_default(c.get(MealField::Macros)) {
        Value::Object(m) => m,
        _ => Map::new(),
    };
    let amount = |v: Option<&Value>| {
        v.and_then(lenient_number)
            .filter(|n| n.is_finite())
            .unwrap_or(0.0)
    };

    let mut out = NutrientMap::<f64>::default();
    out.calories = amount(c.get(MealField::Calories));
    for (nutrient, field) in MACRO_FIELDS {
        let keys = keys_for(MEAL_ALIASES, field);
        let nested = first_present(&macros, keys);
        *out.get_mut(nutrient) = amount(nested.or_else(|| first_present(record, keys)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meal(day: &str, kcal: f64) -> Value {
        json!({ "datetime": format!("{day}T12:30:00Z"), "items": ["x"], "calories": kcal })
    }

    #[test]
    fn empty_or_absent_container_is_all_zero() {
        let zero = NutrientMap::<f64>::default();
        assert_eq!(sum_for_day(None, "2024-02-01"), zero);
        assert_eq!(sum_for_day(Some(&json!([])), "2024-02-01"), zero);
        assert_eq!(sum_for_day(Some(&Value::Null), "2024-02-01"), zero);
        assert_eq!(sum_for_day(Some(&json!("not json")), "2024-02-01"), zero);
        assert_eq!(sum_for_day(Some(&json!({ "a": 1 })), "2024-02-01"), zero);
    }

    #[test]
    fn only_the_requested_day_counts() {
        let log = json!([
            meal("2024-02-01", 700.0),
            meal("2024-02-02", 450.0),
            meal("2024-02-02", 50.0)
        ]);
        assert_eq!(sum_for_day(Some(&log), "2024-02-02").calories, 500.0);
        assert_eq!(sum_for_day(Some(&log), "2024-02-01").calories, 700.0);
    }

    #[test]
    fn nested_and_flat_macros_are_read() {
        let log = json!([
            {
                "datetime": "2024-02-01T08:00:00Z",
                "calories": 500,
                "macros": { "protein": 30, "carbs": 60, "fat": 10, "fiber": 5, "water": 0.3 }
            },
            {
                "data": "2024-02-01",
                "calorias": "200",
                "proteinas": 10,
                "gorduras": 4
            }
        ]);
        let t = sum_for_day(Some(&log), "2024-02-01");
        assert_eq!(t.calories, 700.0);
        assert_eq!(t.protein, 40.0);
        assert_eq!(t.carbs, 60.0);
        assert_eq!(t.fat, 14.0);
        assert_eq!(t.fiber, 5.0);
        assert_eq!(t.water, 0.3);
    }

    #[test]
    fn encoded_container_records_and_macros_are_decoded() {
        let inner = json!({
            "datetime": "2024-02-01T12:00:00Z",
            "calories": 250,
            "macros": "{\"protein\": 20, \"carbs\": 15}"
        })
        .to_string();
        let container = Value::String(json!([inner]).to_string());
        let t = sum_for_day(Some(&container), "2024-02-01");
        assert_eq!(t.calories, 250.0);
        assert_eq!(t.protein, 20.0);
        assert_eq!(t.carbs, 15.0);
    }

    #[test]
    fn malformed_pieces_contribute_zero() {
        let log = json!([
            { "datetime": "2024-02-01T10:00:00Z", "calories": "lots", "macros": "{broken" },
            { "datetime": "not a date", "calories": 900 },
            { "calories": 900 },
            42,
            { "datetime": "2024-02-01T20:00:00Z", "calories": 100, "macros": { "protein": null, "fat": [1] } }
        ]);
        let t = sum_for_day(Some(&log), "2024-02-01");
        assert_eq!(t.calories, 100.0);
        assert_eq!(t.protein, 0.0);
        assert_eq!(t.fat, 0.0);
    }

    #[test]
    fn non_ascii_day_prefix_only_drops_that_meal() {
        let log = json!([
            { "datetime": "٢٠٢٤-٠٢-٠١", "calories": 1 },
            { "datetime": "2024-02-01", "calories": 500 }
        ]);
        assert_eq!(sum_for_day(Some(&log), "2024-02-01").calories, 500.0);
    }

    #[test]
    fn offsets_do_not_move_the_day() {
        let log = json!([{ "datetime": "2024-02-01T23:30:00-05:00", "calories": 300 }]);
        assert_eq!(sum_for_day(Some(&log), "2024-02-01").calories, 300.0);
        assert_eq!(sum_for_day(Some(&log), "2024-02-02").calories, 0.0);
    }

    #[test]
    fn epoch_millis_timestamps_are_accepted() {
        let log = json!([{ "timestamp": 1_706_788_800_000_i64, "calories": 120 }]);
        assert_eq!(sum_for_day(Some(&log), "2024-02-01").calories, 120.0);
    }
}
