use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::PrimitiveDateTime;

use crate::foods::{FoodSource, SkipReason};

// --- wire payload, as the tablecloth firmware sends it ---

// Nested arrays and leaves stay raw JSON; validation reports each bad shape
// at its own path.
#[derive(Debug, Default, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub comidas: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawMeal {
    #[serde(default)]
    pub fecha: Option<Value>,
    #[serde(default)]
    pub platos: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawDish {
    #[serde(default)]
    pub alimentos: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawFood {
    #[serde(default)]
    pub grupo: Option<Value>,
    #[serde(default)]
    pub peso: Option<Value>,
    #[serde(default)]
    pub ean: Option<Value>,
}

// --- validated input ---

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPayload {
    pub device_key: String,
    pub meals: Vec<MealInput>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MealInput {
    pub eaten_at: PrimitiveDateTime,
    pub dishes: Vec<DishInput>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DishInput {
    pub foods: Vec<FoodInput>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoodInput {
    pub weight_g: f64,
    pub source: FoodSource,
}

/// Barcodes in payload order, duplicates included.
pub fn barcodes(meals: &[MealInput]) -> Vec<&str> {
    meals
        .iter()
        .flat_map(|m| &m.dishes)
        .flat_map(|d| &d.foods)
        .filter_map(|f| f.source.ean())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

// --- response ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestCounts {
    pub meals: usize,
    pub dishes: usize,
    pub food_items: usize,
    pub new_barcodes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedItem {
    pub meal: usize,
    pub dish: usize,
    pub food: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub counts: IngestCounts,
    pub skipped: Vec<SkippedItem>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub message: String,
    pub counts: IngestCounts,
    pub skipped: Vec<SkippedItem>,
}

impl From<IngestReport> for IngestResponse {
    fn from(report: IngestReport) -> Self {
        let message = if report.skipped.is_empty() {
            format!("{} meal(s) saved", report.counts.meals)
        } else {
            format!(
                "{} meal(s) saved, {} food item(s) skipped",
                report.counts.meals,
                report.skipped.len()
            )
        };
        Self {
            success: true,
            message,
            counts: report.counts,
            skipped: report.skipped,
        }
    }
}
