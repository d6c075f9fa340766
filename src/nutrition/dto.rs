use serde::Deserialize;
use serde_json::Value;

use super::NutritionFacts;

pub(super) const KCAL_FIELD: &str = "energy-kcal_100g";
pub(super) const PROTEIN_FIELD: &str = "proteins_100g";
pub(super) const FAT_FIELD: &str = "fat_100g";
pub(super) const CARBS_FIELD: &str = "carbohydrates_100g";

/// Body of `GET /api/v2/product/{ean}`. Only `product` matters; its absence
/// means the catalog does not know the barcode.
#[derive(Debug, Deserialize)]
pub(super) struct ProductResponse {
    #[serde(default)]
    pub product: Option<serde_json::Map<String, Value>>,
}

impl ProductResponse {
    pub fn into_facts(self, ean: &str, language: &str) -> Option<NutritionFacts> {
        let product = self.product?;
        let localized = format!("product_name_{language}");
        let name = text(&product, &localized)
            .or_else(|| text(&product, "product_name"))
            .unwrap_or_else(|| ean.to_string());

        Some(NutritionFacts {
            name,
            kcal_100g: amount(&product, KCAL_FIELD),
            protein_100g: amount(&product, PROTEIN_FIELD),
            fat_100g: amount(&product, FAT_FIELD),
            carbs_100g: amount(&product, CARBS_FIELD),
        })
    }
}

fn text(product: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    product
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// The catalog sometimes serializes numbers as strings.
fn amount(product: &serde_json::Map<String, Value>, key: &str) -> f64 {
    let value = match product.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(0.0)
}
