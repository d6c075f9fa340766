use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use uuid::Uuid;

use super::repo_types::ReportRow;
use crate::foods::FoodOrigin;
use crate::store::{DishId, FoodItemId, MealId};

time::serde::format_description!(
    eaten_at_format,
    PrimitiveDateTime,
    "[year]-[month]-[day] [hour]:[minute]:[second]"
);

pub const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 { 100 }

impl ReportQuery {
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.max(0)
    }

    /// Blank filters mean "every device".
    pub fn mac(&self) -> Option<&str> {
        self.mac.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}

/// One food item, flattened with its dish, meal and owning device.
#[derive(Debug, Serialize)]
pub struct ReportEntry {
    pub user_id: Uuid,
    pub mac: String,
    pub meal_id: MealId,
    #[serde(with = "eaten_at_format")]
    pub eaten_at: PrimitiveDateTime,
    pub dish_id: DishId,
    pub food_item_id: FoodItemId,
    pub origin: FoodOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ean: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    pub weight_g: f64,
    pub kcal: f64,
}

impl From<ReportRow> for ReportEntry {
    fn from(r: ReportRow) -> Self {
        Self {
            user_id: r.user_id,
            mac: r.mac,
            meal_id: r.meal_id,
            eaten_at: r.eaten_at,
            dish_id: r.dish_id,
            food_item_id: r.food_item_id,
            origin: r.origin,
            group_code: r.group_code,
            ean: r.ean,
            product_name: r.product_name,
            weight_g: r.weight_g,
            kcal: r.kcal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn row(origin: FoodOrigin) -> ReportRow {
        ReportRow {
            user_id: Uuid::nil(),
            mac: "24:6F:28:AA:BB:CC".into(),
            meal_id: 7,
            eaten_at: datetime!(2023-11-14 22:13:20),
            dish_id: 11,
            food_item_id: 42,
            origin,
            group_code: None,
            ean: None,
            product_name: None,
            weight_g: 150.0,
            kcal: 58.5,
        }
    }

    #[test]
    fn group_entry_serialization() {
        let entry = ReportEntry::from(ReportRow {
            group_code: Some(3),
            ..row(FoodOrigin::Group)
        });

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["eaten_at"], "2023-11-14 22:13:20");
        assert_eq!(value["origin"], "group");
        assert_eq!(value["group_code"], 3);
        assert!(value.get("ean").is_none());
        assert!(value.get("product_name").is_none());
    }

    #[test]
    fn barcode_entry_serialization() {
        let entry = ReportEntry::from(ReportRow {
            ean: Some("8410000000001".into()),
            product_name: Some("Yogur natural".into()),
            ..row(FoodOrigin::Barcode)
        });

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["origin"], "barcode");
        assert_eq!(value["ean"], "8410000000001");
        assert_eq!(value["product_name"], "Yogur natural");
        assert!(value.get("group_code").is_none());
    }

    #[test]
    fn query_defaults_and_bounds() {
        let q: ReportQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!(q.limit(), 100);
        assert_eq!(q.offset(), 0);
        assert_eq!(q.mac(), None);

        let q: ReportQuery =
            serde_json::from_value(json!({ "limit": 50000, "offset": -3, "mac": "  " })).unwrap();
        assert_eq!(q.limit(), MAX_LIMIT);
        assert_eq!(q.offset(), 0);
        assert_eq!(q.mac(), None);
    }
}
