use sqlx::FromRow;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::foods::FoodOrigin;
use crate::store::{DishId, FoodItemId, MealId};

#[derive(Debug, Clone, FromRow)]
pub struct ReportRow {
    pub user_id: Uuid,
    pub mac: String,
    pub meal_id: MealId,
    pub eaten_at: PrimitiveDateTime,
    pub dish_id: DishId,
    pub food_item_id: FoodItemId,
    pub origin: FoodOrigin,
    pub group_code: Option<i32>,
    pub ean: Option<String>,
    pub product_name: Option<String>,
    pub weight_g: f64,
    pub kcal: f64,
}
