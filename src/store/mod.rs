//! Storage seams used by the ingestion pipeline.
//!
//! [`IngestStore`] answers the lookups that run outside a transaction and
//! opens [`IngestUnit`]s. Everything written through a unit becomes visible
//! only after [`IngestUnit::commit`]; dropping a unit discards its writes.

#[cfg(test)]
pub mod memory;
mod postgres;

use async_trait::async_trait;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::nutrition::NutritionFacts;

pub use postgres::PgStore;

pub type FoodTypeId = i64;
pub type MealId = i64;
pub type DishId = i64;
pub type FoodItemId = i64;

#[derive(Debug, Clone, PartialEq)]
pub struct NewFoodItem {
    pub weight_g: f64,
    pub dish_id: DishId,
    pub food_type_id: FoodTypeId,
    pub user_id: Uuid,
}

#[async_trait]
pub trait IngestStore: Send + Sync {
    async fn device_owner(&self, key: &str) -> anyhow::Result<Option<Uuid>>;

    async fn cached_barcode(&self, ean: &str) -> anyhow::Result<Option<FoodTypeId>>;

    async fn begin(&self) -> anyhow::Result<Box<dyn IngestUnit>>;
}

#[async_trait]
pub trait IngestUnit: Send {
    async fn group_food_type(&mut self, code: i32) -> anyhow::Result<Option<FoodTypeId>>;

    async fn barcode_food_type(&mut self, ean: &str) -> anyhow::Result<Option<FoodTypeId>>;

    /// Creates a `barcode` food type and its cache entry as one step. If the
    /// barcode got cached concurrently, the existing food type wins and
    /// nothing new is left behind.
    async fn create_barcode_food_type(
        &mut self,
        ean: &str,
        facts: &NutritionFacts,
    ) -> anyhow::Result<FoodTypeId>;

    async fn insert_meal(&mut self, eaten_at: PrimitiveDateTime) -> anyhow::Result<MealId>;

    async fn insert_dish(&mut self, meal_id: MealId) -> anyhow::Result<DishId>;

    async fn insert_food_item(&mut self, item: NewFoodItem) -> anyhow::Result<FoodItemId>;

    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
}
