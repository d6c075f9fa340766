use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use time::PrimitiveDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{DishId, FoodItemId, FoodTypeId, IngestStore, IngestUnit, MealId, NewFoodItem};
use crate::foods::FoodOrigin;
use crate::nutrition::NutritionFacts;

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IngestStore for PgStore {
    async fn device_owner(&self, key: &str) -> anyhow::Result<Option<Uuid>> {
        let owner = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
            FROM devices
            WHERE upper(mac) = upper($1) OR api_key = $1
            LIMIT 1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await
        .context("look up device")?;
        Ok(owner)
    }

    async fn cached_barcode(&self, ean: &str) -> anyhow::Result<Option<FoodTypeId>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"SELECT food_type_id FROM barcodes WHERE ean = $1"#,
        )
        .bind(ean)
        .fetch_optional(&self.db)
        .await
        .context("look up barcode cache")?;
        Ok(id)
    }

    async fn begin(&self) -> anyhow::Result<Box<dyn IngestUnit>> {
        let tx = self.db.begin().await.context("begin transaction")?;
        Ok(Box::new(PgUnit { tx }))
    }
}

/// One ingestion request's transaction. Rolled back by sqlx when dropped
/// without `commit`.
pub struct PgUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl IngestUnit for PgUnit {
    async fn group_food_type(&mut self, code: i32) -> anyhow::Result<Option<FoodTypeId>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"SELECT food_type_id FROM food_groups WHERE code = $1"#,
        )
        .bind(code)
        .fetch_optional(&mut *self.tx)
        .await
        .context("look up food group")?;
        Ok(id)
    }

    async fn barcode_food_type(&mut self, ean: &str) -> anyhow::Result<Option<FoodTypeId>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"SELECT food_type_id FROM barcodes WHERE ean = $1"#,
        )
        .bind(ean)
        .fetch_optional(&mut *self.tx)
        .await
        .context("look up barcode cache")?;
        Ok(id)
    }

    async fn create_barcode_food_type(
        &mut self,
        ean: &str,
        facts: &NutritionFacts,
    ) -> anyhow::Result<FoodTypeId> {
        let per_gram = facts.per_gram();
        let food_type_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO food_types (kcal_g, prot_g, lip_g, carb_g, origin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(per_gram.kcal_g)
        .bind(per_gram.prot_g)
        .bind(per_gram.lip_g)
        .bind(per_gram.carb_g)
        .bind(FoodOrigin::Barcode.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .context("insert barcode food type")?;

        let linked = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO barcodes (ean, name, food_type_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (ean) DO NOTHING
            RETURNING food_type_id
            "#,
        )
        .bind(ean)
        .bind(&facts.name)
        .bind(food_type_id)
        .fetch_optional(&mut *self.tx)
        .await
        .context("insert barcode cache entry")?;

        if let Some(id) = linked {
            debug!(%ean, food_type_id = id, "barcode cached");
            return Ok(id);
        }

        // Another request cached this barcode first.
        warn!(%ean, "barcode cached concurrently; adopting existing food type");
        sqlx::query(r#"DELETE FROM food_types WHERE id = $1"#)
            .bind(food_type_id)
            .execute(&mut *self.tx)
            .await
            .context("discard duplicate food type")?;
        let existing = sqlx::query_scalar::<_, i64>(
            r#"SELECT food_type_id FROM barcodes WHERE ean = $1"#,
        )
        .bind(ean)
        .fetch_one(&mut *self.tx)
        .await
        .context("read concurrently cached barcode")?;
        Ok(existing)
    }

    async fn insert_meal(&mut self, eaten_at: PrimitiveDateTime) -> anyhow::Result<MealId> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO meals (eaten_at) VALUES ($1) RETURNING id"#,
        )
        .bind(eaten_at)
        .fetch_one(&mut *self.tx)
        .await
        .context("insert meal")?;
        Ok(id)
    }

    async fn insert_dish(&mut self, meal_id: MealId) -> anyhow::Result<DishId> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO dishes (meal_id) VALUES ($1) RETURNING id"#,
        )
        .bind(meal_id)
        .fetch_one(&mut *self.tx)
        .await
        .context("insert dish")?;
        Ok(id)
    }

    async fn insert_food_item(&mut self, item: NewFoodItem) -> anyhow::Result<FoodItemId> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO food_items (weight_g, dish_id, food_type_id, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(item.weight_g)
        .bind(item.dish_id)
        .bind(item.food_type_id)
        .bind(item.user_id)
        .fetch_one(&mut *self.tx)
        .await
        .context("insert food item")?;
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        self.tx.commit().await.context("commit transaction")?;
        Ok(())
    }
}
