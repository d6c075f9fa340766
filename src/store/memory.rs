use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::bail;
use async_trait::async_trait;
use time::PrimitiveDateTime;
use uuid::Uuid;

use super::{DishId, FoodItemId, FoodTypeId, IngestStore, IngestUnit, MealId, NewFoodItem};
use crate::foods::FoodOrigin;
use crate::nutrition::{NutritionFacts, PerGram};

#[derive(Debug, Clone)]
pub struct StoredFoodType {
    pub id: FoodTypeId,
    pub per_gram: PerGram,
    pub origin: FoodOrigin,
}

#[derive(Debug, Clone, Default)]
pub struct Tables {
    next_id: i64,
    pub devices: Vec<(String, Option<String>, Uuid)>,
    pub groups: HashMap<i32, FoodTypeId>,
    pub food_types: Vec<StoredFoodType>,
    pub barcodes: HashMap<String, (String, FoodTypeId)>,
    pub meals: Vec<(MealId, PrimitiveDateTime)>,
    pub dishes: Vec<(DishId, MealId)>,
    pub food_items: Vec<(FoodItemId, NewFoodItem)>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn row_count(&self) -> usize {
        self.food_types.len()
            + self.barcodes.len()
            + self.meals.len()
            + self.dishes.len()
            + self.food_items.len()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Faults {
    barcode_insert: bool,
    food_items_after: Option<usize>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    faults: Faults,
}

impl MemoryStore {
    pub fn with_device(self, mac: &str, api_key: Option<&str>, user_id: Uuid) -> Self {
        self.tables
            .lock()
            .unwrap()
            .devices
            .push((mac.to_string(), api_key.map(str::to_string), user_id));
        self
    }

    pub fn with_group(self, code: i32, per_gram: PerGram) -> Self {
        {
            let mut t = self.tables.lock().unwrap();
            let id = t.next_id();
            t.food_types.push(StoredFoodType {
                id,
                per_gram,
                origin: FoodOrigin::Group,
            });
            t.groups.insert(code, id);
        }
        self
    }

    pub fn failing_barcode_insert(mut self) -> Self {
        self.faults.barcode_insert = true;
        self
    }

    pub fn failing_food_items_after(mut self, n: usize) -> Self {
        self.faults.food_items_after = Some(n);
        self
    }

    pub fn snapshot(&self) -> Tables {
        self.tables.lock().unwrap().clone()
    }
}

#[async_trait]
impl IngestStore for MemoryStore {
    async fn device_owner(&self, key: &str) -> anyhow::Result<Option<Uuid>> {
        let t = self.tables.lock().unwrap();
        Ok(t.devices
            .iter()
            .find(|(mac, api_key, _)| {
                mac.eq_ignore_ascii_case(key) || api_key.as_deref() == Some(key)
            })
            .map(|(_, _, user)| *user))
    }

    async fn cached_barcode(&self, ean: &str) -> anyhow::Result<Option<FoodTypeId>> {
        Ok(self.tables.lock().unwrap().barcodes.get(ean).map(|(_, id)| *id))
    }

    async fn begin(&self) -> anyhow::Result<Box<dyn IngestUnit>> {
        Ok(Box::new(MemoryUnit {
            shared: self.tables.clone(),
            work: self.snapshot(),
            faults: self.faults,
            food_items_written: 0,
        }))
    }
}

pub struct MemoryUnit {
    shared: Arc<Mutex<Tables>>,
    work: Tables,
    faults: Faults,
    food_items_written: usize,
}

#[async_trait]
impl IngestUnit for MemoryUnit {
    async fn group_food_type(&mut self, code: i32) -> anyhow::Result<Option<FoodTypeId>> {
        Ok(self.work.groups.get(&code).copied())
    }

    async fn barcode_food_type(&mut self, ean: &str) -> anyhow::Result<Option<FoodTypeId>> {
        Ok(self.work.barcodes.get(ean).map(|(_, id)| *id))
    }

    async fn create_barcode_food_type(
        &mut self,
        ean: &str,
        facts: &NutritionFacts,
    ) -> anyhow::Result<FoodTypeId> {
        let id = self.work.next_id();
        self.work.food_types.push(StoredFoodType {
            id,
            per_gram: facts.per_gram(),
            origin: FoodOrigin::Barcode,
        });
        if self.faults.barcode_insert {
            bail!("barcode insert rejected");
        }
        self.work
            .barcodes
            .insert(ean.to_string(), (facts.name.clone(), id));
        Ok(id)
    }

    async fn insert_meal(&mut self, eaten_at: PrimitiveDateTime) -> anyhow::Result<MealId> {
        let id = self.work.next_id();
        self.work.meals.push((id, eaten_at));
        Ok(id)
    }

    async fn insert_dish(&mut self, meal_id: MealId) -> anyhow::Result<DishId> {
        if !self.work.meals.iter().any(|(id, _)| *id == meal_id) {
            bail!("dish references missing meal {meal_id}");
        }
        let id = self.work.next_id();
        self.work.dishes.push((id, meal_id));
        Ok(id)
    }

    async fn insert_food_item(&mut self, item: NewFoodItem) -> anyhow::Result<FoodItemId> {
        if self.faults.food_items_after == Some(self.food_items_written) {
            bail!("food item insert rejected");
        }
        if !self.work.dishes.iter().any(|(id, _)| *id == item.dish_id) {
            bail!("food item references missing dish {}", item.dish_id);
        }
        let id = self.work.next_id();
        self.work.food_items.push((id, item));
        self.food_items_written += 1;
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let MemoryUnit { shared, work, .. } = *self;
        *shared.lock().unwrap() = work;
        Ok(())
    }
}
