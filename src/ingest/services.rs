use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::dto::{barcodes, IngestReport, MealInput, SkippedItem, ValidatedPayload};
use super::errors::IngestError;
use crate::devices::resolve_device;
use crate::foods::{plan_barcodes, resolve_food_type, Resolution};
use crate::nutrition::NutritionClient;
use crate::store::{IngestStore, NewFoodItem};

pub async fn ingest_payload(
    store: &dyn IngestStore,
    nutrition: &dyn NutritionClient,
    lookup_budget: Duration,
    payload: &ValidatedPayload,
) -> Result<IngestReport, IngestError> {
    let user_id = resolve_device(store, &payload.device_key)
        .await?
        .ok_or(IngestError::UnknownDevice)?;
    ingest(store, nutrition, lookup_budget, user_id, &payload.meals).await
}

/// Persists the meal → dish → food item hierarchy for `user_id`.
///
/// Barcode data is gathered first, with no transaction open. The writes then
/// run in a single unit of work: food items whose type cannot be resolved are
/// skipped and reported, any storage failure discards everything.
#[instrument(skip(store, nutrition, meals), fields(meals = meals.len()))]
pub async fn ingest(
    store: &dyn IngestStore,
    nutrition: &dyn NutritionClient,
    lookup_budget: Duration,
    user_id: Uuid,
    meals: &[MealInput],
) -> Result<IngestReport, IngestError> {
    let plan = plan_barcodes(store, nutrition, &barcodes(meals), lookup_budget).await?;
    debug!(barcodes = plan.len(), "barcode plan ready");

    let mut unit = store.begin().await?;
    let mut report = IngestReport::default();

    for (m, meal) in meals.iter().enumerate() {
        let meal_id = unit.insert_meal(meal.eaten_at).await?;
        report.counts.meals += 1;

        for (d, dish) in meal.dishes.iter().enumerate() {
            let dish_id = unit.insert_dish(meal_id).await?;
            report.counts.dishes += 1;

            for (f, food) in dish.foods.iter().enumerate() {
                let food_type_id =
                    match resolve_food_type(unit.as_mut(), &plan, &food.source).await? {
                        Resolution::Resolved {
                            food_type_id,
                            created,
                        } => {
                            if created {
                                report.counts.new_barcodes += 1;
                            }
                            food_type_id
                        }
                        Resolution::Skipped(reason) => {
                            warn!(meal = m, dish = d, food = f, %reason, "food item skipped");
                            report.skipped.push(SkippedItem {
                                meal: m,
                                dish: d,
                                food: f,
                                reason,
                            });
                            continue;
                        }
                    };

                unit.insert_food_item(NewFoodItem {
                    weight_g: food.weight_g,
                    dish_id,
                    food_type_id,
                    user_id,
                })
                .await?;
                report.counts.food_items += 1;
            }
        }
    }

    unit.commit().await?;

    info!(
        %user_id,
        meals = report.counts.meals,
        dishes = report.counts.dishes,
        food_items = report.counts.food_items,
        new_barcodes = report.counts.new_barcodes,
        skipped = report.skipped.len(),
        "meals ingested"
    );
    Ok(report)
}
