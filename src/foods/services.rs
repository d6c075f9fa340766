use std::collections::HashMap;
use std::time::Duration;

use anyhow::bail;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use super::dto::{FoodSource, SkipReason};
use crate::nutrition::{NutritionClient, NutritionFacts};
use crate::store::{FoodTypeId, IngestStore, IngestUnit};

#[derive(Debug, Clone)]
enum BarcodeLookup {
    Cached(FoodTypeId),
    Found(NutritionFacts),
    NotFound,
    Failed(String),
}

#[derive(Debug, Default)]
pub struct BarcodePlan {
    lookups: HashMap<String, BarcodeLookup>,
}

impl BarcodePlan {
    pub fn len(&self) -> usize {
        self.lookups.len()
    }
}

pub const DEADLINE_EXCEEDED: &str = "lookup deadline exceeded";

/// Reads the barcode cache and asks the catalog about the misses, once per
/// distinct barcode. Runs with no transaction open. Catalog failures, and
/// lookups still pending when `budget` runs out, are recorded in the plan;
/// storage failures abort.
pub async fn plan_barcodes(
    store: &dyn IngestStore,
    nutrition: &dyn NutritionClient,
    eans: &[&str],
    budget: Duration,
) -> anyhow::Result<BarcodePlan> {
    let deadline = Instant::now() + budget;
    let mut plan = BarcodePlan::default();
    for &ean in eans {
        if plan.lookups.contains_key(ean) {
            continue;
        }
        let lookup = match store.cached_barcode(ean).await? {
            Some(id) => {
                debug!(%ean, food_type_id = id, "barcode cache hit");
                BarcodeLookup::Cached(id)
            }
            None if Instant::now() >= deadline => {
                warn!(%ean, "lookup budget spent, not asking the catalog");
                BarcodeLookup::Failed(DEADLINE_EXCEEDED.into())
            }
            None => match timeout_at(deadline, nutrition.fetch(ean)).await {
                Ok(Ok(Some(facts))) => BarcodeLookup::Found(facts),
                Ok(Ok(None)) => BarcodeLookup::NotFound,
                Ok(Err(e)) => {
                    warn!(%ean, error = %e, "nutrition lookup failed");
                    BarcodeLookup::Failed(e.to_string())
                }
                Err(_) => {
                    warn!(%ean, ?budget, "nutrition lookup cut off by deadline");
                    BarcodeLookup::Failed(DEADLINE_EXCEEDED.into())
                }
            },
        };
        plan.lookups.insert(ean.to_string(), lookup);
    }
    Ok(plan)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved {
        food_type_id: FoodTypeId,
        created: bool,
    },
    Skipped(SkipReason),
}

/// Maps a food item's source to a food type inside the request's unit of
/// work. The first reference to an uncached barcode creates its food type
/// and cache entry; later references in the same unit reuse them.
pub async fn resolve_food_type(
    unit: &mut dyn IngestUnit,
    plan: &BarcodePlan,
    source: &FoodSource,
) -> anyhow::Result<Resolution> {
    let ean = match source {
        FoodSource::Group(code) => {
            return Ok(match unit.group_food_type(*code).await? {
                Some(food_type_id) => Resolution::Resolved {
                    food_type_id,
                    created: false,
                },
                None => Resolution::Skipped(SkipReason::UnknownGroup { group: *code }),
            });
        }
        FoodSource::MissingBarcode => return Ok(Resolution::Skipped(SkipReason::MissingBarcode)),
        FoodSource::Barcode(ean) => ean,
    };

    if let Some(food_type_id) = unit.barcode_food_type(ean).await? {
        return Ok(Resolution::Resolved {
            food_type_id,
            created: false,
        });
    }

    let resolution = match plan.lookups.get(ean.as_str()) {
        Some(BarcodeLookup::Cached(food_type_id)) => Resolution::Resolved {
            food_type_id: *food_type_id,
            created: false,
        },
        Some(BarcodeLookup::Found(facts)) => {
            let food_type_id = unit.create_barcode_food_type(ean, facts).await?;
            info!(%ean, food_type_id, name = %facts.name, "new barcode food type");
            Resolution::Resolved {
                food_type_id,
                created: true,
            }
        }
        Some(BarcodeLookup::NotFound) => Resolution::Skipped(SkipReason::ExternalLookupFailed {
            ean: ean.clone(),
            detail: "product not found".into(),
        }),
        Some(BarcodeLookup::Failed(detail)) => {
            Resolution::Skipped(SkipReason::ExternalLookupFailed {
                ean: ean.clone(),
                detail: detail.clone(),
            })
        }
        None => bail!("barcode {ean} missing from lookup plan"),
    };
    Ok(resolution)
}
