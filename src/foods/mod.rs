mod dto;
mod repo_types;
mod services;

pub use dto::{FoodSource, SkipReason};
pub use repo_types::FoodOrigin;
pub use services::{plan_barcodes, resolve_food_type, Resolution, DEADLINE_EXCEEDED};
