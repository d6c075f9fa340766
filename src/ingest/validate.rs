use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use time::{OffsetDateTime, PrimitiveDateTime};

use super::dto::{
    DishInput, FoodInput, IngestRequest, MealInput, RawDish, RawFood, RawMeal, ValidatedPayload,
    Violation,
};
use crate::devices::pick_device_key;
use crate::foods::FoodSource;

lazy_static! {
    static ref EPOCH_RE: Regex = Regex::new(r"^[0-9]{1,10}$").unwrap();
    static ref GROUP_RE: Regex = Regex::new(r"^-?[0-9]+$").unwrap();
    static ref WEIGHT_RE: Regex = Regex::new(r"^[0-9]+\.[0-9]+$").unwrap();
    static ref EAN_RE: Regex = Regex::new(r"^[0-9]{1,20}$").unwrap();
}

#[derive(Default)]
struct Violations(Vec<Violation>);

impl Violations {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(Violation {
            field: field.into(),
            message: message.into(),
        });
    }
}

pub fn validate(
    header_key: Option<&str>,
    request: IngestRequest,
) -> Result<ValidatedPayload, Vec<Violation>> {
    let mut violations = Violations::default();

    let device_key = pick_device_key(
        header_key,
        request.mac.as_deref(),
        request.api_key.as_deref(),
    );
    if device_key.is_none() {
        violations.push("device_key", "device key is required (X-Device-Key header or mac)");
    }

    let meals: Vec<Option<MealInput>> = items(request.comidas, "comidas", "meal", &mut violations)
        .into_iter()
        .enumerate()
        .map(|(i, meal)| {
            let path = format!("comidas[{i}]");
            element::<RawMeal>(&path, meal, &mut violations)
                .and_then(|meal| validate_meal(&path, meal, &mut violations))
        })
        .collect();

    match device_key {
        Some(device_key) if violations.0.is_empty() => Ok(ValidatedPayload {
            device_key,
            meals: meals.into_iter().flatten().collect(),
        }),
        _ => Err(violations.0),
    }
}

fn validate_meal(path: &str, meal: RawMeal, v: &mut Violations) -> Option<MealInput> {
    let eaten_at = match meal.fecha.as_ref() {
        None => {
            v.push(format!("{path}.fecha"), "fecha is required");
            None
        }
        Some(raw) => {
            let parsed = textual(raw)
                .filter(|s| EPOCH_RE.is_match(s))
                .and_then(|s| s.parse::<i64>().ok())
                .and_then(epoch_to_utc);
            if parsed.is_none() {
                v.push(
                    format!("{path}.fecha"),
                    "fecha must be a Unix timestamp in whole seconds",
                );
            }
            parsed
        }
    };

    let dishes: Vec<Option<DishInput>> = items(meal.platos, &format!("{path}.platos"), "dish", v)
        .into_iter()
        .enumerate()
        .map(|(i, dish)| {
            let path = format!("{path}.platos[{i}]");
            element::<RawDish>(&path, dish, v).and_then(|dish| validate_dish(&path, dish, v))
        })
        .collect();

    Some(MealInput {
        eaten_at: eaten_at?,
        dishes: dishes.into_iter().collect::<Option<Vec<_>>>()?,
    })
}

fn validate_dish(path: &str, dish: RawDish, v: &mut Violations) -> Option<DishInput> {
    let foods: Vec<Option<FoodInput>> =
        items(dish.alimentos, &format!("{path}.alimentos"), "food item", v)
            .into_iter()
            .enumerate()
            .map(|(i, food)| {
                let path = format!("{path}.alimentos[{i}]");
                element::<RawFood>(&path, food, v).and_then(|food| validate_food(&path, food, v))
            })
            .collect();
    Some(DishInput {
        foods: foods.into_iter().collect::<Option<Vec<_>>>()?,
    })
}

fn validate_food(path: &str, food: RawFood, v: &mut Violations) -> Option<FoodInput> {
    let group = match food.grupo.as_ref() {
        None => {
            v.push(format!("{path}.grupo"), "grupo is required");
            None
        }
        Some(raw) => {
            let parsed = textual(raw)
                .filter(|s| GROUP_RE.is_match(s))
                .and_then(|s| s.parse::<i32>().ok());
            if parsed.is_none() {
                v.push(format!("{path}.grupo"), "grupo must be an integer");
            }
            parsed
        }
    };

    let weight = match food.peso.as_ref() {
        None => {
            v.push(format!("{path}.peso"), "peso is required");
            None
        }
        Some(raw) => {
            let parsed = textual(raw)
                .filter(|s| WEIGHT_RE.is_match(s))
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|w| w.is_finite());
            if parsed.is_none() {
                v.push(
                    format!("{path}.peso"),
                    "peso must be a decimal number of grams, e.g. \"12.5\"",
                );
            }
            parsed
        }
    };

    let ean = match food.ean {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(s)) if s.trim().is_empty() => Some(None),
        Some(Value::String(s)) if EAN_RE.is_match(s.trim()) => Some(Some(s.trim().to_string())),
        Some(_) => {
            v.push(format!("{path}.ean"), "ean must be a string of digits");
            None
        }
    };

    Some(FoodInput {
        weight_g: weight?,
        source: FoodSource::classify(group?, ean?),
    })
}

fn items(value: Option<Value>, path: &str, what: &str, v: &mut Violations) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) if !items.is_empty() => items,
        None | Some(Value::Null) | Some(Value::Array(_)) => {
            v.push(path, format!("at least one {what} is required"));
            Vec::new()
        }
        Some(_) => {
            v.push(path, format!("must be an array of {what}s"));
            Vec::new()
        }
    }
}

fn element<T: DeserializeOwned>(path: &str, value: Value, v: &mut Violations) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(raw) => Some(raw),
        Err(_) => {
            v.push(path, "must be an object");
            None
        }
    }
}

/// Textual form of a scalar, so numbers and strings are judged alike.
fn textual(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn epoch_to_utc(secs: i64) -> Option<PrimitiveDateTime> {
    let at = OffsetDateTime::from_unix_timestamp(secs).ok()?;
    Some(PrimitiveDateTime::new(at.date(), at.time()))
}
