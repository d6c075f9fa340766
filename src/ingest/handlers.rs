use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};

use super::dto::{IngestRequest, IngestResponse, Violation};
use super::errors::IngestError;
use super::services::ingest_payload;
use super::validate::validate;
use crate::{devices::DeviceKeyHeader, state::AppState};

pub fn ingest_routes() -> Router<AppState> {
    Router::new().route("/meals", post(ingest_meals))
}

/// POST /meals
/// Body: { mac?, api_key?, comidas: [{ fecha, platos: [{ alimentos: [{ grupo, peso, ean? }] }] }] }
#[instrument(skip(state, header, body))]
pub async fn ingest_meals(
    State(state): State<AppState>,
    DeviceKeyHeader(header): DeviceKeyHeader,
    body: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<IngestResponse>, IngestError> {
    let Json(request) = body.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "unreadable ingestion body");
        IngestError::Validation(vec![Violation {
            field: "body".into(),
            message: rejection.body_text(),
        }])
    })?;

    let payload = validate(header.as_deref(), request).map_err(|violations| {
        warn!(count = violations.len(), "ingestion payload rejected");
        IngestError::Validation(violations)
    })?;

    let report = ingest_payload(
        state.store.as_ref(),
        state.nutrition.as_ref(),
        state.config.lookup_budget(),
        &payload,
    )
    .await?;
    Ok(Json(report.into()))
}
