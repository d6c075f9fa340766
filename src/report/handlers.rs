use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{debug, error, instrument};

use super::dto::{ReportEntry, ReportQuery};
use super::repo::list_entries;
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/report", get(report))
}

/// GET /report?mac=&limit=&offset=
#[instrument(skip(state))]
pub async fn report(
    State(state): State<AppState>,
    Query(q): Query<ReportQuery>,
) -> Result<Json<Vec<ReportEntry>>, (StatusCode, String)> {
    let rows = list_entries(&state.db, q.mac(), q.limit(), q.offset())
        .await
        .map_err(|e| {
            error!(error = %e, "report query failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "report unavailable".into())
        })?;
    debug!(rows = rows.len(), "report rows");
    Ok(Json(rows.into_iter().map(ReportEntry::from).collect()))
}
