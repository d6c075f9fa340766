mod dto;
mod errors;
pub mod handlers;
mod services;
mod validate;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::ingest_routes())
}
