use std::net::SocketAddr;
use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use crate::state::AppState;
use crate::{ingest, report};

pub fn build_app(state: AppState) -> Router {
    // Expiry drops the handler future; an open unit of work rolls back with it.
    let timeout = TimeoutLayer::new(state.config.request_timeout());

    Router::new()
        .nest("/api/v1",
              Router::new()
                  .merge(ingest::router())
                  .merge(report::router())
                  .route("/health", get(|| async { "ok" }))
        )
        .with_state(state)
        .layer(timeout)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
        .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::{Request, StatusCode}};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::{AppConfig, NutritionApiConfig};
    use crate::nutrition::fake::FakeNutrition;
    use crate::nutrition::{OpenFoodFactsClient, PerGram};
    use crate::store::memory::MemoryStore;

    fn app() -> Router {
        build_app(AppState::fake(
            Arc::new(MemoryStore::default()),
            Arc::new(FakeNutrition::default()),
        ))
    }

    #[tokio::test]
    async fn health_is_ok() {
        let res = app()
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn ingestion_is_mounted_under_api_v1() {
        let res = app()
            .oneshot(
                Request::post("/api/v1/meals")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unresponsive_catalog_does_not_time_out_the_request() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let catalog_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let nutrition = NutritionApiConfig {
            base_url: catalog_url,
            timeout_secs: 1,
            max_retries: 3,
            initial_backoff_ms: 100,
            ..NutritionApiConfig::default()
        };
        let store = MemoryStore::default()
            .with_device("24:6F:28:AA:BB:CC", None, Uuid::new_v4())
            .with_group(3, PerGram { kcal_g: 0.39, prot_g: 0.04, lip_g: 0.002, carb_g: 0.05 });

        let mut state = AppState::fake(
            Arc::new(store.clone()),
            Arc::new(OpenFoodFactsClient::new(nutrition.clone()).unwrap()),
        );
        state.config = Arc::new(AppConfig {
            database_url: state.config.database_url.clone(),
            db_max_connections: 1,
            request_timeout_secs: 3,
            lookup_budget_secs: 1,
            nutrition,
        });

        let body = json!({
            "mac": "24:6F:28:AA:BB:CC",
            "comidas": [{ "fecha": 1700000000, "platos": [{ "alimentos": [
                { "grupo": 3, "peso": "150.0" },
                { "grupo": 50, "peso": "33.5", "ean": "111" }
            ] }] }]
        });
        let res = build_app(state)
            .oneshot(
                Request::post("/api/v1/meals")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["counts"]["food_items"], 1);
        assert_eq!(body["skipped"][0]["reason"]["kind"], "ExternalLookupFailed");
        assert_eq!(body["skipped"][0]["reason"]["detail"], "lookup deadline exceeded");
        assert_eq!(store.snapshot().food_items.len(), 1);
    }
}
