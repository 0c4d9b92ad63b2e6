use std::sync::Arc;

use axum::{extract::State, middleware, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};

use crate::{
    db::DB,
    errors::{handle_panic, method_not_allowed, on_error, route_not_found},
    metrics::{self, track_requests, Metrics},
    notes,
    state::AppState,
    Error, Result,
};

pub struct AppParams<Router>
where
    Router: FnOnce(AppState) -> axum::Router,
{
    pub db: DB,
    pub metrics: Arc<Metrics>,
    pub router: Router,
}

/// Builds the full application. Feature routes are served both at the root
/// and under `/api`.
pub fn create<R>(AppParams { db, metrics, router }: AppParams<R>) -> Router
where
    R: FnOnce(AppState) -> Router,
{
    let state = AppState {
        conn: db,
        metrics: metrics.clone(),
    };

    let api = router(state.clone());

    Router::new()
        .route("/__heartbeat__", get(heartbeat))
        .route("/__lbheartbeat__", get(lbheartbeat))
        .route("/metrics", get(metrics::scrape))
        .with_state(state)
        .merge(api.clone())
        .nest("/api", api)
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(metrics, track_requests))
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(on_error))
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
}

async fn heartbeat(State(db): State<DB>) -> Result<impl IntoResponse> {
    notes::ping(&db)
        .await
        .map_err(|e| Error::from(e).context("Store unavailable"))?;

    Ok(Json(json!({
        "status": "ok",
    })))
}

async fn lbheartbeat() -> impl IntoResponse {
    Json(json!({}))
}

#[cfg(test)]
mod tests {
    use std::{future::IntoFuture, sync::Arc};

    use axum::{
        http::{header, Method, StatusCode},
        routing::get,
        Router,
    };
    use serde_json::{json, Value};

    use crate::{
        db::init_test_db,
        errors::{ErrorResponse, Result},
        metrics::{Metrics, CONTENT_TYPE},
        notes::{self, NoteView},
        tests::{test_server, test_server_with},
    };

    #[tokio::test]
    async fn heartbeats() -> Result<()> {
        let db = init_test_db().await?;
        let server = test_server(db).await?;

        let response = server.get("/__heartbeat__").await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.json::<Value>(), json!({ "status": "ok" }));

        let response = server.get("/__lbheartbeat__").await;
        assert_eq!(response.status_code(), 200);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() -> Result<()> {
        let db = init_test_db().await?;
        let server = test_server(db).await?;

        let response = server.get("/nope").await;

        assert_eq!(response.status_code(), 404);
        assert_eq!(response.json::<ErrorResponse>().message, "Route not found");
        Ok(())
    }

    async fn boom() -> &'static str {
        panic!("boom")
    }

    #[tokio::test]
    async fn unsupported_method_is_json_405() -> Result<()> {
        let db = init_test_db().await?;
        let metrics = Arc::new(Metrics::new());
        let server = test_server_with(db, metrics.clone(), notes::router).await?;

        for path in ["/notes", "/api/notes", "/__heartbeat__"] {
            let response = server.patch(path).await;

            assert_eq!(response.status_code(), 405, "path: {path}");
            let error = response.json::<ErrorResponse>();
            assert_eq!(error.error, "method_not_allowed");
            assert_eq!(error.message, "Method not allowed");
            assert_eq!(metrics.requests(&Method::PATCH, path, StatusCode::METHOD_NOT_ALLOWED), 1);
        }
        Ok(())
    }

    #[tokio::test]
    async fn panics_become_500() -> Result<()> {
        let db = init_test_db().await?;
        let metrics = Arc::new(Metrics::new());
        let server = test_server_with(db, metrics.clone(), |_| Router::new().route("/boom", get(boom))).await?;

        let response = server.get("/boom").await;

        assert_eq!(response.status_code(), 500);
        let error = response.json::<ErrorResponse>();
        assert_eq!(error.message, "Something went wrong!");
        assert_eq!(error.error, "boom");
        assert_eq!(metrics.requests(&Method::GET, "/boom", StatusCode::INTERNAL_SERVER_ERROR), 1);
        Ok(())
    }

    #[tokio::test]
    async fn counts_requests_by_final_status() -> Result<()> {
        let db = init_test_db().await?;
        let metrics = Arc::new(Metrics::new());
        let server = test_server_with(db, metrics.clone(), notes::router).await?;

        let created = server
            .post("/notes")
            .json(&json!({ "title": "t", "content": "c" }))
            .await
            .json::<NoteView>();
        server.post("/notes").json(&json!({ "title": "t" })).await;
        server.post("/notes").json(&json!({ "title": "t" })).await;

        let path = format!("/notes/{}", created.id);
        server.delete(&path).await;
        server.get(&path).await;

        assert_eq!(metrics.requests(&Method::POST, "/notes", StatusCode::CREATED), 1);
        assert_eq!(metrics.requests(&Method::POST, "/notes", StatusCode::BAD_REQUEST), 2);
        assert_eq!(metrics.requests(&Method::DELETE, &path, StatusCode::OK), 1);
        assert_eq!(metrics.requests(&Method::GET, &path, StatusCode::NOT_FOUND), 1);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_requests_are_all_counted() -> Result<()> {
        let db = init_test_db().await?;
        let metrics = Arc::new(Metrics::new());
        let server = test_server_with(db, metrics.clone(), notes::router).await?;

        let requests = (0..50).map(|_| server.get("/notes").into_future());
        let responses = futures::future::join_all(requests).await;

        assert!(responses.iter().all(|r| r.status_code() == StatusCode::OK));
        assert_eq!(metrics.requests(&Method::GET, "/notes", StatusCode::OK), 50);
        Ok(())
    }

    #[tokio::test]
    async fn scrape_endpoint() -> Result<()> {
        let db = init_test_db().await?;
        let server = test_server(db).await?;

        server.get("/notes").await;
        server.get("/notes").await;

        let response = server.get("/metrics").await;

        assert_eq!(response.status_code(), 200);
        assert_eq!(response.header(header::CONTENT_TYPE), CONTENT_TYPE);
        assert!(response
            .text()
            .contains(r#"http_requests_total{method="GET",path="/notes",status_code="200"} 2"#));
        Ok(())
    }
}
