#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use genrelay::config::WorkflowRoutes;
use genrelay::routes;
use genrelay::services::{HttpDispatcher, JobService, JobStore, UuidV4Ids};

pub const PUBLIC_URL: &str = "http://gateway.test";

/// Processore finto in ascolto su una porta locale.
///
/// `/image` accetta il lavoro e lo inoltra sul canale, `/broken` risponde 500.
pub struct FakeProcessor {
    pub base_url: String,
    pub received: mpsc::UnboundedReceiver<Value>,
}

pub async fn spawn_processor() -> FakeProcessor {
    let (tx, received) = mpsc::unbounded_channel();

    let app = Router::new()
        .route(
            "/image",
            post(move |Json(body): Json<Value>| {
                let tx = tx.clone();
                async move {
                    tx.send(body).ok();
                    StatusCode::OK
                }
            }),
        )
        .route(
            "/broken",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeProcessor {
        base_url: format!("http://{}", addr),
        received,
    }
}

/// App completa collegata al processore finto via HTTP
pub fn build_test_app(processor: &FakeProcessor) -> (Router, JobService) {
    let workflows: WorkflowRoutes = [
        ("IMAGE", format!("{}/image", processor.base_url)),
        ("BROKEN", format!("{}/broken", processor.base_url)),
        ("OFFLINE", "http://127.0.0.1:1/run".to_string()),
    ]
    .iter()
    .map(|(name, url)| (*name, url.as_str()))
    .collect();

    let dispatcher = HttpDispatcher::new(Duration::from_secs(5)).unwrap();
    let service = JobService::new(
        JobStore::shared(),
        Arc::new(dispatcher),
        Arc::new(UuidV4Ids),
        workflows,
        PUBLIC_URL,
    );

    (routes::create_router(service.clone()), service)
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

pub async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

/// Attende che il job lasci lo stato `Pending`
pub async fn wait_for_terminal(app: &Router, job_id: &str) -> Value {
    for _ in 0..100 {
        let (_, job) = send_json(app, get(&format!("/status/{}", job_id))).await;
        if job["state"] != "Pending" {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("job {} ancora pending", job_id);
}
