mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use common::*;

#[tokio::test]
async fn test_submit_poll_callback_end_to_end() {
    let mut processor = spawn_processor().await;
    let (app, _) = build_test_app(&processor);

    let (status, body) =
        send_json(&app, post_json("/generate", json!({ "workflow": "IMAGE", "prompt": "x" }))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let job_id = body["jobId"].as_str().unwrap().to_string();

    let (status, job) = send_json(&app, get(&format!("/status/{}", job_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["state"], "Pending");
    assert!(job.get("result").is_none());

    // Il processore riceve payload, jobId e callbackUrl
    let dispatched = processor.received.recv().await.unwrap();
    assert_eq!(dispatched["prompt"], "x");
    assert_eq!(dispatched["jobId"], job_id.as_str());
    assert_eq!(
        dispatched["callbackUrl"],
        format!("{}/callback/{}", PUBLIC_URL, job_id)
    );
    assert!(dispatched.get("workflow").is_none());

    let (status, ack) = send(
        &app,
        post_json(
            &format!("/callback/{}", job_id),
            json!({ "jobId": job_id, "imageUrls": ["http://x/1.png"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack, b"OK");

    let (status, job) = send_json(&app, get(&format!("/status/{}", job_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["state"], "Completed");
    assert_eq!(job["result"], json!(["http://x/1.png"]));
    assert!(job.get("error").is_none());
}

#[tokio::test]
async fn test_unknown_workflow_is_rejected() {
    let processor = spawn_processor().await;
    let (app, service) = build_test_app(&processor);

    let (status, body) =
        send_json(&app, post_json("/generate", json!({ "workflow": "AUDIO", "prompt": "x" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("AUDIO"));
    assert!(service.store().is_empty().await);
}

#[tokio::test]
async fn test_missing_workflow_is_bad_request() {
    let processor = spawn_processor().await;
    let (app, service) = build_test_app(&processor);

    let (status, body) = send_json(&app, post_json("/generate", json!({ "prompt": "x" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
    assert!(service.store().is_empty().await);
}

#[tokio::test]
async fn test_status_of_unknown_job_is_404() {
    let processor = spawn_processor().await;
    let (app, _) = build_test_app(&processor);

    let (status, body) = send_json(&app, get("/status/never-submitted")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_callback_for_unknown_job_is_acknowledged() {
    let processor = spawn_processor().await;
    let (app, service) = build_test_app(&processor);

    let (status, ack) = send(
        &app,
        post_json("/callback/ghost", json!({ "imageUrls": ["http://x/1.png"] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack, b"OK");
    assert!(service.store().get("ghost").await.is_none());

    let (status, _) = send_json(&app, get("/status/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_callback_with_json_string_result() {
    let processor = spawn_processor().await;
    let (app, _) = build_test_app(&processor);

    let (_, body) =
        send_json(&app, post_json("/generate", json!({ "workflow": "image" }))).await;
    let job_id = body["jobId"].as_str().unwrap().to_string();

    send(
        &app,
        post_json(
            &format!("/callback/{}", job_id),
            json!({ "imageUrls": "[\"a\",\"b\"]", "finalPrompt": "x, detailed" }),
        ),
    )
    .await;

    let (_, job) = send_json(&app, get(&format!("/status/{}", job_id))).await;
    assert_eq!(job["state"], "Completed");
    assert_eq!(job["result"], json!(["a", "b"]));
    assert_eq!(job["finalPrompt"], "x, detailed");
}

#[tokio::test]
async fn test_callback_with_unparseable_result_completes_empty() {
    let processor = spawn_processor().await;
    let (app, _) = build_test_app(&processor);

    let (_, body) = send_json(&app, post_json("/generate", json!({ "workflow": "IMAGE" }))).await;
    let job_id = body["jobId"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        post_json(
            &format!("/callback/{}", job_id),
            json!({ "imageUrls": "definitely not json" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, job) = send_json(&app, get(&format!("/status/{}", job_id))).await;
    assert_eq!(job["state"], "Completed");
    assert_eq!(job["result"], json!([]));
}

#[tokio::test]
async fn test_callback_with_garbage_body_is_acknowledged() {
    let processor = spawn_processor().await;
    let (app, _) = build_test_app(&processor);

    let (_, body) = send_json(&app, post_json("/generate", json!({ "workflow": "IMAGE" }))).await;
    let job_id = body["jobId"].as_str().unwrap().to_string();

    let request = Request::post(format!("/callback/{}", job_id))
        .header("content-type", "text/plain")
        .body(Body::from("<<<"))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let (_, job) = send_json(&app, get(&format!("/status/{}", job_id))).await;
    assert_eq!(job["state"], "Completed");
    assert_eq!(job["result"], json!([]));
}

#[tokio::test]
async fn test_callback_error_then_late_success_keeps_failure() {
    let processor = spawn_processor().await;
    let (app, _) = build_test_app(&processor);

    let (_, body) = send_json(&app, post_json("/generate", json!({ "workflow": "IMAGE" }))).await;
    let job_id = body["jobId"].as_str().unwrap().to_string();
    let callback = format!("/callback/{}", job_id);

    send(&app, post_json(&callback, json!({ "error": "sampler diverged" }))).await;
    let (status, _) = send(
        &app,
        post_json(&callback, json!({ "imageUrls": ["http://x/late.png"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, job) = send_json(&app, get(&format!("/status/{}", job_id))).await;
    assert_eq!(job["state"], "Failed");
    assert_eq!(job["error"], "sampler diverged");
    assert!(job.get("result").is_none());
}

#[tokio::test]
async fn test_rejected_dispatch_fails_job() {
    let processor = spawn_processor().await;
    let (app, _) = build_test_app(&processor);

    let (status, body) =
        send_json(&app, post_json("/generate", json!({ "workflow": "BROKEN" }))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let job_id = body["jobId"].as_str().unwrap().to_string();

    let job = wait_for_terminal(&app, &job_id).await;
    assert_eq!(job["state"], "Failed");
    assert_eq!(job["error"], "Dispatch to workflow processor failed");
}

#[tokio::test]
async fn test_unreachable_processor_fails_job() {
    let processor = spawn_processor().await;
    let (app, _) = build_test_app(&processor);

    let (status, body) =
        send_json(&app, post_json("/generate", json!({ "workflow": "OFFLINE" }))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let job_id = body["jobId"].as_str().unwrap().to_string();

    let job = wait_for_terminal(&app, &job_id).await;
    assert_eq!(job["state"], "Failed");
}

#[tokio::test]
async fn test_health_reports_jobs_and_workflows() {
    let processor = spawn_processor().await;
    let (app, _) = build_test_app(&processor);

    send_json(&app, post_json("/generate", json!({ "workflow": "IMAGE" }))).await;
    let (status, body) = send_json(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["jobs"], 1);
    assert_eq!(body["workflows"], json!(["BROKEN", "IMAGE", "OFFLINE"]));
}
