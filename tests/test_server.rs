//! Integration test: server API endpoints

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use polars::prelude::*;
use tower::ServiceExt;

use telemark::data::ReferenceDataset;
use telemark::model::{ClassifierArtifact, ClassifierModel, TreeNode};
use telemark::predictor::Predictor;
use telemark::server::{create_router, AppState, ServerError};

fn test_app() -> axum::Router {
    let df = df!(
        "job" => &["management", "technician", "blue-collar", "admin."],
        "marital" => &["married", "single", "divorced", "married"],
        "education_qual" => &["tertiary", "secondary", "primary", "unknown"],
        "call_type" => &["cellular", "telephone", "unknown", "cellular"],
        "prev_outcome" => &["success", "failure", "unknown", "other"],
        "mon" => &["may", "jun", "jul", "aug"],
        "age" => &[35i64, 42, 58, 61],
        "day" => &[15i64, 3, 21, 8],
        "dur" => &[300i64, 120, 45, 600],
        "num_calls" => &[2i64, 1, 5, 3],
        "y" => &["yes", "no", "no", "yes"],
    )
    .unwrap();
    let dataset = ReferenceDataset::from_dataframe(df).unwrap();

    // Split on dur (index 8): calls longer than 200 seconds predict "yes".
    let artifact = ClassifierArtifact::new(ClassifierModel::DecisionTree {
        root: TreeNode::Split {
            feature_idx: 8,
            threshold: 200.0,
            left: Box::new(TreeNode::Leaf { value: 0.0, n_samples: 60 }),
            right: Box::new(TreeNode::Leaf { value: 1.0, n_samples: 40 }),
        },
    });

    let predictor = Predictor::from_parts(artifact, &dataset).unwrap();
    let state = Arc::new(AppState::new(predictor, chrono::Utc::now()));
    create_router(state)
}

fn predict_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn selections_json(dur: i64, job: &str) -> serde_json::Value {
    serde_json::json!({
        "job": job,
        "marital": "married",
        "education_qual": "tertiary",
        "call_type": "cellular",
        "prev_outcome": "success",
        "mon": "may",
        "age": 35,
        "day": 15,
        "dur": dur,
        "num_calls": 2,
    })
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 64).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["uptime_secs"].is_number());
}

#[tokio::test]
async fn test_schema_endpoint() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/schema")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let categorical = body["categorical"].as_array().unwrap();
    assert_eq!(categorical.len(), 6);
    let job = categorical.iter().find(|f| f["name"] == "job").unwrap();
    assert_eq!(
        job["options"],
        serde_json::json!(["admin.", "blue-collar", "management", "technician"])
    );

    let numeric = body["numeric"].as_array().unwrap();
    assert_eq!(numeric.len(), 4);
    let age = numeric.iter().find(|f| f["name"] == "age").unwrap();
    assert_eq!(age["min"], 0);
    assert_eq!(age["max"], 100);
    assert_eq!(age["default"], 30);
}

#[tokio::test]
async fn test_predict_both_outcomes() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(predict_request(selections_json(300, "management")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["prediction"], 1);
    assert_eq!(body["label"], "yes");
    assert_eq!(body["message"], "The customer will subscribe to the insurance.");

    let response = app
        .oneshot(predict_request(selections_json(60, "management")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["label"], "no");
    assert_eq!(body["message"], "The customer will not subscribe to the insurance.");
}

#[tokio::test]
async fn test_predict_unknown_label_returns_400_envelope() {
    let app = test_app();
    let response = app
        .oneshot(predict_request(selections_json(300, "astronaut")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], true);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("astronaut"), "message was: {}", message);
    assert!(message.contains("job"), "message was: {}", message);
}

#[tokio::test]
async fn test_predict_out_of_range_numeric_returns_400() {
    let app = test_app();
    let mut selections = selections_json(300, "management");
    selections["age"] = serde_json::json!(140);
    let response = app.oneshot(predict_request(selections)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], true);
    assert!(body["message"].as_str().unwrap().contains("age"));
}

#[tokio::test]
async fn test_internal_error_body_is_masked() {
    // Fatal errors must not leak their detail to the client.
    let response = ServerError::Internal("tree split references feature index 37".to_string())
        .into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert_eq!(body["error"], true);
    assert_eq!(body["message"], "Prediction unavailable");
}

#[tokio::test]
async fn test_root_serves_html() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Insurance Subscription Prediction"));
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/models")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(response).await;
    assert_eq!(body["error"], true);
}
