//! Integration test: Server API endpoints

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use mushroom_lab::pipeline::PipelineConfig;
use mushroom_lab::server::{create_router, AppState, ServerConfig};
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "mushroom-lab-test-boundary";

fn test_app() -> axum::Router {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_upload_size: 10 * 1024 * 1024,
    };
    let pipeline = PipelineConfig::default().with_random_seed(0).with_min_rows(10);
    create_router(Arc::new(AppState::new(config, pipeline)))
}

fn mushroom_csv() -> String {
    let mut csv = String::from("odor,bruises,class\n");
    for i in 0..20 {
        if i % 2 == 0 {
            csv.push_str("n,t,e\n");
        } else {
            csv.push_str("f,f,p\n");
        }
    }
    csv
}

fn multipart_body(csv: Option<&str>, request: Option<&str>) -> String {
    let mut body = String::new();
    if let Some(csv) = csv {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"mushrooms.csv\"\r\nContent-Type: text/csv\r\n\r\n{csv}\r\n"
        ));
    }
    if let Some(request) = request {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"request\"\r\n\r\n{request}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

fn multipart_request(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = test_app()
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_rules_endpoint_lists_decision_list() {
    let response = test_app()
        .oneshot(Request::builder().uri("/api/rules").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["rules"].as_array().unwrap().len(), 6);
    assert_eq!(body["rules"][0]["position"], 1);
    assert_eq!(body["default_verdict"], "Poisonous");
}

#[tokio::test]
async fn test_classify_endpoint() {
    let request = json_request(
        "/api/classify",
        serde_json::json!({
            "odor": "n",
            "bruises": "t",
            "gill_color": "w",
            "cap_shape": "x",
            "cap_surface": "s",
            "cap_color": "w",
        }),
    );
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["verdict"], "Edible");
    assert_eq!(body["fallback"], false);
}

#[tokio::test]
async fn test_classify_rejects_unknown_token() {
    let request = json_request(
        "/api/classify",
        serde_json::json!({
            "odor": "z",
            "bruises": "t",
            "gill_color": "w",
            "cap_shape": "x",
            "cap_surface": "s",
            "cap_color": "w",
        }),
    );
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], true);
}

#[tokio::test]
async fn test_evaluate_endpoint() {
    let csv = mushroom_csv();
    let request = r#"{"params":{"family":"decision_tree","max_depth":3},"diagnostics":["confusion_matrix"]}"#;
    let response = test_app()
        .oneshot(multipart_request(
            "/api/evaluate",
            multipart_body(Some(&csv), Some(request)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["report"]["target"], "class");
    assert_eq!(body["report"]["predictions"].as_array().unwrap().len(), 20);
    assert_eq!(body["report"]["diagnostics"].as_array().unwrap().len(), 1);
    assert!(body["annotated_csv"].as_str().unwrap().contains("Prediction"));
}

#[tokio::test]
async fn test_evaluate_without_file_is_bad_request() {
    let response = test_app()
        .oneshot(multipart_request("/api/evaluate", multipart_body(None, None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_evaluate_rejects_out_of_range_parameters() {
    let csv = mushroom_csv();
    let request = r#"{"params":{"family":"knn","n_neighbors":50}}"#;
    let response = test_app()
        .oneshot(multipart_request(
            "/api/evaluate",
            multipart_body(Some(&csv), Some(request)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_compare_endpoint() {
    let csv = mushroom_csv();
    let response = test_app()
        .oneshot(multipart_request("/api/compare", multipart_body(Some(&csv), None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["comparison"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = test_app()
        .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"], true);
    assert!(body["message"].as_str().unwrap().starts_with("no such route"));
}
