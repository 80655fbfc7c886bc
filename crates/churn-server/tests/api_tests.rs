//! Integration tests for the churn server startup and API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use churn_lib::{ChurnError, ServiceMetrics, StructuredLogger};
use churn_server::{create_router, startup, AppState, ServerConfig};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn preprocessing() -> Value {
    json!({
        "numeric": [
            {"min": 10.0, "max": 60.0},
            {"min": 0.0, "max": 300.0},
            {"min": 0.0, "max": 100.0},
            {"min": 0.0, "max": 1.0}
        ],
        "categorical": [
            {"column": "gender", "categories": ["Female", "Male", "Other"], "drop_first": true},
            {"column": "country", "categories": ["CA", "DE", "US"], "drop_first": true},
            {"column": "subscription_type", "categories": ["Family", "Free", "Premium", "Student"], "drop_first": true},
            {"column": "device_type", "categories": ["Desktop", "Mobile", "Web"], "drop_first": true}
        ]
    })
}

/// sigmoid(4 * skip_rate - 2)
fn logistic_artifact() -> Value {
    let mut coefficients = vec![0.0; 16];
    coefficients[3] = 4.0;
    json!({
        "format_version": 1,
        "preprocessing": preprocessing(),
        "estimator": {"kind": "logistic", "coefficients": coefficients, "intercept": -2.0}
    })
}

fn forest_artifact() -> Value {
    let stump = |threshold: f64, left: f64, right: f64| {
        json!({"nodes": [
            {"node": "split", "feature": 3, "threshold": threshold, "left": 1, "right": 2},
            {"node": "leaf", "value": left},
            {"node": "leaf", "value": right}
        ]})
    };
    json!({
        "format_version": 1,
        "preprocessing": preprocessing(),
        "estimator": {
            "kind": "tree_ensemble",
            "aggregation": {"method": "mean_probability"},
            "trees": [stump(0.5, 0.2, 0.8), stump(0.7, 0.0, 1.0)]
        }
    })
}

fn boosted_artifact() -> Value {
    json!({
        "format_version": 1,
        "preprocessing": preprocessing(),
        "estimator": {
            "kind": "tree_ensemble",
            "aggregation": {"method": "logit_sum", "base_score": -0.5, "learning_rate": 0.1},
            "trees": [{"nodes": [
                {"node": "split", "feature": 14, "threshold": 0.5, "left": 1, "right": 2},
                {"node": "leaf", "value": -1.0},
                {"node": "leaf", "value": 3.0}
            ]}]
        },
        "quantiles": {"skip_rate_q75": 0.9, "listening_time_q25": 10.0, "age_q70": 20.0}
    })
}

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

fn write_dataset(path: &Path) {
    let mut csv = String::from(
        "user_id,gender,age,country,subscription_type,listening_time,songs_played_per_day,skip_rate,device_type,ads_listened_per_week,offline_listening,is_churned\n",
    );
    for i in 1..=20u32 {
        csv.push_str(&format!(
            "{},Male,{},US,Free,{},{},{:.2},Mobile,0,1,{}\n",
            i,
            15 + i * 2,
            i * 15,
            i,
            i as f64 * 0.03,
            i % 2
        ));
    }
    fs::write(path, csv).unwrap();
}

struct Fixture {
    _dir: TempDir,
    config: ServerConfig,
}

fn fixture(with_xgb: bool) -> Fixture {
    let dir = TempDir::new().unwrap();
    let artifacts = dir.path().join("artifacts");
    fs::create_dir(&artifacts).unwrap();
    let dataset = dir.path().join("spotify_churn_dataset.csv");

    write_dataset(&dataset);
    write_json(&artifacts.join("churn_model_LG.json"), &logistic_artifact());
    write_json(&artifacts.join("churn_model_RF.json"), &forest_artifact());
    write_json(&artifacts.join("churn_model_GB.json"), &boosted_artifact());
    if with_xgb {
        write_json(&artifacts.join("churn_model_XGB.json"), &boosted_artifact());
    }

    let config = ServerConfig {
        dataset_path: dataset,
        artifacts_dir: artifacts,
        ..ServerConfig::default()
    };
    Fixture { _dir: dir, config }
}

fn setup_test_app(with_xgb: bool) -> (Router, Arc<AppState>) {
    let fixture = fixture(with_xgb);
    let metrics = ServiceMetrics::new();
    let logger = StructuredLogger::new("test-instance");

    let service = startup::initialize(&fixture.config, &logger, &metrics).unwrap();
    let state = Arc::new(AppState::new(service, metrics, logger));
    (create_router(state.clone()), state)
}

fn churn_request(skip_rate: f64) -> Value {
    json!({
        "age": 30,
        "listening_time": 5,
        "songs_played_per_day": 10,
        "skip_rate": skip_rate,
        "gender": "Male",
        "country": "US",
        "subscription_type": "Free",
        "device_type": "Mobile"
    })
}

fn post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_returns_fixed_ok() {
    let (app, _state) = setup_test_app(false);

    let (status, body) = send_json(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_predict_uses_logistic_model_by_default() {
    let (app, _state) = setup_test_app(false);

    let (status, body) = send_json(&app, post("/predict_churn", &churn_request(0.9))).await;

    assert_eq!(status, StatusCode::OK);
    let probability = body["churn_probability"].as_f64().unwrap();
    // sigmoid(4 * 0.9 - 2)
    let expected = 1.0 / (1.0 + (-1.6f64).exp());
    assert!((probability - expected).abs() < 1e-12);
    assert_eq!(body["churn_label"], 1);
}

#[tokio::test]
async fn test_probability_of_exactly_half_labels_churn() {
    let (app, _state) = setup_test_app(false);

    let (status, body) = send_json(&app, post("/predict_churn?model_type=lg", &churn_request(0.5))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["churn_probability"].as_f64().unwrap(), 0.5);
    assert_eq!(body["churn_label"], 1);
}

#[tokio::test]
async fn test_model_type_is_case_insensitive() {
    let (app, _state) = setup_test_app(false);

    for model_type in ["rf", "RF", "Rf"] {
        let uri = format!("/predict_churn?model_type={}", model_type);
        let (status, body) = send_json(&app, post(&uri, &churn_request(0.6))).await;

        assert_eq!(status, StatusCode::OK, "model_type {}", model_type);
        assert!((body["churn_probability"].as_f64().unwrap() - 0.4).abs() < 1e-12);
        assert_eq!(body["churn_label"], 0);
    }
}

#[tokio::test]
async fn test_unknown_model_lists_loaded_keys() {
    let (app, state) = setup_test_app(false);

    for model_type in ["xgb", "svm"] {
        let uri = format!("/predict_churn?model_type={}", model_type);
        let (status, body) = send_json(&app, post(&uri, &churn_request(0.6))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Invalid model type. Use one of: lg, rf, gb");

        let reported: HashSet<String> = body["available_models"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        let loaded: HashSet<String> = state.service.available_keys().into_iter().collect();
        assert_eq!(reported, loaded);
    }
}

#[tokio::test]
async fn test_padded_model_type_rejected() {
    let (app, _state) = setup_test_app(false);

    let (status, body) = send_json(&app, post("/predict_churn?model_type=%20lg%20", &churn_request(0.6))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["available_models"].is_array());
}

#[tokio::test]
async fn test_optional_model_served_when_present() {
    let (app, state) = setup_test_app(true);

    assert_eq!(state.service.available_keys(), vec!["lg", "rf", "gb", "xgb"]);
    let (status, body) = send_json(&app, post("/predict_churn?model_type=XGB", &churn_request(0.9))).await;

    assert_eq!(status, StatusCode::OK);
    let probability = body["churn_probability"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&probability));
}

#[tokio::test]
async fn test_out_of_range_skip_rate_rejected() {
    let (app, _state) = setup_test_app(false);

    let (status, body) = send_json(&app, post("/predict_churn", &churn_request(1.5))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("skip_rate"));
}

#[tokio::test]
async fn test_malformed_fields_rejected() {
    let (app, _state) = setup_test_app(false);

    let mut bad_gender = churn_request(0.3);
    bad_gender["gender"] = json!("Unknown");
    let mut negative_age = churn_request(0.3);
    negative_age["age"] = json!(-1);
    let mut missing_device = churn_request(0.3);
    missing_device.as_object_mut().unwrap().remove("device_type");

    for body in [bad_gender, negative_age, missing_device] {
        let (status, response) = send_json(&app, post("/predict_churn", &body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "accepted {}", body);
        assert!(response["detail"].is_string());
    }
}

#[tokio::test]
async fn test_empty_country_accepted() {
    let (app, _state) = setup_test_app(false);

    let mut body = churn_request(0.9);
    body["country"] = json!("");
    let (status, response) = send_json(&app, post("/predict_churn", &body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["churn_label"], 1);
}

#[tokio::test]
async fn test_malformed_query_returns_json_detail() {
    let (app, _state) = setup_test_app(false);

    let (status, body) = send(
        &app,
        post("/predict_churn?model_type=lg&model_type=rf", &churn_request(0.3)),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["detail"].as_str().unwrap().contains("model_type"));
}

#[tokio::test]
async fn test_models_endpoint_lists_loaded_models() {
    let (app, _state) = setup_test_app(false);

    let (status, body) = send_json(&app, get("/models")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["default"], "lg");
    let models = body["models"].as_array().unwrap();
    let keys: Vec<&str> = models.iter().map(|m| m["key"].as_str().unwrap()).collect();
    assert_eq!(keys, vec!["lg", "rf", "gb"]);
    assert_eq!(models[0]["estimator"], "logistic");
    assert_eq!(models[1]["estimator"], "tree_ensemble");
    assert!(models.iter().all(|m| m["checksum"].as_str().unwrap().len() == 64));
}

#[tokio::test]
async fn test_readyz_reports_quantiles() {
    let (app, state) = setup_test_app(false);

    let (status, body) = send_json(&app, get("/readyz")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
    assert_eq!(body["dataset_rows"], 20);
    let q = state.service.quantiles();
    assert_eq!(body["quantiles"]["age_q70"].as_f64().unwrap(), q.age_q70);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_predictions() {
    let (app, _state) = setup_test_app(false);

    let (status, _) = send(&app, post("/predict_churn?model_type=gb", &churn_request(0.2))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("churn_server_predictions_total"));
    assert!(text.contains("churn_server_models_loaded"));
}

#[test]
fn test_startup_fails_without_required_model() {
    let fixture = fixture(false);
    fs::remove_file(fixture.config.artifacts_dir.join("churn_model_RF.json")).unwrap();

    let err = startup::initialize(
        &fixture.config,
        &StructuredLogger::new("test-instance"),
        &ServiceMetrics::new(),
    )
    .err()
    .expect("startup must fail");

    let cause = err.downcast_ref::<ChurnError>().expect("churn error");
    assert!(matches!(cause, ChurnError::ModelUnavailable { key, .. } if key == "rf"));
}

#[test]
fn test_startup_fails_without_dataset() {
    let fixture = fixture(false);
    fs::remove_file(&fixture.config.dataset_path).unwrap();

    let err = startup::initialize(
        &fixture.config,
        &StructuredLogger::new("test-instance"),
        &ServiceMetrics::new(),
    )
    .err()
    .expect("startup must fail");

    let cause = err.downcast_ref::<ChurnError>().expect("churn error");
    assert!(matches!(cause, ChurnError::DataUnavailable { .. }));
}
