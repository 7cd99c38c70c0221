use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::models::{MetricDataRequest, MetricDataResponse, MetricRequest, MetricsResponse};
use crate::service::MetricService;
use crate::{metrics, Result};

/// HTTP side port: health check, Prometheus exposition and JSON mirrors of the
/// metric operations.
pub fn router(service: MetricService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .route("/v1/metric/list", post(list_metrics))
        .route("/v1/metric/get_data", post(get_metric_data))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn prometheus_metrics() -> Result<impl IntoResponse> {
    let body = metrics::gather_text()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

async fn list_metrics(
    State(service): State<MetricService>,
    request: std::result::Result<Json<MetricRequest>, JsonRejection>,
) -> Result<Json<MetricsResponse>> {
    let Json(request) = request?;
    info!("HTTP: metric list");
    Ok(Json(service.list(request).await?))
}

async fn get_metric_data(
    State(service): State<MetricService>,
    request: std::result::Result<Json<MetricDataRequest>, JsonRejection>,
) -> Result<Json<MetricDataResponse>> {
    let Json(request) = request?;
    info!("HTTP: metric get_data");
    Ok(Json(service.get_data(request).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::MockConnector;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    async fn spawn() -> (String, Arc<MockConnector>) {
        let connector = Arc::new(MockConnector::default());
        let app = router(MetricService::new(connector.clone()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), connector)
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(MetricService::new(Arc::new(MockConnector::default())));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_prometheus_exposition() {
        metrics::init_metrics();
        let app = router(MetricService::new(Arc::new(MockConnector::default())));

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("plugin_up 1"));
    }

    #[tokio::test]
    async fn test_get_data_json_mirror() {
        let (base, _) = spawn().await;

        let response = reqwest::Client::new()
            .post(format!("{}/v1/metric/get_data", base))
            .json(&json!({
                "options": {},
                "secret_data": {},
                "resource": "/subscriptions/sub",
                "metric": "CPU",
                "start": "2024-01-01T00:00:00Z",
                "end": "2024-01-01T01:00:00Z"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), StatusCode::OK.as_u16());

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["metric"], json!("CPU"));
        assert_eq!(body["values"], json!([3.0, 1.0, 2.0]));
        assert_eq!(body["labels"][0], json!("2024-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn test_missing_field_is_bad_request() {
        let (base, connector) = spawn().await;

        let response = reqwest::Client::new()
            .post(format!("{}/v1/metric/list", base))
            .json(&json!({ "options": {}, "secret_data": {} }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), StatusCode::BAD_REQUEST.as_u16());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], json!("ERROR_REQUIRED_PARAMETER"));
        assert_eq!(connector.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mistyped_field_is_bad_request() {
        let (base, connector) = spawn().await;

        let response = reqwest::Client::new()
            .post(format!("{}/v1/metric/get_data", base))
            .json(&json!({
                "options": {},
                "secret_data": {},
                "resource": "/subscriptions/sub",
                "start": "2024-01-01T00:00:00Z",
                "end": "2024-01-01T01:00:00Z",
                "period": "300"
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), StatusCode::BAD_REQUEST.as_u16());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], json!("ERROR_INVALID_PARAMETER"));
        assert!(body["error"].as_str().unwrap().contains("period"));
        assert_eq!(connector.call_count(), 0);
    }
}
