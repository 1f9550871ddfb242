//! Serve command handler
//!
//! Exposes `POST /api/generate`, the same route the browser client posts to.

use crate::cli::ServeArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use ecotips_core::{require_credential, ObservationRecord, ProviderCredential, TipGenerator};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Body of a generate request
#[derive(Debug, Deserialize)]
struct GenerateRequest {
    data: ObservationRecord,
    #[serde(default)]
    config: Option<ProviderCredential>,
}

/// Handle the serve command
#[instrument(skip(config, output))]
pub async fn handle_serve(args: ServeArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());

    let generator = TipGenerator::with_reqwest(config.providers.clone(), &config.http_client(None))?;
    let app = router(Arc::new(generator));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|e| Error::Server(format!("Failed to bind {}: {}", bind, e)))?;

    info!(bind = %bind, "Listening");
    output.success(&format!("Listening on http://{}", bind))?;
    output.info("POST /api/generate")?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Server(e.to_string()))
}

/// Router for the generate API
pub fn router(generator: Arc<TipGenerator>) -> Router {
    Router::new()
        .route("/api/generate", post(generate))
        .with_state(generator)
}

async fn generate(State(generator): State<Arc<TipGenerator>>, body: String) -> Response {
    // Parsed by hand so malformed bodies still get the error envelope
    let request: GenerateRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejected malformed generate request");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "リクエストの形式が正しくありません",
                    "details": e.to_string(),
                })),
            )
                .into_response();
        }
    };

    let result = match require_credential(request.config) {
        Ok(credential) => generator.generate(&request.data, &credential).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(tips) => Json(json!({ "tips": tips })).into_response(),
        Err(err) => {
            let status =
                StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                Json(json!({
                    "error": err.localized_message(),
                    "details": err.detail(),
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use ecotips_core::{AdapterSettings, HttpRequest, HttpResponse, HttpTransport};
    use serde_json::Value;
    use tower::ServiceExt;

    struct CannedTransport {
        status: u16,
        body: Value,
    }

    #[async_trait]
    impl HttpTransport for CannedTransport {
        async fn post_json(&self, _request: HttpRequest) -> ecotips_core::Result<HttpResponse> {
            Ok(HttpResponse::new(self.status, self.body.to_string()))
        }
    }

    fn app(status: u16, body: Value) -> Router {
        let transport = Arc::new(CannedTransport { status, body });
        router(Arc::new(TipGenerator::new(AdapterSettings::default(), transport)))
    }

    fn data() -> Value {
        json!({
            "electricity": 250.0,
            "water": 12000.0,
            "temperature": 28.5,
            "humidity": 70.0,
            "weather": "くもり",
            "people": 3,
            "timestamp": "2025-06-01T09:00:00Z"
        })
    }

    async fn post(app: Router, body: String) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/generate")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_generate_returns_tips() {
        let completion = json!({
            "choices": [{"message": {"content": "1. 照明を消す\n2. 外干しする"}}]
        });
        let body = json!({
            "data": data(),
            "config": {"type": "openai", "apiKey": "sk-test"}
        });

        let (status, value) = post(app(200, completion), body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value, json!({"tips": ["1. 照明を消す", "2. 外干しする"]}));
    }

    #[tokio::test]
    async fn test_missing_config_is_bad_request() {
        let body = json!({ "data": data() });

        let (status, value) = post(app(200, json!({})), body.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"], "APIの設定が必要です");
    }

    #[tokio::test]
    async fn test_gemini_without_project() {
        let body = json!({
            "data": data(),
            "config": {"type": "gemini", "apiKey": "ya29.token"}
        });

        let (status, value) = post(app(200, json!({})), body.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"], "APIの設定が必要です");
    }

    #[tokio::test]
    async fn test_rate_limit_status() {
        let error = json!({"error": {"message": "Rate limit reached", "type": "requests"}});
        let body = json!({
            "data": data(),
            "config": {"type": "openai", "apiKey": "sk-test"}
        });

        let (status, value) = post(app(429, error), body.to_string()).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(value["error"].as_str().unwrap().contains("利用制限"));
        assert!(value["details"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (status, value) = post(app(200, json!({})), "not json".to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"], "リクエストの形式が正しくありません");
    }
}
