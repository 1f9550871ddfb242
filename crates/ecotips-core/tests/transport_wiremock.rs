//! End-to-end adapter tests over the reqwest transport
//!
//! A wiremock server stands in for each vendor API so the real HTTP stack,
//! headers and JSON bodies are exercised.


use ecotips_core::providers::{AnthropicSettings, GeminiSettings, OpenAISettings};
use ecotips_core::{
    AdapterSettings, ErrorKind, HttpClientConfig, HttpRequest, HttpTransport, ProviderCredential,
    ProviderKind, ReqwestTransport, TipGenerator,
};
use serde_json::json;
use test_support::{numbered_tips, sample_record};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn generator(settings: AdapterSettings) -> TipGenerator {
    TipGenerator::with_reqwest(settings, &HttpClientConfig::default()).unwrap()
}

#[tokio::test]
async fn test_openai_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-3.5-turbo"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": numbered_tips(3)}}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let settings = AdapterSettings {
        openai: OpenAISettings {
            endpoint: format!("{}/v1/chat/completions", mock_server.uri()),
            ..Default::default()
        },
        ..Default::default()
    };
    let credential = ProviderCredential::new(ProviderKind::OpenAI, "sk-test");

    let tips = generator(settings)
        .generate(&sample_record(), &credential)
        .await
        .unwrap();

    assert_eq!(tips.len(), 3);
    assert_eq!(tips.as_slice()[2], "3. 節約のヒント3");
}

#[tokio::test]
async fn test_anthropic_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({"max_tokens": 1024})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_01",
            "type": "message",
            "content": [{"type": "text", "text": "1. 照明を消す\n\n2. 外干しする"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let settings = AdapterSettings {
        anthropic: AnthropicSettings {
            endpoint: format!("{}/v1/messages", mock_server.uri()),
            ..Default::default()
        },
        ..Default::default()
    };
    let credential = ProviderCredential::new(ProviderKind::Anthropic, "sk-ant-test");

    let tips = generator(settings)
        .generate(&sample_record(), &credential)
        .await
        .unwrap();

    assert_eq!(tips.into_inner(), vec!["1. 照明を消す", "2. 外干しする"]);
}

#[tokio::test]
async fn test_gemini_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(
            "/v1/projects/eco-project/locations/us-central1/publishers/google/models/gemini-2.0-flash:generateContent",
        ))
        .and(header("Authorization", "Bearer ya29.token"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "Permission denied", "status": "PERMISSION_DENIED"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let settings = AdapterSettings {
        gemini: GeminiSettings {
            base_url: Some(mock_server.uri()),
            ..Default::default()
        },
        ..Default::default()
    };
    let credential =
        ProviderCredential::new(ProviderKind::Gemini, "ya29.token").with_project_id("eco-project");

    let err = generator(settings)
        .generate(&sample_record(), &credential)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let settings = AdapterSettings {
        openai: OpenAISettings {
            endpoint: mock_server.uri(),
            ..Default::default()
        },
        ..Default::default()
    };
    let credential = ProviderCredential::new(ProviderKind::OpenAI, "sk-test");

    let err = generator(settings)
        .generate(&sample_record(), &credential)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TransportOrUnknown);
    assert_eq!(err.http_status(), 503);
    assert_eq!(err.localized_message(), "OpenAI API error: Unknown error");
}

#[tokio::test]
async fn test_transport_reports_status_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(header("x-custom", "1"))
        .respond_with(ResponseTemplate::new(418).set_body_string("teapot"))
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::with_default_config().unwrap();
    let mut request = HttpRequest::new(format!("{}/echo", mock_server.uri()), json!({"a": 1}));
    request.headers.insert("x-custom".to_string(), "1".to_string());

    let response = transport.post_json(request).await.unwrap();

    assert_eq!(response.status, 418);
    assert_eq!(response.body, "teapot");
    assert!(!response.is_success());
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    let settings = AdapterSettings {
        openai: OpenAISettings {
            endpoint: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    let credential = ProviderCredential::new(ProviderKind::OpenAI, "sk-test");

    let err = generator(settings)
        .generate(&sample_record(), &credential)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TransportOrUnknown);
    assert_eq!(err.http_status(), 500);
}
