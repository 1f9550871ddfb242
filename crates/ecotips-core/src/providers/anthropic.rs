//! Anthropic messages adapter

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::{decode_success, validate_endpoint, TipProvider};
use crate::error::{Error, Result};
use crate::http::{
    create_auth_handler, AuthHandler, HttpError, HttpRequest, HttpResponse, HttpTransport,
};
use crate::prompt::{render_user_prompt, SYSTEM_PROMPT};
use crate::tips::{PostProcessOverrides, TipPostProcessor};
use crate::types::{ObservationRecord, ProviderCredential, ProviderKind, TipList};

pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Anthropic adapter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicSettings {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub post_process: PostProcessOverrides,
}

impl Default for AnthropicSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            post_process: PostProcessOverrides::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<UserMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Option<Vec<ContentBlock>>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

/// Adapter for the Anthropic messages API
pub struct AnthropicProvider {
    settings: AnthropicSettings,
    auth: Box<dyn AuthHandler>,
    transport: Arc<dyn HttpTransport>,
    post_processor: TipPostProcessor,
}

impl AnthropicProvider {
    pub fn new(
        credential: &ProviderCredential,
        settings: AnthropicSettings,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        validate_endpoint(ProviderKind::Anthropic, &settings.endpoint)?;
        let auth = create_auth_handler(credential);
        auth.validate_credentials()?;

        let post_processor = TipPostProcessor::for_provider(ProviderKind::Anthropic)
            .merged(&settings.post_process);

        Ok(Self {
            settings,
            auth,
            transport,
            post_processor,
        })
    }

    fn build_request(&self, record: &ObservationRecord) -> Result<HttpRequest> {
        let user_prompt = render_user_prompt(record);
        let body = MessagesRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            system: SYSTEM_PROMPT,
            messages: vec![UserMessage {
                role: "user",
                content: &user_prompt,
            }],
        };

        let mut headers = HashMap::new();
        self.auth.apply_auth(&mut headers)?;

        Ok(HttpRequest {
            url: self.settings.endpoint.clone(),
            headers,
            body: serde_json::to_value(&body)?,
        })
    }

    fn parse_response(&self, response: HttpResponse) -> Result<TipList> {
        if !response.is_success() {
            let error = HttpError::from_parts(response.status, response.body);
            tracing::warn!(
                status = error.status_code,
                error_type = ?error.provider_code,
                "Anthropic API returned an error"
            );
            return Err(classify_failure(error));
        }

        let message: MessagesResponse = decode_success(ProviderKind::Anthropic, &response)?;
        let blocks = match message.content {
            Some(blocks) if !blocks.is_empty() => blocks,
            _ => {
                return Err(Error::UnexpectedFormat {
                    provider: ProviderKind::Anthropic,
                    detail: "Unexpected response format from Anthropic API".to_string(),
                })
            }
        };

        let text = blocks
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .unwrap_or_default();
        tracing::debug!(chars = text.chars().count(), "Anthropic API content received");

        Ok(self.post_processor.process(&text))
    }
}

/// Map a non-success Anthropic response onto an error kind by its error type
fn classify_failure(error: HttpError) -> Error {
    if error.has_code("authentication_error") {
        return Error::Authentication {
            provider: ProviderKind::Anthropic,
            detail: error.message_or_body(),
        };
    }
    if error.has_code("rate_limit_error") {
        return Error::RateLimit {
            provider: ProviderKind::Anthropic,
            detail: error.message_or_body(),
        };
    }

    let message = error
        .provider_message
        .clone()
        .unwrap_or_else(|| "エラーが発生しました".to_string());
    Error::Transport {
        message,
        status_code: Some(error.status_code),
        source: Some(anyhow::Error::new(error)),
    }
}

#[async_trait]
impl TipProvider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn generate_tips(&self, record: &ObservationRecord) -> Result<TipList> {
        let request = self.build_request(record)?;
        tracing::debug!(model = %self.settings.model, url = %request.url, "Sending Anthropic message");

        let response = self.transport.post_json(request).await?;
        self.parse_response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EcoMetrics;
    use chrono::Utc;

    struct Unreachable;

    #[async_trait]
    impl HttpTransport for Unreachable {
        async fn post_json(&self, _request: HttpRequest) -> Result<HttpResponse> {
            Err(Error::transport("network disabled in unit tests"))
        }
    }

    fn provider() -> AnthropicProvider {
        let credential = ProviderCredential::new(ProviderKind::Anthropic, "sk-ant-test");
        AnthropicProvider::new(&credential, AnthropicSettings::default(), Arc::new(Unreachable))
            .unwrap()
    }

    #[test]
    fn test_request_shape() {
        let record = ObservationRecord::new(
            EcoMetrics {
                electricity: 10.0,
                water: 200.0,
                temperature: 25.0,
                humidity: 60.0,
                weather: "晴れ".to_string(),
                people: 2,
            },
            Utc::now(),
        );
        let request = provider().build_request(&record).unwrap();

        assert_eq!(request.headers.get("x-api-key").unwrap(), "sk-ant-test");
        assert_eq!(request.headers.get("anthropic-version").unwrap(), "2023-06-01");
        assert_eq!(request.body["model"], DEFAULT_MODEL);
        assert_eq!(request.body["max_tokens"], 1024);
        assert_eq!(request.body["system"], SYSTEM_PROMPT);
        assert_eq!(request.body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(request.body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_rate_limit_classification() {
        let body = r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#;
        let err = provider()
            .parse_response(HttpResponse::new(429, body))
            .unwrap_err();

        assert!(matches!(err, Error::RateLimit { .. }));
        assert_eq!(
            err.localized_message(),
            "APIの利用制限に達しました。しばらく時間をおいて再度お試しください。"
        );
    }

    #[test]
    fn test_other_error_carries_provider_message() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let err = provider()
            .parse_response(HttpResponse::new(529, body))
            .unwrap_err();

        assert_eq!(err.localized_message(), "Overloaded");
        assert_eq!(err.http_status(), 529);
    }

    #[test]
    fn test_non_error_status_falls_back_to_500() {
        let body = r#"{"type":"error","error":{"type":"api_error","message":"moved"}}"#;
        let err = provider()
            .parse_response(HttpResponse::new(302, body))
            .unwrap_err();

        assert_eq!(err.localized_message(), "moved");
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn test_error_without_envelope_uses_generic_message() {
        let err = provider()
            .parse_response(HttpResponse::new(400, r#"{"detail":"nope"}"#))
            .unwrap_err();
        assert_eq!(err.localized_message(), "エラーが発生しました");
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_empty_content_is_unexpected_format() {
        let err = provider()
            .parse_response(HttpResponse::new(200, r#"{"content":[]}"#))
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedFormat { .. }));

        let err = provider()
            .parse_response(HttpResponse::new(200, r#"{"id":"msg_1"}"#))
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedFormat { .. }));
    }

    #[test]
    fn test_block_without_text_yields_no_tips() {
        let body = r#"{"content":[{"type":"tool_use","id":"t1"}]}"#;
        let tips = provider().parse_response(HttpResponse::new(200, body)).unwrap();
        assert!(tips.is_empty());
    }

    #[test]
    fn test_success_cleans_text() {
        let body = serde_json::json!({
            "content": [{"type": "text", "text": "'1. 照明を消す' +\n\n'2. 外干しする'\n"}]
        });
        let tips = provider()
            .parse_response(HttpResponse::new(200, body.to_string()))
            .unwrap();
        assert_eq!(tips.into_inner(), vec!["1. 照明を消す", "2. 外干しする"]);
    }
}
