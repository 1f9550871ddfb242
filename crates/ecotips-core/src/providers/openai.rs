//! OpenAI chat-completions adapter

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::{decode_success, validate_endpoint, TipProvider};
use crate::error::{Error, Result};
use crate::http::{
    create_auth_handler, AuthHandler, ErrorClassification, HttpError, HttpRequest, HttpResponse,
    HttpTransport,
};
use crate::prompt::{render_user_prompt, SYSTEM_PROMPT};
use crate::tips::{PostProcessOverrides, TipPostProcessor};
use crate::types::{ObservationRecord, ProviderCredential, ProviderKind, TipList};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// OpenAI adapter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    pub endpoint: String,
    pub model: String,
    pub temperature: f64,
    pub post_process: PostProcessOverrides,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            post_process: PostProcessOverrides::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Adapter for the OpenAI chat-completions API
pub struct OpenAIProvider {
    settings: OpenAISettings,
    auth: Box<dyn AuthHandler>,
    transport: Arc<dyn HttpTransport>,
    post_processor: TipPostProcessor,
}

impl OpenAIProvider {
    pub fn new(
        credential: &ProviderCredential,
        settings: OpenAISettings,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        validate_endpoint(ProviderKind::OpenAI, &settings.endpoint)?;
        let auth = create_auth_handler(credential);
        auth.validate_credentials()?;

        let post_processor =
            TipPostProcessor::for_provider(ProviderKind::OpenAI).merged(&settings.post_process);

        Ok(Self {
            settings,
            auth,
            transport,
            post_processor,
        })
    }

    fn build_request(&self, record: &ObservationRecord) -> Result<HttpRequest> {
        let user_prompt = render_user_prompt(record);
        let body = ChatCompletionRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: self.settings.temperature,
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
            return Err(classify_failure(HttpError::from_parts(response.status, response.body)));
        }

        let completion: ChatCompletionResponse = decode_success(ProviderKind::OpenAI, &response)?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| Error::UnexpectedFormat {
                provider: ProviderKind::OpenAI,
                detail: "response has no choices[0].message.content".to_string(),
            })?;

        Ok(self.post_processor.process(&content))
    }
}

/// Map a non-success OpenAI response onto an error kind
fn classify_failure(error: HttpError) -> Error {
    let message = format!(
        "OpenAI API error: {}",
        error.provider_message.as_deref().unwrap_or("Unknown error")
    );

    match error.classification {
        ErrorClassification::AuthenticationError => Error::Authentication {
            provider: ProviderKind::OpenAI,
            detail: message,
        },
        ErrorClassification::RateLimitError => Error::RateLimit {
            provider: ProviderKind::OpenAI,
            detail: message,
        },
        _ => Error::Transport {
            message,
            status_code: Some(error.status_code),
            source: Some(anyhow::Error::new(error)),
        },
    }
}

#[async_trait]
impl TipProvider for OpenAIProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn generate_tips(&self, record: &ObservationRecord) -> Result<TipList> {
        let request = self.build_request(record)?;
        tracing::debug!(model = %self.settings.model, url = %request.url, "Sending OpenAI chat completion");

        let response = self.transport.post_json(request).await?;
        self.parse_response(response)
    }
}
