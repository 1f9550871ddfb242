//! Gemini adapter for Vertex AI `generateContent`

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
use crate::prompt::render_combined_prompt;
use crate::tips::{PostProcessOverrides, TipPostProcessor};
use crate::types::{ObservationRecord, ProviderCredential, ProviderKind, TipList};

pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Gemini adapter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    /// Overrides `https://{location}-aiplatform.googleapis.com`
    pub base_url: Option<String>,
    pub location: String,
    pub model: String,
    pub temperature: Option<f64>,
    pub post_process: PostProcessOverrides,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            location: DEFAULT_LOCATION.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            post_process: PostProcessOverrides::default(),
        }
    }
}

impl GeminiSettings {
    /// Full `generateContent` URL for a project
    pub fn endpoint_for(&self, project_id: &str) -> String {
        let base = match &self.base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.location),
        };
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            base, project_id, self.location, self.model
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Adapter for Gemini models served by Vertex AI
pub struct GeminiProvider {
    settings: GeminiSettings,
    endpoint: String,
    auth: Box<dyn AuthHandler>,
    transport: Arc<dyn HttpTransport>,
    post_processor: TipPostProcessor,
}

impl GeminiProvider {
    pub fn new(
        credential: &ProviderCredential,
        settings: GeminiSettings,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        let project_id = credential.project_id().ok_or_else(|| {
            Error::configuration("Gemini requires a project id alongside the access token")
        })?;
        let endpoint = settings.endpoint_for(project_id);
        validate_endpoint(ProviderKind::Gemini, &endpoint)?;

        let auth = create_auth_handler(credential);
        auth.validate_credentials()?;

        let post_processor =
            TipPostProcessor::for_provider(ProviderKind::Gemini).merged(&settings.post_process);

        Ok(Self {
            settings,
            endpoint,
            auth,
            transport,
            post_processor,
        })
    }

    fn build_request(&self, record: &ObservationRecord) -> Result<HttpRequest> {
        let prompt = render_combined_prompt(record);
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: &prompt }],
            }],
            generation_config: self
                .settings
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        };

        let mut headers = HashMap::new();
        self.auth.apply_auth(&mut headers)?;

        Ok(HttpRequest {
            url: self.endpoint.clone(),
            headers,
            body: serde_json::to_value(&body)?,
        })
    }

    fn parse_response(&self, response: HttpResponse) -> Result<TipList> {
        if !response.is_success() {
            return Err(classify_failure(HttpError::from_parts(response.status, response.body)));
        }

        let generated: GenerateContentResponse = decode_success(ProviderKind::Gemini, &response)?;
        let block_reason = generated
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason);

        let parts = generated
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default();

        let texts: Vec<String> = parts.into_iter().filter_map(|part| part.text).collect();
        if texts.is_empty() {
            let detail = match block_reason {
                Some(reason) => format!("no candidate text (blocked: {})", reason),
                None => "no candidate text".to_string(),
            };
            return Err(Error::UnexpectedFormat {
                provider: ProviderKind::Gemini,
                detail,
            });
        }

        Ok(self.post_processor.process(&texts.concat()))
    }
}

/// Map a non-success Vertex AI response onto an error kind
///
/// Google reports both an HTTP status and a canonical status string; either
/// one is enough to classify.
fn classify_failure(error: HttpError) -> Error {
    let message = format!(
        "Gemini API error: {}",
        error.provider_message.as_deref().unwrap_or("Unknown error")
    );

    let is_auth = error.classification == ErrorClassification::AuthenticationError
        || error.has_code("UNAUTHENTICATED")
        || error.has_code("PERMISSION_DENIED");
    let is_rate_limited = error.classification == ErrorClassification::RateLimitError
        || error.has_code("RESOURCE_EXHAUSTED");

    if is_auth {
        Error::Authentication {
            provider: ProviderKind::Gemini,
            detail: message,
        }
    } else if is_rate_limited {
        Error::RateLimit {
            provider: ProviderKind::Gemini,
            detail: message,
        }
    } else {
        Error::Transport {
            message,
            status_code: Some(error.status_code),
            source: Some(anyhow::Error::new(error)),
        }
    }
}

#[async_trait]
impl TipProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn generate_tips(&self, record: &ObservationRecord) -> Result<TipList> {
        let request = self.build_request(record)?;
        tracing::debug!(model = %self.settings.model, url = %request.url, "Sending Gemini generateContent");

        let response = self.transport.post_json(request).await?;
        self.parse_response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::SYSTEM_PROMPT;
    use crate::types::EcoMetrics;
    use chrono::Utc;

    struct Unreachable;

    #[async_trait]
    impl HttpTransport for Unreachable {
        async fn post_json(&self, _request: HttpRequest) -> Result<HttpResponse> {
            Err(Error::transport("network disabled in unit tests"))
        }
    }

    fn credential() -> ProviderCredential {
        ProviderCredential::new(ProviderKind::Gemini, "ya29.token").with_project_id("demo-project")
    }

    fn provider() -> GeminiProvider {
        GeminiProvider::new(&credential(), GeminiSettings::default(), Arc::new(Unreachable))
            .unwrap()
    }

    fn record() -> ObservationRecord {
        ObservationRecord::new(
            EcoMetrics {
                electricity: 10.0,
                water: 200.0,
                temperature: 25.0,
                humidity: 60.0,
                weather: "晴れ".to_string(),
                people: 2,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_endpoint_layout() {
        let settings = GeminiSettings::default();
        assert_eq!(
            settings.endpoint_for("demo-project"),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/demo-project/locations/us-central1/publishers/google/models/gemini-2.0-flash:generateContent"
        );

        let local = GeminiSettings {
            base_url: Some("http://127.0.0.1:9000/".to_string()),
            ..Default::default()
        };
        assert!(local
            .endpoint_for("p")
            .starts_with("http://127.0.0.1:9000/v1/projects/p/"));
    }

    #[test]
    fn test_missing_project_id_is_configuration_error() {
        let credential = ProviderCredential::new(ProviderKind::Gemini, "ya29.token");
        let result = GeminiProvider::new(&credential, GeminiSettings::default(), Arc::new(Unreachable));
        assert!(matches!(result, Err(Error::Configuration { .. })));

        let blank = ProviderCredential::new(ProviderKind::Gemini, "ya29.token").with_project_id("  ");
        let result = GeminiProvider::new(&blank, GeminiSettings::default(), Arc::new(Unreachable));
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_request_shape() {
        let request = provider().build_request(&record()).unwrap();

        assert_eq!(request.headers.get("Authorization").unwrap(), "Bearer ya29.token");
        assert_eq!(request.body["contents"][0]["role"], "user");
        let text = request.body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.starts_with(SYSTEM_PROMPT));
        assert!(text.contains("晴れ"));
        assert!(request.body.get("generationConfig").is_none());
    }

    #[test]
    fn test_temperature_is_sent_when_configured() {
        let settings = GeminiSettings {
            temperature: Some(0.4),
            ..Default::default()
        };
        let provider = GeminiProvider::new(&credential(), settings, Arc::new(Unreachable)).unwrap();
        let request = provider.build_request(&record()).unwrap();
        assert!((request.body["generationConfig"]["temperature"].as_f64().unwrap() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_status_string_classification() {
        let body = r#"{"error":{"code":400,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = provider()
            .parse_response(HttpResponse::new(400, body))
            .unwrap_err();
        assert!(matches!(err, Error::RateLimit { .. }));

        let body = r#"{"error":{"code":403,"message":"denied","status":"PERMISSION_DENIED"}}"#;
        let err = provider()
            .parse_response(HttpResponse::new(403, body))
            .unwrap_err();
        assert!(matches!(err, Error::Authentication { .. }));
    }

    #[test]
    fn test_other_error_prefix() {
        let body = r#"{"error":{"code":404,"message":"Model not found","status":"NOT_FOUND"}}"#;
        let err = provider()
            .parse_response(HttpResponse::new(404, body))
            .unwrap_err();
        assert_eq!(err.localized_message(), "Gemini API error: Model not found");
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn test_blocked_prompt_is_unexpected_format() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let err = provider()
            .parse_response(HttpResponse::new(200, body))
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedFormat { .. }));
        assert!(err.detail().unwrap().contains("SAFETY"));
    }

    #[test]
    fn test_success_drops_marker_lines() {
        let body = serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "1.\n照明を消す\n2.\n外干しする\n"}]}
            }]
        });
        let tips = provider()
            .parse_response(HttpResponse::new(200, body.to_string()))
            .unwrap();
        assert_eq!(tips.into_inner(), vec!["照明を消す", "外干しする"]);
    }
}
