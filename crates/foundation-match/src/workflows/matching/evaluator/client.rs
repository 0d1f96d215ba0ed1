use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::schema::structured_schema;
use super::{EvaluatorError, JudgmentService, ScoringPrompt, ScoringResponse};
use crate::config::{ConfigError, EvaluatorConfig};

const RESPONSE_SCHEMA_NAME: &str = "foundation_evaluations";

/// Judgment service backed by an OpenAI-compatible chat completions endpoint with strict
/// structured output.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl ChatCompletionsClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: crate::config::DEFAULT_EVALUATOR_BASE_URL.to_string(),
            model: model.into(),
            temperature: crate::config::DEFAULT_EVALUATOR_TEMPERATURE,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Build a client from loaded settings; fails when no API key is configured.
    pub fn from_config(config: &EvaluatorConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?;
        Ok(Self::new(api_key, config.model.clone())
            .with_base_url(config.base_url.clone())
            .with_temperature(config.temperature))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> Result<HeaderMap, EvaluatorError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|_| {
            EvaluatorError::Unavailable("API key is not a valid header value".to_string())
        })?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn request<'a>(&'a self, prompt: &'a ScoringPrompt) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: &prompt.system,
                },
                WireMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: RESPONSE_SCHEMA_NAME,
                    strict: true,
                    schema: structured_schema::<ScoringResponse>(),
                },
            },
        }
    }
}

#[async_trait]
impl JudgmentService for ChatCompletionsClient {
    async fn judge(&self, prompt: &ScoringPrompt) -> Result<ScoringResponse, EvaluatorError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, "evaluator structured output request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&self.request(prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await?;
            return Err(EvaluatorError::Status { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(EvaluatorError::EmptyResponse)?;

        parse_scoring_content(&content)
    }
}

/// Decode the assistant message, tolerating a surrounding markdown code fence.
pub(crate) fn parse_scoring_content(content: &str) -> Result<ScoringResponse, EvaluatorError> {
    let body = strip_code_blocks(content);
    if body.is_empty() {
        return Err(EvaluatorError::EmptyResponse);
    }
    serde_json::from_str(body).map_err(EvaluatorError::Malformed)
}

fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<WireMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    strict: bool,
    schema: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt() -> ScoringPrompt {
        ScoringPrompt {
            system: "system".to_string(),
            user: "user".to_string(),
        }
    }

    #[test]
    fn request_carries_strict_schema_and_both_messages() {
        let client = ChatCompletionsClient::new("key", "anthropic/claude-haiku-4-5")
            .with_base_url("https://router.example/v1/")
            .with_temperature(0.3);
        let prompt = prompt();
        let body = serde_json::to_value(client.request(&prompt)).expect("serializable");

        assert_eq!(client.base_url, "https://router.example/v1");
        assert_eq!(body["model"], "anthropic/claude-haiku-4-5");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
        assert!(body["response_format"]["json_schema"]["schema"]["properties"]
            .get("evaluations")
            .is_some());
    }

    #[test]
    fn from_config_requires_api_key() {
        let mut config = EvaluatorConfig {
            api_key: None,
            base_url: "https://router.example/v1".to_string(),
            model: "m".to_string(),
            temperature: 0.5,
        };
        assert!(matches!(
            ChatCompletionsClient::from_config(&config),
            Err(ConfigError::MissingEvaluatorKey)
        ));

        config.api_key = Some("secret".to_string());
        let client = ChatCompletionsClient::from_config(&config).expect("client");
        assert_eq!(client.model(), "m");
        assert!((client.temperature - 0.5).abs() < f32::EPSILON);
        assert!(client.headers().is_ok());
    }

    #[test]
    fn parses_fenced_and_plain_content() {
        let plain = r#"{"evaluations":[{"foundation_id":"a","match_score":0.7,"fits":["x"],"mismatches":[],"questions":[]}]}"#;
        let fenced = format!("```json\n{plain}\n```");

        for content in [plain.to_string(), fenced] {
            let parsed = parse_scoring_content(&content).expect("parses");
            assert_eq!(parsed.evaluations.len(), 1);
            assert_eq!(parsed.evaluations[0].foundation_id.as_str(), "a");
        }
    }

    #[test]
    fn rejects_content_that_breaks_the_shape() {
        assert!(matches!(
            parse_scoring_content("  "),
            Err(EvaluatorError::EmptyResponse)
        ));
        assert!(matches!(
            parse_scoring_content(r#"{"evaluations":[{"foundation_id":"a"}]}"#),
            Err(EvaluatorError::Malformed(_))
        ));
        assert!(matches!(
            parse_scoring_content("Leider kann ich das nicht bewerten."),
            Err(EvaluatorError::Malformed(_))
        ));
    }
}
