//! OpenAI-compatible chat-completion client (Groq by default)

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt, future};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::sse::{self, SseEvent};
use super::{NarrativeGenerator, SYSTEM_PROMPT, user_prompt};
use crate::config::LlmConfig;
use crate::models::PoiQuery;
use crate::{GeoguideError, Result};

const SERVICE: &str = "Language model";
const CHAT_ENDPOINT: &str = "chat/completions";

/// Incremental narrative text, in arrival order
pub type NarrativeStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: String,
}

#[derive(Serialize, Debug)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

#[derive(Deserialize, Debug)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Deserialize, Debug)]
pub struct ChatChoiceMessage {
    pub content: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ChatStreamChunk {
    #[serde(default)]
    pub choices: Vec<ChatStreamChoice>,
}

#[derive(Deserialize, Debug)]
pub struct ChatStreamChoice {
    pub delta: ChatStreamDelta,
}

#[derive(Deserialize, Debug)]
pub struct ChatStreamDelta {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first choice
    pub fn into_text(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .ok_or_else(|| GeoguideError::upstream(SERVICE, "completion contained no choices"))?
            .message
            .content
            .ok_or_else(|| GeoguideError::upstream(SERVICE, "completion contained no text"))
    }
}

/// Parse one streamed `data:` payload into its text delta
pub fn parse_stream_chunk(data: &str) -> Result<Option<String>> {
    let chunk: ChatStreamChunk = serde_json::from_str(data).map_err(|e| {
        GeoguideError::upstream(SERVICE, format!("Failed to parse completion chunk: {e}"))
    })?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

/// Chat-completion client with fixed sampling parameters
pub struct ChatCompletionClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout_seconds: u64,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

impl ChatCompletionClient {
    /// Create a new client from validated configuration
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| GeoguideError::config("Missing language model API key"))?;
        let model = config
            .model
            .clone()
            .ok_or_else(|| GeoguideError::config("Missing language model deployment"))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("GeoGuide/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeoguideError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: config.base_url.clone(),
            timeout_seconds: config.timeout_seconds,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), CHAT_ENDPOINT)
    }

    /// Request body for a query
    pub fn build_request(&self, query: &PoiQuery, stream: bool) -> ChatCompletionRequest<'_> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(query),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
            stream,
            stop: None,
        }
    }

    async fn send(&self, body: &ChatCompletionRequest<'_>) -> Result<Response> {
        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GeoguideError::from_reqwest(SERVICE, self.timeout_seconds, &e))?;

        debug!("{} HTTP status: {}", SERVICE, response.status());

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeoguideError::upstream(
                SERVICE,
                format!("API returned error status {status}: {error_text}"),
            ));
        }

        Ok(response)
    }

    /// Stream the narrative as text deltas
    #[instrument(skip_all, fields(category = %query.category))]
    pub async fn stream(&self, query: &PoiQuery) -> Result<NarrativeStream> {
        let response = self.send(&self.build_request(query, true)).await?;
        let timeout_seconds = self.timeout_seconds;

        let deltas = sse::decode(Box::pin(response.bytes_stream()))
            .take_while(|event| future::ready(!matches!(event, Ok(SseEvent::Done))))
            .filter_map(move |event| {
                future::ready(match event {
                    Ok(SseEvent::Data(data)) => parse_stream_chunk(&data).transpose(),
                    Ok(SseEvent::Done) => None,
                    Err(e) => Some(Err(GeoguideError::from_reqwest(SERVICE, timeout_seconds, &e))),
                })
            });

        Ok(Box::pin(deltas))
    }

    /// Stream the narrative and collect it into one trimmed string
    pub async fn generate_streaming(&self, query: &PoiQuery) -> Result<String> {
        let mut deltas = self.stream(query).await?;
        let mut answer = String::new();
        while let Some(delta) = deltas.next().await {
            answer.push_str(&delta?);
        }
        Ok(answer.trim().to_string())
    }
}

#[async_trait]
impl NarrativeGenerator for ChatCompletionClient {
    #[instrument(skip_all, fields(category = %query.category, model = %self.model))]
    async fn generate(&self, query: &PoiQuery) -> Result<String> {
        let response = self.send(&self.build_request(query, false)).await?;

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            GeoguideError::upstream(SERVICE, format!("Failed to decode completion: {e}"))
        })?;

        let text = body.into_text()?;
        info!("Generated narrative of {} characters", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;

    fn test_config() -> LlmConfig {
        LlmConfig {
            api_key: Some("gsk_test".to_string()),
            model: Some("llama3-8b-8192".to_string()),
            ..LlmConfig::default()
        }
    }

    fn query() -> PoiQuery {
        PoiQuery::new(Coordinate::new(40.7128, -74.006).unwrap(), "restaurant")
    }

    #[test]
    fn test_request_body() {
        let client = ChatCompletionClient::new(&test_config()).unwrap();
        let body = serde_json::to_value(client.build_request(&query(), false)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "llama3-8b-8192",
                "messages": [
                    {"role": "system", "content": "You are an assistant providing geospatial information."},
                    {"role": "user", "content": "Find the nearest restaurant to the location latitude 40.7128, longitude -74.006."}
                ],
                "temperature": 1.0,
                "max_tokens": 300,
                "top_p": 1.0,
                "stream": false
            })
        );
    }

    #[test]
    fn test_chat_url() {
        let client = ChatCompletionClient::new(&test_config()).unwrap();
        assert_eq!(client.chat_url(), "https://api.groq.com/openai/v1/chat/completions");
    }

    #[test]
    fn test_into_text() {
        let body: ChatCompletionResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Try Joe's."},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(body.into_text().unwrap(), "Try Joe's.");

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(empty.into_text().unwrap_err().to_string().contains("no choices"));
    }

    #[test]
    fn test_parse_stream_chunk() {
        let text = parse_stream_chunk(r#"{"choices":[{"index":0,"delta":{"content":"Hel"}}]}"#);
        assert_eq!(text.unwrap(), Some("Hel".to_string()));

        let role_only = parse_stream_chunk(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#);
        assert_eq!(role_only.unwrap(), None);

        assert!(parse_stream_chunk("not json").is_err());
    }

    #[test]
    fn test_client_requires_credentials() {
        let mut config = test_config();
        config.model = None;
        assert!(ChatCompletionClient::new(&config).is_err());
    }
}
