use std::{fmt, str::FromStr, time::Duration};

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::core::AppConfig;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::Assistant => "assistant",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "assistant" => Ok(Role::Assistant),
            "user" => Ok(Role::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A single entry in the `messages` array of a chat completion request.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("OPENROUTER_API_KEY is not configured")]
    MissingCredential,
    #[error("completion API returned {status}")]
    Upstream { status: StatusCode },
    #[error("unexpected response format from completion API: {0}")]
    Malformed(String),
    #[error("completion API request timed out")]
    Timeout,
    #[error("completion API request failed: {0}")]
    Transport(reqwest::Error),
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CompletionError::Timeout
        } else {
            CompletionError::Transport(err)
        }
    }
}

/// Client for an OpenAI compatible chat completion endpoint. Generation
/// parameters are fixed at construction.
#[derive(Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    api_hostname: String,
    api_key: String,
    model: String,
    referer: String,
    title: String,
    max_tokens: u32,
    temperature: f64,
    timeout: Duration,
}

// Keep the API key out of logs
impl fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionClient")
            .field("api_hostname", &self.api_hostname)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CompletionClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_hostname: config.openrouter_api_hostname.clone(),
            api_key: config.openrouter_api_key.clone(),
            model: config.openrouter_model.clone(),
            referer: config.openrouter_referer.clone(),
            title: config.openrouter_title.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.upstream_timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Fails when no API key was configured so callers can reject a
    /// request before doing any other work.
    pub fn ensure_configured(&self) -> Result<(), CompletionError> {
        if self.api_key.trim().is_empty() {
            return Err(CompletionError::MissingCredential);
        }
        Ok(())
    }

    /// Sends `messages` to the completion endpoint and returns the text
    /// of the first choice.
    pub async fn complete(&self, messages: &[Message]) -> Result<String, CompletionError> {
        self.ensure_configured()?;

        let payload = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });
        let url = format!(
            "{}/v1/chat/completions",
            self.api_hostname.trim_end_matches("/")
        );

        tracing::debug!(model = %self.model, messages = messages.len(), "Sending completion request");

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Completion API returned {}: {}", status, body);
            return Err(CompletionError::Upstream { status });
        }

        let body = response.text().await?;
        let resp: Value = serde_json::from_str(&body)
            .map_err(|e| CompletionError::Malformed(format!("invalid JSON: {}", e)))?;

        extract_reply(&resp)
    }
}

/// Pulls `choices[0].message.content` out of a completion response.
/// Missing, non-string and empty content are all malformed.
pub fn extract_reply(resp: &Value) -> Result<String, CompletionError> {
    match resp["choices"][0]["message"]["content"].as_str() {
        Some(content) if !content.is_empty() => Ok(content.to_string()),
        _ => Err(CompletionError::Malformed(format!(
            "missing choices[0].message.content in {}",
            resp
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn test_client(api_hostname: &str, api_key: &str) -> CompletionClient {
        let mut config = AppConfig::from_lookup(|_| None).unwrap();
        config.openrouter_api_hostname = api_hostname.to_string();
        config.openrouter_api_key = api_key.to_string();
        CompletionClient::new(&config)
    }

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::System, Role::User, Role::Assistant] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("tool".parse::<Role>().is_err());
    }

    #[test]
    fn test_message_serializes_lowercase_role() {
        let msg = Message::new(Role::Assistant, "Hello!");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"role": "assistant", "content": "Hello!"})
        );
    }

    #[test]
    fn test_extract_reply_rejects_empty_content() {
        let resp = json!({"choices": [{"message": {"role": "assistant", "content": ""}}]});
        assert!(matches!(
            extract_reply(&resp),
            Err(CompletionError::Malformed(_))
        ));
        let resp = json!({"choices": []});
        assert!(matches!(
            extract_reply(&resp),
            Err(CompletionError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_basic() {
        let mut server = mockito::Server::new_async().await;

        let response_body = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1694268190,
            "model": "mistralai/mistral-7b-instruct:free",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Hello!"
                },
                "finish_reason": "stop"
            }]
        }"#;

        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_header("x-title", "Portfolio AI Chat")
            .match_body(Matcher::PartialJson(json!({
                "model": "mistralai/mistral-7b-instruct:free",
                "max_tokens": 500,
                "messages": [{"role": "user", "content": "Hi"}],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(response_body)
            .create_async()
            .await;

        let client = test_client(&server.url(), "test-key");
        let messages = vec![Message::new(Role::User, "Hi")];
        let result = client.complete(&messages).await;

        mock.assert_async().await;
        assert_eq!(result.unwrap(), "Hello!");
    }

    #[tokio::test]
    async fn test_complete_preserves_upstream_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body(r#"{"error": {"message": "rate limited"}}"#)
            .create_async()
            .await;

        let client = test_client(&server.url(), "test-key");
        let result = client.complete(&[Message::new(Role::User, "Hi")]).await;

        match result {
            Err(CompletionError::Upstream { status }) => {
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS)
            }
            other => panic!("Expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body("not json at all")
            .create_async()
            .await;

        let client = test_client(&server.url(), "test-key");
        let result = client.complete(&[Message::new(Role::User, "Hi")]).await;
        assert!(matches!(result, Err(CompletionError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_complete_without_key_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let client = test_client(&server.url(), "  ");
        let result = client.complete(&[Message::new(Role::User, "Hi")]).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(CompletionError::MissingCredential)));
    }
}
