//! OpenAI chat-completion adapter.
//!
//! Also works against OpenAI-compatible endpoints (vLLM, LM Studio, ...).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::completion::{CompletionError, CompletionRequest, CompletionService};

/// Default API root.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Connection settings for [`OpenAiCompletion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiConfig {
    /// API root; `/chat/completions` is appended.
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        OpenAiConfig {
            endpoint: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
        }
    }
}

impl OpenAiConfig {
    /// Read `OPENAI_BASE_URL` and `OPENAI_API_KEY`.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Override the API key.
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_completion_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// HTTP client for an OpenAI-style `/chat/completions` endpoint.
pub struct OpenAiCompletion {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiCompletion {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Build from config; `None` when no API key is configured.
    pub fn from_config(config: &OpenAiConfig) -> Option<Self> {
        config
            .api_key
            .as_deref()
            .map(|key| Self::new(&config.endpoint, key))
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            max_completion_tokens: request.max_tokens,
        };

        debug!(model = %request.model, max_tokens = request.max_tokens, "sending completion request");

        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => CompletionError::Authentication(error_text),
                429 => CompletionError::RateLimited(error_text),
                404 => CompletionError::ModelNotFound(request.model.clone()),
                _ => CompletionError::Provider(format!("HTTP {status}: {error_text}")),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Provider(format!("failed to parse response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        if content.is_empty() {
            warn!(model = %request.model, "completion returned no content");
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-5".to_string(),
            system_prompt: "sys".to_string(),
            user_prompt: "usr".to_string(),
            max_tokens: 16,
        }
    }

    /// Byte length of a complete HTTP request in `buf`, if one has arrived.
    fn full_request_len(buf: &[u8]) -> Option<usize> {
        let text = String::from_utf8_lossy(buf);
        let header_end = text.find("\r\n\r\n")? + 4;
        let body_len = text[..header_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        (buf.len() >= header_end + body_len).then_some(header_end + body_len)
    }

    /// Serve one canned HTTP response on a local port. Returns the endpoint
    /// and a receiver for the raw request the client sent.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/v1", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            while full_request_len(&buf).is_none() {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
        });

        (endpoint, rx)
    }

    async fn complete_against(
        status: &'static str,
        body: &'static str,
    ) -> Result<String, CompletionError> {
        let (endpoint, _request) = serve_once(status, body).await;
        OpenAiCompletion::new(&endpoint, "sk-test")
            .complete(&request())
            .await
    }

    #[test]
    fn test_url_joins_endpoint_without_double_slash() {
        let client = OpenAiCompletion::new("http://localhost:8080/v1/", "sk-test");
        assert_eq!(client.url(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = OpenAiConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
        };
        assert!(OpenAiCompletion::from_config(&config).is_none());
        assert!(OpenAiCompletion::from_config(&config.with_api_key("sk-test")).is_some());
    }

    #[test]
    fn test_request_body_uses_system_and_user_messages() {
        let body = ChatRequest {
            model: "gpt-5",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "usr",
                },
            ],
            max_completion_tokens: 4000,
        };
        let raw = serde_json::to_value(&body).unwrap();
        assert_eq!(raw["model"], "gpt-5");
        assert_eq!(raw["messages"][0]["role"], "system");
        assert_eq!(raw["messages"][1]["content"], "usr");
        assert_eq!(raw["max_completion_tokens"], 4000);
    }

    #[test]
    fn test_response_without_content_parses() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let client = OpenAiCompletion::new("http://127.0.0.1:9", "sk-test");
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::Network(_)));
    }

    #[tokio::test]
    async fn test_success_returns_first_choice_text() {
        let (endpoint, sent) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"content":"Europe looks promising."}}]}"#,
        )
        .await;
        let text = OpenAiCompletion::new(&endpoint, "sk-test")
            .complete(&request())
            .await
            .unwrap();
        assert_eq!(text, "Europe looks promising.");

        let sent = sent.await.unwrap();
        assert!(sent.starts_with("POST /v1/chat/completions "));
        assert!(sent.to_ascii_lowercase().contains("authorization: bearer sk-test"));
        assert!(sent.contains(r#""max_completion_tokens":16"#));
    }

    #[tokio::test]
    async fn test_empty_content_is_an_empty_answer() {
        let text = complete_against("200 OK", r#"{"choices":[{"message":{"content":""}}]}"#)
            .await
            .unwrap();
        assert_eq!(text, "");

        let text = complete_against("200 OK", r#"{"choices":[{"message":{"content":null}}]}"#)
            .await
            .unwrap();
        assert_eq!(text, "");

        let text = complete_against("200 OK", r#"{"choices":[]}"#).await.unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn test_unauthorized_is_authentication_error() {
        let err = complete_against("401 Unauthorized", r#"{"error":"bad key"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Authentication(ref body) if body.contains("bad key")));

        let err = complete_against("403 Forbidden", "{}").await.unwrap_err();
        assert!(matches!(err, CompletionError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_too_many_requests_is_rate_limited() {
        let err = complete_against("429 Too Many Requests", r#"{"error":"quota"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::RateLimited(ref body) if body.contains("quota")));
    }

    #[tokio::test]
    async fn test_not_found_names_the_model() {
        let err = complete_against("404 Not Found", "{}").await.unwrap_err();
        assert_eq!(err, CompletionError::ModelNotFound("gpt-5".to_string()));
    }

    #[tokio::test]
    async fn test_server_error_is_provider_error() {
        let err = complete_against("500 Internal Server Error", r#"{"error":"boom"}"#)
            .await
            .unwrap_err();
        match err {
            CompletionError::Provider(detail) => {
                assert!(detail.contains("500"));
                assert!(detail.contains("boom"));
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_provider_error() {
        let err = complete_against("200 OK", "not json").await.unwrap_err();
        assert!(matches!(err, CompletionError::Provider(ref detail) if detail.contains("parse")));
    }
}
