//! `OpenAI` chat completions client.

use super::{ChatMessage, CompletionHttpConfig, CompletionProvider, build_http_client};
use crate::config::CompletionConfig;
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// `OpenAI` chat completions client.
///
/// The bearer key belongs to the caller and is only ever sent to the
/// completion API. It is never logged or stored.
pub struct OpenAiClient {
    /// API key.
    api_key: Option<SecretString>,
    /// API endpoint.
    endpoint: String,
    /// Model to use.
    model: String,
    /// Sampling temperature.
    temperature: f32,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl OpenAiClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.openai.com/v1";

    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "gpt-3.5-turbo";

    /// Default sampling temperature.
    pub const DEFAULT_TEMPERATURE: f32 = 1.0;

    /// Creates a client reading the key from `OPENAI_API_KEY`.
    #[must_use]
    pub fn new() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);
        Self {
            api_key,
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            temperature: Self::DEFAULT_TEMPERATURE,
            client: build_http_client(CompletionHttpConfig::default().with_env_overrides()),
        }
    }

    /// Creates a client from the `[completion]` config section.
    #[must_use]
    pub fn from_config(config: &CompletionConfig) -> Self {
        Self::new()
            .with_endpoint(&config.endpoint)
            .with_model(&config.model)
            .with_temperature(config.temperature)
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Sets the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Returns the configured model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns true if an API key is available.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Makes a request to the chat completions API.
    fn request(&self, messages: &[ChatMessage]) -> Result<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| Error::OperationFailed {
                operation: "openai_request".to_string(),
                cause: "OPENAI_API_KEY not set".to_string(),
            })?;

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .map_err(|e| Error::OperationFailed {
                operation: "openai_request".to_string(),
                cause: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::OperationFailed {
                operation: "openai_request".to_string(),
                cause: format!("API returned status: {status} - {body}"),
            });
        }

        let response: ChatCompletionResponse =
            response.json().map_err(|e| Error::OperationFailed {
                operation: "openai_response".to_string(),
                cause: e.to_string(),
            })?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::OperationFailed {
                operation: "openai_response".to_string(),
                cause: "No choices in response".to_string(),
            })
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    #[instrument(skip(self, messages), fields(provider = "openai", model = %self.model, messages = messages.len()))]
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let start = std::time::Instant::now();
        let result = self.request(messages);
        let status = if result.is_ok() { "success" } else { "error" };
        metrics::counter!(
            "parley_completion_requests_total",
            "provider" => "openai",
            "status" => status
        )
        .increment(1);
        metrics::histogram!("parley_completion_duration_ms", "provider" => "openai")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        result
    }
}

/// Request body for chat completions.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serves one canned HTTP response and returns the request body it saw.
    fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(value) = lower.strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let mut stream = reader.into_inner();
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            String::from_utf8(request_body).unwrap()
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn test_defaults() {
        let client = OpenAiClient::new();
        assert_eq!(client.name(), "openai");
        assert_eq!(client.model(), "gpt-3.5-turbo");
        assert!((client.temperature - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_builder() {
        let client = OpenAiClient::new()
            .with_api_key("sk-test")
            .with_endpoint("http://localhost:9999/v1/")
            .with_model("gpt-4o-mini");
        assert!(client.has_api_key());
        assert_eq!(client.endpoint, "http://localhost:9999/v1");
        assert_eq!(client.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_missing_key_fails_before_network() {
        let mut client = OpenAiClient::new().with_endpoint("http://127.0.0.1:9");
        client.api_key = None;

        let err = client.complete(&[ChatMessage::new("user", "hi")]).unwrap_err();
        assert!(matches!(err, Error::OperationFailed { .. }));
    }

    #[test]
    fn test_complete_sends_transcript_and_reads_first_choice() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"Hello!"}}]}"#,
        );
        let client = OpenAiClient::new()
            .with_api_key("sk-test")
            .with_endpoint(endpoint);

        let reply = client
            .complete(&[
                ChatMessage::new("system", "Be kind."),
                ChatMessage::new("user", "hi"),
            ])
            .unwrap();
        assert_eq!(reply, "Hello!");

        let sent: serde_json::Value = serde_json::from_str(&server.join().unwrap()).unwrap();
        assert_eq!(sent["model"], "gpt-3.5-turbo");
        assert_eq!(sent["messages"].as_array().unwrap().len(), 2);
        assert_eq!(sent["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_error_status_is_operation_failed() {
        let (endpoint, server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#);
        let client = OpenAiClient::new()
            .with_api_key("sk-test")
            .with_endpoint(endpoint);

        let err = client.complete(&[ChatMessage::new("user", "hi")]).unwrap_err();
        server.join().unwrap();
        assert!(err.to_string().contains("500"));
    }
}
