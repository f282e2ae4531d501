//! OpenAI-compatible chat client.

use std::pin::Pin;
use std::time::Duration;

use eventsource_stream::{EventStream, Eventsource};
use futures_util::Stream;
use futures_util::stream::BoxStream;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{AssistantError, AssistantResult};
use crate::prompts::TITLE_PROMPT;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Applied to both connect and read; streaming replies keep the connection
/// alive as long as deltas arrive within this window.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Title generation wants less creativity than chat.
const TITLE_TEMPERATURE: f32 = 0.3;

/// Chat client configuration, already resolved against env and defaults.
#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

/// One message in a chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestMessage {
    pub role: String,
    pub content: String,
}

impl RequestMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Boxed stream of content deltas.
pub type TokenStream = BoxStream<'static, AssistantResult<String>>;

/// Streaming chat client for OpenAI-compatible endpoints.
pub struct ChatClient {
    config: ChatClientConfig,
    http: reqwest::Client,
}

impl ChatClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: ChatClientConfig) -> AssistantResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .read_timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AssistantError::network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    /// Sends a streaming chat completion request and returns the content
    /// deltas as they arrive.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    pub async fn stream_chat(&self, messages: &[RequestMessage]) -> AssistantResult<TokenStream> {
        let request = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            stream: true,
            messages,
        };

        let url = format!("{}{}", self.config.base_url, CHAT_COMPLETIONS_PATH);
        let response = self
            .http
            .post(&url)
            .headers(build_headers(&self.config.api_key))
            .json(&request)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(AssistantError::http_status(status.as_u16(), &error_body));
        }

        Ok(Box::pin(DeltaSseParser::new(response.bytes_stream())))
    }

    /// Generates a short title for note content with a single non-streaming
    /// completion.
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-success status, or an
    /// unparseable response body.
    pub async fn generate_title(&self, content: &str) -> AssistantResult<String> {
        let messages = [
            RequestMessage::system(TITLE_PROMPT),
            RequestMessage::user(content),
        ];
        let request = ChatRequest {
            model: &self.config.model,
            temperature: TITLE_TEMPERATURE,
            stream: false,
            messages: &messages,
        };

        let url = format!("{}{}", self.config.base_url, CHAT_COMPLETIONS_PATH);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(AssistantError::http_status(status.as_u16(), &error_body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AssistantError::parse(format!("Failed to parse response: {e}")))?;
        let title = body
            .get("choices")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| AssistantError::parse("Response has no message content"))?;

        // Models love to quote their titles.
        Ok(title.trim().trim_matches(['"', '\'']).trim().to_string())
    }
}

fn build_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Authorization",
        HeaderValue::from_str(&format!("Bearer {api_key}"))
            .unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    headers.insert("accept", HeaderValue::from_static("text/event-stream"));
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers
}

fn classify_reqwest_error(e: reqwest::Error) -> AssistantError {
    if e.is_timeout() {
        AssistantError::timeout(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        AssistantError::network(format!("Connection failed: {e}"))
    } else {
        AssistantError::network(format!("Network error: {e}"))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    stream: bool,
    messages: &'a [RequestMessage],
}

/// Some providers close the byte stream without a trailing blank line, which
/// leaves the last SSE event unterminated. Appending one is harmless when
/// the terminator was already sent.
struct SseTerminatedStream<S> {
    inner: S,
    emitted_terminator: bool,
}

impl<S> SseTerminatedStream<S> {
    fn new(inner: S) -> Self {
        Self {
            inner,
            emitted_terminator: false,
        }
    }
}

impl<S, E> Stream for SseTerminatedStream<S>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
{
    type Item = std::result::Result<bytes::Bytes, E>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use std::task::Poll;

        if self.emitted_terminator {
            return Poll::Ready(None);
        }

        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(item)) => Poll::Ready(Some(item)),
            Poll::Ready(None) => {
                self.emitted_terminator = true;
                Poll::Ready(Some(Ok(bytes::Bytes::from_static(b"\n\n"))))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// SSE parser that reduces chat completion chunks to bare content deltas.
///
/// Malformed chunks are logged and skipped so one bad frame never kills an
/// otherwise healthy stream.
struct DeltaSseParser<S> {
    inner: EventStream<SseTerminatedStream<S>>,
    done: bool,
}

impl<S> DeltaSseParser<S> {
    fn new<E>(stream: S) -> Self
    where
        S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    {
        Self {
            inner: SseTerminatedStream::new(stream).eventsource(),
            done: false,
        }
    }
}

fn delta_text(data: &str) -> Option<String> {
    let value = match serde_json::from_str::<Value>(data) {
        Ok(value) => value,
        Err(err) => {
            debug!(%err, "skipping malformed SSE chunk");
            return None;
        }
    };
    value
        .get("choices")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("delta"))
        .and_then(|delta| delta.get("content"))
        .and_then(|content| content.as_str())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

impl<S, E> Stream for DeltaSseParser<S>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = AssistantResult<String>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use std::task::Poll;

        loop {
            if self.done {
                return Poll::Ready(None);
            }

            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    let data = event.data.trim();
                    if data.is_empty() {
                        continue;
                    }
                    if data == "[DONE]" {
                        self.done = true;
                        return Poll::Ready(None);
                    }
                    if let Some(text) = delta_text(data) {
                        return Poll::Ready(Some(Ok(text)));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(AssistantError::parse(format!(
                        "SSE stream error: {e}"
                    )))));
                }
                Poll::Ready(None) => {
                    self.done = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_text_extracts_content() {
        let data = r#"{"choices":[{"delta":{"content":"Hi"}}]}"#;
        assert_eq!(delta_text(data), Some("Hi".to_string()));
    }

    #[test]
    fn test_delta_text_skips_malformed_and_empty() {
        assert_eq!(delta_text("not json"), None);
        assert_eq!(delta_text(r#"{"choices":[{"delta":{}}]}"#), None);
        assert_eq!(delta_text(r#"{"choices":[{"delta":{"content":""}}]}"#), None);
    }
}
