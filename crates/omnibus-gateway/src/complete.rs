//! Text completion, in both single-value and streamed form.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use serde_json::{json, Value};

use crate::error::GatewayError;
use crate::session::SessionGateway;
use crate::sse::SseDecoder;
use crate::CompletionService;

const COMPLETE_PATH: &str = "/api/v2/cortex/inference:complete";
const DONE_MARKER: &str = "[DONE]";

impl SessionGateway {
    async fn send_completion(
        &self,
        model: &str,
        prompt: &str,
        stream: bool,
    ) -> Result<Response, GatewayError> {
        let credential = self.credential().await?;
        let body = json!({
            "model": model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "stream": stream,
        });
        let response = self
            .request(&format!("{}{}", self.base_url(), COMPLETE_PATH), &credential)
            .json(&body)
            .send()
            .await?;
        self.checked(response).await
    }
}

#[async_trait]
impl CompletionService for SessionGateway {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, GatewayError> {
        let response = self.send_completion(model, prompt, false).await?;

        // Some deployments always answer with an event stream; collect it.
        if is_event_stream(&response) {
            let mut text = String::new();
            read_event_stream(response, &mut |fragment: &str| text.push_str(fragment)).await?;
            return Ok(text);
        }

        let payload: Value = response.json().await?;
        Ok(message_text(&payload).unwrap_or_default())
    }

    async fn complete_stream(
        &self,
        model: &str,
        prompt: &str,
        on_fragment: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<(), GatewayError> {
        let response = self.send_completion(model, prompt, true).await?;

        if !is_event_stream(&response) {
            let payload: Value = response.json().await?;
            if let Some(text) = message_text(&payload).filter(|t| !t.is_empty()) {
                on_fragment(&text);
            }
            return Ok(());
        }

        read_event_stream(response, on_fragment).await
    }
}

fn is_event_stream(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("text/event-stream"))
        .unwrap_or(false)
}

async fn read_event_stream(
    mut response: Response,
    on_fragment: &mut (dyn for<'a> FnMut(&'a str) + Send),
) -> Result<(), GatewayError> {
    let mut decoder = SseDecoder::new();
    let mut fragments = 0usize;

    while let Some(chunk) = response.chunk().await? {
        for payload in decoder.feed(&chunk) {
            if payload.trim() == DONE_MARKER {
                tracing::debug!(fragments, "Completion stream finished");
                return Ok(());
            }
            if let Some(text) = delta_text(&payload)? {
                fragments += 1;
                on_fragment(&text);
            }
        }
    }

    if let Some(payload) = decoder.finish() {
        if payload.trim() != DONE_MARKER {
            if let Some(text) = delta_text(&payload)? {
                fragments += 1;
                on_fragment(&text);
            }
        }
    }
    tracing::debug!(fragments, "Completion stream finished");
    Ok(())
}

/// Extract the text carried by one streamed event. Blank deltas yield `None`.
pub(crate) fn delta_text(payload: &str) -> Result<Option<String>, GatewayError> {
    if payload.trim().is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| GatewayError::InvalidPayload(format!("bad stream event: {}", e)))?;
    if let Some(message) = value.get("message").and_then(Value::as_str) {
        if value.get("choices").is_none() {
            return Err(GatewayError::InvalidPayload(message.to_string()));
        }
    }
    let choice = &value["choices"][0];
    let text = choice["delta"]["content"]
        .as_str()
        .or_else(|| choice["delta"]["text"].as_str())
        .or_else(|| choice["message"]["content"].as_str());
    Ok(text.filter(|t| !t.is_empty()).map(str::to_string))
}

/// Extract the answer from a non-streamed completion body.
pub(crate) fn message_text(payload: &Value) -> Option<String> {
    let choice = &payload["choices"][0];
    choice["message"]["content"]
        .as_str()
        .or_else(|| choice["messages"].as_str())
        .map(str::to_string)
}
