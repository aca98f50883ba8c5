//! Anthropic Messages API client.
//!
//! Tool calls are `tool_use` content blocks on the assistant message; tool
//! results go back as `tool_result` blocks inside a user message keyed by
//! `tool_use_id`.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm::{
    ChatProvider, ChatRequest, ModelTurn, ProviderError, ToolCallRequest, TranscriptEntry,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AnthropicProvider {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self { http, base_url: base_url.into(), api_key: api_key.into() }
    }
}

fn render_payload(request: &ChatRequest) -> Value {
    let mut messages = Vec::new();
    for entry in &request.transcript {
        match entry {
            TranscriptEntry::User(text) => {
                messages.push(json!({ "role": "user", "content": text }));
            }
            TranscriptEntry::Assistant(text) => {
                messages.push(json!({ "role": "assistant", "content": text }));
            }
            TranscriptEntry::ToolCalls(calls) => {
                let blocks: Vec<Value> = calls
                    .iter()
                    .map(|call| {
                        json!({
                            "type": "tool_use",
                            "id": call.id,
                            "name": call.name,
                            "input": call.arguments,
                        })
                    })
                    .collect();
                messages.push(json!({ "role": "assistant", "content": blocks }));
            }
            TranscriptEntry::ToolOutcomes(outcomes) => {
                let blocks: Vec<Value> = outcomes
                    .iter()
                    .map(|outcome| {
                        json!({
                            "type": "tool_result",
                            "tool_use_id": outcome.call_id,
                            "content": outcome.content.to_string(),
                            "is_error": outcome.is_error,
                        })
                    })
                    .collect();
                messages.push(json!({ "role": "user", "content": blocks }));
            }
        }
    }

    let tools: Vec<Value> = request
        .tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "input_schema": tool.parameters,
            })
        })
        .collect();

    let mut payload = json!({
        "model": request.model,
        "max_tokens": request.max_tokens,
        "temperature": request.temperature,
        "system": request.system,
        "messages": messages,
    });
    if !tools.is_empty() {
        payload["tools"] = Value::Array(tools);
    }
    payload
}

fn interpret_response(body: &Value) -> Result<ModelTurn, ProviderError> {
    let content = body
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Decode("response has no content array".to_string()))?;

    let mut calls = Vec::new();
    let mut text_parts = Vec::new();
    for block in content {
        match block.get("type").and_then(Value::as_str) {
            Some("tool_use") => {
                let id = block
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ProviderError::Decode("tool_use without id".to_string()))?;
                let name = block
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ProviderError::Decode("tool_use without name".to_string()))?;
                calls.push(ToolCallRequest {
                    id: id.to_string(),
                    name: name.to_string(),
                    arguments: block.get("input").cloned().unwrap_or(json!({})),
                });
            }
            Some("text") => {
                if let Some(text) = block.get("text").and_then(Value::as_str) {
                    text_parts.push(text.to_string());
                }
            }
            _ => {}
        }
    }

    if calls.is_empty() {
        Ok(ModelTurn::Text(text_parts.join("\n")))
    } else {
        Ok(ModelTurn::ToolCalls(calls))
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    async fn send_turn(&self, request: &ChatRequest) -> Result<ModelTurn, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&render_payload(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status: status.as_u16(), body });
        }

        let body: Value = response.json().await?;
        interpret_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::llm::{
        ChatRequest, ModelTurn, ToolDeclaration, ToolOutcome, TranscriptEntry,
    };

    use super::{interpret_response, render_payload};

    fn request() -> ChatRequest {
        ChatRequest {
            model: "claude-3-5-haiku-latest".to_string(),
            system: "You are the assistant.".to_string(),
            temperature: 0.4,
            max_tokens: 512,
            transcript: vec![TranscriptEntry::User("hola".to_string())],
            tools: vec![ToolDeclaration {
                name: "get_services_info",
                description: "List catalog services",
                parameters: json!({"type": "object", "properties": {}}),
            }],
        }
    }

    #[test]
    fn payload_uses_messages_api_shapes() {
        let payload = render_payload(&request());
        assert_eq!(payload["system"], "You are the assistant.");
        assert_eq!(payload["messages"][0]["role"], "user");
        assert_eq!(payload["tools"][0]["input_schema"]["type"], "object");
    }

    #[test]
    fn tool_outcomes_render_as_tool_result_blocks() {
        let mut request = request();
        request.transcript.push(TranscriptEntry::ToolOutcomes(vec![ToolOutcome {
            call_id: "toolu_1".to_string(),
            name: "get_services_info".to_string(),
            content: json!({"services": []}),
            is_error: false,
        }]));

        let payload = render_payload(&request);
        let block = &payload["messages"][1]["content"][0];
        assert_eq!(block["type"], "tool_result");
        assert_eq!(block["tool_use_id"], "toolu_1");
    }

    #[test]
    fn text_blocks_join_into_a_text_turn() {
        let body = json!({
            "content": [
                {"type": "text", "text": "Claro,"},
                {"type": "text", "text": "con gusto."}
            ],
            "stop_reason": "end_turn"
        });
        assert_eq!(
            interpret_response(&body).expect("interpret"),
            ModelTurn::Text("Claro,\ncon gusto.".to_string())
        );
    }

    #[test]
    fn tool_use_blocks_win_over_text() {
        let body = json!({
            "content": [
                {"type": "text", "text": "Déjame revisar."},
                {
                    "type": "tool_use",
                    "id": "toolu_9",
                    "name": "check_availability",
                    "input": {"date": "2026-08-28"}
                }
            ],
            "stop_reason": "tool_use"
        });

        let ModelTurn::ToolCalls(calls) = interpret_response(&body).expect("interpret") else {
            panic!("expected tool calls");
        };
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "toolu_9");
        assert_eq!(calls[0].arguments["date"], "2026-08-28");
    }
}
