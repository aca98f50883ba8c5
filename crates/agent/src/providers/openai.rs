//! OpenAI Chat Completions client.
//!
//! Tool calls arrive as `tool_calls` entries whose `function.arguments` is a
//! JSON document encoded as a string; tool results go back as `role: "tool"`
//! messages keyed by `tool_call_id`.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm::{
    ChatProvider, ChatRequest, ModelTurn, ProviderError, ToolCallRequest, TranscriptEntry,
};

pub struct OpenAiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiProvider {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self { http, base_url: base_url.into(), api_key: api_key.into() }
    }
}

fn render_payload(request: &ChatRequest) -> Value {
    let mut messages = vec![json!({ "role": "system", "content": request.system })];
    for entry in &request.transcript {
        match entry {
            TranscriptEntry::User(text) => {
                messages.push(json!({ "role": "user", "content": text }));
            }
            TranscriptEntry::Assistant(text) => {
                messages.push(json!({ "role": "assistant", "content": text }));
            }
            TranscriptEntry::ToolCalls(calls) => {
                let tool_calls: Vec<Value> = calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments.to_string(),
                            },
                        })
                    })
                    .collect();
                messages.push(json!({
                    "role": "assistant",
                    "content": Value::Null,
                    "tool_calls": tool_calls,
                }));
            }
            TranscriptEntry::ToolOutcomes(outcomes) => {
                for outcome in outcomes {
                    messages.push(json!({
                        "role": "tool",
                        "tool_call_id": outcome.call_id,
                        "content": outcome.content.to_string(),
                    }));
                }
            }
        }
    }

    let tools: Vec<Value> = request
        .tools
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                },
            })
        })
        .collect();

    let mut payload = json!({
        "model": request.model,
        "messages": messages,
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
    });
    if !tools.is_empty() {
        payload["tools"] = Value::Array(tools);
    }
    payload
}

fn interpret_response(body: &Value) -> Result<ModelTurn, ProviderError> {
    let message = body
        .pointer("/choices/0/message")
        .ok_or_else(|| ProviderError::Decode("response has no choices".to_string()))?;

    if let Some(raw_calls) = message.get("tool_calls").and_then(Value::as_array) {
        if !raw_calls.is_empty() {
            let mut calls = Vec::with_capacity(raw_calls.len());
            for raw in raw_calls {
                let id = raw
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ProviderError::Decode("tool call without id".to_string()))?;
                let name = raw
                    .pointer("/function/name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ProviderError::Decode("tool call without name".to_string()))?;
                let arguments_raw =
                    raw.pointer("/function/arguments").and_then(Value::as_str).unwrap_or("{}");
                let arguments: Value = serde_json::from_str(arguments_raw).map_err(|error| {
                    ProviderError::Decode(format!("tool call arguments not JSON: {error}"))
                })?;
                calls.push(ToolCallRequest {
                    id: id.to_string(),
                    name: name.to_string(),
                    arguments,
                });
            }
            return Ok(ModelTurn::ToolCalls(calls));
        }
    }

    let text = message.get("content").and_then(Value::as_str).unwrap_or_default();
    Ok(ModelTurn::Text(text.to_string()))
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn send_turn(&self, request: &ChatRequest) -> Result<ModelTurn, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
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

    use crate::llm::{ChatRequest, ModelTurn, ToolCallRequest, ToolDeclaration, TranscriptEntry};

    use super::{interpret_response, render_payload};

    fn request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o-mini".to_string(),
            system: "You are the assistant.".to_string(),
            temperature: 0.4,
            max_tokens: 512,
            transcript: vec![TranscriptEntry::User("hola".to_string())],
            tools: vec![ToolDeclaration {
                name: "check_availability",
                description: "Free slots for a date",
                parameters: json!({"type": "object", "properties": {}}),
            }],
        }
    }

    #[test]
    fn payload_carries_system_tools_and_transcript() {
        let payload = render_payload(&request());
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["content"], "hola");
        assert_eq!(payload["tools"][0]["function"]["name"], "check_availability");
    }

    #[test]
    fn tool_call_round_trip_stringifies_arguments() {
        let mut request = request();
        request.transcript.push(TranscriptEntry::ToolCalls(vec![ToolCallRequest {
            id: "call_1".to_string(),
            name: "check_availability".to_string(),
            arguments: json!({"date": "2026-08-28"}),
        }]));

        let payload = render_payload(&request);
        let call = &payload["messages"][2]["tool_calls"][0];
        assert_eq!(call["function"]["arguments"], r#"{"date":"2026-08-28"}"#);
    }

    #[test]
    fn text_response_becomes_a_text_turn() {
        let body = json!({
            "choices": [{
                "message": { "role": "assistant", "content": "¡Hola! ¿En qué ayudo?" }
            }]
        });
        assert_eq!(
            interpret_response(&body).expect("interpret"),
            ModelTurn::Text("¡Hola! ¿En qué ayudo?".to_string())
        );
    }

    #[test]
    fn tool_call_response_parses_string_arguments() {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "check_availability",
                            "arguments": "{\"date\":\"2026-08-28\"}"
                        }
                    }]
                }
            }]
        });

        let turn = interpret_response(&body).expect("interpret");
        let ModelTurn::ToolCalls(calls) = turn else {
            panic!("expected tool calls");
        };
        assert_eq!(calls[0].name, "check_availability");
        assert_eq!(calls[0].arguments["date"], "2026-08-28");
    }

    #[test]
    fn malformed_arguments_are_a_decode_error() {
        let body = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "id": "call_abc",
                        "function": { "name": "check_availability", "arguments": "not json" }
                    }]
                }
            }]
        });
        assert!(interpret_response(&body).is_err());
    }
}
