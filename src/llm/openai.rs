//! OpenAI-compatible chat completions over HTTP.

use crate::config::LlmConfig;
use crate::core::{Role, ToolCall, Turn};
use crate::error::{Error, Result};
use crate::llm::{ChatModel, Completion, CompletionRequest, ToolChoice};
use crate::tools::ToolSpec;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::{debug, warn};

/// Chat model backed by `{base_url}/chat/completions`.
pub struct OpenAiChatModel {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiChatModel {
    /// Build a client from configuration. The API key is read from the
    /// environment variable named in the config.
    ///
    /// # Errors
    ///
    /// Returns `Llm` if the HTTP client cannot be constructed.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Llm(format!("Failed to build HTTP client: {e}")))?;

        let api_key = env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!(env = %config.api_key_env, "No API key set; requests will be unauthenticated");
        }

        Ok(Self {
            client,
            url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
        })
    }
}

impl ChatModel for OpenAiChatModel {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<Completion> {
        let body = build_body(&self.model, request);
        debug!(
            model = %self.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "Sending completion request"
        );

        let mut http = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        let response = http
            .send()
            .map_err(|e| Error::Llm(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(map_http_error(status, &text));
        }

        let parsed: WireResponse = response
            .json()
            .map_err(|e| Error::Llm(format!("Failed to parse response: {e}")))?;
        into_completion(parsed)
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn build_body<'a>(model: &'a str, request: &CompletionRequest<'a>) -> WireRequest<'a> {
    let messages = request.messages.iter().map(wire_message).collect();
    let tools: Vec<Value> = request.tools.iter().map(ToolSpec::to_json).collect();
    let tool_choice = if tools.is_empty() {
        None
    } else {
        Some(match request.tool_choice {
            ToolChoice::Auto => "auto",
            ToolChoice::None => "none",
            ToolChoice::Required => "required",
        })
    };

    WireRequest {
        model,
        messages,
        tools,
        tool_choice,
        temperature: request.temperature,
    }
}

fn wire_message(turn: &Turn) -> WireMessage<'_> {
    let content = if turn.content.is_empty() && !turn.tool_calls.is_empty() {
        None
    } else {
        Some(turn.content.as_str())
    };
    WireMessage {
        role: turn.role,
        content,
        tool_calls: turn
            .tool_calls
            .iter()
            .map(|c| WireToolCall {
                id: c.id.clone(),
                kind: function_kind(),
                function: WireFunction {
                    name: c.name.clone(),
                    arguments: c.arguments.clone(),
                },
            })
            .collect(),
        tool_call_id: turn.tool_call_id.as_deref(),
    }
}

fn into_completion(response: WireResponse) -> Result<Completion> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| Error::Llm("Response contained no choices".to_string()))?;

    let content = message.content.unwrap_or_default();
    if message.tool_calls.is_empty() {
        return Ok(Completion::Text(content));
    }

    let calls = message
        .tool_calls
        .into_iter()
        .enumerate()
        .map(|(i, c)| ToolCall {
            id: if c.id.is_empty() {
                format!("call_{i}")
            } else {
                c.id
            },
            name: c.function.name,
            arguments: c.function.arguments,
        })
        .collect();
    Ok(Completion::ToolCalls { content, calls })
}

fn map_http_error(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map_or_else(|_| body.to_string(), |wrapper| wrapper.error.message);
    Error::Llm(format!("HTTP {}: {message}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::registry;
    use serde_json::json;

    fn request<'a>(messages: &'a [Turn], tools: &'a [ToolSpec]) -> CompletionRequest<'a> {
        CompletionRequest {
            messages,
            tools,
            tool_choice: ToolChoice::Auto,
            temperature: 0.2,
        }
    }

    #[test]
    fn body_with_tools_sets_choice() {
        let messages = vec![Turn::system("be helpful"), Turn::user("vpn broken")];
        let body = build_body("gpt-test", &request(&messages, registry()));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "gpt-test");
        assert_eq!(json["tool_choice"], "auto");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "vpn broken");
        assert_eq!(json["tools"].as_array().unwrap().len(), registry().len());
        assert!(json["messages"][1].get("tool_calls").is_none());
    }

    #[test]
    fn body_without_tools_omits_choice() {
        let messages = vec![Turn::user("hi")];
        let body = build_body("gpt-test", &request(&messages, &[]));
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("tools").is_none());
        assert!(json.get("tool_choice").is_none());
    }

    #[test]
    fn tool_call_turns_round_trip_to_wire() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "get_helpdesk_stats".to_string(),
            arguments: "{}".to_string(),
        };
        let messages = vec![
            Turn::assistant_calls("", vec![call]),
            Turn::tool("call_1", "No tickets"),
        ];
        let body = build_body("gpt-test", &request(&messages, &[]));
        let json = serde_json::to_value(&body).unwrap();

        assert!(json["messages"][0]["content"].is_null());
        assert_eq!(json["messages"][0]["tool_calls"][0]["type"], "function");
        assert_eq!(
            json["messages"][0]["tool_calls"][0]["function"]["name"],
            "get_helpdesk_stats"
        );
        assert_eq!(json["messages"][1]["role"], "tool");
        assert_eq!(json["messages"][1]["tool_call_id"], "call_1");
    }

    #[test]
    fn parse_text_response() {
        let raw = json!({
            "choices": [{ "message": { "role": "assistant", "content": "Try restarting." } }]
        });
        let parsed: WireResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(
            into_completion(parsed).unwrap(),
            Completion::Text("Try restarting.".to_string())
        );
    }

    #[test]
    fn parse_tool_call_response() {
        let raw = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {
                            "id": "call_a",
                            "type": "function",
                            "function": { "name": "create_ticket", "arguments": "{\"issue\":\"x\"}" }
                        },
                        { "function": { "name": "get_helpdesk_stats" } }
                    ]
                }
            }]
        });
        let parsed: WireResponse = serde_json::from_value(raw).unwrap();
        let Completion::ToolCalls { content, calls } = into_completion(parsed).unwrap() else {
            panic!("Expected tool calls");
        };
        assert!(content.is_empty());
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "call_a");
        assert_eq!(calls[0].arguments, "{\"issue\":\"x\"}");
        assert_eq!(calls[1].id, "call_1");
        assert_eq!(calls[1].arguments, "");
    }

    #[test]
    fn empty_choices_is_error() {
        let parsed: WireResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(matches!(into_completion(parsed), Err(Error::Llm(_))));
    }

    #[test]
    fn http_error_uses_api_message() {
        let body = r#"{"error": {"message": "Invalid API key", "type": "auth"}}"#;
        let err = map_http_error(StatusCode::UNAUTHORIZED, body);
        assert_eq!(err.to_string(), "LLM error: HTTP 401: Invalid API key");

        let err = map_http_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.to_string(), "LLM error: HTTP 502: upstream down");
    }

    #[test]
    fn url_strips_trailing_slash() {
        let config = LlmConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            api_key_env: "HELPDESK_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..LlmConfig::default()
        };
        let model = OpenAiChatModel::new(&config).unwrap();
        assert_eq!(model.url, "http://localhost:8080/v1/chat/completions");
        assert!(model.api_key.is_none());
    }
}
