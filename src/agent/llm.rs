/// Language-model backends.
///
/// Enum dispatch over two HTTP backends that both speak native function
/// calling: the Gemini `generateContent` API and OpenAI-compatible chat
/// completions (`OpenAI`, `DeepSeek`, Ollama, ...). Calls are blocking; the
/// session waits for every answer before touching the map.
///
/// Request building and response extraction are plain functions over
/// `serde_json::Value` so they can be tested without a network.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::debug;

use super::{AgentDriver, AgentTurn, ToolInvocation, ToolReply, ToolSpec, Turn, TurnRequest, Usage};
use crate::config::{AgentConfig, BackendType};
use crate::error::DriverError;

// ── Unified backend enum ──

pub enum LlmBackend {
    Gemini(GeminiBackend),
    OpenAi(OpenAiBackend),
}

impl AgentDriver for LlmBackend {
    fn name(&self) -> &str {
        match self {
            Self::Gemini(_) => "gemini",
            Self::OpenAi(_) => "openai-compatible",
        }
    }

    fn next_turn(&mut self, request: &TurnRequest<'_>) -> Result<AgentTurn, DriverError> {
        match self {
            Self::Gemini(backend) => backend.complete(request),
            Self::OpenAi(backend) => backend.complete(request),
        }
    }
}

/// Create a backend from configuration and an API key.
pub fn create_backend(config: &AgentConfig, api_key: String) -> Result<LlmBackend, DriverError> {
    let http = HttpTarget::new(config, api_key)?;
    Ok(match config.backend {
        BackendType::Gemini => LlmBackend::Gemini(GeminiBackend { http }),
        BackendType::OpenAi => LlmBackend::OpenAi(OpenAiBackend { http }),
    })
}

/// Read the API key named by the config from the environment.
pub fn api_key_from_env(config: &AgentConfig) -> Result<String, DriverError> {
    match std::env::var(&config.api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(DriverError::MissingApiKey(config.api_key_env.clone())),
    }
}

struct HttpTarget {
    client: reqwest::blocking::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpTarget {
    fn new(config: &AgentConfig, api_key: String) -> Result<Self, DriverError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DriverError::Request(format!("HTTP client init failed: {e}")))?;
        Ok(HttpTarget {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }

    fn post(&self, url: &str, auth: (&str, String), body: &Value) -> Result<Value, DriverError> {
        let response = self
            .client
            .post(url)
            .header(auth.0, auth.1)
            .json(body)
            .send()
            .map_err(|e| DriverError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(DriverError::Status { status: status.as_u16(), body });
        }

        response
            .json::<Value>()
            .map_err(|e| DriverError::Malformed(format!("response is not JSON: {e}")))
    }
}

// ── Gemini ──

/// Backend for the Gemini `generateContent` API.
///
/// Sends requests to `{api_url}/models/{model}:generateContent` with the key
/// in the `x-goog-api-key` header.
pub struct GeminiBackend {
    http: HttpTarget,
}

impl GeminiBackend {
    fn complete(&self, request: &TurnRequest<'_>) -> Result<AgentTurn, DriverError> {
        let url = format!("{}/models/{}:generateContent", self.http.api_url, self.http.model);
        let body = gemini_request_body(request);
        debug!(model = %self.http.model, turns = request.transcript.len(), "gemini request");
        let json = self
            .http
            .post(&url, ("x-goog-api-key", self.http.api_key.clone()), &body)?;
        parse_gemini_response(&json)
    }
}

fn gemini_request_body(request: &TurnRequest<'_>) -> Value {
    let contents: Vec<Value> = request.transcript.iter().map(gemini_content).collect();
    let declarations: Vec<Value> = request
        .tools
        .iter()
        .map(|t| json!({
            "name": t.name,
            "description": t.description,
            "parameters": { "type": "OBJECT" },
        }))
        .collect();

    json!({
        "systemInstruction": { "parts": [{ "text": request.system }] },
        "contents": contents,
        "tools": [{ "functionDeclarations": declarations }],
    })
}

fn gemini_content(turn: &Turn) -> Value {
    match turn {
        Turn::User(text) => json!({ "role": "user", "parts": [{ "text": text }] }),
        Turn::Model { raw: Some(raw), .. } => raw.clone(),
        Turn::Model { text, calls, raw: None } => {
            let mut parts: Vec<Value> = text.iter().map(|t| json!({ "text": t })).collect();
            parts.extend(calls.iter().map(|c| {
                let mut call = json!({ "name": c.name, "args": {} });
                if !c.id.is_empty() {
                    call["id"] = Value::from(c.id.as_str());
                }
                json!({ "functionCall": call })
            }));
            json!({ "role": "model", "parts": parts })
        }
        Turn::ToolResults(results) => {
            let parts: Vec<Value> = results
                .iter()
                .map(|r| {
                    let response = match &r.reply {
                        ToolReply::Result(t) => json!({ "result": t }),
                        ToolReply::Error(t) => json!({ "error": t }),
                    };
                    let mut reply = json!({ "name": r.name, "response": response });
                    if !r.call_id.is_empty() {
                        reply["id"] = Value::from(r.call_id.as_str());
                    }
                    json!({ "functionResponse": reply })
                })
                .collect();
            json!({ "role": "user", "parts": parts })
        }
    }
}

/// Extract text, function calls and usage from a `generateContent` response.
fn parse_gemini_response(json: &Value) -> Result<AgentTurn, DriverError> {
    let content = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"));

    let Some(content) = content else {
        let reason = json
            .pointer("/promptFeedback/blockReason")
            .and_then(Value::as_str)
            .unwrap_or("no candidates");
        return Err(DriverError::Malformed(format!("Gemini response has no content: {reason}")));
    };

    let parts = content
        .get("parts")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut text = String::new();
    let mut calls = vec![];
    for part in parts {
        if let Some(call) = part.get("functionCall") {
            let name = call
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| DriverError::Malformed("functionCall without name".to_owned()))?;
            // Gemini only sometimes assigns ids; an empty id is never echoed.
            let id = call.get("id").and_then(Value::as_str).unwrap_or_default().to_owned();
            calls.push(ToolInvocation { id, name: name.to_owned() });
        } else if let Some(t) = part.get("text").and_then(Value::as_str) {
            if part.get("thought").and_then(Value::as_bool) != Some(true) {
                text.push_str(t);
            }
        }
    }

    let usage = json.get("usageMetadata").map(|u| Usage {
        prompt_tokens: u.get("promptTokenCount").and_then(Value::as_u64).unwrap_or(0),
        completion_tokens: u.get("candidatesTokenCount").and_then(Value::as_u64).unwrap_or(0),
    });

    Ok(AgentTurn {
        text: (!text.is_empty()).then_some(text),
        calls,
        usage,
        raw: Some(content.clone()),
    })
}

// ── OpenAI-compatible ──

/// Backend for OpenAI-compatible chat completions with `tools`.
///
/// Sends requests to `{api_url}/chat/completions`.
pub struct OpenAiBackend {
    http: HttpTarget,
}

impl OpenAiBackend {
    fn complete(&self, request: &TurnRequest<'_>) -> Result<AgentTurn, DriverError> {
        let url = format!("{}/chat/completions", self.http.api_url);
        let body = openai_request_body(&self.http.model, request);
        debug!(model = %self.http.model, turns = request.transcript.len(), "openai request");
        let json = self.http.post(
            &url,
            ("Authorization", format!("Bearer {}", self.http.api_key)),
            &body,
        )?;
        parse_openai_response(&json)
    }
}

fn openai_request_body(model: &str, request: &TurnRequest<'_>) -> Value {
    let mut messages = vec![json!({ "role": "system", "content": request.system })];
    for turn in request.transcript {
        match turn {
            Turn::User(text) => messages.push(json!({ "role": "user", "content": text })),
            Turn::Model { text, calls, .. } => {
                let mut msg = json!({ "role": "assistant", "content": text });
                if !calls.is_empty() {
                    let tool_calls: Vec<Value> = calls
                        .iter()
                        .map(|c| json!({
                            "id": c.id,
                            "type": "function",
                            "function": { "name": c.name, "arguments": "{}" },
                        }))
                        .collect();
                    msg["tool_calls"] = Value::from(tool_calls);
                }
                messages.push(msg);
            }
            Turn::ToolResults(results) => {
                messages.extend(results.iter().map(|r| json!({
                    "role": "tool",
                    "tool_call_id": r.call_id,
                    "content": r.reply.text(),
                })));
            }
        }
    }

    let tools: Vec<Value> = request.tools.iter().map(openai_tool).collect();
    json!({ "model": model, "messages": messages, "tools": tools })
}

fn openai_tool(tool: &ToolSpec) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": { "type": "object", "properties": {} },
        },
    })
}

/// Extract content, tool calls and usage from a chat completions response.
fn parse_openai_response(json: &Value) -> Result<AgentTurn, DriverError> {
    let message = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| {
            DriverError::Malformed("OpenAI response missing choices[0].message".to_owned())
        })?;

    let text = message
        .get("content")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned);

    let mut calls = vec![];
    if let Some(tool_calls) = message.get("tool_calls").and_then(Value::as_array) {
        for call in tool_calls {
            let name = call
                .pointer("/function/name")
                .and_then(Value::as_str)
                .ok_or_else(|| DriverError::Malformed("tool call without name".to_owned()))?;
            let id = call
                .get("id")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| format!("call_{}", calls.len()));
            calls.push(ToolInvocation { id, name: name.to_owned() });
        }
    }

    let usage = json.get("usage").map(|u| Usage {
        prompt_tokens: u.get("prompt_tokens").and_then(Value::as_u64).unwrap_or(0),
        completion_tokens: u.get("completion_tokens").and_then(Value::as_u64).unwrap_or(0),
    });

    Ok(AgentTurn { text, calls, usage, raw: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ToolResponse;

    const TOOLS: &[ToolSpec] = &[
        ToolSpec { name: "check_map", description: "You review the map known to you." },
        ToolSpec { name: "move_north", description: "Try to move north and update your map" },
    ];

    fn transcript() -> Vec<Turn> {
        vec![
            Turn::User("go".into()),
            Turn::Model {
                text: None,
                calls: vec![ToolInvocation { id: "c1".into(), name: "move_north".into() }],
                raw: None,
            },
            Turn::ToolResults(vec![ToolResponse {
                call_id: "c1".into(),
                name: "move_north".into(),
                reply: ToolReply::Result("moved".into()),
            }]),
        ]
    }

    fn config(backend: BackendType) -> AgentConfig {
        AgentConfig {
            backend,
            model: "test-model".into(),
            api_url: "https://example.invalid/v1/".into(),
            api_key_env: "FOGDRONE_TEST_KEY".into(),
            prompt_variant: 3,
            request_timeout_secs: 5,
        }
    }

    #[test]
    fn gemini_body_declares_tools_and_function_responses() {
        let turns = transcript();
        let request = TurnRequest { system: "sys", transcript: &turns, tools: TOOLS };
        let body = gemini_request_body(&request);

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(body["tools"][0]["functionDeclarations"][1]["name"], "move_north");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][1]["parts"][0]["functionCall"]["name"], "move_north");
        assert_eq!(
            body["contents"][2]["parts"][0]["functionResponse"]["response"]["result"],
            "moved"
        );
        assert_eq!(body["contents"][1]["parts"][0]["functionCall"]["id"], "c1");
        assert_eq!(body["contents"][2]["parts"][0]["functionResponse"]["id"], "c1");
    }

    #[test]
    fn gemini_call_ids_flow_back_into_function_responses() {
        let json = json!({
            "candidates": [{ "content": { "role": "model", "parts": [
                { "functionCall": { "id": "fc-7", "name": "check_map", "args": {} } },
                { "functionCall": { "name": "check_walkable", "args": {} } }
            ] } }]
        });
        let turn = parse_gemini_response(&json).unwrap();
        assert_eq!(turn.calls[0].id, "fc-7");
        assert_eq!(turn.calls[1].id, "");

        let turns = vec![
            turn.to_turn(),
            Turn::ToolResults(
                turn.calls
                    .iter()
                    .map(|c| ToolResponse {
                        call_id: c.id.clone(),
                        name: c.name.clone(),
                        reply: ToolReply::Result("ok".into()),
                    })
                    .collect(),
            ),
        ];
        let request = TurnRequest { system: "", transcript: &turns, tools: TOOLS };
        let body = gemini_request_body(&request);
        let parts = &body["contents"][1]["parts"];
        assert_eq!(parts[0]["functionResponse"]["id"], "fc-7");
        assert!(parts[1]["functionResponse"].get("id").is_none());
        assert_eq!(parts[1]["functionResponse"]["name"], "check_walkable");
    }

    #[test]
    fn gemini_echoes_raw_model_content() {
        let raw = json!({ "role": "model", "parts": [{ "functionCall": { "name": "check_map" }, "thoughtSignature": "abc" }] });
        let turns = vec![Turn::Model { text: None, calls: vec![], raw: Some(raw.clone()) }];
        let request = TurnRequest { system: "", transcript: &turns, tools: TOOLS };
        assert_eq!(gemini_request_body(&request)["contents"][0], raw);
    }

    #[test]
    fn gemini_response_with_calls_and_usage() {
        let json = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "thinking", "thought": true },
                        { "functionCall": { "name": "move_north", "args": {} } },
                        { "functionCall": { "name": "check_walkable", "args": {} } }
                    ]
                }
            }],
            "usageMetadata": { "promptTokenCount": 120, "candidatesTokenCount": 8 }
        });
        let turn = parse_gemini_response(&json).unwrap();
        assert_eq!(turn.text, None);
        let names: Vec<_> = turn.calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["move_north", "check_walkable"]);
        assert!(turn.calls.iter().all(|c| c.id.is_empty()));
        assert_eq!(turn.usage, Some(Usage { prompt_tokens: 120, completion_tokens: 8 }));
        assert!(turn.raw.is_some());
    }

    #[test]
    fn gemini_final_text() {
        let json = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Path: " }, { "text": "(4,1)" }] } }]
        });
        let turn = parse_gemini_response(&json).unwrap();
        assert_eq!(turn.text.as_deref(), Some("Path: (4,1)"));
        assert!(turn.calls.is_empty());
        assert_eq!(turn.usage, None);
    }

    #[test]
    fn gemini_blocked_prompt_is_malformed() {
        let json = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = parse_gemini_response(&json).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn openai_body_pairs_tool_results_with_call_ids() {
        let turns = transcript();
        let request = TurnRequest { system: "sys", transcript: &turns, tools: TOOLS };
        let body = openai_request_body("m", &request);

        assert_eq!(body["model"], "m");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][2]["tool_calls"][0]["id"], "c1");
        assert_eq!(body["messages"][3]["role"], "tool");
        assert_eq!(body["messages"][3]["tool_call_id"], "c1");
        assert_eq!(body["tools"][0]["function"]["name"], "check_map");
    }

    #[test]
    fn openai_response_with_tool_calls() {
        let json = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [
                        { "id": "abc", "type": "function", "function": { "name": "move_east", "arguments": "{}" } }
                    ]
                }
            }],
            "usage": { "prompt_tokens": 50, "completion_tokens": 5 }
        });
        let turn = parse_openai_response(&json).unwrap();
        assert_eq!(turn.text, None);
        assert_eq!(turn.calls, vec![ToolInvocation { id: "abc".into(), name: "move_east".into() }]);
        assert_eq!(turn.usage, Some(Usage { prompt_tokens: 50, completion_tokens: 5 }));
    }

    #[test]
    fn openai_response_missing_choices() {
        let json = json!({ "error": "rate_limit" });
        assert!(parse_openai_response(&json).is_err());
    }

    #[test]
    fn create_backend_dispatches_correctly() {
        let backend = create_backend(&config(BackendType::Gemini), "k".into()).unwrap();
        assert_eq!(backend.name(), "gemini");
        let backend = create_backend(&config(BackendType::OpenAi), "k".into()).unwrap();
        assert_eq!(backend.name(), "openai-compatible");
        if let LlmBackend::OpenAi(b) = backend {
            assert_eq!(b.http.api_url, "https://example.invalid/v1");
        }
    }

    #[test]
    fn missing_api_key_is_reported() {
        let mut cfg = config(BackendType::Gemini);
        cfg.api_key_env = "FOGDRONE_SURELY_UNSET_KEY".into();
        let err = api_key_from_env(&cfg).unwrap_err();
        assert!(matches!(err, DriverError::MissingApiKey(name) if name == "FOGDRONE_SURELY_UNSET_KEY"));
    }
}
