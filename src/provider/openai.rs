//! OpenAI Chat Completions API provider.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::debug;

use crate::error::CourierError;
use crate::types::*;

use super::http::{bearer_headers, build_client, status_to_error};
use super::{ModelProvider, ProviderRequest, ProviderResponse};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    provider_name: &'static str,
    model: String,
    url: String,
    headers: HeaderMap,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(
        model: impl Into<String>,
        api_key: &str,
        base_url: Option<String>,
    ) -> Result<Self, CourierError> {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::with_endpoint(
            "openai",
            model,
            format!("{}/chat/completions", base_url.trim_end_matches('/')),
            bearer_headers(api_key),
        )
    }

    /// Chat Completions wire format at an arbitrary URL with custom auth headers.
    pub(crate) fn with_endpoint(
        provider_name: &'static str,
        model: impl Into<String>,
        url: String,
        headers: HeaderMap,
    ) -> Result<Self, CourierError> {
        Ok(Self {
            provider_name,
            model: model.into(),
            url,
            headers,
            client: build_client()?,
        })
    }

    pub(crate) fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let messages = request
            .messages
            .iter()
            .map(message_to_openai)
            .collect::<Vec<_>>();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });
        let Some(obj) = body.as_object_mut() else {
            return body;
        };

        if let Some(max) = request.settings.max_tokens {
            obj.insert("max_tokens".into(), max.into());
        }
        if let Some(temp) = request.settings.temperature {
            obj.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = request.settings.top_p {
            obj.insert("top_p".into(), top_p.into());
        }
        if let Some(seed) = request.settings.seed {
            obj.insert("seed".into(), seed.into());
        }
        if let Some(ref user) = request.settings.user {
            obj.insert("user".into(), user.clone().into());
        }

        // tool_choice is only valid alongside a tool list
        if let Some(tools) = request.tools.as_ref().filter(|t| !t.is_empty()) {
            let tool_defs: Vec<serde_json::Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters.schema,
                        }
                    })
                })
                .collect();
            obj.insert("tools".into(), tool_defs.into());
            if let Some(choice) = request.tool_choice {
                obj.insert("tool_choice".into(), choice.to_string().into());
            }
        }

        body
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        self.provider_name
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, CourierError> {
        let body = self.build_request_body(request);

        debug!(
            provider = self.provider_name,
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "chat completion request"
        );

        let resp = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: OpenAiChatResponse = resp.json().await?;
        parse_response(data)
    }
}

fn parse_response(data: OpenAiChatResponse) -> Result<ProviderResponse, CourierError> {
    let choice = data
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CourierError::api(200, "No choices in chat completion response"))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| ToolCallRequest::from_wire(tc.id, tc.function.name, tc.function.arguments))
        .collect();

    Ok(ProviderResponse {
        content: choice.message.content,
        tool_calls,
        usage: data
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default(),
        finish_reason: choice.finish_reason.as_deref().and_then(FinishReason::from_wire),
    })
}

pub(crate) fn message_to_openai(msg: &ModelMessage) -> serde_json::Value {
    match msg {
        ModelMessage::System { content } => {
            serde_json::json!({ "role": "system", "content": content })
        }
        ModelMessage::User { content } => serde_json::json!({ "role": "user", "content": content }),
        ModelMessage::Assistant {
            content,
            tool_calls,
        } => {
            let mut value = serde_json::json!({ "role": "assistant", "content": content });
            if !tool_calls.is_empty() {
                let tc_json: Vec<serde_json::Value> = tool_calls
                    .iter()
                    .map(|tc| {
                        serde_json::json!({
                            "id": tc.id,
                            "type": "function",
                            "function": {
                                "name": tc.name,
                                "arguments": arguments_to_wire(&tc.arguments),
                            }
                        })
                    })
                    .collect();
                value["tool_calls"] = tc_json.into();
            }
            value
        }
        ModelMessage::Tool(result) => serde_json::json!({
            "role": "tool",
            "tool_call_id": result.tool_call_id,
            "name": result.name,
            "content": result.content(),
        }),
    }
}

/// Raw strings are echoed back exactly as the model produced them.
fn arguments_to_wire(arguments: &serde_json::Value) -> String {
    match arguments {
        serde_json::Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}

// Chat Completions response types (internal)

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunction,
}

#[derive(Deserialize)]
struct OpenAiFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolDeclaration, ToolParameters};
    use serde_json::json;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new("gpt-4o", "sk-test", None).unwrap()
    }

    fn request(tools: Option<Vec<ToolDeclaration>>, tool_choice: Option<ToolChoice>) -> ProviderRequest {
        ProviderRequest {
            messages: vec![ModelMessage::user("hi")],
            settings: GenerationSettings::default(),
            tools,
            tool_choice,
        }
    }

    #[test]
    fn body_advertises_tools_with_choice() {
        let decl = ToolDeclaration::new("get_current_time", "time", ToolParameters::empty());
        let body = provider().build_request_body(&request(Some(vec![decl]), Some(ToolChoice::Auto)));

        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "get_current_time");
        assert_eq!(body["tools"][0]["function"]["parameters"]["type"], "object");
        assert_eq!(body["tool_choice"], "auto");
    }

    #[test]
    fn body_without_tools_omits_tool_choice() {
        let body = provider().build_request_body(&request(None, Some(ToolChoice::Auto)));
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn assistant_tool_calls_and_results_use_wire_shape() {
        let call = ToolCallRequest::new("call_1", "send_email", json!({ "to_email": "a@b.se" }));
        let assistant = message_to_openai(&ModelMessage::assistant_with_tool_calls(None, vec![call.clone()]));
        assert_eq!(assistant["content"], serde_json::Value::Null);
        assert_eq!(assistant["tool_calls"][0]["function"]["arguments"], r#"{"to_email":"a@b.se"}"#);

        let tool = message_to_openai(&ModelMessage::tool_result(ToolCallResult::success(
            &call,
            json!({ "status": "sent" }),
        )));
        assert_eq!(tool["role"], "tool");
        assert_eq!(tool["tool_call_id"], "call_1");
        assert_eq!(tool["name"], "send_email");
        assert_eq!(tool["content"], r#"{"ok":true,"data":{"status":"sent"}}"#);
    }

    #[test]
    fn response_parsing_keeps_tool_call_order() {
        let data: OpenAiChatResponse = serde_json::from_value(json!({
            "choices": [{
                "finish_reason": "tool_calls",
                "message": {
                    "content": null,
                    "tool_calls": [
                        { "id": "a", "type": "function", "function": { "name": "get_current_time", "arguments": "{\"location\":\"Tokyo\"}" } },
                        { "id": "b", "type": "function", "function": { "name": "get_current_time", "arguments": "{bad" } }
                    ]
                }
            }],
            "usage": { "prompt_tokens": 3, "completion_tokens": 4, "total_tokens": 7 }
        }))
        .unwrap();

        let resp = parse_response(data).unwrap();
        assert_eq!(resp.content, None);
        assert_eq!(resp.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(resp.usage.total_tokens, 7);
        let ids: Vec<_> = resp.tool_calls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(resp.tool_calls[1].arguments, json!("{bad"));
    }

    #[test]
    fn empty_choices_is_an_error() {
        let data: OpenAiChatResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(parse_response(data).is_err());
    }
}
