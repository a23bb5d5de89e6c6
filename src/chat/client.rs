//! HTTP client for the model provider's Responses API.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::errors::{Error, Result};
use crate::secrets::{SecretCache, SecretString};

use super::types::{normalize_tag, Intelligence, ResponseFormat};

/// Default API endpoint; overridable for tests and proxies.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Payload field holding the provider API key inside the keys secret.
const OPENAI_KEY_FIELD: &str = "OPENAI";

/// Output of a chat call.
///
/// Plain text when no response format was requested, parsed JSON when a
/// schema was enforced.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutput {
    Text(String),
    Json(Value),
}

impl ChatOutput {
    /// The text form, if this is a text output.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ChatOutput::Text(s) => Some(s),
            ChatOutput::Json(_) => None,
        }
    }

    /// The JSON form, if this is a structured output.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ChatOutput::Json(v) => Some(v),
            ChatOutput::Text(_) => None,
        }
    }
}

/// Chat client wrapping the Responses API.
///
/// Holds the API key as a [`SecretString`] so it never appears in Debug or
/// log output. Construct via [`ChatClient::from_cache`] in production so the
/// key follows the same rotation path as every other secret.
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// Create a client with an explicit API key.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        }
    }

    /// Point the client at a different API endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resolve the API key from the secret cache.
    ///
    /// The secret payload must contain an `OPENAI` field holding the key.
    pub async fn from_cache(
        cache: &SecretCache,
        secret_id: &str,
        region: &str,
    ) -> Result<Self> {
        let payload = cache.get(secret_id, region, false).await?;
        let api_key = payload
            .get(OPENAI_KEY_FIELD)
            .and_then(Value::as_str)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::config(format!(
                    "API keys secret is missing the '{OPENAI_KEY_FIELD}' field"
                ))
            })?;

        Ok(Self::new(SecretString::new(api_key)))
    }

    /// Send a system prompt and one or more user prompts in a single call.
    ///
    /// `tag` is normalized and attached as `metadata.billing_tag` and as the
    /// request `user` field for usage aggregation. When `response_format` is
    /// supplied the model is constrained to the schema and the output is
    /// parsed as JSON; otherwise the assistant text is returned as-is.
    pub async fn chat(
        &self,
        tag: &str,
        intelligence: Intelligence,
        system_prompt: &str,
        user_prompts: &[String],
        response_format: Option<&ResponseFormat>,
    ) -> Result<ChatOutput> {
        let schema = match response_format {
            Some(format) => Some(format.load()?),
            None => None,
        };
        let body = build_request_body(tag, intelligence, system_prompt, user_prompts, schema.as_ref())?;

        debug!(
            model = intelligence.model(),
            billing_tag = %normalize_tag(tag),
            structured = schema.is_some(),
            "Sending chat request"
        );

        let response = self
            .http
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::chat(
                format!("chat request failed: {detail}"),
                Some(status.as_u16()),
            ));
        }

        let envelope: Value = response.json().await?;
        let text = extract_output_text(&envelope)?;
        info!(model = intelligence.model(), chars = text.len(), "Chat response received");

        if schema.is_some() {
            let parsed = serde_json::from_str(&text).map_err(|e| {
                Error::chat(
                    format!("model output is not valid JSON despite enforced schema: {e}"),
                    None,
                )
            })?;
            Ok(ChatOutput::Json(parsed))
        } else {
            Ok(ChatOutput::Text(text))
        }
    }
}

/// Assemble the Responses API request body.
fn build_request_body(
    tag: &str,
    intelligence: Intelligence,
    system_prompt: &str,
    user_prompts: &[String],
    schema: Option<&Value>,
) -> Result<Value> {
    if user_prompts.is_empty() {
        return Err(Error::config("at least one user prompt is required"));
    }

    let mut input = Vec::with_capacity(user_prompts.len() + 1);
    if !system_prompt.is_empty() {
        input.push(json!({ "role": "system", "content": system_prompt }));
    }
    for prompt in user_prompts {
        input.push(json!({ "role": "user", "content": prompt }));
    }

    let mut body = json!({
        "model": intelligence.model(),
        "input": input,
    });

    if let Some(schema) = schema {
        body["response_format"] = json!({
            "type": "json_schema",
            "json_schema": schema,
        });
    }

    if let Some(effort) = intelligence.reasoning_effort() {
        body["reasoning"] = json!({ "effort": effort });
    }

    let safe_tag = normalize_tag(tag);
    body["metadata"] = json!({ "billing_tag": safe_tag });
    body["user"] = json!(safe_tag);

    Ok(body)
}

/// Concatenate the `output_text` fragments of a Responses API envelope.
fn extract_output_text(envelope: &Value) -> Result<String> {
    let outputs = envelope
        .get("output")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::chat("response envelope has no 'output' array", None))?;

    let mut text = String::new();
    for item in outputs {
        let Some(contents) = item.get("content").and_then(Value::as_array) else {
            continue;
        };
        for content in contents {
            if content.get("type").and_then(Value::as_str) == Some("output_text") {
                if let Some(fragment) = content.get("text").and_then(Value::as_str) {
                    text.push_str(fragment);
                }
            }
        }
    }

    if text.is_empty() {
        return Err(Error::chat("response contained no assistant text", None));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_body_includes_system_and_user_roles() {
        let body = build_request_body(
            "demo",
            Intelligence::Medium,
            "You are terse.",
            &prompts(&["Say hi", "Again"]),
            None,
        )
        .unwrap();

        let input = body["input"].as_array().unwrap();
        assert_eq!(input.len(), 3);
        assert_eq!(input[0]["role"], "system");
        assert_eq!(input[1]["role"], "user");
        assert_eq!(input[1]["content"], "Say hi");
        assert_eq!(input[2]["content"], "Again");
    }

    #[test]
    fn test_body_omits_empty_system_prompt() {
        let body =
            build_request_body("demo", Intelligence::Low, "", &prompts(&["hi"]), None).unwrap();
        let input = body["input"].as_array().unwrap();
        assert_eq!(input.len(), 1);
        assert_eq!(input[0]["role"], "user");
    }

    #[test]
    fn test_body_requires_a_user_prompt() {
        assert!(build_request_body("demo", Intelligence::Low, "sys", &[], None).is_err());
    }

    #[test]
    fn test_body_sets_model_and_reasoning_per_tier() {
        let low = build_request_body("t", Intelligence::Low, "", &prompts(&["x"]), None).unwrap();
        assert_eq!(low["model"], "gpt-5-mini");
        assert!(low.get("reasoning").is_none());

        let high = build_request_body("t", Intelligence::High, "", &prompts(&["x"]), None).unwrap();
        assert_eq!(high["model"], "gpt-5");
        assert_eq!(high["reasoning"]["effort"], "high");
    }

    #[test]
    fn test_body_carries_normalized_billing_tag() {
        let body =
            build_request_body("  Team AB! ", Intelligence::Low, "", &prompts(&["x"]), None)
                .unwrap();
        assert_eq!(body["metadata"]["billing_tag"], "team_ab");
        assert_eq!(body["user"], "team_ab");
    }

    #[test]
    fn test_body_embeds_schema_when_supplied() {
        let schema = json!({"name": "answer", "schema": {"type": "object"}});
        let body = build_request_body(
            "t",
            Intelligence::Medium,
            "",
            &prompts(&["x"]),
            Some(&schema),
        )
        .unwrap();

        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "answer");
    }

    #[test]
    fn test_extract_output_text_concatenates_fragments() {
        let envelope = json!({
            "output": [
                {
                    "type": "message",
                    "content": [
                        { "type": "output_text", "text": "Hello" },
                        { "type": "output_text", "text": ", world" }
                    ]
                }
            ]
        });
        assert_eq!(extract_output_text(&envelope).unwrap(), "Hello, world");
    }

    #[test]
    fn test_extract_output_text_skips_non_text_content() {
        let envelope = json!({
            "output": [
                { "type": "reasoning" },
                {
                    "type": "message",
                    "content": [
                        { "type": "refusal", "refusal": "no" },
                        { "type": "output_text", "text": "yes" }
                    ]
                }
            ]
        });
        assert_eq!(extract_output_text(&envelope).unwrap(), "yes");
    }

    #[test]
    fn test_extract_output_text_empty_is_error() {
        assert!(extract_output_text(&json!({"output": []})).is_err());
        assert!(extract_output_text(&json!({})).is_err());
    }
}
