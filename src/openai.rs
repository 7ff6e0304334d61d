use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Settings;
use crate::error::{EzCommitError, Result};

const DIFF_PLACEHOLDER: &str = "{diff}";

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[\w-]*[ \t]*\n(.*?)\n?```$").expect("code fence pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Builds the chat history for one generation request.
///
/// `{diff}` in the system prompt is replaced by the diff text; otherwise the
/// diff travels in the user message.
pub fn render_messages(system_prompt: &str, diff: &str, revision: Option<(&str, &str)>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(4);

    let user = if system_prompt.contains(DIFF_PLACEHOLDER) {
        messages.push(ChatMessage::new(Role::System, system_prompt.replace(DIFF_PLACEHOLDER, diff)));
        "Generate a commit message for the git diff above.".to_string()
    } else {
        messages.push(ChatMessage::new(Role::System, system_prompt));
        format!("Generate a commit message for the following git diff:\n\n{}", diff)
    };
    messages.push(ChatMessage::new(Role::User, user));

    if let Some((previous, feedback)) = revision {
        messages.push(ChatMessage::new(Role::Assistant, previous));
        messages.push(ChatMessage::new(Role::User, format!("Suggested changes: {}", feedback)));
    }
    messages
}

/// Trims the reply and unwraps a surrounding markdown code fence.
pub fn extract_message(content: &str) -> String {
    let trimmed = content.trim();
    match CODE_FENCE.captures(trimmed) {
        Some(caps) => caps[1].trim().to_string(),
        None => trimmed.to_string(),
    }
}

pub struct MessageGenerator {
    client: reqwest::Client,
    settings: Settings,
}

impl MessageGenerator {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| EzCommitError::Api(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, settings: settings.clone() })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn generate(&self, diff: &str) -> Result<String> {
        let messages = render_messages(&self.settings.system_prompt, diff, None);
        self.complete(&messages).await
    }

    /// Asks for a new message, passing the rejected one and the user's
    /// feedback along. Blank feedback is a plain retry.
    pub async fn regenerate(&self, diff: &str, previous: &str, feedback: &str) -> Result<String> {
        let feedback = feedback.trim();
        let revision = (!feedback.is_empty()).then_some((previous, feedback));
        let messages = render_messages(&self.settings.system_prompt, diff, revision);
        self.complete(&messages).await
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let api_key = self.settings.resolved_api_key().ok_or_else(|| {
            EzCommitError::Config(
                "OpenAI API key not found. Either set it in the config file or set the \
                 OPENAI_API_KEY environment variable."
                    .to_string(),
            )
        })?;

        let url = format!("{}/chat/completions", self.settings.api_base_url.trim_end_matches('/'));
        let request = CompletionRequest {
            model: &self.settings.model,
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        debug!(%url, model = %self.settings.model, messages = messages.len(), "requesting completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EzCommitError::Api(format!(
                        "Request timed out after {}s",
                        self.settings.request_timeout_secs
                    ))
                } else {
                    EzCommitError::Api(format!("Could not connect to {}: {}", url, e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EzCommitError::Api(format!("Failed to read response body: {}", e)))?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(EzCommitError::Api(format!(
                "Authentication failed (HTTP {}). Check your API key.",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(EzCommitError::Api(format!("HTTP {}: {}", status.as_u16(), body.trim())));
        }

        let parsed: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| EzCommitError::Api(format!("Malformed response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| EzCommitError::Api("Response contained no message".to_string()))?;

        let message = extract_message(&content);
        if message.is_empty() {
            return Err(EzCommitError::Api("Model returned an empty message".to_string()));
        }
        Ok(message)
    }
}
