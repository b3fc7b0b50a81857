//! The text-completion collaborator. `OllamaClient` talks to a model server over HTTP;
//! `ScriptedCompletion` answers offline and is used in tests and in test mode.

mod ollama;
mod scripted;

use crate::error::Res;
use crate::Config;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub(crate) use ollama::is_timeout;
pub use ollama::OllamaClient;
pub use scripted::{ScriptedCompletion, ADVICE_REPLY, CONVERSATIONAL_REPLY};

/// The environment variable that switches the binary to `Mode::Test`.
pub const TEST_MODE_ENV: &str = "MONEYMANAGER_IN_TEST_MODE";

/// The body of a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    /// Always false; the whole response is awaited.
    pub stream: bool,
    /// `Some("json")` constrains the model to JSON output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl CompletionRequest {
    /// A request for a single JSON object.
    pub fn json(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
            format: Some("json".to_string()),
        }
    }

    /// A request for free text.
    pub fn text(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            format: None,
            ..Self::json(model, prompt)
        }
    }
}

/// The body of a completion response. Only `response` is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub created_at: String,
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

/// Sends a prompt to a text-completion model and returns its raw reply.
#[async_trait::async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Res<CompletionResponse>;
}

/// Whether the real model server or the offline scripted client is used.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum Mode {
    #[default]
    Live,
    Test,
}

impl Mode {
    /// `Mode::Test` when `MONEYMANAGER_IN_TEST_MODE` is set to a non-empty value.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(v) if !v.is_empty() => Mode::Test,
            _ => Mode::Live,
        }
    }
}

/// Builds the completion client for `mode`.
pub fn completion(config: &Config, mode: Mode) -> Res<Arc<dyn Completion>> {
    Ok(match mode {
        Mode::Live => Arc::new(OllamaClient::new(
            config.completion_url(),
            config.completion_timeout(),
        )?),
        Mode::Test => Arc::new(ScriptedCompletion::default()),
    })
}
