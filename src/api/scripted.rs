//! An offline `Completion` implementation.
//!
//! Note: this is compiled into the binary as well so that the whole program can be run in test mode
//! without a model server.

use crate::api::{Completion, CompletionRequest, CompletionResponse};
use crate::error::Res;
use crate::prompt::{INPUT_PREFIX, WORKED_EXAMPLES};
use anyhow::anyhow;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const MODEL: &str = "scripted";

/// The reply to inputs that are not in the script.
pub const CONVERSATIONAL_REPLY: &str =
    "Hello! I can help you record income and expenses. What did you spend money on today?";

/// The reply to prompts that carry no `INPUT:` line, such as advisor questions.
pub const ADVICE_REPLY: &str =
    "Your spending looks under control this month. Keep an eye on your largest expense category.";

/// Answers extraction prompts from a fixed script keyed by the prompt's input text.
///
/// The script starts with the worked examples of the extraction prompt. Replies queued with
/// `enqueue` or `enqueue_error` take priority over the script, one per call.
#[derive(Debug)]
pub struct ScriptedCompletion {
    script: HashMap<String, String>,
    queued: Mutex<VecDeque<Result<String, String>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl Default for ScriptedCompletion {
    fn default() -> Self {
        let script = WORKED_EXAMPLES
            .iter()
            .map(|(input, json)| (input.to_string(), json.to_string()))
            .collect();
        Self {
            script,
            queued: Mutex::new(VecDeque::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }
}

impl ScriptedCompletion {
    /// Adds or replaces the reply for `input`.
    pub fn with_reply(mut self, input: impl Into<String>, reply: impl Into<String>) -> Self {
        self.script.insert(input.into(), reply.into());
        self
    }

    /// Sleeps for `delay` before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// The next call returns `reply` verbatim.
    pub fn enqueue(&self, reply: impl Into<String>) {
        self.queue().push_back(Ok(reply.into()));
    }

    /// The next call fails with `message`.
    pub fn enqueue_error(&self, message: impl Into<String>) {
        self.queue().push_back(Err(message.into()));
    }

    /// How many requests have been received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, String>>> {
        self.queued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn scripted_reply(&self, prompt: &str) -> String {
        match input_of(prompt) {
            Some(input) => self
                .script
                .iter()
                .find(|(k, _)| k.trim().to_lowercase() == input.trim().to_lowercase())
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| CONVERSATIONAL_REPLY.to_string()),
            None => ADVICE_REPLY.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Completion for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Res<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let queued = self.queue().pop_front();
        let response = match queued {
            Some(Ok(reply)) => reply,
            Some(Err(message)) => return Err(anyhow!(message)),
            None => self.scripted_reply(&request.prompt),
        };
        Ok(CompletionResponse {
            model: MODEL.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            response,
            done: true,
        })
    }
}

/// The quoted text on the prompt's `INPUT:` line.
fn input_of(prompt: &str) -> Option<&str> {
    let line = prompt
        .lines()
        .find_map(|line| line.trim().strip_prefix(INPUT_PREFIX))?;
    Some(line.trim().trim_matches('"'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::build_extraction_prompt;

    fn request(input: &str) -> CompletionRequest {
        CompletionRequest::json("m", build_extraction_prompt(input, &[]))
    }

    #[tokio::test]
    async fn test_answers_worked_examples() {
        let client = ScriptedCompletion::default();
        let response = client.complete(&request("Cafe 30k")).await.unwrap();
        assert!(response.response.contains("\"amount\": 30000"));
        assert!(response.done);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_input_is_conversational() {
        let client = ScriptedCompletion::default();
        let response = client.complete(&request("hello there")).await.unwrap();
        assert_eq!(response.response, CONVERSATIONAL_REPLY);
    }

    #[tokio::test]
    async fn test_queue_takes_priority() {
        let client = ScriptedCompletion::default().with_reply("taxi 80k", r#"{"amount": 80000}"#);
        client.enqueue("not json");
        client.enqueue_error("server exploded");
        assert_eq!(
            client.complete(&request("taxi 80k")).await.unwrap().response,
            "not json"
        );
        let err = client.complete(&request("taxi 80k")).await.unwrap_err();
        assert_eq!(err.to_string(), "server exploded");
        assert_eq!(
            client.complete(&request("taxi 80k")).await.unwrap().response,
            r#"{"amount": 80000}"#
        );
    }

    #[tokio::test]
    async fn test_prompt_without_input_gets_advice() {
        let client = ScriptedCompletion::default();
        let response = client
            .complete(&CompletionRequest::text("m", "How am I doing?"))
            .await
            .unwrap();
        assert_eq!(response.response, ADVICE_REPLY);
    }
}
