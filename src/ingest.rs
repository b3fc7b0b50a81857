//! The natural-language ingestion pipeline: free text in, persisted `Transaction` out.
//!
//! Each call walks `Submitted -> AwaitingCompletion -> Parsing -> Resolving -> Persisting` and ends
//! in `Succeeded`, `Failed` or `Cancelled`. Progress can be observed through a `watch` channel. The
//! pipeline holds no per-call state; `Session` is what keeps a caller to one submission at a time.

use crate::api::{is_timeout, Completion, CompletionRequest};
use crate::extract::{parse, ParseError};
use crate::model::{Category, Transaction};
use crate::prompt::build_extraction_prompt;
use crate::resolve::resolve;
use crate::store::Store;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Default bound on the completion call.
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on loading the caller's categories.
pub const DEFAULT_CATEGORY_TIMEOUT: Duration = Duration::from_secs(2);

const COULD_NOT_UNDERSTAND: &str =
    "Sorry, I could not understand that as a transaction. Try something like \"cafe 30k\".";

/// Why an ingestion did not produce a transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error("the input is empty")]
    EmptyInput,
    #[error("the completion server did not answer within {0:?}")]
    CompletionTimeout(Duration),
    #[error("the completion request failed: {0}")]
    CompletionError(String),
    #[error("the completion could not be parsed: {0}")]
    MalformedResponse(#[from] ParseError),
    #[error("the input does not describe a transaction")]
    NotATransaction,
    #[error("the transaction could not be saved: {0}")]
    PersistenceError(String),
    #[error("the ingestion was cancelled")]
    Cancelled,
    #[error("another submission is still in progress")]
    Busy,
}

impl IngestError {
    /// The message to show the user. Inputs that could not be understood all get the same message;
    /// upstream and storage failures are shown as they are so the user can decide to retry.
    pub fn user_message(&self) -> String {
        match self {
            IngestError::EmptyInput
            | IngestError::NotATransaction
            | IngestError::MalformedResponse(_) => COULD_NOT_UNDERSTAND.to_string(),
            other => {
                let s = other.to_string();
                let mut chars = s.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => s,
                }
            }
        }
    }

    /// Whether submitting the same text again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IngestError::CompletionTimeout(_)
                | IngestError::CompletionError(_)
                | IngestError::PersistenceError(_)
                | IngestError::Busy
        )
    }
}

/// Where an ingestion is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IngestState {
    #[default]
    Idle,
    Submitted,
    AwaitingCompletion,
    Parsing,
    Resolving,
    Persisting,
    Succeeded(Transaction),
    Failed(IngestError),
    Cancelled,
}

impl IngestState {
    pub fn name(&self) -> &'static str {
        match self {
            IngestState::Idle => "idle",
            IngestState::Submitted => "submitted",
            IngestState::AwaitingCompletion => "awaiting_completion",
            IngestState::Parsing => "parsing",
            IngestState::Resolving => "resolving",
            IngestState::Persisting => "persisting",
            IngestState::Succeeded(_) => "succeeded",
            IngestState::Failed(_) => "failed",
            IngestState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            IngestState::Succeeded(_) | IngestState::Failed(_) | IngestState::Cancelled
        )
    }

    /// True while a submission occupies the session.
    pub fn is_in_flight(&self) -> bool {
        !self.is_terminal() && *self != IngestState::Idle
    }
}

/// Requests cancellation of the ingestion holding the matching `Cancel`.
#[derive(Debug)]
pub struct Canceller(watch::Sender<bool>);

/// Observes a `Canceller`. If the `Canceller` is dropped without cancelling, nothing is cancelled.
#[derive(Debug, Clone)]
pub struct Cancel(watch::Receiver<bool>);

/// Creates a connected `Canceller` and `Cancel`.
pub fn cancellation() -> (Canceller, Cancel) {
    let (tx, rx) = watch::channel(false);
    (Canceller(tx), Cancel(rx))
}

impl Canceller {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

impl Cancel {
    /// A `Cancel` that never fires.
    pub fn never() -> Self {
        cancellation().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Completes once cancellation has been requested.
    pub async fn cancelled(&self) {
        let mut rx = self.0.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Turns free text into a stored transaction.
pub struct Pipeline {
    completion: Arc<dyn Completion>,
    store: Arc<dyn Store>,
    model: String,
    completion_timeout: Duration,
    category_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        completion: Arc<dyn Completion>,
        store: Arc<dyn Store>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            completion,
            store,
            model: model.into(),
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
            category_timeout: DEFAULT_CATEGORY_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, completion: Duration, categories: Duration) -> Self {
        self.completion_timeout = completion;
        self.category_timeout = categories;
        self
    }

    /// Runs one ingestion without observation or cancellation.
    pub async fn ingest(&self, input: &str) -> Result<Transaction, IngestError> {
        let (state, _) = watch::channel(IngestState::Idle);
        self.ingest_observed(input, &state, &Cancel::never()).await
    }

    /// Runs one ingestion, publishing every state to `state`. `cancel` is honoured until the
    /// transaction is handed to the store; after that the ingestion always runs to completion.
    pub async fn ingest_observed(
        &self,
        input: &str,
        state: &watch::Sender<IngestState>,
        cancel: &Cancel,
    ) -> Result<Transaction, IngestError> {
        let set = |s: IngestState| {
            debug!("Ingestion state: {}", s.name());
            state.send_replace(s);
        };
        let fail = |e: IngestError| {
            debug!("Ingestion failed: {e}");
            set(if e == IngestError::Cancelled {
                IngestState::Cancelled
            } else {
                IngestState::Failed(e.clone())
            });
            Err(e)
        };

        set(IngestState::Submitted);
        let input = input.trim();
        if input.is_empty() {
            return fail(IngestError::EmptyInput);
        }

        let categories = tokio::select! {
            biased;
            _ = cancel.cancelled() => return fail(IngestError::Cancelled),
            categories = self.load_categories() => categories,
        };
        let names: Vec<&str> = categories.iter().map(|c| c.name()).collect();
        let request = CompletionRequest::json(&self.model, build_extraction_prompt(input, &names));

        set(IngestState::AwaitingCompletion);
        let call = tokio::time::timeout(self.completion_timeout, self.completion.complete(&request));
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return fail(IngestError::Cancelled),
            result = call => result,
        };
        let response = match result {
            Err(_) => return fail(IngestError::CompletionTimeout(self.completion_timeout)),
            Ok(Err(e)) if is_timeout(&e) => {
                return fail(IngestError::CompletionTimeout(self.completion_timeout))
            }
            Ok(Err(e)) => return fail(IngestError::CompletionError(format!("{e:#}"))),
            Ok(Ok(response)) => response,
        };
        if cancel.is_cancelled() {
            return fail(IngestError::Cancelled);
        }

        set(IngestState::Parsing);
        let extracted = match parse(&response.response) {
            Ok(extracted) => extracted,
            Err(e) => return fail(e.into()),
        };
        let amount = match extracted.amount {
            Some(amount) if extracted.is_transaction() => amount,
            _ => return fail(IngestError::NotATransaction),
        };

        set(IngestState::Resolving);
        let category = resolve(extracted.category.as_deref(), &categories);
        debug!(
            "Category guess {:?} resolved to '{}'",
            extracted.category,
            category.name()
        );
        let description = extracted
            .description
            .clone()
            .unwrap_or_else(|| input.to_string());
        let transaction = Transaction::new(
            amount,
            extracted.kind(),
            category.name(),
            description,
            Utc::now(),
        );

        if cancel.is_cancelled() {
            return fail(IngestError::Cancelled);
        }
        set(IngestState::Persisting);
        let saved = match self.store.add_transaction(transaction).await {
            Ok(saved) => saved,
            Err(e) => return fail(IngestError::PersistenceError(format!("{e:#}"))),
        };
        info!(
            "Recorded {} of {} in '{}'",
            saved.kind(),
            saved.amount(),
            saved.category()
        );
        set(IngestState::Succeeded(saved.clone()));
        Ok(saved)
    }

    /// Loads the caller's categories, giving up after `category_timeout`. Any failure yields an
    /// empty list.
    async fn load_categories(&self) -> Vec<Category> {
        match tokio::time::timeout(self.category_timeout, self.store.categories()).await {
            Ok(Ok(categories)) => categories,
            Ok(Err(e)) => {
                warn!("Unable to load categories, continuing without them: {e:#}");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    "Loading categories took longer than {:?}, continuing without them",
                    self.category_timeout
                );
                Vec::new()
            }
        }
    }
}

/// One caller's ingestion session. At most one submission runs at a time; a second one is rejected
/// with `IngestError::Busy` instead of being queued.
pub struct Session {
    pipeline: Arc<Pipeline>,
    in_flight: tokio::sync::Mutex<()>,
    state: watch::Sender<IngestState>,
}

impl Session {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        let (state, _) = watch::channel(IngestState::Idle);
        Self {
            pipeline,
            in_flight: tokio::sync::Mutex::new(()),
            state,
        }
    }

    /// Receives every state of every submission made through this session.
    pub fn subscribe(&self) -> watch::Receiver<IngestState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> IngestState {
        self.state.borrow().clone()
    }

    pub async fn submit(&self, input: &str) -> Result<Transaction, IngestError> {
        self.submit_cancellable(input, &Cancel::never()).await
    }

    pub async fn submit_cancellable(
        &self,
        input: &str,
        cancel: &Cancel,
    ) -> Result<Transaction, IngestError> {
        let _guard = self.in_flight.try_lock().map_err(|_| {
            debug!("Rejecting a submission while another is in flight");
            IngestError::Busy
        })?;
        self.pipeline
            .ingest_observed(input, &self.state, cancel)
            .await
    }
}
