use crate::alerts::{AlertLedger, LogNotifier, Notifier};
use crate::api::{self, Mode};
use crate::args::AddArgs;
use crate::commands::budgets::report_once;
use crate::commands::{open_store, Out};
use crate::error::{ErrorType, IntoResult};
use crate::ingest::{cancellation, IngestError, Pipeline, Session};
use crate::model::Transaction;
use crate::{Config, Error, Result};
use anyhow::anyhow;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Records a transaction described in free text, e.g. `moneymanager add cafe 30k`.
///
/// The text goes through the ingestion pipeline. Ctrl-C cancels it unless the transaction is
/// already being saved. Afterwards the budgets active today are checked so that a budget crossing
/// 80% raises its alert right away.
pub async fn add(config: Config, mode: Mode, args: AddArgs) -> Result<Out<Transaction>> {
    let completion = api::completion(&config, mode).pub_result(ErrorType::Completion)?;
    let store = open_store(&config).await?;
    let pipeline = Pipeline::new(completion, store.clone(), config.model())
        .with_timeouts(config.completion_timeout(), config.category_timeout());
    let session = Session::new(Arc::new(pipeline));

    let (canceller, cancel) = cancellation();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Ctrl-C received, cancelling the submission");
            canceller.cancel();
        }
    });
    let result = session.submit_cancellable(&args.text(), &cancel).await;
    interrupt.abort();
    let transaction = result.map_err(failure)?;

    let ledger = AlertLedger::new(config.notifications_enabled());
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    report_once(store.as_ref(), Utc::now().date_naive(), &ledger, &notifier).await;

    Ok(Out::new(
        format!(
            "Recorded {} of {} in '{}' ({})",
            transaction.kind(),
            transaction.amount(),
            transaction.category(),
            transaction.id()
        ),
        transaction,
    ))
}

/// Turns an ingestion failure into the message the user sees.
fn failure(e: IngestError) -> Error {
    let error_type = match e {
        IngestError::CompletionTimeout(_) | IngestError::CompletionError(_) => {
            ErrorType::Completion
        }
        IngestError::PersistenceError(_) => ErrorType::Store,
        _ => ErrorType::Request,
    };
    Error::new(error_type, anyhow!(e.user_message()))
}
