use crate::api::{self, CompletionRequest, Mode};
use crate::args::AskArgs;
use crate::commands::{open_store, Out};
use crate::error::{ErrorType, IntoResult};
use crate::live::LiveSequence;
use crate::prompt::build_advisor_prompt;
use crate::store::Store;
use crate::summary::MonthlySummary;
use crate::{Config, Error, Result};
use anyhow::{anyhow, Context};
use chrono::{Datelike, Utc};

/// Asks the model a free-form question about the current month. The answer is the message; the
/// figures the model was given are the structured output.
pub async fn ask(config: Config, mode: Mode, args: AskArgs) -> Result<Out<MonthlySummary>> {
    let question = args.question();
    if question.trim().is_empty() {
        return Err(Error::new(ErrorType::Request, anyhow!("The question is empty")));
    }

    let store = open_store(&config).await?;
    let transactions = store.transactions().next().await.unwrap_or_default();
    let today = Utc::now();
    let summary = MonthlySummary::compute(&transactions, today.year(), today.month());

    let completion = api::completion(&config, mode).pub_result(ErrorType::Completion)?;
    let request = CompletionRequest::text(config.model(), build_advisor_prompt(&summary, &question));
    let response =
        tokio::time::timeout(config.completion_timeout(), completion.complete(&request))
            .await
            .map_err(|_| {
                anyhow!(
                    "The completion server did not answer within {:?}",
                    config.completion_timeout()
                )
            })
            .and_then(|r| r.context("Unable to get an answer"))
            .pub_result(ErrorType::Completion)?;

    let answer = response.response.trim();
    let answer = if answer.is_empty() {
        "The model returned an empty answer."
    } else {
        answer
    };
    Ok(Out::new(answer, summary))
}
