//! Record personal income and expenses from free text and keep budgets in view.
//!
//! Free text such as `cafe 30k` is sent to a local text-completion model, the JSON it returns is
//! parsed into a `Transaction`, its category is resolved against the user's categories and the
//! result is stored. Budgets are re-aggregated whenever budgets or transactions change, and a budget
//! that reaches 80% of its allocation raises a one-time alert.

mod aggregate;
mod aggregator;
mod alerts;
pub mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
mod extract;
mod ingest;
mod live;
pub mod model;
mod prompt;
mod resolve;
mod search;
mod store;
mod summary;
mod utils;

#[cfg(test)]
mod test;

pub use aggregate::{aggregate, projected, spent_for, BudgetSnapshot};
pub use aggregator::{AggregationPass, BudgetAggregator};
pub use alerts::{dispatch, AlertLedger, LogNotifier, Notifier};
pub use api::Mode;
pub use config::Config;
pub use error::{Error, ErrorType, Result};
pub use extract::{ExtractedTransaction, ParseError};
pub use ingest::{cancellation, Cancel, Canceller, IngestError, IngestState, Pipeline, Session};
pub use live::{BoxedSequence, Filtered, LiveSequence};
pub use prompt::{build_advisor_prompt, build_extraction_prompt};
pub use resolve::{resolve, ResolvedCategory};
pub use search::SearchCache;
pub use store::{FileStore, Store};
pub use summary::MonthlySummary;
