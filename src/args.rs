//! These structs provide the CLI interface for the moneymanager CLI.

use crate::model::{Amount, TransactionKind};
use crate::utils::{parse_amount, parse_date};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// moneymanager: track income, expenses and budgets from short notes.
///
/// Write what happened the way you would say it, e.g. "cafe 30k" or "nhận lương 15tr", and a
/// local language model turns it into a transaction. Budgets are recomputed from your transactions
/// and you are alerted once when a budget reaches 80% or goes over.
///
/// A model server with an Ollama-compatible `/api/generate` endpoint is required, see `init`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and the configuration file.
    ///
    /// This is the first command you should run. By default the home directory is
    /// $HOME/moneymanager and the model server is a local Ollama at http://localhost:11434/.
    Init(InitArgs),
    /// Record a transaction from free text, e.g. `moneymanager add cafe 30k`.
    Add(AddArgs),
    /// Show every budget that is active today with its spending, status and projection.
    Budgets(BudgetsArgs),
    /// Create, change or delete a budget.
    Budget(BudgetArgs),
    /// Add or list categories.
    Category(CategoryArgs),
    /// Find transactions whose category, description or amount contains the query.
    Search(SearchArgs),
    /// Delete a transaction.
    Delete(DeleteArgs),
    /// Turn budget alerts on or off.
    Notifications(NotificationsArgs),
    /// Ask the advisor a question about this month's finances.
    Ask(AskArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where data and configuration are held. Defaults to ~/moneymanager
    #[arg(long, env = "MONEYMANAGER_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// (Not shown): Args for the `moneymanager init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// Base URL of the completion server.
    #[arg(long)]
    completion_url: Option<String>,

    /// The model to ask, e.g. qwen2.5:1.5b
    #[arg(long)]
    model: Option<String>,
}

impl InitArgs {
    pub fn new(completion_url: Option<String>, model: Option<String>) -> Self {
        Self {
            completion_url,
            model,
        }
    }

    pub fn completion_url(&self) -> Option<&str> {
        self.completion_url.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
}

/// (Not shown): Args for the `moneymanager add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// What happened, e.g. "đổ xăng 50". The words are joined with spaces.
    #[arg(required = true)]
    text: Vec<String>,
}

impl AddArgs {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: vec![text.into()],
        }
    }

    pub fn text(&self) -> String {
        self.text.join(" ")
    }
}

/// (Not shown): Args for the `moneymanager budgets` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct BudgetsArgs {
    /// Keep running and print a new summary whenever a budget or transaction changes.
    #[arg(long)]
    watch: bool,

    /// Show the budgets active on this date (YYYY-MM-DD) instead of today.
    #[arg(long, value_parser = parse_date)]
    as_of: Option<NaiveDate>,
}

impl BudgetsArgs {
    pub fn new(watch: bool, as_of: Option<NaiveDate>) -> Self {
        Self { watch, as_of }
    }

    pub fn watch(&self) -> bool {
        self.watch
    }

    pub fn as_of(&self) -> Option<NaiveDate> {
        self.as_of
    }
}

/// (Not shown): Args for the `moneymanager budget` command.
#[derive(Debug, Parser, Clone)]
pub struct BudgetArgs {
    #[command(subcommand)]
    action: BudgetSubcommand,
}

impl BudgetArgs {
    pub fn new(action: BudgetSubcommand) -> Self {
        Self { action }
    }

    pub fn action(&self) -> &BudgetSubcommand {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum BudgetSubcommand {
    /// Create a budget, or replace the budget given by --id.
    Set(BudgetSetArgs),
    /// Delete a budget.
    Delete(BudgetDeleteArgs),
}

/// (Not shown): Args for the `moneymanager budget set` command.
#[derive(Debug, Parser, Clone)]
pub struct BudgetSetArgs {
    /// The category name the budget applies to, matched exactly.
    #[arg(long)]
    category: String,

    /// The allocated amount, e.g. 2000000 or 2,000,000
    #[arg(long, value_parser = parse_amount)]
    amount: Amount,

    /// First day of the budget (YYYY-MM-DD), inclusive.
    #[arg(long, value_parser = parse_date)]
    start: NaiveDate,

    /// Last day of the budget (YYYY-MM-DD), inclusive.
    #[arg(long, value_parser = parse_date)]
    end: NaiveDate,

    /// Replace the budget with this id instead of creating a new one.
    #[arg(long)]
    id: Option<String>,
}

impl BudgetSetArgs {
    pub fn new(
        category: impl Into<String>,
        amount: Amount,
        start: NaiveDate,
        end: NaiveDate,
        id: Option<String>,
    ) -> Self {
        Self {
            category: category.into(),
            amount,
            start,
            end,
            id,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// (Not shown): Args for the `moneymanager budget delete` command.
#[derive(Debug, Parser, Clone)]
pub struct BudgetDeleteArgs {
    /// The budget id, as shown by `moneymanager budgets`.
    id: String,
}

impl BudgetDeleteArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// (Not shown): Args for the `moneymanager category` command.
#[derive(Debug, Parser, Clone)]
pub struct CategoryArgs {
    #[command(subcommand)]
    action: CategorySubcommand,
}

impl CategoryArgs {
    pub fn new(action: CategorySubcommand) -> Self {
        Self { action }
    }

    pub fn action(&self) -> &CategorySubcommand {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategorySubcommand {
    /// Add a category.
    Add(CategoryAddArgs),
    /// List categories grouped under their parents.
    List,
}

/// (Not shown): Args for the `moneymanager category add` command.
#[derive(Debug, Parser, Clone)]
pub struct CategoryAddArgs {
    /// The name, unique per type regardless of case.
    #[arg(long)]
    name: String,

    /// income or expense
    #[arg(long = "type")]
    kind: TransactionKind,

    /// The id of a top-level category to nest this one under.
    #[arg(long)]
    parent: Option<String>,
}

impl CategoryAddArgs {
    pub fn new(name: impl Into<String>, kind: TransactionKind, parent: Option<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            parent,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

/// (Not shown): Args for the `moneymanager search` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct SearchArgs {
    /// The text to look for. Without a query every transaction is listed.
    query: Vec<String>,
}

impl SearchArgs {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: vec![query.into()],
        }
    }

    pub fn query(&self) -> String {
        self.query.join(" ")
    }
}

/// (Not shown): Args for the `moneymanager delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The transaction id, e.g. txn-3f2a...
    id: String,
}

impl DeleteArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnOff {
    #[default]
    On,
    Off,
}

serde_plain::derive_display_from_serialize!(OnOff);
serde_plain::derive_fromstr_from_deserialize!(OnOff);

impl OnOff {
    pub fn is_on(&self) -> bool {
        *self == OnOff::On
    }
}

/// (Not shown): Args for the `moneymanager notifications` command.
#[derive(Debug, Parser, Clone)]
pub struct NotificationsArgs {
    /// "on" or "off"
    state: OnOff,
}

impl NotificationsArgs {
    pub fn new(state: OnOff) -> Self {
        Self { state }
    }

    pub fn state(&self) -> OnOff {
        self.state
    }
}

/// (Not shown): Args for the `moneymanager ask` command.
#[derive(Debug, Parser, Clone)]
pub struct AskArgs {
    /// The question. The words are joined with spaces.
    #[arg(required = true)]
    question: Vec<String>,
}

impl AskArgs {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: vec![question.into()],
        }
    }

    pub fn question(&self) -> String {
        self.question.join(" ")
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("moneymanager"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or MONEYMANAGER_HOME instead of relying on the default \
                home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("moneymanager")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
