use clap::Parser;
use moneymanager::args::{Args, BudgetSubcommand, CategorySubcommand, Command};
use moneymanager::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home().path();

    // This allows for running the program without a model server. When MONEYMANAGER_IN_TEST_MODE
    // is set and non-zero in length, then the mode will be Mode::Test, otherwise Mode::Live.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => {
            commands::init(home, init_args.completion_url(), init_args.model())
                .await?
                .print()
        }

        Command::Add(add_args) => {
            let config = Config::load(home).await?;
            commands::add(config, mode, add_args.clone()).await?.print()
        }

        Command::Budgets(budgets_args) => {
            let config = Config::load(home).await?;
            commands::budgets(config, budgets_args.clone())
                .await?
                .print()
        }

        Command::Budget(budget_args) => {
            let config = Config::load(home).await?;
            match budget_args.action() {
                BudgetSubcommand::Set(args) => {
                    commands::budget_set(config, args.clone()).await?.print()
                }
                BudgetSubcommand::Delete(args) => {
                    commands::budget_delete(config, args.clone())
                        .await?
                        .print()
                }
            }
        }

        Command::Category(category_args) => {
            let config = Config::load(home).await?;
            match category_args.action() {
                CategorySubcommand::Add(args) => {
                    commands::category_add(config, args.clone()).await?.print()
                }
                CategorySubcommand::List => commands::category_list(config).await?.print(),
            }
        }

        Command::Search(search_args) => {
            let config = Config::load(home).await?;
            commands::search(config, search_args.clone()).await?.print()
        }

        Command::Delete(delete_args) => {
            let config = Config::load(home).await?;
            commands::delete(config, delete_args.clone()).await?.print()
        }

        Command::Notifications(notifications_args) => {
            let config = Config::load(home).await?;
            commands::notifications(config, notifications_args.clone())
                .await?
                .print()
        }

        Command::Ask(ask_args) => {
            let config = Config::load(home).await?;
            commands::ask(config, mode, ask_args.clone()).await?.print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
