use cambio_desk::args::{Args, Command};
use cambio_desk::{commands, Config, Mode, Result};
use clap::Parser;
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
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().cambio_home().path();

    // When CAMBIO_IN_TEST_MODE is set and non-empty the in-memory sheet and storage are used, so
    // the program can run end to end without Google or Dropbox.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(
            home,
            init_args.client_secret(),
            init_args.sheet_url(),
            init_args.ledger_tab(),
        )
        .await?
        .print(),

        Command::Clients => commands::clients(Config::load(home).await?, mode)
            .await?
            .print(),

        Command::Rates => commands::rates(Config::load(home).await?, mode)
            .await?
            .print(),

        Command::Quote(ticket_args) => {
            let config = Config::load(home).await?;
            commands::quote(config, mode, ticket_args.ticket())
                .await?
                .print()
        }

        Command::Save(ticket_args) => {
            let config = Config::load(home).await?;
            commands::save(config, mode, ticket_args.ticket())
                .await?
                .print()
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
                "cambio_desk",
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
