//! These structs provide the CLI interface for the cambio CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// cambio: A command-line tool for an MXN/USDT exchange desk.
///
/// The desk keeps its client roster, its default rates and its ledger in a Google sheet. This
/// program computes the pesos and USDT of each operation from the rates, records a batch of
/// operations to the ledger with daily folios, uploads receipt images to Dropbox and updates the
/// client's running balance.
///
/// Operations are described in a ticket, a small JSON file. Use `quote` to see what a ticket
/// computes to and `save` to record it.
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
    /// Create the data directory and initialize the configuration files.
    ///
    /// You need a few things ready beforehand:
    ///
    /// - The URL of the desk's Google sheet, passed as --sheet-url. It must have the tabs
    ///   `Clientes` and `Tasas` and the ledger tab.
    ///
    /// - Google OAuth client credentials downloaded to a file, passed as --client-secret. A stored
    ///   token is expected at `.secrets/token.json` in the data directory.
    ///
    /// - A Dropbox access token, either in CAMBIO_STORAGE_TOKEN or in `.secrets/storage_token`.
    Init(InitArgs),
    /// List the clients of the roster with their balances.
    Clients,
    /// Show the default rates from the `Tasas` tab.
    Rates,
    /// Compute the rows and totals of a ticket without saving anything.
    Quote(TicketArgs),
    /// Record the operations of a ticket to the ledger and update the client's balance.
    Save(TicketArgs),
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

    /// The directory where cambio configuration and journals are held. Defaults to ~/cambio
    #[arg(long, env = "CAMBIO_HOME", default_value_t = default_cambio_home())]
    cambio_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, cambio_home: PathBuf) -> Self {
        Self {
            log_level,
            cambio_home: cambio_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn cambio_home(&self) -> &DisplayPath {
        &self.cambio_home
    }
}

/// (Not shown): Args for the `cambio init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL to the desk's Google sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    sheet_url: String,

    /// The path to your downloaded OAuth client credentials. This file will be copied to the
    /// default secrets location in the data directory.
    #[arg(long)]
    client_secret: PathBuf,

    /// The tab that ledger rows are appended to.
    #[arg(long, default_value = crate::config::DEFAULT_LEDGER_TAB)]
    ledger_tab: String,
}

impl InitArgs {
    pub fn new(
        sheet_url: impl Into<String>,
        client_secret: impl Into<PathBuf>,
        ledger_tab: impl Into<String>,
    ) -> Self {
        Self {
            sheet_url: sheet_url.into(),
            client_secret: client_secret.into(),
            ledger_tab: ledger_tab.into(),
        }
    }

    pub fn sheet_url(&self) -> &str {
        &self.sheet_url
    }

    pub fn client_secret(&self) -> &Path {
        &self.client_secret
    }

    pub fn ledger_tab(&self) -> &str {
        &self.ledger_tab
    }
}

/// (Not shown): Args for the `cambio quote` and `cambio save` commands.
#[derive(Debug, Parser, Clone)]
pub struct TicketArgs {
    /// The ticket JSON file. Receipt paths inside it are relative to the file.
    #[arg(long)]
    ticket: PathBuf,
}

impl TicketArgs {
    pub fn new(ticket: impl Into<PathBuf>) -> Self {
        Self {
            ticket: ticket.into(),
        }
    }

    pub fn ticket(&self) -> &Path {
        &self.ticket
    }
}

fn default_cambio_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("cambio"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --cambio-home or CAMBIO_HOME instead of relying on the default \
                cambio home directory.",
            );
            PathBuf::from("cambio")
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
    pub fn path(&self) -> &Path {
        &self.0
    }
}
