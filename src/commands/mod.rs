//! Command handlers for the cambio CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod clients;
mod init;
mod quote;
mod rates;
mod save;

use crate::api::{self, Desk, Mode};
use crate::session::Session;
use crate::ticket::Ticket;
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;
use tracing::{debug, info};

pub use clients::clients;
pub use init::init;
pub use quote::{quote, Quote};
pub use rates::rates;
pub use save::save;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Loads the ticket at `ticket_path` and replays it into a new session that starts from the
/// sheet's default rates. The ticket is read before the sheet is contacted so that a bad ticket
/// fails fast.
async fn open_session(config: &Config, mode: Mode, ticket_path: &Path) -> Result<(Desk, Session)> {
    let ticket = Ticket::load(ticket_path).await?;
    let sheet = api::sheet(config, mode).await?;
    let mut desk = Desk::new(sheet, config.ledger_tab());
    let clients = desk.clients().await;
    let mut session = Session::new(desk.rates().await);
    ticket.apply(&mut session, &clients).await?;
    Ok((desk, session))
}
