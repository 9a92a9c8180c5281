use crate::api::{self, Mode};
use crate::commands::{open_session, Out};
use crate::save::{self as flow, SaveContext, SaveOutcome};
use crate::{clock, Config, Result};
use std::path::Path;
use tracing::warn;

/// Records the operations of the ticket at `ticket_path` to the ledger, uploads their receipts and
/// updates the client's balance.
///
/// # Errors
/// - Returns an error if the ticket is invalid, no client is selected, or the ledger append
///   fails. A balance that could not be written is reported in the message instead.
pub async fn save(config: Config, mode: Mode, ticket_path: &Path) -> Result<Out<SaveOutcome>> {
    let (mut desk, session) = open_session(&config, mode, ticket_path).await?;
    let mut storage = api::storage(&config, mode).await?;
    let backup = config.backup();
    let ctx = SaveContext {
        desk: &mut desk,
        storage: storage.as_mut(),
        backup: &backup,
        compute_mxn: config.compute_mxn_balance(),
    };
    let outcome = flow::save(&session, ctx, &clock::now()).await?;

    let mut message = outcome.message();
    if let SaveOutcome::Saved { warnings, .. } = &outcome {
        for warning in warnings {
            warn!("{warning}");
            message.push_str(&format!("\n{warning}"));
        }
    }
    Ok(Out::new(message, outcome))
}
