//! Commits a batch of ledger entries and the client's new balance.

use crate::api::Desk;
use crate::model::LedgerEntry;
use crate::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

/// What happened when a batch was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    pub appended: usize,
    pub balance_updated: bool,
    pub warning: Option<String>,
}

/// Appends `entries` in a single call and then writes the closing balances of `alias`.
///
/// A failed append is an error and nothing else is written. A failed balance write is not: the
/// entries are already in the ledger, so the outcome carries a warning and the roster is left for
/// the operator to fix by hand.
pub(crate) async fn write_ledger(
    desk: &mut Desk,
    entries: &[LedgerEntry],
    alias: &str,
    balance_usdt: Decimal,
    balance_mxn: Decimal,
) -> Result<WriteOutcome> {
    desk.append_entries(entries).await?;
    info!("Appended {} entries to '{}'", entries.len(), desk.ledger_tab());

    let balance_updated = desk.update_balance(alias, balance_usdt, balance_mxn).await;
    let warning = (!balance_updated).then(|| {
        format!(
            "The operations were saved but the balance of '{alias}' could not be updated, \
            set it to {balance_usdt} USDT and {balance_mxn} MXN by hand"
        )
    });
    Ok(WriteOutcome {
        appended: entries.len(),
        balance_updated,
        warning,
    })
}
