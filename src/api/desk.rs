//! Typed access to the desk's spreadsheet: the roster, the default rates and the ledger.

use crate::api::{Sheet, SheetRange, CLIENTES, TASAS};
use crate::cache::Cached;
use crate::model::{
    ledger_number, next_folio_number, Clients, LedgerEntry, RateConfig, RosterColumns,
};
use crate::Result;
use anyhow::{bail, Context};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, warn};

const ROSTER_TTL: Duration = Duration::from_secs(60);
const RATES_TTL: Duration = Duration::from_secs(300);

/// Wraps a `Sheet` for one operator session. Reads of the roster and of the rates are cached for
/// the life of the `Desk`; each command builds its own, so the caches never outlive the process.
pub(crate) struct Desk {
    sheet: Box<dyn Sheet>,
    ledger_tab: String,
    roster: Cached<Clients>,
    rates: Cached<RateConfig>,
}

impl Desk {
    pub(crate) fn new(sheet: Box<dyn Sheet>, ledger_tab: impl Into<String>) -> Self {
        Self {
            sheet,
            ledger_tab: ledger_tab.into(),
            roster: Cached::new(ROSTER_TTL),
            rates: Cached::new(RATES_TTL),
        }
    }

    pub(crate) fn ledger_tab(&self) -> &str {
        &self.ledger_tab
    }

    /// The client roster. If it cannot be read, a warning is logged and the roster is empty.
    pub(crate) async fn clients(&mut self) -> Clients {
        if let Some(clients) = self.roster.get() {
            return clients;
        }
        match self.fetch_clients().await {
            Ok(clients) => {
                debug!("Loaded {} clients", clients.len());
                self.roster.put(clients.clone());
                clients
            }
            Err(e) => {
                warn!("Unable to load the client roster, continuing without clients: {e:#}");
                Clients::default()
            }
        }
    }

    /// The default rates. If they cannot be read, a warning is logged and the built-in defaults
    /// are used.
    pub(crate) async fn rates(&mut self) -> RateConfig {
        if let Some(rates) = self.rates.get() {
            return rates;
        }
        let fetched = match self.sheet.get(TASAS).await {
            Ok(rows) => RateConfig::from_rows(&rows),
            Err(e) => Err(e),
        };
        match fetched {
            Ok(rates) => {
                self.rates.put(rates);
                rates
            }
            Err(e) => {
                let rates = RateConfig::default();
                warn!(
                    "Unable to load the default rates, using {} and {}: {e:#}",
                    rates.buy_rate(),
                    rates.sell_rate()
                );
                rates
            }
        }
    }

    /// The number of the next folio for `today`. Any failure to read the ledger starts the day's
    /// sequence at 1.
    pub(crate) async fn next_folio_number(&mut self, today: NaiveDate) -> u32 {
        match self.sheet.get(&self.ledger_tab).await {
            Ok(rows) => next_folio_number(&rows, today),
            Err(e) => {
                warn!("Unable to read the ledger, starting folios at 1: {e:#}");
                1
            }
        }
    }

    /// Appends all `entries` to the ledger in one call.
    pub(crate) async fn append_entries(&mut self, entries: &[LedgerEntry]) -> Result<()> {
        let rows: Vec<Vec<String>> = entries.iter().map(LedgerEntry::to_row).collect();
        self.sheet
            .append_rows(&self.ledger_tab, &rows)
            .await
            .with_context(|| format!("Unable to append to the '{}' tab", self.ledger_tab))
    }

    /// Writes the closing balances of `alias` to the roster. Returns `false`, with a warning,
    /// when the client cannot be found or the write fails.
    pub(crate) async fn update_balance(&mut self, alias: &str, usdt: Decimal, mxn: Decimal) -> bool {
        match self.write_balance(alias, usdt, mxn).await {
            Ok(()) => {
                self.roster.invalidate();
                true
            }
            Err(e) => {
                warn!("Unable to update the balance of '{alias}': {e:#}");
                false
            }
        }
    }

    async fn fetch_clients(&mut self) -> Result<Clients> {
        let rows = self.sheet.get(CLIENTES).await?;
        Clients::parse(&rows)
    }

    async fn write_balance(&mut self, alias: &str, usdt: Decimal, mxn: Decimal) -> Result<()> {
        let rows = self.sheet.get(CLIENTES).await?;
        let headers = rows.first().context("The roster is empty")?;
        let columns = RosterColumns::find(headers)?;
        let (Some(usdt_col), Some(mxn_col)) = (columns.usdt, columns.mxn) else {
            bail!("The roster is missing a balance column");
        };
        let Some(row) = rows.iter().enumerate().skip(1).find_map(|(ix, row)| {
            (row.get(columns.alias).map(|a| a.trim()) == Some(alias)).then_some(ix)
        }) else {
            bail!("Client '{alias}' is not in the roster");
        };

        self.sheet
            .write_ranges(&[SheetRange::cell(CLIENTES, mxn_col, row, ledger_number(mxn))])
            .await
            .context("Unable to write the MXN balance")?;
        self.sheet
            .write_ranges(&[SheetRange::cell(CLIENTES, usdt_col, row, ledger_number(usdt))])
            .await
            .context("Unable to write the USDT balance")?;
        Ok(())
    }
}
