use crate::api::Mode;
use crate::commands::{open_session, Out};
use crate::model::{
    AdjustmentRow, Amount, BalanceStatus, CalculationRow, OpeningBalance, RateConfig, Totals,
};
use crate::save::count_operations;
use crate::session::{Operation, Session};
use crate::{Config, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;

/// Everything the operator sees before saving a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Quote {
    pub client: Option<String>,
    pub opening_balance: OpeningBalance,
    pub rates: RateConfig,
    pub rows: Vec<CalculationRow>,
    pub adjustments: Vec<AdjustmentRow>,
    pub totals: Totals,
    pub status: BalanceStatus,
    pub status_label: String,
    /// The operations a save would record, in ledger order.
    pub operations: Vec<Operation>,
}

impl Quote {
    pub(crate) fn new(session: &Session, compute_mxn: bool) -> Self {
        let totals = session.totals(compute_mxn);
        let status = totals.status();
        Self {
            client: session.client().map(|c| c.alias().to_string()),
            opening_balance: session.opening_balance(),
            rates: *session.rates(),
            rows: session.rows(),
            adjustments: session.adjustments(),
            totals,
            status,
            status_label: status.label().to_string(),
            operations: session.pending_operations(),
        }
    }

    /// A short human-readable summary.
    pub fn summary(&self) -> String {
        let num = |d: Decimal| Amount::plain(d).to_string();
        let mut lines = vec![format!(
            "Client: {}",
            self.client.as_deref().unwrap_or("(none selected)")
        )];
        lines.push(format!(
            "Rates: buy {} (enter {}), sell {} (enter {})",
            num(self.rates.buy_rate()),
            self.rates.buy_direction().input_label(),
            num(self.rates.sell_rate()),
            self.rates.sell_direction().input_label()
        ));
        for (i, row) in self.rows.iter().enumerate() {
            if !row.has_compra() && !row.has_venta() {
                continue;
            }
            lines.push(format!(
                "Row {}: pay {} MXN for {} USDT, charge {} MXN for {} USDT",
                i + 1,
                num(row.pesos_pagar),
                num(row.usdt_recibir),
                num(row.pesos_cobrar),
                num(row.usdt_entregar)
            ));
        }
        lines.push(format!(
            "Received {} USDT, delivered {} USDT",
            num(self.totals.total_recibidos_usdt),
            num(self.totals.total_entregados_usdt)
        ));
        lines.push(format!(
            "Closing balance: {} USDT, {} MXN ({})",
            num(self.totals.balance_final_usdt),
            num(self.totals.balance_final_mxn),
            self.status_label
        ));
        lines.push(format!(
            "{} to save",
            count_operations(self.operations.len())
        ));
        lines.join("\n")
    }
}

/// Computes the rows and totals of the ticket at `ticket_path` without writing anything.
pub async fn quote(config: Config, mode: Mode, ticket_path: &Path) -> Result<Out<Quote>> {
    let (_, session) = open_session(&config, mode, ticket_path).await?;
    let quote = Quote::new(&session, config.compute_mxn_balance());
    Ok(Out::new(quote.summary(), quote))
}
