//! Consolidated totals and the client's closing balance.

use crate::model::{AdjustmentRow, CalculationRow, Currency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether the closing balance leaves the client owing the desk, the desk owing the client, or
/// neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus {
    ClientOwes,
    DeskOwes,
    Settled,
}

impl BalanceStatus {
    pub fn from_balance(balance: Decimal) -> Self {
        if balance > Decimal::ZERO {
            BalanceStatus::ClientOwes
        } else if balance < Decimal::ZERO {
            BalanceStatus::DeskOwes
        } else {
            BalanceStatus::Settled
        }
    }

    /// The banner shown to the operator.
    pub fn label(&self) -> &'static str {
        match self {
            BalanceStatus::ClientOwes => "TE DEBEN PAGAR (Utilidad en USDT)",
            BalanceStatus::DeskOwes => "DEBES PAGAR (Pérdida en USDT)",
            BalanceStatus::Settled => "BALANCE CERO",
        }
    }
}

/// The opening balances of the selected client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OpeningBalance {
    pub usdt: Decimal,
    pub mxn: Decimal,
}

/// Sums over all rows and adjustments, plus the closing balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Totals {
    pub pagar_pesos_sum: Decimal,
    pub recibir_usdt_sum: Decimal,
    pub cobrar_pesos_sum: Decimal,
    pub entregar_usdt_sum: Decimal,
    pub ajuste_neto_pesos: Decimal,
    pub ajuste_neto_usdt: Decimal,
    /// USDT received by operations, plus the positive parts of the opening balance and the net
    /// adjustment.
    pub total_recibidos_usdt: Decimal,
    /// USDT delivered by operations, plus the negative parts of the opening balance and the net
    /// adjustment.
    pub total_entregados_usdt: Decimal,
    pub balance_final_usdt: Decimal,
    /// Always zero unless the MXN balance computation is enabled.
    pub balance_final_mxn: Decimal,
}

impl Totals {
    /// Aggregates `rows` and `adjustments` against the `opening` balance. When `compute_mxn` is
    /// false the MXN closing balance is left at zero, which is how the ledger has always been
    /// written.
    pub fn compute(
        rows: &[CalculationRow],
        adjustments: &[AdjustmentRow],
        opening: OpeningBalance,
        compute_mxn: bool,
    ) -> Self {
        let pagar_pesos_sum = rows.iter().map(|r| r.pesos_pagar).sum::<Decimal>();
        let recibir_usdt_sum = rows.iter().map(|r| r.usdt_recibir).sum::<Decimal>();
        let cobrar_pesos_sum = rows.iter().map(|r| r.pesos_cobrar).sum::<Decimal>();
        let entregar_usdt_sum = rows.iter().map(|r| r.usdt_entregar).sum::<Decimal>();

        let net = |currency: Currency| -> Decimal {
            let pagos = adjustments.iter().map(|a| a.pago_in(currency)).sum::<Decimal>();
            let recibos = adjustments
                .iter()
                .map(|a| a.recibo_in(currency))
                .sum::<Decimal>();
            pagos - recibos
        };
        let ajuste_neto_pesos = net(Currency::Mxn);
        let ajuste_neto_usdt = net(Currency::Usdt);

        let positive = |d: Decimal| d.max(Decimal::ZERO);
        let negative = |d: Decimal| d.min(Decimal::ZERO).abs();
        let total_recibidos_usdt =
            recibir_usdt_sum + positive(opening.usdt) + positive(ajuste_neto_usdt);
        let total_entregados_usdt =
            entregar_usdt_sum + negative(opening.usdt) + negative(ajuste_neto_usdt);

        let balance_final_usdt =
            (recibir_usdt_sum + opening.usdt + ajuste_neto_usdt) - entregar_usdt_sum;
        let balance_final_mxn = if compute_mxn {
            (cobrar_pesos_sum + opening.mxn + ajuste_neto_pesos) - pagar_pesos_sum
        } else {
            Decimal::ZERO
        };

        Self {
            pagar_pesos_sum,
            recibir_usdt_sum,
            cobrar_pesos_sum,
            entregar_usdt_sum,
            ajuste_neto_pesos,
            ajuste_neto_usdt,
            total_recibidos_usdt,
            total_entregados_usdt,
            balance_final_usdt,
            balance_final_mxn,
        }
    }

    pub fn status(&self) -> BalanceStatus {
        BalanceStatus::from_balance(self.balance_final_usdt)
    }
}
