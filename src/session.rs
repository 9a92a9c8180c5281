//! The state of one operator session: the selected client, the rates in effect, the calculation
//! rows and the cash adjustments. Every change goes through one of the event handlers below and
//! all derived values are computed from this state on demand.

use crate::model::{
    AdjustmentRow, Attachment, CalculationRow, Client, Clients, Currency, Direction, OpType,
    OpeningBalance, RateConfig, Totals,
};
use crate::Result;
use anyhow::{bail, ensure, Context};
use rust_decimal::Decimal;
use serde::Serialize;

/// The most calculation rows a session can hold.
pub const MAX_ROWS: usize = 15;

/// The operator's input for one calculation row.
#[derive(Debug, Clone, Default)]
pub struct RowInput {
    /// Amount the client sells, in the currency of the buy direction.
    pub vende: Decimal,
    /// Amount the client buys, in the currency of the sell direction.
    pub compra: Decimal,
    pub vende_receipt: Option<Attachment>,
    pub compra_receipt: Option<Attachment>,
}

/// The operator's input for one adjustment row.
#[derive(Debug, Clone, Default)]
pub struct AdjustmentInput {
    pub row: AdjustmentRow,
    pub pago_receipt: Option<Attachment>,
    pub recibo_receipt: Option<Attachment>,
}

/// An operation that will become one ledger entry on save. `index` points at the row (for
/// `Compra`/`Venta`) or adjustment (for `Pago`/`Recibo`) it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub op_type: OpType,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct Session {
    client: Option<Client>,
    rates: RateConfig,
    rows: Vec<RowInput>,
    adjustments: Vec<AdjustmentInput>,
}

impl Session {
    /// Starts a session with one empty row, one empty adjustment and the default `rates`.
    pub fn new(rates: RateConfig) -> Self {
        Self {
            client: None,
            rates,
            rows: vec![RowInput::default()],
            adjustments: vec![AdjustmentInput::default()],
        }
    }

    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    pub fn rates(&self) -> &RateConfig {
        &self.rates
    }

    pub fn row_inputs(&self) -> &[RowInput] {
        &self.rows
    }

    pub fn adjustment_inputs(&self) -> &[AdjustmentInput] {
        &self.adjustments
    }

    pub fn opening_balance(&self) -> OpeningBalance {
        self.client
            .as_ref()
            .map(|c| OpeningBalance {
                usdt: c.balance_usdt(),
                mxn: c.balance_mxn(),
            })
            .unwrap_or_default()
    }

    pub fn select_client(&mut self, clients: &Clients, alias: &str) -> Result<()> {
        let client = clients
            .get(alias)
            .with_context(|| format!("Client '{alias}' is not in the roster"))?;
        self.client = Some(client.clone());
        Ok(())
    }

    pub fn clear_client(&mut self) {
        self.client = None;
    }

    pub fn set_buy_rate(&mut self, rate: Decimal) {
        self.rates = self.rates.with_buy_rate(rate);
    }

    pub fn set_sell_rate(&mut self, rate: Decimal) {
        self.rates = self.rates.with_sell_rate(rate);
    }

    pub fn set_buy_direction(&mut self, direction: Direction) {
        self.rates = self.rates.with_buy_direction(direction);
    }

    pub fn set_sell_direction(&mut self, direction: Direction) {
        self.rates = self.rates.with_sell_direction(direction);
    }

    /// Adds an empty row and returns its index.
    pub fn add_row(&mut self) -> Result<usize> {
        if self.rows.len() >= MAX_ROWS {
            bail!("A session holds at most {MAX_ROWS} calculation rows");
        }
        self.rows.push(RowInput::default());
        Ok(self.rows.len() - 1)
    }

    pub fn set_row_amounts(&mut self, index: usize, vende: Decimal, compra: Decimal) -> Result<()> {
        non_negative(vende)?;
        non_negative(compra)?;
        let row = self.row_mut(index)?;
        row.vende = vende;
        row.compra = compra;
        Ok(())
    }

    pub fn attach_vende(&mut self, index: usize, attachment: Attachment) -> Result<()> {
        self.row_mut(index)?.vende_receipt = Some(attachment);
        Ok(())
    }

    pub fn attach_compra(&mut self, index: usize, attachment: Attachment) -> Result<()> {
        self.row_mut(index)?.compra_receipt = Some(attachment);
        Ok(())
    }

    /// Back to a single empty row; attachments are dropped.
    pub fn clear_rows(&mut self) {
        self.rows = vec![RowInput::default()];
    }

    /// Adds an empty adjustment and returns its index.
    pub fn add_adjustment(&mut self) -> usize {
        self.adjustments.push(AdjustmentInput::default());
        self.adjustments.len() - 1
    }

    pub fn set_adjustment(
        &mut self,
        index: usize,
        pago: (Decimal, Currency),
        recibo: (Decimal, Currency),
    ) -> Result<()> {
        non_negative(pago.0)?;
        non_negative(recibo.0)?;
        let adjustment = self.adjustment_mut(index)?;
        adjustment.row = AdjustmentRow::new(pago.0, pago.1, recibo.0, recibo.1);
        Ok(())
    }

    pub fn attach_pago(&mut self, index: usize, attachment: Attachment) -> Result<()> {
        self.adjustment_mut(index)?.pago_receipt = Some(attachment);
        Ok(())
    }

    pub fn attach_recibo(&mut self, index: usize, attachment: Attachment) -> Result<()> {
        self.adjustment_mut(index)?.recibo_receipt = Some(attachment);
        Ok(())
    }

    /// Back to a single empty adjustment; attachments are dropped.
    pub fn clear_adjustments(&mut self) {
        self.adjustments = vec![AdjustmentInput::default()];
    }

    /// Clears rows, adjustments and the selected client. Rates are kept.
    pub fn clear_all(&mut self) {
        self.clear_rows();
        self.clear_adjustments();
        self.clear_client();
    }

    /// The computed calculation rows.
    pub fn rows(&self) -> Vec<CalculationRow> {
        self.rows
            .iter()
            .map(|r| CalculationRow::compute(r.vende, r.compra, &self.rates))
            .collect()
    }

    pub fn adjustments(&self) -> Vec<AdjustmentRow> {
        self.adjustments.iter().map(|a| a.row).collect()
    }

    pub fn totals(&self, compute_mxn: bool) -> Totals {
        Totals::compute(
            &self.rows(),
            &self.adjustments(),
            self.opening_balance(),
            compute_mxn,
        )
    }

    /// The operations to record, in ledger order: for every row a `Compra` and then a `Venta` if
    /// that side is non-zero, then for every adjustment a `Pago` and then a `Recibo` if non-zero.
    pub fn pending_operations(&self) -> Vec<Operation> {
        let mut ops = Vec::new();
        for (index, row) in self.rows().iter().enumerate() {
            if row.has_compra() {
                ops.push(Operation {
                    op_type: OpType::Compra,
                    index,
                });
            }
            if row.has_venta() {
                ops.push(Operation {
                    op_type: OpType::Venta,
                    index,
                });
            }
        }
        for (index, adjustment) in self.adjustments.iter().enumerate() {
            if adjustment.row.pago_monto > Decimal::ZERO {
                ops.push(Operation {
                    op_type: OpType::Pago,
                    index,
                });
            }
            if adjustment.row.recibo_monto > Decimal::ZERO {
                ops.push(Operation {
                    op_type: OpType::Recibo,
                    index,
                });
            }
        }
        ops
    }

    /// The receipt attached to the side of the row or adjustment that `op` records.
    pub fn receipt(&self, op: Operation) -> Option<&Attachment> {
        match op.op_type {
            OpType::Compra => self.rows.get(op.index)?.vende_receipt.as_ref(),
            OpType::Venta => self.rows.get(op.index)?.compra_receipt.as_ref(),
            OpType::Pago => self.adjustments.get(op.index)?.pago_receipt.as_ref(),
            OpType::Recibo => self.adjustments.get(op.index)?.recibo_receipt.as_ref(),
        }
    }

    fn row_mut(&mut self, index: usize) -> Result<&mut RowInput> {
        let len = self.rows.len();
        self.rows
            .get_mut(index)
            .with_context(|| format!("Row {index} does not exist, there are {len} rows"))
    }

    fn adjustment_mut(&mut self, index: usize) -> Result<&mut AdjustmentInput> {
        let len = self.adjustments.len();
        self.adjustments.get_mut(index).with_context(|| {
            format!("Adjustment {index} does not exist, there are {len} adjustments")
        })
    }
}

fn non_negative(amount: Decimal) -> Result<()> {
    ensure!(
        !amount.is_sign_negative() || amount.is_zero(),
        "Amounts cannot be negative, got {amount}"
    );
    Ok(())
}
