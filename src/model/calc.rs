//! Conversion arithmetic for calculation rows and the pass-through of cash adjustments.

use crate::model::{Currency, Direction, RateConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Both sides of a conversion: the pesos amount and the USDT amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Conversion {
    pub pesos: Decimal,
    pub usdt: Decimal,
}

/// Converts an entered `amount` into the opposite currency.
///
/// With `PesosToUsdt` the amount is pesos and `usdt = amount / rate`; a rate of zero or less yields
/// zero USDT instead of dividing. With `UsdtToPesos` the amount is USDT and
/// `pesos = amount * rate`.
pub fn convert(amount: Decimal, rate: Decimal, direction: Direction) -> Conversion {
    match direction {
        Direction::PesosToUsdt => {
            let usdt = if rate > Decimal::ZERO {
                amount.checked_div(rate).unwrap_or_default()
            } else {
                Decimal::ZERO
            };
            Conversion {
                pesos: amount,
                usdt,
            }
        }
        Direction::UsdtToPesos => Conversion {
            pesos: amount.checked_mul(rate).unwrap_or_default(),
            usdt: amount,
        },
    }
}

/// One calculation row after conversion. The "vende" pair is the client selling USDT to the desk
/// (`Compra`), the "compra" pair is the client buying USDT from the desk (`Venta`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CalculationRow {
    pub pesos_pagar: Decimal,
    pub usdt_recibir: Decimal,
    pub pesos_cobrar: Decimal,
    pub usdt_entregar: Decimal,
}

impl CalculationRow {
    /// Computes a row from the two entered amounts using the rates and directions in `rates`.
    pub fn compute(vende: Decimal, compra: Decimal, rates: &RateConfig) -> Self {
        let bought = convert(vende, rates.buy_rate(), rates.buy_direction());
        let sold = convert(compra, rates.sell_rate(), rates.sell_direction());
        Self {
            pesos_pagar: bought.pesos,
            usdt_recibir: bought.usdt,
            pesos_cobrar: sold.pesos,
            usdt_entregar: sold.usdt,
        }
    }

    /// True when the desk-buys side has anything to record.
    pub fn has_compra(&self) -> bool {
        self.pesos_pagar > Decimal::ZERO || self.usdt_recibir > Decimal::ZERO
    }

    /// True when the desk-sells side has anything to record.
    pub fn has_venta(&self) -> bool {
        self.pesos_cobrar > Decimal::ZERO || self.usdt_entregar > Decimal::ZERO
    }
}

/// A manual cash adjustment: a payment out (`pago`) and a receipt in (`recibo`), each in its own
/// currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AdjustmentRow {
    pub pago_monto: Decimal,
    pub pago_moneda: Currency,
    pub recibo_monto: Decimal,
    pub recibo_moneda: Currency,
}

impl AdjustmentRow {
    pub fn new(
        pago_monto: Decimal,
        pago_moneda: Currency,
        recibo_monto: Decimal,
        recibo_moneda: Currency,
    ) -> Self {
        Self {
            pago_monto,
            pago_moneda,
            recibo_monto,
            recibo_moneda,
        }
    }

    /// The payment amount if it is in `currency`, otherwise zero.
    pub fn pago_in(&self, currency: Currency) -> Decimal {
        if self.pago_moneda == currency {
            self.pago_monto
        } else {
            Decimal::ZERO
        }
    }

    /// The receipt amount if it is in `currency`, otherwise zero.
    pub fn recibo_in(&self, currency: Currency) -> Decimal {
        if self.recibo_moneda == currency {
            self.recibo_monto
        } else {
            Decimal::ZERO
        }
    }
}
