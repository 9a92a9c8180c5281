//! Rows of the ledger tab.

use crate::model::{Currency, Folio};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The header row of the ledger tab.
pub const LEDGER_HEADERS: [&str; 8] = [
    "Folio",
    "Fecha",
    "Cliente",
    "Tipo",
    "Pesos",
    "USDT",
    "Tasa",
    "Comprobante",
];

/// Placeholder written in the rate column for cash adjustments.
pub const NO_RATE: &str = "N/A";

/// Decimal places kept when an amount is written to the ledger.
const LEDGER_DP: u32 = 6;

/// The kind of operation, from the desk's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OpType {
    /// The desk buys USDT from the client.
    Compra,
    /// The desk sells USDT to the client.
    Venta,
    /// A cash payment out to the client.
    Pago,
    /// A cash receipt in from the client.
    Recibo,
}

serde_plain::derive_display_from_serialize!(OpType);
serde_plain::derive_fromstr_from_deserialize!(OpType);

/// One append-only row of the ledger. Empty amounts and the rate placeholder are represented by
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LedgerEntry {
    pub folio: Folio,
    pub timestamp: String,
    pub client_alias: String,
    pub op_type: OpType,
    pub pesos: Option<Decimal>,
    pub usdt: Option<Decimal>,
    pub rate: Option<Decimal>,
    pub receipt_link: String,
}

impl LedgerEntry {
    /// A `Compra` or `Venta` entry: both amounts and the rate are recorded.
    pub fn conversion(
        folio: Folio,
        timestamp: impl Into<String>,
        client_alias: impl Into<String>,
        op_type: OpType,
        pesos: Decimal,
        usdt: Decimal,
        rate: Decimal,
    ) -> Self {
        Self {
            folio,
            timestamp: timestamp.into(),
            client_alias: client_alias.into(),
            op_type,
            pesos: Some(pesos),
            usdt: Some(usdt),
            rate: Some(rate),
            receipt_link: String::new(),
        }
    }

    /// A `Pago` or `Recibo` entry: the amount goes in the column of its currency and there is no
    /// rate.
    pub fn adjustment(
        folio: Folio,
        timestamp: impl Into<String>,
        client_alias: impl Into<String>,
        op_type: OpType,
        amount: Decimal,
        currency: Currency,
    ) -> Self {
        let (pesos, usdt) = match currency {
            Currency::Mxn => (Some(amount), None),
            Currency::Usdt => (None, Some(amount)),
        };
        Self {
            folio,
            timestamp: timestamp.into(),
            client_alias: client_alias.into(),
            op_type,
            pesos,
            usdt,
            rate: None,
            receipt_link: String::new(),
        }
    }

    pub fn with_receipt_link(mut self, link: impl Into<String>) -> Self {
        self.receipt_link = link.into();
        self
    }

    /// The cells written to the sheet. Amounts are plain decimal strings so that the sheet
    /// interprets them as numbers.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.folio.to_string(),
            self.timestamp.clone(),
            self.client_alias.clone(),
            self.op_type.to_string(),
            self.pesos.map(ledger_number).unwrap_or_default(),
            self.usdt.map(ledger_number).unwrap_or_default(),
            self.rate
                .map(ledger_number)
                .unwrap_or_else(|| NO_RATE.to_string()),
            self.receipt_link.clone(),
        ]
    }
}

/// Formats a number for a ledger cell, e.g. `53.908356` or `1855`.
pub fn ledger_number(d: Decimal) -> String {
    d.round_dp(LEDGER_DP).normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn folio() -> Folio {
        Folio::new(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), 3)
    }

    #[test]
    fn test_conversion_row() {
        let usdt = Decimal::from(1000) / Decimal::from_str("18.55").unwrap();
        let entry = LedgerEntry::conversion(
            folio(),
            "2025-06-01 10:11:12",
            "Juan Perez",
            OpType::Compra,
            Decimal::from(1000),
            usdt,
            Decimal::from_str("18.55").unwrap(),
        )
        .with_receipt_link("https://example.com/r.png?raw=1");
        assert_eq!(
            entry.to_row(),
            vec![
                "25-06-01-0003",
                "2025-06-01 10:11:12",
                "Juan Perez",
                "Compra",
                "1000",
                "53.908356",
                "18.55",
                "https://example.com/r.png?raw=1",
            ]
        );
    }

    #[test]
    fn test_adjustment_row_mxn() {
        let entry = LedgerEntry::adjustment(
            folio(),
            "2025-06-01 10:11:12",
            "Ana",
            OpType::Pago,
            Decimal::from_str("250.50").unwrap(),
            Currency::Mxn,
        );
        let row = entry.to_row();
        assert_eq!(row[3], "Pago");
        assert_eq!(row[4], "250.5");
        assert_eq!(row[5], "");
        assert_eq!(row[6], "N/A");
        assert_eq!(row[7], "");
    }

    #[test]
    fn test_adjustment_row_usdt() {
        let entry = LedgerEntry::adjustment(
            folio(),
            "t",
            "Ana",
            OpType::Recibo,
            Decimal::from(20),
            Currency::Usdt,
        );
        let row = entry.to_row();
        assert_eq!(row[4], "");
        assert_eq!(row[5], "20");
    }

    #[test]
    fn test_op_type_display() {
        assert_eq!(OpType::Venta.to_string(), "Venta");
        assert_eq!("Recibo".parse::<OpType>().unwrap(), OpType::Recibo);
    }
}
