//! Exchange rates and conversion directions for the two sides of the desk.

use crate::model::Amount;
use crate::Result;
use anyhow::{bail, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Buy rate used when the `Tasas` tab cannot be read.
pub const DEFAULT_BUY_RATE: Decimal = Decimal::from_parts(1855, 0, 0, false, 2);

/// Sell rate used when the `Tasas` tab cannot be read.
pub const DEFAULT_SELL_RATE: Decimal = Decimal::from_parts(1944, 0, 0, false, 2);

/// Which amount the operator enters for one side of the desk. The other amount is derived.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The operator enters pesos, USDT is derived by dividing by the rate.
    #[default]
    PesosToUsdt,
    /// The operator enters USDT, pesos are derived by multiplying by the rate.
    UsdtToPesos,
}

serde_plain::derive_display_from_serialize!(Direction);
serde_plain::derive_fromstr_from_deserialize!(Direction);

impl Direction {
    /// The currency of the amount the operator types in.
    pub fn input_label(&self) -> &'static str {
        match self {
            Direction::PesosToUsdt => "MXN",
            Direction::UsdtToPesos => "USDT",
        }
    }
}

/// The rates and directions in effect for a session. Defaults come from the `Tasas` tab and the
/// operator may override any of them; overrides are never written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateConfig {
    /// Rate used when the client sells USDT to the desk (`Compra`).
    buy_rate: Decimal,
    /// Rate used when the client buys USDT from the desk (`Venta`).
    sell_rate: Decimal,
    buy_direction: Direction,
    sell_direction: Direction,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BUY_RATE, DEFAULT_SELL_RATE)
    }
}

impl RateConfig {
    pub fn new(buy_rate: Decimal, sell_rate: Decimal) -> Self {
        Self {
            buy_rate,
            sell_rate,
            buy_direction: Direction::default(),
            sell_direction: Direction::default(),
        }
    }

    /// Reads the default rates from the rows of the `Tasas` tab. Row 2 holds `[buy, sell]`.
    ///
    /// # Errors
    /// - Returns an error if row 2 is missing, too short, or holds a value that is not a number.
    pub fn from_rows(rows: &[Vec<String>]) -> Result<Self> {
        let Some(row) = rows.get(1) else {
            bail!("The rates tab has no second row");
        };
        if row.len() < 2 {
            bail!("The rates row needs two values, found {}", row.len());
        }
        let buy = Amount::from_str(&row[0])
            .with_context(|| format!("Invalid buy rate '{}'", row[0]))?
            .value();
        let sell = Amount::from_str(&row[1])
            .with_context(|| format!("Invalid sell rate '{}'", row[1]))?
            .value();
        Ok(Self::new(buy, sell))
    }

    pub fn buy_rate(&self) -> Decimal {
        self.buy_rate
    }

    pub fn sell_rate(&self) -> Decimal {
        self.sell_rate
    }

    pub fn buy_direction(&self) -> Direction {
        self.buy_direction
    }

    pub fn sell_direction(&self) -> Direction {
        self.sell_direction
    }

    pub fn with_buy_rate(mut self, rate: Decimal) -> Self {
        self.buy_rate = rate;
        self
    }

    pub fn with_sell_rate(mut self, rate: Decimal) -> Self {
        self.sell_rate = rate;
        self
    }

    pub fn with_buy_direction(mut self, direction: Direction) -> Self {
        self.buy_direction = direction;
        self
    }

    pub fn with_sell_direction(mut self, direction: Direction) -> Self {
        self.sell_direction = direction;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_defaults() {
        let rates = RateConfig::default();
        assert_eq!(rates.buy_rate().to_string(), "18.55");
        assert_eq!(rates.sell_rate().to_string(), "19.44");
        assert_eq!(rates.buy_direction(), Direction::PesosToUsdt);
        assert_eq!(rates.sell_direction(), Direction::PesosToUsdt);
    }

    #[test]
    fn test_from_rows() {
        let data = rows(&[&["Compra", "Venta"], &["18.20", "$19.10"]]);
        let rates = RateConfig::from_rows(&data).unwrap();
        assert_eq!(rates.buy_rate(), Decimal::from_str("18.20").unwrap());
        assert_eq!(rates.sell_rate(), Decimal::from_str("19.10").unwrap());
    }

    #[test]
    fn test_from_rows_missing_row() {
        let data = rows(&[&["Compra", "Venta"]]);
        assert!(RateConfig::from_rows(&data).is_err());
    }

    #[test]
    fn test_from_rows_short_row() {
        let data = rows(&[&["Compra", "Venta"], &["18.20"]]);
        assert!(RateConfig::from_rows(&data).is_err());
    }

    #[test]
    fn test_from_rows_not_a_number() {
        let data = rows(&[&["Compra", "Venta"], &["n/a", "19.10"]]);
        let err = RateConfig::from_rows(&data).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid buy rate"));
    }

    #[test]
    fn test_overrides() {
        let rates = RateConfig::default()
            .with_buy_rate(Decimal::from(17))
            .with_sell_direction(Direction::UsdtToPesos);
        assert_eq!(rates.buy_rate(), Decimal::from(17));
        assert_eq!(rates.sell_rate(), DEFAULT_SELL_RATE);
        assert_eq!(rates.sell_direction(), Direction::UsdtToPesos);
        assert_eq!(rates.buy_direction(), Direction::PesosToUsdt);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(
            "usdt_to_pesos".parse::<Direction>().unwrap(),
            Direction::UsdtToPesos
        );
        assert_eq!(Direction::PesosToUsdt.to_string(), "pesos_to_usdt");
    }

    #[test]
    fn test_direction_input_label() {
        assert_eq!(Direction::PesosToUsdt.input_label(), "MXN");
        assert_eq!(Direction::UsdtToPesos.input_label(), "USDT");
    }
}
