//! The client roster read from the `Clientes` tab.

use crate::model::Amount;
use crate::Result;
use anyhow::bail;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Header of the roster column holding the client alias.
pub const ALIAS_HEADER: &str = "Alias Cliente";
/// Header of the roster column holding the USDT balance.
pub const USDT_HEADER: &str = "Saldo USDT";
/// Header of the roster column holding the MXN balance.
pub const MXN_HEADER: &str = "Saldo MXN";

/// A client of the desk and their running balances. A positive balance means the client owes the
/// desk, a negative balance means the desk owes the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Client {
    alias: String,
    balance_usdt: Decimal,
    balance_mxn: Decimal,
}

impl Client {
    pub fn new(alias: impl Into<String>, balance_usdt: Decimal, balance_mxn: Decimal) -> Self {
        Self {
            alias: alias.into(),
            balance_usdt,
            balance_mxn,
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn balance_usdt(&self) -> Decimal {
        self.balance_usdt
    }

    pub fn balance_mxn(&self) -> Decimal {
        self.balance_mxn
    }
}

/// Column positions of the roster headers, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterColumns {
    pub alias: usize,
    pub usdt: Option<usize>,
    pub mxn: Option<usize>,
}

impl RosterColumns {
    /// Finds the roster columns by header name.
    ///
    /// # Errors
    /// - Returns an error if there is no `Alias Cliente` header.
    pub fn find<S: AsRef<str>>(headers: &[S]) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h.as_ref().trim() == name);
        let Some(alias) = position(ALIAS_HEADER) else {
            bail!("The roster is missing the '{ALIAS_HEADER}' column");
        };
        Ok(Self {
            alias,
            usdt: position(USDT_HEADER),
            mxn: position(MXN_HEADER),
        })
    }
}

/// All clients from the roster, in sheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clients {
    data: Vec<Client>,
}

impl Clients {
    pub fn new(data: Vec<Client>) -> Self {
        Self { data }
    }

    /// Parses the rows of the `Clientes` tab. The first row holds the headers. Balances may be
    /// currency formatted and anything unparseable becomes zero. Rows without an alias are
    /// skipped.
    ///
    /// # Errors
    /// - Returns an error if there are data rows but no `Alias Cliente` header.
    pub fn parse(rows: &[Vec<String>]) -> Result<Self> {
        let mut iter = rows.iter();
        let Some(headers) = iter.next() else {
            return Ok(Self::default());
        };
        if rows.len() < 2 {
            return Ok(Self::default());
        }
        let columns = RosterColumns::find(headers)?;
        let cell = |row: &Vec<String>, ix: Option<usize>| -> Decimal {
            ix.and_then(|i| row.get(i))
                .map(|s| Amount::coerce(s))
                .unwrap_or_default()
        };

        let data = iter
            .filter_map(|row| {
                let alias = row.get(columns.alias)?.trim();
                if alias.is_empty() {
                    return None;
                }
                Some(Client::new(
                    alias,
                    cell(row, columns.usdt),
                    cell(row, columns.mxn),
                ))
            })
            .collect();
        Ok(Self { data })
    }

    pub fn get(&self, alias: &str) -> Option<&Client> {
        self.data.iter().find(|c| c.alias == alias)
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.data.iter().map(|c| c.alias.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
