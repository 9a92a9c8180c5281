//! A ticket is a JSON file describing one operator session: the client, any rate overrides, the
//! calculation rows and the cash adjustments, with optional receipt images next to the file.
//!
//! ```json
//! {
//!   "client": "Juan Perez",
//!   "buy_rate": "18.55",
//!   "rows": [{ "vende": "$1,855.00", "compra": 0, "vende_receipt": "recibo.png" }],
//!   "adjustments": [{ "pago": 0, "recibo": 10, "recibo_moneda": "USDT" }]
//! }
//! ```

use crate::model::{Amount, Attachment, Clients, Currency, Direction};
use crate::session::Session;
use crate::{utils, Result};
use anyhow::{bail, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// The receipt image formats that are accepted.
const RECEIPT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// An amount in a ticket. Either a JSON number or a string such as `"$1,200.00"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketAmount(Decimal);

impl TicketAmount {
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl<'de> Deserialize<'de> for TicketAmount {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(serde_json::Number),
            Text(String),
        }

        let value = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Decimal::from_str(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string()))
                .map_err(serde::de::Error::custom)?,
            Raw::Text(s) => Amount::from_str(&s)
                .map_err(serde::de::Error::custom)?
                .value(),
        };
        Ok(TicketAmount(value))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TicketRow {
    #[serde(default)]
    pub vende: TicketAmount,
    #[serde(default)]
    pub compra: TicketAmount,
    pub vende_receipt: Option<PathBuf>,
    pub compra_receipt: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TicketAdjustment {
    #[serde(default)]
    pub pago: TicketAmount,
    #[serde(default)]
    pub pago_moneda: Currency,
    #[serde(default)]
    pub recibo: TicketAmount,
    #[serde(default)]
    pub recibo_moneda: Currency,
    pub pago_receipt: Option<PathBuf>,
    pub recibo_receipt: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ticket {
    pub client: Option<String>,
    pub buy_rate: Option<TicketAmount>,
    pub sell_rate: Option<TicketAmount>,
    pub buy_direction: Option<Direction>,
    pub sell_direction: Option<Direction>,
    #[serde(default)]
    pub rows: Vec<TicketRow>,
    #[serde(default)]
    pub adjustments: Vec<TicketAdjustment>,
    /// Receipt paths are resolved against this directory.
    #[serde(skip)]
    base_dir: PathBuf,
}

impl Ticket {
    /// Reads a ticket file. Receipt paths in it are relative to the file's directory.
    pub async fn load(path: &Path) -> Result<Self> {
        let json = utils::read(path).await?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::parse(&json, base_dir)
            .with_context(|| format!("Invalid ticket file {}", path.display()))
    }

    pub fn parse(json: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut ticket: Ticket = serde_json::from_str(json).context("Unable to parse the ticket")?;
        ticket.base_dir = base_dir.into();
        Ok(ticket)
    }

    /// Replays the ticket into `session` through its event handlers. Any rows and adjustments
    /// already in the session are replaced.
    pub async fn apply(&self, session: &mut Session, clients: &Clients) -> Result<()> {
        if let Some(alias) = &self.client {
            session.select_client(clients, alias.trim())?;
        }
        if let Some(rate) = self.buy_rate {
            session.set_buy_rate(rate.value());
        }
        if let Some(rate) = self.sell_rate {
            session.set_sell_rate(rate.value());
        }
        if let Some(direction) = self.buy_direction {
            session.set_buy_direction(direction);
        }
        if let Some(direction) = self.sell_direction {
            session.set_sell_direction(direction);
        }

        session.clear_rows();
        for (i, row) in self.rows.iter().enumerate() {
            let index = if i == 0 { 0 } else { session.add_row()? };
            session
                .set_row_amounts(index, row.vende.value(), row.compra.value())
                .with_context(|| format!("Invalid row {}", i + 1))?;
            if let Some(path) = &row.vende_receipt {
                session.attach_vende(index, self.receipt(path).await?)?;
            }
            if let Some(path) = &row.compra_receipt {
                session.attach_compra(index, self.receipt(path).await?)?;
            }
        }

        session.clear_adjustments();
        for (i, adjustment) in self.adjustments.iter().enumerate() {
            let index = if i == 0 { 0 } else { session.add_adjustment() };
            session
                .set_adjustment(
                    index,
                    (adjustment.pago.value(), adjustment.pago_moneda),
                    (adjustment.recibo.value(), adjustment.recibo_moneda),
                )
                .with_context(|| format!("Invalid adjustment {}", i + 1))?;
            if let Some(path) = &adjustment.pago_receipt {
                session.attach_pago(index, self.receipt(path).await?)?;
            }
            if let Some(path) = &adjustment.recibo_receipt {
                session.attach_recibo(index, self.receipt(path).await?)?;
            }
        }
        debug!(
            "Applied ticket with {} rows and {} adjustments",
            self.rows.len(),
            self.adjustments.len()
        );
        Ok(())
    }

    async fn receipt(&self, path: &Path) -> Result<Attachment> {
        load_receipt(&self.base_dir.join(path)).await
    }
}

/// Reads a receipt image. Only PNG and JPEG files are accepted.
pub async fn load_receipt(path: &Path) -> Result<Attachment> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !RECEIPT_EXTENSIONS.contains(&extension.as_str()) {
        bail!(
            "Receipt '{}' must be one of {}",
            path.display(),
            RECEIPT_EXTENSIONS.join(", ")
        );
    }
    let filename = path
        .file_name()
        .with_context(|| format!("Receipt path '{}' has no file name", path.display()))?
        .to_string_lossy()
        .to_string();
    let content = utils::read_bytes(path).await?;
    Ok(Attachment::new(filename, content))
}
