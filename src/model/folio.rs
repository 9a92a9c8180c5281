//! Daily sequential ledger identifiers of the form `YY-MM-DD-NNNN`.

use crate::Result;
use anyhow::{bail, Context};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const DATE_FORMAT: &str = "%y-%m-%d";

/// A ledger identifier: the Mexico City calendar date of the operation and its number within
/// that day, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Folio {
    date: NaiveDate,
    number: u32,
}

impl Folio {
    pub fn new(date: NaiveDate, number: u32) -> Self {
        Self { date, number }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn number(&self) -> u32 {
        self.number
    }
}

impl fmt::Display for Folio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:04}", self.date.format(DATE_FORMAT), self.number)
    }
}

impl FromStr for Folio {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 4 {
            bail!("A folio must have 4 segments, got '{s}'");
        }
        if parts[..3]
            .iter()
            .any(|p| p.len() != 2 || !p.chars().all(|c| c.is_ascii_digit()))
        {
            bail!("A folio date must be YY-MM-DD, got '{s}'");
        }
        let date = NaiveDate::parse_from_str(&parts[..3].join("-"), DATE_FORMAT)
            .with_context(|| format!("Invalid folio date in '{s}'"))?;
        let number = parts[3]
            .parse::<u32>()
            .with_context(|| format!("Invalid folio number in '{s}'"))?;
        Ok(Self { date, number })
    }
}

impl Serialize for Folio {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Folio {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Folio::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Derives the next folio number for `today` from the rows of the ledger tab, header included.
///
/// The folio of the last row continues the sequence when it was issued `today`, otherwise the
/// sequence starts again at 1. A ledger with no data rows, or a last row whose folio cannot be
/// parsed, also starts at 1.
pub fn next_folio_number(rows: &[Vec<String>], today: NaiveDate) -> u32 {
    if rows.len() < 2 {
        return 1;
    }
    let last = rows
        .last()
        .and_then(|row| row.first())
        .and_then(|cell| Folio::from_str(cell).ok());
    match last {
        Some(folio) if folio.date() == today => folio.number().saturating_add(1),
        _ => 1,
    }
}

/// The folios for a batch of `count` operations starting at `base`.
pub fn batch_folios(today: NaiveDate, base: u32, count: usize) -> Vec<Folio> {
    (0..count)
        .map(|i| Folio::new(today, base.saturating_add(i as u32)))
        .collect()
}
