//! Implements the `Sheet` trait using in-memory data.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets.

use crate::api::{parse_cell, Sheet, SheetRange, CLIENTES, TASAS};
use crate::config::DEFAULT_LEDGER_TAB;
use crate::model::LEDGER_HEADERS;
use crate::Result;
use anyhow::{bail, Context};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Mutex, MutexGuard, OnceLock};
use tracing::debug;

/// Everything an in-memory spreadsheet holds, plus switches that make its calls fail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TestSheetState {
    pub(crate) tabs: HashMap<String, Vec<Vec<String>>>,
    pub(crate) fail_reads: bool,
    pub(crate) fail_append: bool,
    pub(crate) fail_writes: bool,
    pub(crate) append_calls: usize,
    pub(crate) write_calls: usize,
}

impl TestSheetState {
    /// The seed roster, rates and an empty ledger.
    pub(crate) fn seeded() -> Self {
        let mut tabs = HashMap::new();
        tabs.insert(CLIENTES.to_string(), load_csv(CLIENT_DATA));
        tabs.insert(TASAS.to_string(), load_csv(RATE_DATA));
        tabs.insert(
            DEFAULT_LEDGER_TAB.to_string(),
            vec![LEDGER_HEADERS.iter().map(|h| h.to_string()).collect()],
        );
        Self {
            tabs,
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub(crate) fn tab(&self, name: &str) -> Option<&Vec<Vec<String>>> {
        self.tabs.get(name)
    }
}

/// State is shared by spreadsheet id so that every `TestSheet` created for the same config sees
/// the same data, the way every client of a real spreadsheet does.
fn states() -> MutexGuard<'static, HashMap<String, TestSheetState>> {
    static STATES: OnceLock<Mutex<HashMap<String, TestSheetState>>> = OnceLock::new();
    STATES
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) struct TestSheet {
    spreadsheet_id: String,
}

impl TestSheet {
    /// Opens the in-memory spreadsheet `spreadsheet_id`, seeding it on first use.
    pub(crate) fn new(spreadsheet_id: impl Into<String>) -> Self {
        let spreadsheet_id = spreadsheet_id.into();
        states()
            .entry(spreadsheet_id.clone())
            .or_insert_with(TestSheetState::seeded);
        Self { spreadsheet_id }
    }

    #[cfg(test)]
    pub(crate) fn get_state(&self) -> TestSheetState {
        states()
            .get(&self.spreadsheet_id)
            .cloned()
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn set_state(&self, state: TestSheetState) {
        states().insert(self.spreadsheet_id.clone(), state);
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut TestSheetState) -> Result<T>) -> Result<T> {
        let mut guard = states();
        let state = guard.entry(self.spreadsheet_id.clone()).or_default();
        f(state)
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn get(&mut self, tab: &str) -> Result<Vec<Vec<String>>> {
        self.with_state(|state| {
            if state.fail_reads {
                bail!("Simulated failure reading {tab}");
            }
            state
                .tabs
                .get(tab)
                .cloned()
                .with_context(|| format!("Sheet '{tab}' not found"))
        })
    }

    async fn append_rows(&mut self, tab: &str, rows: &[Vec<String>]) -> Result<()> {
        self.with_state(|state| {
            state.append_calls += 1;
            if state.fail_append {
                bail!("Simulated failure appending to {tab}");
            }
            let existing = state
                .tabs
                .get_mut(tab)
                .with_context(|| format!("Sheet '{tab}' not found"))?;
            existing.extend(rows.iter().cloned());
            debug!("Appended {} rows to in-memory {tab}", rows.len());
            Ok(())
        })
    }

    async fn write_ranges(&mut self, data: &[SheetRange]) -> Result<()> {
        self.with_state(|state| {
            state.write_calls += 1;
            if state.fail_writes {
                bail!("Simulated failure writing ranges");
            }
            for sheet_range in data {
                let (tab, column, row) = parse_cell(&sheet_range.range)?;
                let rows = state
                    .tabs
                    .get_mut(&tab)
                    .with_context(|| format!("Sheet '{tab}' not found"))?;
                for (i, values) in sheet_range.values.iter().enumerate() {
                    let r = row + i;
                    if rows.len() <= r {
                        rows.resize(r + 1, Vec::new());
                    }
                    for (j, value) in values.iter().enumerate() {
                        let c = column + j;
                        if rows[r].len() <= c {
                            rows[r].resize(c + 1, String::new());
                        }
                        rows[r][c] = value.clone();
                    }
                }
            }
            Ok(())
        })
    }
}

/// Loads data from a CSV-formatted string. The seed data is static, so a bad record is skipped.
fn load_csv(csv_data: &str) -> Vec<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));
    rdr.records()
        .filter_map(|record| record.ok())
        .map(|record| record.iter().map(|field| field.to_string()).collect())
        .collect()
}

/// Seed roster. The alias is in the second column, as in the desk's real sheet.
const CLIENT_DATA: &str = r##"ID,Alias Cliente,Saldo USDT,Saldo MXN
1,Juan Perez,$150.00,$0.00
2,Maria Lopez,-$25.50,"$1,200.00"
3,Ana,$0.00,$0.00
"##;

/// Seed rates: buy, then sell.
const RATE_DATA: &str = r##"Compra,Venta
$18.70,$19.30
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sheet() -> TestSheet {
        TestSheet::new(Uuid::new_v4().to_string())
    }

    #[tokio::test]
    async fn test_seed_data() {
        let mut sheet = sheet();
        let clients = sheet.get(CLIENTES).await.unwrap();
        assert_eq!(clients[0][1], "Alias Cliente");
        assert_eq!(clients[2][3], "$1,200.00");
        let rates = sheet.get(TASAS).await.unwrap();
        assert_eq!(rates[1], vec!["$18.70", "$19.30"]);
        let ledger = sheet.get(DEFAULT_LEDGER_TAB).await.unwrap();
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_tab() {
        let mut sheet = sheet();
        assert!(sheet.get("Nope").await.is_err());
        assert!(sheet.append_rows("Nope", &[vec!["x".to_string()]]).await.is_err());
    }

    #[tokio::test]
    async fn test_shared_state() {
        let id = Uuid::new_v4().to_string();
        let mut a = TestSheet::new(&id);
        a.append_rows(DEFAULT_LEDGER_TAB, &[vec!["25-06-01-0001".to_string()]])
            .await
            .unwrap();
        let mut b = TestSheet::new(&id);
        let ledger = b.get(DEFAULT_LEDGER_TAB).await.unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(b.get_state().append_calls, 1);
    }

    #[tokio::test]
    async fn test_write_ranges_grows_rows() {
        let mut sheet = sheet();
        sheet
            .write_ranges(&[SheetRange::cell(CLIENTES, 5, 2, "x")])
            .await
            .unwrap();
        let clients = sheet.get(CLIENTES).await.unwrap();
        assert_eq!(clients[2].len(), 6);
        assert_eq!(clients[2][5], "x");
    }

    #[tokio::test]
    async fn test_failure_flags() {
        let mut sheet = sheet();
        let mut state = sheet.get_state();
        state.fail_append = true;
        state.fail_writes = true;
        state.fail_reads = true;
        sheet.set_state(state);
        assert!(sheet.get(CLIENTES).await.is_err());
        assert!(sheet.append_rows(DEFAULT_LEDGER_TAB, &[]).await.is_err());
        assert!(sheet.write_ranges(&[]).await.is_err());
        let state = sheet.get_state();
        assert_eq!(state.append_calls, 1);
        assert_eq!(state.write_calls, 1);
    }
}
