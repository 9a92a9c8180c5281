//! The external collaborators of the desk: the Google sheet that holds the roster, the rates and
//! the ledger, and the file storage that holds receipt images.
//!
//! Each collaborator sits behind a small trait so that the whole app can run top-to-bottom against
//! in-memory implementations when `CAMBIO_IN_TEST_MODE` is set.

mod desk;
mod dropbox;
mod files;
mod oauth;
mod sheet;
mod sheet_test_client;
mod storage_test_client;

use crate::{Config, Result};
use anyhow::{bail, Context};

pub(crate) use desk::Desk;
pub(crate) use oauth::TokenProvider;
pub(crate) use sheet_test_client::TestSheet;
#[cfg(test)]
pub(crate) use sheet_test_client::TestSheetState;
pub(crate) use storage_test_client::TestStorage;
#[cfg(test)]
pub(crate) use storage_test_client::TestStorageState;

/// The tab holding one row per client with their running balances.
pub const CLIENTES: &str = "Clientes";

/// The tab holding the default rates in its second row.
pub const TASAS: &str = "Tasas";

/// The environment variable that switches the app to the in-memory backends.
pub const TEST_MODE_ENV: &str = "CAMBIO_IN_TEST_MODE";

const OAUTH_SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets"];

/// Selects real or in-memory backends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Live,
    Test,
}

impl Mode {
    /// `Mode::Test` when `CAMBIO_IN_TEST_MODE` is set to a non-empty value, otherwise `Mode::Live`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Live,
        }
    }
}

/// A block of cells to write, addressed in A1 notation, e.g. `'Clientes'!C4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetRange {
    pub(crate) range: String,
    pub(crate) values: Vec<Vec<String>>,
}

impl SheetRange {
    /// A single cell at the zero-based `column` and `row` of `tab`.
    pub(crate) fn cell(tab: &str, column: usize, row: usize, value: impl Into<String>) -> Self {
        Self {
            range: format!("{}!{}{}", quote_tab(tab), column_letters(column), row + 1),
            values: vec![vec![value.into()]],
        }
    }
}

/// Raw access to the tabs of one spreadsheet.
#[async_trait::async_trait]
pub(crate) trait Sheet: Send {
    /// All rows of `tab`. Errors when the tab does not exist.
    async fn get(&mut self, tab: &str) -> Result<Vec<Vec<String>>>;

    /// Appends `rows` after the last row of `tab` in a single call. Values are parsed as if typed
    /// by a user.
    async fn append_rows(&mut self, tab: &str, rows: &[Vec<String>]) -> Result<()>;

    /// Overwrites the given ranges. Values are parsed as if typed by a user.
    async fn write_ranges(&mut self, data: &[SheetRange]) -> Result<()>;
}

/// File storage with shareable links.
#[async_trait::async_trait]
pub(crate) trait Storage: Send {
    /// Writes `content` to `path`, replacing any existing file.
    async fn upload(&mut self, path: &str, content: &[u8]) -> Result<()>;

    /// The shared links that already exist for `path`.
    async fn list_shared_links(&mut self, path: &str) -> Result<Vec<String>>;

    /// Creates a new shared link for `path`.
    async fn create_shared_link(&mut self, path: &str) -> Result<String>;
}

/// Creates the `Sheet` for `config` in the given `mode`.
pub(crate) async fn sheet(config: &Config, mode: Mode) -> Result<Box<dyn Sheet>> {
    match mode {
        Mode::Live => {
            let token_provider =
                TokenProvider::load(config.client_secret_path(), config.token_path()).await?;
            Ok(Box::new(
                sheet::GoogleSheet::new(config.clone(), token_provider).await?,
            ))
        }
        Mode::Test => Ok(Box::new(TestSheet::new(config.spreadsheet_id()))),
    }
}

/// Creates the `Storage` for `config` in the given `mode`.
pub(crate) async fn storage(config: &Config, mode: Mode) -> Result<Box<dyn Storage>> {
    match mode {
        Mode::Live => {
            let token = config
                .storage_token()
                .await
                .context("A storage access token is required to upload receipts")?;
            Ok(Box::new(dropbox::DropboxStorage::new(token)?))
        }
        Mode::Test => Ok(Box::new(TestStorage::new(config.spreadsheet_id()))),
    }
}

/// Wraps a tab name in single quotes so that names with spaces work in A1 notation.
fn quote_tab(tab: &str) -> String {
    format!("'{}'", tab.replace('\'', "''"))
}

/// Converts a zero-based column index to its letters, e.g. `0 -> A`, `27 -> AB`.
fn column_letters(column: usize) -> String {
    let mut n = column + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Splits a single-cell A1 range into its tab name and zero-based column and row.
fn parse_cell(range: &str) -> Result<(String, usize, usize)> {
    let (tab, cell) = range
        .rsplit_once('!')
        .with_context(|| format!("Range '{range}' has no tab name"))?;
    let tab = tab
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or(tab)
        .replace("''", "'");
    let split = cell
        .find(|c: char| c.is_ascii_digit())
        .with_context(|| format!("Range '{range}' has no row number"))?;
    let (letters, digits) = cell.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_uppercase()) {
        bail!("Range '{range}' has an invalid column");
    }
    let column = letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A') as usize + 1)
        - 1;
    let row: usize = digits
        .parse()
        .with_context(|| format!("Range '{range}' has an invalid row"))?;
    if row == 0 {
        bail!("Range '{range}' has row 0");
    }
    Ok((tab, column, row - 1))
}
