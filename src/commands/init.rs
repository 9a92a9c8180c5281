use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and:
/// - Creates an initial `config.json` file using `sheet_url` and `ledger_tab` along with default
///   settings
/// - Copies `secret_file` into its default location in the data dir.
///
/// # Arguments
/// - `cambio_home` - The directory that will be the root of data directory, e.g. `$HOME/cambio`
/// - `secret_file` - The downloaded OAuth 2.0 client credentials JSON. This will be copied from
///   the `secret_file` path to its default location and name in the data directory.
/// - `sheet_url` - The URL of the desk's Google Sheet.
/// - `ledger_tab` - The tab that ledger rows are appended to.
///
/// # Errors
/// - Returns an error if the URL is not a spreadsheet URL or any file operations fail.
pub async fn init(
    cambio_home: &Path,
    secret_file: &Path,
    sheet_url: &str,
    ledger_tab: &str,
) -> Result<Out<()>> {
    let config = Config::create(cambio_home, secret_file, sheet_url, ledger_tab)
        .await
        .context("Unable to create the data directory and configs")?;
    Ok(format!(
        "Successfully created the cambio directory at {}",
        config.root().display()
    )
    .into())
}
