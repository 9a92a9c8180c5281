//! Configuration file handling for the desk.
//!
//! The configuration file is stored at `$CAMBIO_HOME/config.json` and holds the Google Sheet URL,
//! the name of the ledger tab, backup settings, and the paths of the credential files.

use crate::backup::Backup;
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The ledger tab used when `init` is not given one.
pub const DEFAULT_LEDGER_TAB: &str = "Operaciones";

/// Environment variable holding the storage access token. It wins over the local token file.
pub const STORAGE_TOKEN_ENV: &str = "CAMBIO_STORAGE_TOKEN";

const APP_NAME: &str = "cambio";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const SECRETS: &str = ".secrets";
const BACKUPS: &str = ".backups";
const CLIENT_SECRET_JSON: &str = "client_secret.json";
const TOKEN_JSON: &str = "token.json";
const STORAGE_TOKEN: &str = "storage_token";
const CONFIG_JSON: &str = "config.json";

/// The configuration of the app. It is loaded from `$CAMBIO_HOME/config.json` and knows where
/// everything else in the home directory lives.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet_id: String,
}

impl Config {
    /// Creates the home directory and its subdirectories, writes an initial `config.json` and
    /// copies `secret_file` to its default location.
    ///
    /// # Arguments
    /// - `dir` - The home directory, e.g. `$HOME/cambio`
    /// - `secret_file` - The OAuth 2.0 client credentials downloaded from Google Cloud Console.
    /// - `sheet_url` - The URL of the desk's Google Sheet, e.g.
    ///   `https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX`
    /// - `ledger_tab` - The tab that ledger rows are appended to.
    ///
    /// # Errors
    /// - Returns an error if the sheet URL is not a spreadsheet URL or a file operation fails.
    pub async fn create(
        dir: impl Into<PathBuf>,
        secret_file: &Path,
        sheet_url: &str,
        ledger_tab: &str,
    ) -> Result<Self> {
        let spreadsheet_id = extract_spreadsheet_id(sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();
        ensure!(!ledger_tab.trim().is_empty(), "The ledger tab name is empty");

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the cambio home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;
        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        utils::copy(secret_file, secrets.join(CLIENT_SECRET_JSON)).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            sheet_url: sheet_url.to_string(),
            ledger_tab: ledger_tab.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            backups,
            secrets,
            config_path,
            config_file,
            spreadsheet_id,
        })
    }

    /// Loads and validates the home directory at `cambio_home`.
    pub async fn load(cambio_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = cambio_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The cambio home directory is missing, run 'cambio init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let spreadsheet_id = extract_spreadsheet_id(&config_file.sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();

        let config = Self {
            root: root.clone(),
            backups: root.join(BACKUPS),
            secrets: root.join(SECRETS),
            config_path,
            config_file,
            spreadsheet_id,
        };
        if !config.backups.is_dir() {
            bail!(
                "The backups directory is missing '{}'",
                config.backups.display()
            )
        }
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        debug!("Loaded config from {}", config.config_path.display());
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn sheet_url(&self) -> &str {
        &self.config_file.sheet_url
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn ledger_tab(&self) -> &str {
        &self.config_file.ledger_tab
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    /// Whether the MXN closing balance is computed. When off it is written as zero.
    pub fn compute_mxn_balance(&self) -> bool {
        self.config_file.compute_mxn_balance
    }

    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }

    pub fn client_secret_path(&self) -> PathBuf {
        self.resolve(self.config_file.client_secret_path())
    }

    pub fn token_path(&self) -> PathBuf {
        self.resolve(self.config_file.token_path())
    }

    pub fn storage_token_path(&self) -> PathBuf {
        self.resolve(self.config_file.storage_token_path())
    }

    /// The storage access token: `CAMBIO_STORAGE_TOKEN` if it is set, otherwise the contents of
    /// the storage token file.
    pub async fn storage_token(&self) -> Result<String> {
        storage_token_from(
            std::env::var(STORAGE_TOKEN_ENV).ok(),
            &self.storage_token_path(),
        )
        .await
    }

    /// Relative paths are relative to the home directory.
    fn resolve(&self, p: PathBuf) -> PathBuf {
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

async fn storage_token_from(env_value: Option<String>, fallback: &Path) -> Result<String> {
    if let Some(token) = env_value.map(|v| v.trim().to_string()) {
        if !token.is_empty() {
            return Ok(token);
        }
    }
    let token = utils::read(fallback)
        .await
        .with_context(|| format!("{STORAGE_TOKEN_ENV} is not set and the token file is unreadable"))?
        .trim()
        .to_string();
    ensure!(!token.is_empty(), "The storage token file '{}' is empty", fallback.display());
    Ok(token)
}

/// The serialization format of `config.json`.
///
/// ```json
/// {
///   "app_name": "cambio",
///   "config_version": 1,
///   "sheet_url": "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
///   "ledger_tab": "Operaciones",
///   "backup_copies": 5,
///   "compute_mxn_balance": false
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Should always be "cambio"
    app_name: String,

    config_version: u8,

    sheet_url: String,

    #[serde(default = "default_ledger_tab")]
    ledger_tab: String,

    #[serde(default = "default_backup_copies")]
    backup_copies: u32,

    /// Relative to the home directory or absolute. Defaults to `.secrets/client_secret.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_secret_path: Option<PathBuf>,

    /// Relative to the home directory or absolute. Defaults to `.secrets/token.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,

    /// Relative to the home directory or absolute. Defaults to `.secrets/storage_token`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    storage_token_path: Option<PathBuf>,

    #[serde(default)]
    compute_mxn_balance: bool,
}

fn default_ledger_tab() -> String {
    DEFAULT_LEDGER_TAB.to_string()
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: String::new(),
            ledger_tab: default_ledger_tab(),
            backup_copies: BACKUP_COPIES,
            client_secret_path: None,
            token_path: None,
            storage_token_path: None,
            compute_mxn_balance: false,
        }
    }
}

impl ConfigFile {
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;
        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }

    fn client_secret_path(&self) -> PathBuf {
        self.client_secret_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(CLIENT_SECRET_JSON))
    }

    fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(TOKEN_JSON))
    }

    fn storage_token_path(&self) -> PathBuf {
        self.storage_token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(STORAGE_TOKEN))
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL of the form
/// `https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...`.
fn extract_spreadsheet_id(url: &str) -> Result<&str> {
    let parts: Vec<&str> = url.split('/').collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "d" && i + 1 < parts.len() {
            let id_part = parts[i + 1];
            let id = id_part
                .split(['?', '#'])
                .next()
                .unwrap_or(id_part);
            if !id.is_empty() {
                return Ok(id);
            }
        }
    }
    bail!(
        "Invalid Google Sheets URL '{url}'. Expected: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SHEET_URL: &str =
        "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL/edit";

    #[tokio::test]
    async fn test_config_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("cambio_home");
        let secret_source = dir.path().join("x.json");
        utils::write(&secret_source, "12345").await.unwrap();

        let config = Config::create(&home_dir, &secret_source, SHEET_URL, "Bitacora")
            .await
            .unwrap();
        assert_eq!(SHEET_URL, config.sheet_url());
        assert_eq!(
            "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
            config.spreadsheet_id()
        );
        assert_eq!("Bitacora", config.ledger_tab());
        assert!(!config.compute_mxn_balance());
        assert_eq!(
            "12345",
            utils::read(&config.client_secret_path()).await.unwrap()
        );
        assert!(config.backups().is_dir());
        assert!(config.secrets().is_dir());

        let loaded = Config::load(&home_dir).await.unwrap();
        assert_eq!(loaded.ledger_tab(), "Bitacora");
        assert_eq!(loaded.backup_copies(), 5);
        assert_eq!(
            loaded.storage_token_path(),
            loaded.root().join(SECRETS).join(STORAGE_TOKEN)
        );
    }

    #[tokio::test]
    async fn test_config_create_bad_url() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("cambio_home");
        let secret_source = dir.path().join("x.json");
        utils::write(&secret_source, "{}").await.unwrap();
        let result = Config::create(&home_dir, &secret_source, "https://example.com/x", "L").await;
        assert!(result.is_err());
        assert!(!home_dir.exists());
    }

    #[tokio::test]
    async fn test_load_missing_home() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(dir.path().join("nope")).await.is_err());
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "cambio",
            "config_version": 1,
            "sheet_url": "https://docs.google.com/spreadsheets/d/minimal"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.ledger_tab, DEFAULT_LEDGER_TAB);
        assert_eq!(config.backup_copies, 5);
        assert!(!config.compute_mxn_balance);
        assert_eq!(
            config.client_secret_path(),
            PathBuf::from(SECRETS).join(CLIENT_SECRET_JSON)
        );
        assert_eq!(config.token_path(), PathBuf::from(SECRETS).join(TOKEN_JSON));
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "wrong_app",
            "config_version": 1,
            "sheet_url": "https://docs.google.com/spreadsheets/d/test"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let original = ConfigFile {
            sheet_url: "https://docs.google.com/spreadsheets/d/test123".to_string(),
            backup_copies: 7,
            token_path: Some(PathBuf::from("/etc/cambio/token.json")),
            compute_mxn_balance: true,
            ..ConfigFile::default()
        };
        original.save(&config_path).await.unwrap();
        assert_eq!(original, ConfigFile::load(&config_path).await.unwrap());
    }

    #[test]
    fn test_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("client_secret_path"));
        assert!(!json.contains("token_path"));
    }

    #[tokio::test]
    async fn test_storage_token_precedence() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("storage_token");
        utils::write(&file, "from-file\n").await.unwrap();

        let token = storage_token_from(Some("from-env".to_string()), &file).await;
        assert_eq!(token.unwrap(), "from-env");
        let token = storage_token_from(Some("  ".to_string()), &file).await;
        assert_eq!(token.unwrap(), "from-file");
        let token = storage_token_from(None, &file).await;
        assert_eq!(token.unwrap(), "from-file");
        assert!(storage_token_from(None, &dir.path().join("missing"))
            .await
            .is_err());
    }

    #[test]
    fn test_extract_spreadsheet_id() {
        assert_eq!(
            extract_spreadsheet_id(SHEET_URL).unwrap(),
            "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL"
        );
        assert_eq!(
            extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/ABC123?foo=bar").unwrap(),
            "ABC123"
        );
        assert_eq!(
            extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/ABC123#gid=0").unwrap(),
            "ABC123"
        );
        assert!(extract_spreadsheet_id("https://example.com/invalid").is_err());
        assert!(extract_spreadsheet_id("").is_err());
    }
}
