//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::api::{TestSheet, TestSheetState, TestStorage, TestStorageState};
use crate::config::DEFAULT_LEDGER_TAB;
use crate::Config;
use tempfile::TempDir;
use uuid::Uuid;

/// Test environment with a cambio home directory and its Config. The in-memory sheet and
/// storage are keyed by the random spreadsheet id, so every environment starts from the seed
/// data. Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("cambio");
        let secret_path = temp_dir.path().join("client_secret.json");

        let secret_content = r#"{
            "installed": {
                "client_id": "test-client-id",
                "client_secret": "test-secret",
                "redirect_uris": ["http://localhost"],
                "token_uri": "https://oauth2.googleapis.com/token"
            }
        }"#;
        std::fs::write(&secret_path, secret_content).unwrap();

        let rand = Uuid::new_v4().to_string().replace('-', "");
        let sheet_url = format!("https://docs.google.com/spreadsheets/d/{rand}/edit");
        let config = Config::create(&root, &secret_path, &sheet_url, DEFAULT_LEDGER_TAB)
            .await
            .unwrap();

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    pub fn config(&self) -> Config {
        self.config.clone()
    }

    pub fn sheet(&self) -> TestSheet {
        TestSheet::new(self.config.spreadsheet_id())
    }

    pub fn storage(&self) -> TestStorage {
        TestStorage::new(self.config.spreadsheet_id())
    }

    pub fn get_state(&self) -> TestSheetState {
        self.sheet().get_state()
    }

    pub fn set_state(&self, state: TestSheetState) {
        self.sheet().set_state(state)
    }

    pub fn get_storage_state(&self) -> TestStorageState {
        self.storage().get_state()
    }

    pub fn set_storage_state(&self, state: TestStorageState) {
        self.storage().set_state(state)
    }
}
