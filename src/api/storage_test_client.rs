//! Implements the `Storage` trait in memory so that receipts can be "uploaded" without Dropbox.

use crate::api::Storage;
use crate::Result;
use anyhow::{bail, Context};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, OnceLock};

/// The files and links of one in-memory storage account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TestStorageState {
    pub(crate) files: HashMap<String, Vec<u8>>,
    pub(crate) links: HashMap<String, Vec<String>>,
    pub(crate) fail_uploads: bool,
    pub(crate) fail_links: bool,
    pub(crate) upload_calls: usize,
    pub(crate) create_link_calls: usize,
}

fn states() -> MutexGuard<'static, HashMap<String, TestStorageState>> {
    static STATES: OnceLock<Mutex<HashMap<String, TestStorageState>>> = OnceLock::new();
    STATES
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shares state with every other `TestStorage` opened with the same key.
pub(crate) struct TestStorage {
    key: String,
}

impl TestStorage {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    #[cfg(test)]
    pub(crate) fn get_state(&self) -> TestStorageState {
        states().get(&self.key).cloned().unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn set_state(&self, state: TestStorageState) {
        states().insert(self.key.clone(), state);
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut TestStorageState) -> Result<T>) -> Result<T> {
        let mut guard = states();
        f(guard.entry(self.key.clone()).or_default())
    }
}

#[async_trait::async_trait]
impl Storage for TestStorage {
    async fn upload(&mut self, path: &str, content: &[u8]) -> Result<()> {
        self.with_state(|state| {
            state.upload_calls += 1;
            if state.fail_uploads {
                bail!("Simulated failure uploading {path}");
            }
            state.files.insert(path.to_string(), content.to_vec());
            Ok(())
        })
    }

    async fn list_shared_links(&mut self, path: &str) -> Result<Vec<String>> {
        self.with_state(|state| {
            if state.fail_links {
                bail!("Simulated failure listing links for {path}");
            }
            Ok(state.links.get(path).cloned().unwrap_or_default())
        })
    }

    async fn create_shared_link(&mut self, path: &str) -> Result<String> {
        self.with_state(|state| {
            state.create_link_calls += 1;
            if state.fail_links {
                bail!("Simulated failure creating a link for {path}");
            }
            if !state.files.contains_key(path) {
                bail!("Cannot share {path}, it does not exist");
            }
            let links = state.links.entry(path.to_string()).or_default();
            if !links.is_empty() {
                bail!("shared_link_already_exists for {path}");
            }
            let link = format!(
                "https://www.dropbox.com/scl/fi/{}{path}?rlkey=test&dl=0",
                links.len() + 1
            );
            links.push(link.clone());
            links
                .last()
                .cloned()
                .with_context(|| format!("No link recorded for {path}"))
        })
    }
}
