//! A local journal of every batch sent to the ledger, kept in rotated JSON files.

use crate::{clock, utils, Config, Result};
use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;

/// Prefix of the journal file written before each save.
pub const SAVE: &str = "save";

const EXTENSION: &str = "json";

/// Writes journal files named `{prefix}.YYYY-MM-DD-NNN.json` and keeps only the newest
/// `backup_copies` of each prefix.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
}

impl Backup {
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
        }
    }

    /// Saves `data` as pretty-printed JSON and rotates old files. Returns the path written.
    pub async fn save_json<T: Serialize>(&self, prefix: &str, data: &T) -> Result<PathBuf> {
        let date = clock::now().format("%Y-%m-%d").to_string();
        let seq = self.next_sequence_number(prefix, &date).await?;
        let path = self
            .backups_dir
            .join(format!("{prefix}.{date}-{seq:03}.{EXTENSION}"));

        let json = serde_json::to_string_pretty(data).context("Failed to serialize the journal")?;
        utils::write(&path, json).await?;

        self.rotate(prefix).await?;
        Ok(path)
    }

    async fn file_names(&self) -> Result<Vec<(PathBuf, String)>> {
        let mut names = Vec::new();
        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            names.push((entry.path(), entry.file_name().to_string_lossy().to_string()));
        }
        Ok(names)
    }

    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Result<u32> {
        let max_seq = self
            .file_names()
            .await?
            .iter()
            .filter_map(|(_, name)| parse_sequence_number(name, prefix, date))
            .max()
            .unwrap_or(0);
        Ok(max_seq + 1)
    }

    /// Deletes the oldest files of `prefix` beyond `backup_copies`. Names sort by date and then
    /// sequence number.
    async fn rotate(&self, prefix: &str) -> Result<()> {
        let mut files: Vec<(PathBuf, String)> = self
            .file_names()
            .await?
            .into_iter()
            .filter(|(_, name)| is_backup_file(name, prefix))
            .collect();
        files.sort_by(|a, b| a.1.cmp(&b.1));

        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for (path, _) in files.into_iter().take(to_delete) {
            utils::remove(&path).await?;
        }
        Ok(())
    }
}

/// The `NNN` of `{prefix}.{date}-NNN.json`, or `None` if `filename` does not match.
fn parse_sequence_number(filename: &str, prefix: &str, date: &str) -> Option<u32> {
    filename
        .strip_prefix(&format!("{prefix}.{date}-"))?
        .strip_suffix(&format!(".{EXTENSION}"))?
        .parse()
        .ok()
}

fn is_backup_file(filename: &str, prefix: &str) -> bool {
    filename.starts_with(&format!("{prefix}.")) && filename.ends_with(&format!(".{EXTENSION}"))
}
