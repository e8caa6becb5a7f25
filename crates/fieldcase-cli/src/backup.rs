//! Before/after document backups

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fieldcase_core::Document;
use std::path::{Path, PathBuf};

/// Writes pretty-printed document pairs into one directory
#[derive(Debug, Clone)]
pub(crate) struct BackupWriter {
    dir: PathBuf,
}

/// Files written for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BackupFiles {
    pub(crate) original: PathBuf,
    pub(crate) migrated: PathBuf,
}

impl BackupWriter {
    /// Create writer, creating the directory if needed
    pub(crate) async fn create(dir: &Path) -> Result<Self> {
        let dir = dir.to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating backup directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Write `<item>_<timestamp>_original.json` and `..._migrated.json`
    pub(crate) async fn write(
        &self,
        item_id: &str,
        original: &Document,
        migrated: &Document,
        at: DateTime<Utc>,
    ) -> Result<BackupFiles> {
        let stamp = at.format("%Y%m%dT%H%M%SZ");
        let files = BackupFiles {
            original: self.dir.join(format!("{item_id}_{stamp}_original.json")),
            migrated: self.dir.join(format!("{item_id}_{stamp}_migrated.json")),
        };
        write_document(&files.original, original).await?;
        write_document(&files.migrated, migrated).await?;
        tracing::info!("backed up item {} to {}", item_id, self.dir.display());
        Ok(files)
    }
}

async fn write_document(path: &Path, document: &Document) -> Result<()> {
    let text = document.to_pretty_json()?;
    tokio::fs::write(path, text)
        .await
        .with_context(|| format!("writing {}", path.display()))
}
