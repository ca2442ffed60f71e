use crate::ledger::Ledger;
use crate::models::{Cents, Sale, TIMESTAMP_FORMAT};
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("No se pudieron guardar las ventas: {0}")]
    Io(#[from] std::io::Error),
    #[error("No se pudieron serializar las ventas: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ArchivedSales<'a> {
    guardado_en: String,
    total_ventas: Cents,
    ventas: &'a [Sale],
}

/// What a [`SalesArchive::save`] wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Saved {
    pub count: usize,
    pub total: Cents,
}

/// Durable copy of the sale history, written on demand as a JSON snapshot.
///
/// Writers are serialised, and each write lands through a sibling temp file
/// and a rename, so the file on disk is always one complete snapshot.
#[derive(Debug, Clone)]
pub struct SalesArchive {
    path: PathBuf,
    writer: Arc<Mutex<()>>,
}

impl SalesArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshots `ledger` and writes it. The snapshot is taken while holding
    /// the writer lock, so saves complete in the order their snapshots were
    /// taken and the last write always carries the newest history.
    pub async fn save(&self, ledger: &RwLock<Ledger>) -> Result<Saved, ArchiveError> {
        let _writer = self.writer.lock().await;
        let (sales, total) = {
            let ledger = ledger.read().await;
            (ledger.sales().to_vec(), ledger.total())
        };
        self.write_snapshot(&sales, total).await?;
        Ok(Saved {
            count: sales.len(),
            total,
        })
    }

    /// Overwrites the archive with `sales` and their `total`.
    pub async fn persist(&self, sales: &[Sale], total: Cents) -> Result<(), ArchiveError> {
        let _writer = self.writer.lock().await;
        self.write_snapshot(sales, total).await
    }

    async fn write_snapshot(&self, sales: &[Sale], total: Cents) -> Result<(), ArchiveError> {
        let snapshot = ArchivedSales {
            guardado_en: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            total_ventas: total,
            ventas: sales,
        };
        let payload = serde_json::to_vec_pretty(&snapshot)?;

        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let staging = self.staging_path();
        fs::write(&staging, payload).await?;
        if let Err(err) = fs::rename(&staging, &self.path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(err.into());
        }
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }
}
