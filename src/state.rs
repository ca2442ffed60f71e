use crate::ledger::Ledger;
use crate::storage::SalesArchive;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Handles shared by every request. Mutations take the write lock, so sales
/// are serialised across all flavors.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<RwLock<Ledger>>,
    pub archive: SalesArchive,
}

impl AppState {
    pub fn new(ledger: Ledger, archive: SalesArchive) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            archive,
        }
    }
}
