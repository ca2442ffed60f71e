pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod state;
pub mod storage;

pub use app::router;
pub use config::{load_catalog, Catalog, Settings};
pub use ledger::{Ledger, LedgerError};
pub use state::AppState;
pub use storage::SalesArchive;
