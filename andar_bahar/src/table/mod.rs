//! Tables: the exclusive round mutex, per-table configuration, the running
//! table itself, and the registry that owns every live table.

pub mod config;
pub mod manager;
pub mod mutex;
#[allow(clippy::module_inception)]
pub mod table;

pub use config::TableConfig;
pub use manager::{TableManager, TableMetadata};
pub use mutex::RoundMutex;
pub use table::{GameTable, TableState};
