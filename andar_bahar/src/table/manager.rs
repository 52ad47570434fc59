//! Table registry.
//!
//! Owns every live table, hands out shared handles, and drives each table's
//! periodic ticker so betting windows close on schedule even when no
//! request touches the table.

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serde::{Deserialize, Serialize};
use tokio::{sync::RwLock, task::JoinHandle, time::Duration};

use crate::broadcast::RoomRegistry;
use crate::clock::Clock;
use crate::collab::{BalanceLedger, NotificationService};
use crate::game::{
    entities::{Chips, TableId},
    errors::GameError,
    round::Phase,
};

use super::{config::TableConfig, table::GameTable};

/// How often each table's window-expiry ticker fires.
const TICK_INTERVAL: Duration = Duration::from_millis(250);

struct TableEntry {
    table: Arc<GameTable>,
    ticker: JoinHandle<()>,
}

/// Listing row for the table index.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TableMetadata {
    pub id: TableId,
    pub name: String,
    pub min_bet: Chips,
    pub rounds_played: u64,
    pub current_phase: Option<Phase>,
}

pub struct TableManager {
    tables: RwLock<HashMap<TableId, TableEntry>>,
    next_table_id: AtomicU64,
    rooms: Arc<RoomRegistry>,
    clock: Arc<dyn Clock>,
    ledger: Arc<dyn BalanceLedger>,
    notifier: Arc<dyn NotificationService>,
}

impl TableManager {
    pub fn new(
        clock: Arc<dyn Clock>,
        ledger: Arc<dyn BalanceLedger>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            next_table_id: AtomicU64::new(1),
            rooms: Arc::new(RoomRegistry::new()),
            clock,
            ledger,
            notifier,
        }
    }

    pub fn rooms(&self) -> &Arc<RoomRegistry> {
        &self.rooms
    }

    pub async fn create_table(&self, config: TableConfig) -> anyhow::Result<Arc<GameTable>> {
        if let Err(reason) = config.validate() {
            anyhow::bail!("invalid table config: {reason}");
        }
        let id = self.next_table_id.fetch_add(1, Ordering::Relaxed);
        let table = Arc::new(GameTable::new(
            id,
            config,
            self.clock.clone(),
            self.rooms.clone(),
            self.ledger.clone(),
            self.notifier.clone(),
        ));

        let ticker = {
            let table = table.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(TICK_INTERVAL);
                loop {
                    interval.tick().await;
                    if let Err(err) = table.tick().await {
                        log::warn!("table {}: tick skipped: {}", table.id, err);
                    }
                }
            })
        };

        let mut tables = self.tables.write().await;
        tables.insert(id, TableEntry { table: table.clone(), ticker });
        log::info!("table {} created ({})", id, table.config.name);
        Ok(table)
    }

    pub async fn get_table(&self, table_id: TableId) -> Result<Arc<GameTable>, GameError> {
        let tables = self.tables.read().await;
        tables
            .get(&table_id)
            .map(|entry| entry.table.clone())
            .ok_or(GameError::TableNotFound)
    }

    /// Remove a table: stop its ticker, cancel pending broadcasts, and drop
    /// its room so subscribers observe the disconnect.
    pub async fn remove_table(&self, table_id: TableId) -> Result<(), GameError> {
        let entry = {
            let mut tables = self.tables.write().await;
            tables.remove(&table_id).ok_or(GameError::TableNotFound)?
        };
        entry.ticker.abort();
        entry.table.teardown().await;
        self.rooms.remove_room(table_id).await;
        log::info!("table {} removed", table_id);
        Ok(())
    }

    pub async fn active_table_count(&self) -> usize {
        self.tables.read().await.len()
    }

    pub async fn list_tables(&self) -> Vec<TableMetadata> {
        let tables: Vec<Arc<GameTable>> = {
            let tables = self.tables.read().await;
            tables.values().map(|entry| entry.table.clone()).collect()
        };

        let mut listing = Vec::with_capacity(tables.len());
        for table in tables {
            let current_phase = table.snapshot().await.ok().map(|snapshot| snapshot.phase);
            listing.push(TableMetadata {
                id: table.id,
                name: table.config.name.clone(),
                min_bet: table.config.min_bet,
                rounds_played: table.rounds_played().await,
                current_phase,
            });
        }
        listing.sort_by_key(|metadata| metadata.id);
        listing
    }

    /// Abort every ticker at shutdown.
    pub async fn shutdown(&self) {
        let mut tables = self.tables.write().await;
        for (table_id, entry) in tables.drain() {
            entry.ticker.abort();
            entry.table.teardown().await;
            self.rooms.remove_room(table_id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::collab::{LoggingLedger, LoggingNotifier};
    use crate::game::entities::{Card, Suit};

    fn manager() -> TableManager {
        TableManager::new(
            Arc::new(ManualClock::new(chrono::Utc::now())),
            Arc::new(LoggingLedger),
            Arc::new(LoggingNotifier),
        )
    }

    #[tokio::test]
    async fn tables_get_sequential_ids() {
        let manager = manager();
        let first = manager.create_table(TableConfig::default()).await.unwrap();
        let second = manager.create_table(TableConfig::default()).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(manager.active_table_count().await, 2);
    }

    #[tokio::test]
    async fn invalid_config_rejected() {
        let manager = manager();
        let config = TableConfig {
            min_bet: 0,
            ..TableConfig::default()
        };
        assert!(manager.create_table(config).await.is_err());
        assert_eq!(manager.active_table_count().await, 0);
    }

    #[tokio::test]
    async fn removed_table_is_gone() {
        let manager = manager();
        let table = manager.create_table(TableConfig::default()).await.unwrap();
        manager.remove_table(table.id).await.unwrap();
        assert_eq!(
            manager.get_table(table.id).await.unwrap_err(),
            GameError::TableNotFound
        );
        assert!(matches!(
            manager.remove_table(table.id).await,
            Err(GameError::TableNotFound)
        ));
    }

    #[tokio::test]
    async fn listing_reflects_round_state() {
        let manager = manager();
        let table = manager.create_table(TableConfig::default()).await.unwrap();
        table.create_round(Card(7, Suit::Club)).await.unwrap();

        let listing = manager.list_tables().await;
        assert_eq!(listing.len(), 1);
        assert_eq!(
            listing[0].current_phase,
            Some(Phase::Betting { round_number: 1 })
        );
    }
}
