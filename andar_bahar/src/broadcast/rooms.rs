//! Transport adapter: publish/subscribe rooms keyed by table id.
//!
//! Each subscriber holds a bounded channel. Publishing uses `try_send` so a
//! slow viewer can never stall the round engine: a full channel drops that
//! notification for that viewer, a closed channel removes the subscriber.

use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::events::RoundEvent;
use crate::game::entities::TableId;

pub type SubscriberId = Uuid;

/// Capacity of each subscriber's event channel.
const SUBSCRIBER_BUFFER: usize = 32;

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<TableId, HashMap<SubscriberId, mpsc::Sender<RoundEvent>>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join a table's room. The receiver drives the subscriber's send loop.
    pub async fn subscribe(&self, table_id: TableId) -> (SubscriberId, mpsc::Receiver<RoundEvent>) {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = Uuid::new_v4();
        let mut rooms = self.rooms.write().await;
        rooms.entry(table_id).or_default().insert(id, tx);
        log::debug!("subscriber {} joined room {}", id, table_id);
        (id, rx)
    }

    pub async fn unsubscribe(&self, table_id: TableId, subscriber_id: SubscriberId) {
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get_mut(&table_id) {
            room.remove(&subscriber_id);
            if room.is_empty() {
                rooms.remove(&table_id);
            }
        }
        log::debug!("subscriber {} left room {}", subscriber_id, table_id);
    }

    /// Deliver an event to every subscriber in a room.
    pub async fn publish(&self, table_id: TableId, event: &RoundEvent) {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(&table_id) else {
            return;
        };
        room.retain(|subscriber_id, sender| match sender.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!(
                    "subscriber {} channel full, dropping event for room {}",
                    subscriber_id,
                    table_id
                );
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                log::debug!("subscriber {} disconnected, removing", subscriber_id);
                false
            }
        });
    }

    pub async fn subscriber_count(&self, table_id: TableId) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(&table_id).map_or(0, HashMap::len)
    }

    /// Drop a whole room at table teardown.
    pub async fn remove_room(&self, table_id: TableId) {
        let mut rooms = self.rooms.write().await;
        rooms.remove(&table_id);
    }
}
