//! Broadcast coalescer/throttler.
//!
//! Rate-limits outbound notifications per channel. The first publish on an
//! idle channel goes out immediately; publishes landing inside the rolling
//! window are coalesced — only the most recent payload is retained and
//! exactly one trailing send fires when the window elapses. A payload is
//! never silently lost: it is either sent immediately, replaced by a newer
//! one, or delivered at the trailing edge.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{Duration, Instant},
};

use super::{events::RoundEvent, rooms::RoomRegistry};
use crate::game::entities::{RoundId, TableId};

#[derive(Debug)]
struct ChannelState {
    last_sent_at: Instant,
    pending: Option<RoundEvent>,
    trailing: Option<JoinHandle<()>>,
    /// Highest stats sequence seen on this channel, scoped to its round.
    /// Publishes are taken under the table lock but arrive here after it
    /// releases, so a snapshot can be overtaken in flight; anything at or
    /// below this mark for the same round is discarded.
    latest_stats: Option<(RoundId, u64)>,
}

/// Per-table throttler in front of a [`RoomRegistry`]. Constructed per
/// table and torn down with it; unrelated tables never share a backlog.
#[derive(Debug)]
pub struct BroadcastThrottle {
    window: Duration,
    rooms: Arc<RoomRegistry>,
    channels: Mutex<HashMap<TableId, ChannelState>>,
}

impl BroadcastThrottle {
    pub fn new(window: Duration, rooms: Arc<RoomRegistry>) -> Arc<Self> {
        Arc::new(Self {
            window,
            rooms,
            channels: Mutex::new(HashMap::new()),
        })
    }

    /// Publish a payload on a channel, sending now or coalescing into the
    /// trailing edge of the current window. A sequenced payload older than
    /// one already seen on the channel is dropped outright.
    pub async fn publish(self: &Arc<Self>, table_id: TableId, event: RoundEvent) {
        let send_now = {
            let mut channels = self.channels.lock().await;
            let now = Instant::now();
            match channels.get_mut(&table_id) {
                None => {
                    channels.insert(
                        table_id,
                        ChannelState {
                            last_sent_at: now,
                            pending: None,
                            trailing: None,
                            latest_stats: event.stats_order(),
                        },
                    );
                    true
                }
                Some(state) => {
                    if let Some((round_id, seq)) = event.stats_order() {
                        let stale = state
                            .latest_stats
                            .is_some_and(|(latest_round, latest_seq)| {
                                latest_round == round_id && seq <= latest_seq
                            });
                        if stale {
                            return;
                        }
                        state.latest_stats = Some((round_id, seq));
                    }
                    if state.trailing.is_some() {
                        // A trailing send is already scheduled; just keep
                        // the freshest payload for it.
                        state.pending = Some(event.clone());
                        false
                    } else if now.duration_since(state.last_sent_at) >= self.window {
                        state.last_sent_at = now;
                        true
                    } else {
                        state.pending = Some(event.clone());
                        let deadline = state.last_sent_at + self.window;
                        let this = Arc::clone(self);
                        state.trailing = Some(tokio::spawn(async move {
                            tokio::time::sleep_until(deadline).await;
                            this.flush(table_id).await;
                        }));
                        false
                    }
                }
            }
        };
        if send_now {
            self.rooms.publish(table_id, &event).await;
        }
    }

    /// Trailing-edge delivery: whatever payload is pending at send time is
    /// the one that goes out.
    async fn flush(&self, table_id: TableId) {
        let pending = {
            let mut channels = self.channels.lock().await;
            let Some(state) = channels.get_mut(&table_id) else {
                return;
            };
            state.trailing = None;
            state.last_sent_at = Instant::now();
            state.pending.take()
        };
        if let Some(event) = pending {
            self.rooms.publish(table_id, &event).await;
        }
    }

    /// Cancel all pending timers and drop pending payloads. Used at table
    /// teardown.
    pub async fn clear(&self) {
        let mut channels = self.channels.lock().await;
        for state in channels.values_mut() {
            if let Some(handle) = state.trailing.take() {
                handle.abort();
            }
            state.pending = None;
        }
        channels.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn stats(total_andar_bets: i64) -> RoundEvent {
        stats_for(Uuid::nil(), total_andar_bets)
    }

    fn stats_for(round_id: Uuid, total_andar_bets: i64) -> RoundEvent {
        RoundEvent::Stats {
            round_id,
            seq: total_andar_bets as u64,
            total_andar_bets,
            total_bahar_bets: 0,
        }
    }

    fn total_of(event: &RoundEvent) -> i64 {
        match event {
            RoundEvent::Stats {
                total_andar_bets, ..
            } => *total_andar_bets,
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_publishes_coalesce_to_leading_and_trailing() {
        let rooms = Arc::new(RoomRegistry::new());
        let throttle = BroadcastThrottle::new(Duration::from_millis(1000), rooms.clone());
        let (_, mut rx) = rooms.subscribe(1).await;

        // Five publishes within 200ms.
        for i in 1..=5 {
            throttle.publish(1, stats(i)).await;
            tokio::time::advance(Duration::from_millis(40)).await;
        }

        // Leading edge: the first payload, immediately.
        assert_eq!(total_of(&rx.recv().await.unwrap()), 1);
        assert!(rx.try_recv().is_err());

        // Trailing edge at the end of the window: the 5th payload, once.
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(total_of(&rx.recv().await.unwrap()), 5);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_channel_sends_immediately_and_restarts_window() {
        let rooms = Arc::new(RoomRegistry::new());
        let throttle = BroadcastThrottle::new(Duration::from_millis(1000), rooms.clone());
        let (_, mut rx) = rooms.subscribe(1).await;

        throttle.publish(1, stats(1)).await;
        assert_eq!(total_of(&rx.recv().await.unwrap()), 1);

        // Well past the window: next publish is immediate again.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        throttle.publish(1, stats(2)).await;
        assert_eq!(total_of(&rx.recv().await.unwrap()), 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn channels_throttle_independently() {
        let rooms = Arc::new(RoomRegistry::new());
        let throttle = BroadcastThrottle::new(Duration::from_millis(1000), rooms.clone());
        let (_, mut rx1) = rooms.subscribe(1).await;
        let (_, mut rx2) = rooms.subscribe(2).await;

        throttle.publish(1, stats(1)).await;
        throttle.publish(2, stats(2)).await;

        assert_eq!(total_of(&rx1.recv().await.unwrap()), 1);
        assert_eq!(total_of(&rx2.recv().await.unwrap()), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn overtaken_snapshots_are_dropped() {
        let rooms = Arc::new(RoomRegistry::new());
        let throttle = BroadcastThrottle::new(Duration::from_millis(1000), rooms.clone());
        let (_, mut rx) = rooms.subscribe(1).await;

        // A newer snapshot lands first; the older one arrives late.
        throttle.publish(1, stats(2)).await;
        throttle.publish(1, stats(1)).await;
        assert_eq!(total_of(&rx.recv().await.unwrap()), 2);

        // The stale snapshot scheduled no trailing send.
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(rx.try_recv().is_err());

        // Same inversion inside a window: the trailing send carries the
        // newest snapshot, not the last to arrive.
        throttle.publish(1, stats(4)).await;
        assert_eq!(total_of(&rx.recv().await.unwrap()), 4);
        throttle.publish(1, stats(6)).await;
        throttle.publish(1, stats(5)).await;
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(total_of(&rx.recv().await.unwrap()), 6);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn a_new_round_restarts_the_stats_ordering() {
        let rooms = Arc::new(RoomRegistry::new());
        let throttle = BroadcastThrottle::new(Duration::from_millis(1000), rooms.clone());
        let (_, mut rx) = rooms.subscribe(1).await;

        throttle.publish(1, stats(5)).await;
        assert_eq!(total_of(&rx.recv().await.unwrap()), 5);

        // The next round's first snapshot has a lower sequence but must
        // not be mistaken for a stale one.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        throttle.publish(1, stats_for(Uuid::new_v4(), 1)).await;
        assert_eq!(total_of(&rx.recv().await.unwrap()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_drops_pending_trailing_send() {
        let rooms = Arc::new(RoomRegistry::new());
        let throttle = BroadcastThrottle::new(Duration::from_millis(1000), rooms.clone());
        let (_, mut rx) = rooms.subscribe(1).await;

        throttle.publish(1, stats(1)).await;
        throttle.publish(1, stats(2)).await;
        assert_eq!(total_of(&rx.recv().await.unwrap()), 1);

        throttle.clear().await;
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(rx.try_recv().is_err());
    }
}
