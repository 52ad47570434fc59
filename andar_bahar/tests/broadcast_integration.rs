//! Broadcast behavior through a full table: immediate events bypass the
//! throttler, aggregate stats coalesce to a leading send plus one trailing
//! send carrying the latest totals.

use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use tokio::time::Duration;

use andar_bahar::collab::{LoggingLedger, LoggingNotifier};
use andar_bahar::{
    Card, GameTable, ManualClock, RoomRegistry, RoundEvent, Side, Suit, TableConfig,
};

fn table_with_rooms() -> (Arc<GameTable>, Arc<ManualClock>, Arc<RoomRegistry>) {
    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let rooms = Arc::new(RoomRegistry::new());
    let table = Arc::new(GameTable::new(
        1,
        TableConfig::default(),
        clock.clone(),
        rooms.clone(),
        Arc::new(LoggingLedger),
        Arc::new(LoggingNotifier),
    ));
    (table, clock, rooms)
}

#[tokio::test(start_paused = true)]
async fn rapid_bets_coalesce_to_leading_and_trailing_stats() {
    let (table, _clock, rooms) = table_with_rooms();
    table.create_round(Card(7, Suit::Club)).await.unwrap();
    let (_, mut rx) = rooms.subscribe(1).await;

    // Five bets inside 200ms, alternating sides.
    for user in 1..=5i64 {
        let side = if user % 2 == 0 { Side::Bahar } else { Side::Andar };
        table.place_bet(user, side, 5_000).await.unwrap();
        tokio::time::advance(Duration::from_millis(40)).await;
    }

    // Leading edge: the first bet's totals, immediately.
    match rx.recv().await.unwrap() {
        RoundEvent::Stats {
            total_andar_bets,
            total_bahar_bets,
            ..
        } => {
            assert_eq!(total_andar_bets, 5_000);
            assert_eq!(total_bahar_bets, 0);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(rx.try_recv().is_err());

    // Trailing edge: exactly one more send, carrying the final totals.
    tokio::time::sleep(Duration::from_millis(1000)).await;
    match rx.recv().await.unwrap() {
        RoundEvent::Stats {
            total_andar_bets,
            total_bahar_bets,
            ..
        } => {
            assert_eq!(total_andar_bets, 15_000);
            assert_eq!(total_bahar_bets, 10_000);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn card_and_winner_events_bypass_the_throttle_window() {
    let (table, clock, rooms) = table_with_rooms();
    let (_, mut rx) = rooms.subscribe(1).await;

    table.create_round(Card(7, Suit::Club)).await.unwrap();
    assert!(matches!(
        rx.recv().await.unwrap(),
        RoundEvent::RoundCreated { .. }
    ));

    table.place_bet(1, Side::Bahar, 5_000).await.unwrap();
    assert!(matches!(rx.recv().await.unwrap(), RoundEvent::Stats { .. }));

    clock.advance(ChronoDuration::seconds(91));

    // The deal lands well inside the stats window yet broadcasts at once,
    // preceded by the betting-closed transition it forced.
    let outcome = table.deal_card(Card(7, Suit::Spade)).await.unwrap();
    assert!(outcome.is_winning_card);

    assert!(matches!(
        rx.recv().await.unwrap(),
        RoundEvent::BettingClosed { .. }
    ));
    match rx.recv().await.unwrap() {
        RoundEvent::CardDealt {
            card,
            side,
            position,
            is_winning_card,
            ..
        } => {
            assert_eq!(card, Card(7, Suit::Spade));
            assert_eq!((side, position), (Side::Bahar, 1));
            assert!(is_winning_card);
        }
        other => panic!("unexpected event {other:?}"),
    }
    match rx.recv().await.unwrap() {
        RoundEvent::WinnerDetermined {
            winning_side,
            winning_card,
            payouts,
            ..
        } => {
            assert_eq!(winning_side, Side::Bahar);
            assert_eq!(winning_card, Card(7, Suit::Spade));
            assert_eq!(payouts.len(), 1);
            assert_eq!(payouts[0].payout, 9_750); // position 1: 5_000 + 4_750
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn teardown_cancels_pending_trailing_stats() {
    let (table, _clock, rooms) = table_with_rooms();
    table.create_round(Card(7, Suit::Club)).await.unwrap();
    let (_, mut rx) = rooms.subscribe(1).await;

    table.place_bet(1, Side::Andar, 5_000).await.unwrap();
    table.place_bet(2, Side::Bahar, 5_000).await.unwrap();
    assert!(matches!(rx.recv().await.unwrap(), RoundEvent::Stats { .. }));

    table.teardown().await;
    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert!(rx.try_recv().is_err());
}
