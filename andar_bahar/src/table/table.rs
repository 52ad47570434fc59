//! A running table: one round at a time, all mutation linearized through
//! the table's round mutex.
//!
//! Every public operation follows the same shape: acquire the critical
//! section with a bounded wait, mutate the round synchronously, collect
//! what happened, release, and only then perform side effects (broadcasts,
//! balance credits, notifications). Collaborators never run while the
//! round is held.

use std::sync::Arc;

use crate::broadcast::{BroadcastThrottle, RoomRegistry, RoundEvent};
use crate::clock::Clock;
use crate::collab::{BalanceLedger, NotificationService, SettleReason};
use crate::game::{
    entities::{Card, Chips, RoundId, Side, TableId, UserId},
    errors::GameError,
    ledger::Bet,
    payout::Settlement,
    round::{DealOutcome, Phase, Round, RoundSnapshot},
};

use super::{config::TableConfig, mutex::RoundMutex};

#[derive(Debug, Default)]
pub struct TableState {
    pub round: Option<Round>,
    pub rounds_played: u64,
}

pub struct GameTable {
    pub id: TableId,
    pub config: TableConfig,
    state: RoundMutex<TableState>,
    clock: Arc<dyn Clock>,
    rooms: Arc<RoomRegistry>,
    throttle: Arc<BroadcastThrottle>,
    ledger: Arc<dyn BalanceLedger>,
    notifier: Arc<dyn NotificationService>,
}

impl GameTable {
    pub fn new(
        id: TableId,
        config: TableConfig,
        clock: Arc<dyn Clock>,
        rooms: Arc<RoomRegistry>,
        ledger: Arc<dyn BalanceLedger>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        let throttle = BroadcastThrottle::new(config.throttle_window(), rooms.clone());
        Self {
            id,
            config,
            state: RoundMutex::new(TableState::default()),
            clock,
            rooms,
            throttle,
            ledger,
            notifier,
        }
    }

    /// Open a new round from an operator-selected opening card. Rejected
    /// while a non-terminal round is live; a settled round is retired here.
    pub async fn create_round(&self, opening_card: Card) -> Result<RoundSnapshot, GameError> {
        let clock = self.clock.clone();
        let round_one = self.config.round_one_window();
        let round_two = self.config.round_two_window();
        let snapshot = self
            .state
            .run_exclusive_timeout(self.config.lock_timeout(), move |state| {
                if let Some(round) = &state.round {
                    if !round.is_terminal() {
                        return Err(GameError::RoundInProgress);
                    }
                    state.rounds_played += 1;
                }
                let round = Round::open(opening_card, clock.now(), round_one, round_two)?;
                let snapshot = round.snapshot();
                state.round = Some(round);
                Ok(snapshot)
            })
            .await??;

        log::info!(
            "table {}: round {} opened with {}",
            self.id,
            snapshot.id,
            snapshot.opening_card
        );
        self.emit(RoundEvent::RoundCreated {
            round_id: snapshot.id,
            opening_card: snapshot.opening_card,
            round_number: snapshot.round_number,
        })
        .await;
        Ok(snapshot)
    }

    /// Accept a bet against the live round. Expired windows are advanced
    /// first, so a request arriving after the cutoff observes the closed
    /// window rather than racing it.
    pub async fn place_bet(
        &self,
        user_id: UserId,
        side: Side,
        amount: Chips,
    ) -> Result<Bet, GameError> {
        let now = self.clock.now();
        let policy = self.config.bet_policy();
        let (result, entered, round_id, seq, totals) = self
            .state
            .run_exclusive_timeout(self.config.lock_timeout(), move |state| {
                let round = state.round.as_mut().ok_or(GameError::NoActiveRound)?;
                let entered = round.advance(now);
                let result = round.place_bet(user_id, side, amount, now, &policy);
                // Bet count orders the stats snapshot; the broadcast leaves
                // the critical section before it is published.
                let seq = round.ledger.len() as u64;
                Ok::<_, GameError>((result, entered, round.id, seq, round.ledger.totals()))
            })
            .await??;

        self.emit_phase_events(round_id, &entered).await;
        let bet = result?;
        log::debug!(
            "table {}: user {} bet {} on {}",
            self.id,
            user_id,
            amount,
            side
        );
        self.emit(RoundEvent::Stats {
            round_id,
            seq,
            total_andar_bets: totals.0,
            total_bahar_bets: totals.1,
        })
        .await;
        Ok(bet)
    }

    /// Deal an operator-selected card into the live round. Terminal
    /// transitions settle inside the critical section; crediting and
    /// notifications run after it releases.
    pub async fn deal_card(&self, card: Card) -> Result<DealOutcome, GameError> {
        let now = self.clock.now();
        let (result, entered, round_id) = self
            .state
            .run_exclusive_timeout(self.config.lock_timeout(), move |state| {
                let round = state.round.as_mut().ok_or(GameError::NoActiveRound)?;
                let entered = round.advance(now);
                let result = round.deal_card(card);
                Ok::<_, GameError>((result, entered, round.id))
            })
            .await??;

        self.emit_phase_events(round_id, &entered).await;
        let outcome = result?;
        self.emit(RoundEvent::CardDealt {
            round_id,
            card: outcome.card,
            side: outcome.side,
            position: outcome.position,
            is_winning_card: outcome.is_winning_card,
        })
        .await;

        if let Some(settlement) = &outcome.settlement {
            self.settle(round_id, &outcome, settlement).await;
        }
        Ok(outcome)
    }

    /// Periodic driver: advances expired betting windows even when no
    /// request touches the table, so broadcast-only viewers still see the
    /// cutoff happen on time.
    pub async fn tick(&self) -> Result<(), GameError> {
        let now = self.clock.now();
        let advanced = self
            .state
            .run_exclusive_timeout(self.config.lock_timeout(), move |state| {
                let round = state.round.as_mut()?;
                let entered = round.advance(now);
                Some((round.id, entered))
            })
            .await?;

        if let Some((round_id, entered)) = advanced {
            self.emit_phase_events(round_id, &entered).await;
        }
        Ok(())
    }

    pub async fn snapshot(&self) -> Result<RoundSnapshot, GameError> {
        self.state
            .run_exclusive_timeout(self.config.lock_timeout(), |state| {
                state
                    .round
                    .as_ref()
                    .map(Round::snapshot)
                    .ok_or(GameError::NoActiveRound)
            })
            .await?
    }

    pub async fn rounds_played(&self) -> u64 {
        self.state.run_exclusive(|state| state.rounds_played).await
    }

    pub fn rooms(&self) -> &Arc<RoomRegistry> {
        &self.rooms
    }

    /// Cancel pending throttled broadcasts. Called at table removal.
    pub async fn teardown(&self) {
        self.throttle.clear().await;
    }

    async fn emit(&self, event: RoundEvent) {
        if event.is_immediate() {
            self.rooms.publish(self.id, &event).await;
        } else {
            self.throttle.publish(self.id, event).await;
        }
    }

    async fn emit_phase_events(&self, round_id: RoundId, entered: &[Phase]) {
        for phase in entered {
            if *phase == Phase::Dealing {
                self.emit(RoundEvent::BettingClosed { round_id }).await;
            }
        }
    }

    async fn settle(&self, round_id: RoundId, outcome: &DealOutcome, settlement: &Settlement) {
        let (event, reason) = match outcome.phase_after {
            Phase::Complete => (
                RoundEvent::WinnerDetermined {
                    round_id,
                    winning_side: outcome.side,
                    winning_card: outcome.card,
                    payouts: settlement.payouts.clone(),
                },
                SettleReason::Win,
            ),
            _ => (
                RoundEvent::NoWinner {
                    round_id,
                    refunds: settlement.payouts.clone(),
                },
                SettleReason::Refund,
            ),
        };
        log::info!(
            "table {}: round {} settled as {}, total payout {}",
            self.id,
            round_id,
            outcome.phase_after,
            settlement.total_payout
        );
        self.emit(event.clone()).await;

        // Collaborator failures are logged, never retried here: the round's
        // settlement amounts are final and the collaborator owns recovery.
        for payout in &settlement.payouts {
            if payout.payout > 0 {
                if let Err(err) = self
                    .ledger
                    .apply_settlement(payout.user_id, payout.payout, reason)
                    .await
                {
                    log::error!(
                        "table {}: ledger credit failed for user {}: {:#}",
                        self.id,
                        payout.user_id,
                        err
                    );
                }
            }
            if let Err(err) = self.notifier.notify(payout.user_id, &event).await {
                log::error!(
                    "table {}: notification failed for user {}: {:#}",
                    self.id,
                    payout.user_id,
                    err
                );
            }
        }
    }
}

impl std::fmt::Debug for GameTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameTable")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
