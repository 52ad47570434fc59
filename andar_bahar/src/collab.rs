//! Collaborator seams consumed by the round engine.
//!
//! The engine computes settlement amounts but never mutates account
//! balances itself; crediting and user-facing messaging are handed to these
//! collaborators after the critical section releases. Their failures are
//! logged and left to the collaborator's own retry machinery — they must
//! never re-enter the round, whose payout computation is already final.

use async_trait::async_trait;

use crate::broadcast::RoundEvent;
use crate::game::entities::{Chips, UserId};

/// Reason attached to a balance movement.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SettleReason {
    Win,
    Refund,
}

impl SettleReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Refund => "refund",
        }
    }
}

/// External balance-ledger collaborator. `delta` is the full credit due to
/// the user for one settled bet.
#[async_trait]
pub trait BalanceLedger: Send + Sync {
    async fn apply_settlement(
        &self,
        user_id: UserId,
        delta: Chips,
        reason: SettleReason,
    ) -> anyhow::Result<()>;
}

/// External notification collaborator for user-facing messages.
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn notify(&self, user_id: UserId, event: &RoundEvent) -> anyhow::Result<()>;
}

/// Log-only ledger used when no real wallet service is wired in.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingLedger;

#[async_trait]
impl BalanceLedger for LoggingLedger {
    async fn apply_settlement(
        &self,
        user_id: UserId,
        delta: Chips,
        reason: SettleReason,
    ) -> anyhow::Result<()> {
        log::info!(
            "settlement: user={} delta={} reason={}",
            user_id,
            delta,
            reason.as_str()
        );
        Ok(())
    }
}

/// Log-only notifier used when no real delivery service is wired in.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl NotificationService for LoggingNotifier {
    async fn notify(&self, user_id: UserId, event: &RoundEvent) -> anyhow::Result<()> {
        log::debug!("notify: user={} event={:?}", user_id, event);
        Ok(())
    }
}
