//! Exclusive round mutex.
//!
//! Every state mutation on a table (bet acceptance, card deals, phase
//! transitions) runs inside one critical section on this lock, so
//! concurrent requests are linearized into some serial order and can never
//! interleave into an inconsistent round. Tokio's mutex hands the lock to
//! waiters in FIFO order, which keeps acquisition fair under contention.

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::{timeout, Duration};

use crate::game::errors::GameError;

#[derive(Debug, Default)]
pub struct RoundMutex<T> {
    inner: Mutex<T>,
}

impl<T> RoundMutex<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().await
    }

    /// Run `f` inside the critical section. The closure is synchronous on
    /// purpose: nothing may await while holding the round.
    pub async fn run_exclusive<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut guard = self.inner.lock().await;
        f(&mut guard)
    }

    /// Like [`run_exclusive`](Self::run_exclusive) but gives up waiting for
    /// the lock after `wait`, so a wedged critical section surfaces as a
    /// retryable error instead of an unbounded stall.
    pub async fn run_exclusive_timeout<F, R>(&self, wait: Duration, f: F) -> Result<R, GameError>
    where
        F: FnOnce(&mut T) -> R,
    {
        match timeout(wait, self.inner.lock()).await {
            Ok(mut guard) => Ok(f(&mut guard)),
            Err(_) => Err(GameError::ConcurrencyTimeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn mutations_are_serialized() {
        let counter = Arc::new(RoundMutex::new(0u64));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    counter.run_exclusive(|n| *n += 1).await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(counter.run_exclusive(|n| *n).await, 800);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_acquisition_fails_when_lock_is_held() {
        let mutex = Arc::new(RoundMutex::new(()));
        let guard = mutex.lock().await;

        let err = mutex
            .run_exclusive_timeout(Duration::from_millis(50), |_| ())
            .await
            .unwrap_err();
        assert_eq!(err, GameError::ConcurrencyTimeout);

        drop(guard);
        assert!(mutex
            .run_exclusive_timeout(Duration::from_millis(50), |_| ())
            .await
            .is_ok());
    }
}
