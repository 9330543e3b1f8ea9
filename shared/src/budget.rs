//! Shared token budget
//!
//! All workers spend against one `BudgetGuard`. The ceiling check and the
//! spend increment always happen inside the same critical section, so no
//! sequence of concurrent commits can push `spent` past `ceiling`.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinError;

/// Point-in-time view of the budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetSnapshot {
    pub spent: u64,
    pub ceiling: u64,
}

impl BudgetSnapshot {
    pub fn remaining(&self) -> u64 {
        self.ceiling.saturating_sub(self.spent)
    }

    /// Spent share of the ceiling in percent
    pub fn percent_spent(&self) -> f64 {
        if self.ceiling == 0 {
            return 100.0;
        }
        self.spent as f64 * 100.0 / self.ceiling as f64
    }
}

/// Mutex-owned spend counter with a fixed ceiling
#[derive(Debug)]
pub struct BudgetGuard {
    spent: Arc<Mutex<u64>>,
    ceiling: u64,
}

impl BudgetGuard {
    pub fn new(ceiling: u64) -> Self {
        Self {
            spent: Arc::new(Mutex::new(0)),
            ceiling,
        }
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    /// Tokens still available; only a hint for an early exit
    pub async fn remaining(&self) -> u64 {
        let spent = self.spent.lock().await;
        self.ceiling.saturating_sub(*spent)
    }

    pub async fn snapshot(&self) -> BudgetSnapshot {
        let spent = self.spent.lock().await;
        BudgetSnapshot {
            spent: *spent,
            ceiling: self.ceiling,
        }
    }

    /// Atomically spend `cost` if it fits under the ceiling.
    ///
    /// Returns `false` and leaves the budget untouched when
    /// `spent + cost > ceiling`.
    pub async fn try_commit(&self, cost: u64) -> bool {
        let mut spent = self.spent.lock().await;
        match spent.checked_add(cost) {
            Some(next) if next <= self.ceiling => {
                *spent = next;
                true
            }
            _ => false,
        }
    }

    /// Spend `cost` only once `write` has durably succeeded.
    ///
    /// The ceiling check, the write and the increment run under one lock
    /// acquisition. `Ok(false)` means the cost does not fit and `write` was
    /// never invoked; an error from `write` leaves the budget untouched.
    ///
    /// Once the cost fits, the write and the increment run on their own task
    /// holding the lock. Dropping or aborting the caller mid-write cannot leave
    /// a written item uncharged, and readers of the budget wait for the task.
    pub async fn commit_with<F, Fut, E>(&self, cost: u64, write: F) -> Result<bool, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: From<JoinError> + Send + 'static,
    {
        let mut spent = Arc::clone(&self.spent).lock_owned().await;
        let next = match spent.checked_add(cost) {
            Some(next) if next <= self.ceiling => next,
            _ => return Ok(false),
        };

        let pending = write();
        tokio::spawn(async move {
            pending.await?;
            *spent = next;
            Ok::<bool, E>(true)
        })
        .await?
    }
}
