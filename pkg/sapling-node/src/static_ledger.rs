use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use sapling::StateDiff;

use crate::{LedgerState, Result};

/// An in-memory ledger
///
/// Counts how often its state is read, so callers can check that no I/O happened
#[derive(Debug)]
pub struct StaticLedger {
    diff: RwLock<StateDiff>,
    chain_id: String,
    fetches: AtomicUsize,
}

impl StaticLedger {
    pub fn new(diff: StateDiff, chain_id: &str) -> Self {
        Self {
            diff: RwLock::new(diff),
            chain_id: chain_id.to_owned(),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Replace the pool, as if new transactions had been included
    pub fn set_diff(&self, diff: StateDiff) {
        *self.diff.write() = diff;
    }

    /// How many times the diff or the chain id have been read
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerState for StaticLedger {
    async fn state_diff(&self) -> Result<StateDiff> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.diff.read().clone())
    }

    async fn chain_id(&self) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.chain_id.clone())
    }
}
