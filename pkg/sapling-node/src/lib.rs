#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

//! Where the shielded pool's state comes from
//!
//! [`LedgerState`] is the one read interface the protocol needs. [`NodeClient`] serves it from a
//! node's JSON-RPC, [`StaticLedger`] from memory.

mod client;
mod error;
mod static_ledger;

use async_trait::async_trait;
use sapling::StateDiff;

pub use client::NodeClient;
pub use error::{Error, Result};
pub use static_ledger::StaticLedger;

/// A read-only view of the pool and the chain it lives on
///
/// Every call fetches fresh data; implementations must not cache
#[async_trait]
pub trait LedgerState: Send + Sync {
    /// Every commitment, ciphertext and nullifier published so far
    async fn state_diff(&self) -> Result<StateDiff>;

    /// The identifier of the chain, as used in anti-replay tags
    async fn chain_id(&self) -> Result<String>;
}
