#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::match_bool)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

//! A wallet-facing protocol over one sapling contract
//!
//! [`SaplingProtocol`] turns viewing and spending keys plus a fresh view of the pool into
//! balances, history and ready-to-sign transactions. It speaks in text addresses (`zet1…` for
//! shielded, `tz1…` for base-chain accounts) and leaves the base-chain side of a transaction to a
//! [`BaseChain`] collaborator.

pub mod address;
pub mod base_chain;
mod capability;
mod config;
mod details;
mod error;
mod history;
mod protocol;

#[cfg(test)]
mod tests;

pub use base_chain::{BaseChain, BaseChainError, ContractCall, RpcError};
pub use capability::{BalanceQuery, HistoryQuery, TransferBuilder, TransferOptions};
pub use config::ProtocolConfig;
pub use details::{filter_out_paybacks, DisplayDetails, SHIELDED_POOL};
pub use error::{BroadcastRejection, Error, Result};
pub use history::{TransactionCursor, TransactionPage};
pub use protocol::SaplingProtocol;
