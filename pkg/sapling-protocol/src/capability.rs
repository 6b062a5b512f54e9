//! One trait per concern a wallet needs from a protocol

use async_trait::async_trait;
use num_bigint::BigUint;
use sapling::{SpendingKey, UnsignedSaplingTransaction, ViewingKey};

use crate::{
    history::{TransactionCursor, TransactionPage},
    Result,
};

#[async_trait]
pub trait BalanceQuery {
    /// The value of all unspent notes of `viewing_key`
    async fn get_balance(&self, viewing_key: &ViewingKey) -> Result<BigUint>;

    /// The most `viewing_key` can send in one transaction
    async fn estimate_max_transaction_value(&self, viewing_key: &ViewingKey) -> Result<BigUint>;

    async fn get_balance_of_addresses(&self, addresses: &[String]) -> Result<BigUint>;

    /// The part of the balance of `addresses` that can be spent right now
    async fn get_available_balance_of_addresses(&self, addresses: &[String]) -> Result<BigUint>;

    /// The balance of the account of `public_key` in each of `sub_protocols`
    async fn get_balance_of_public_key_for_sub_protocols(
        &self,
        public_key: &str,
        sub_protocols: &[String],
    ) -> Result<Vec<BigUint>>;
}

/// Privacy padding added to a shielded transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOptions {
    pub dummy_inputs: usize,
    pub dummy_outputs: usize,
}

#[async_trait]
pub trait TransferBuilder {
    /// Prepare a transaction paying `values` to `recipients`, to be signed by the holder of the
    /// spending key
    async fn prepare_transaction(
        &self,
        viewing_key: &ViewingKey,
        recipients: &[String],
        values: &[u64],
        options: TransferOptions,
    ) -> Result<UnsignedSaplingTransaction>;

    /// Forge and sign `transaction`, returning its encoding as hex
    async fn sign_with_spending_key(
        &self,
        spending_key: &SpendingKey,
        transaction: &UnsignedSaplingTransaction,
    ) -> Result<String>;
}

#[async_trait]
pub trait HistoryQuery {
    /// Transactions involving `viewing_key`, most recent first
    async fn get_transaction_history(
        &self,
        viewing_key: &ViewingKey,
        limit: usize,
        cursor: Option<TransactionCursor>,
    ) -> Result<TransactionPage>;

    async fn get_transactions_from_addresses(
        &self,
        addresses: &[String],
        limit: usize,
        cursor: Option<TransactionCursor>,
    ) -> Result<TransactionPage>;
}
