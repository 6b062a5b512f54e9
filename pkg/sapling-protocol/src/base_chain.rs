//! The base-chain protocol the shielded pool lives on
//!
//! Shielded transactions reach the pool as parameters of a call to the sapling contract. Forging,
//! fee estimation and broadcasting of that call are the base chain's business.

use async_trait::async_trait;

/// A call to the sapling contract carrying encoded shielded transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub destination: String,
    /// Encoded transactions, in the order the contract applies them
    pub transactions: Vec<Vec<u8>>,
    /// Base-chain value sent along with the call, covering the value shielded by the
    /// transactions
    pub amount: u64,
}

/// One error reported by a base-chain node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    pub id: String,
    pub kind: String,
}

fn format_rejections(errors: &[RpcError]) -> String {
    errors
        .iter()
        .map(|error| format!(" {} ({})", error.id, error.kind))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BaseChainError {
    /// The node refused the operation, e.g. during simulation
    #[error("operation rejected:{}", format_rejections(.0))]
    Rejected(Vec<RpcError>),

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait BaseChain: Send + Sync {
    /// Build the forged base-chain operation for `call`, sent from the account of `public_key`
    async fn prepare_contract_call(
        &self,
        public_key: &str,
        call: ContractCall,
        fee: u64,
    ) -> Result<Vec<u8>, BaseChainError>;
}
