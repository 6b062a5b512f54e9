use commitment_tree::TreeOverflow;
use num_bigint::BigUint;

use crate::ProverError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("insufficient balance: {balance} available, {required} required")]
    InsufficientBalance { balance: BigUint, required: u64 },

    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error(transparent)]
    TreeOverflow(#[from] TreeOverflow),

    #[error("prover error")]
    Prover(#[from] ProverError),

    #[error("failed to encode transaction")]
    Encode(#[source] std::io::Error),

    #[error("failed to decode transaction")]
    Decode(#[source] std::io::Error),

    #[error("note encryption failed")]
    Encryption,

    #[error("value overflow: {0}")]
    ValueOverflow(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
