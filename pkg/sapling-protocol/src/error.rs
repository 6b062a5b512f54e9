use crate::base_chain::BaseChainError;

/// Why the base chain refused to include a wrapped transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BroadcastRejection {
    /// The sender cannot pay for the storage the contract call allocates
    #[error("balance too low, cannot pay for storage fee")]
    InsufficientStorageFee,

    #[error("balance too low")]
    BalanceTooLow,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Sapling(#[from] sapling::Error),

    #[error("node error")]
    Node(#[from] sapling_node::Error),

    #[error("broadcast rejected: {0}")]
    BroadcastRejected(BroadcastRejection),

    #[error("base chain error")]
    BaseChain(#[source] BaseChainError),

    #[error("invalid configuration")]
    Config(#[from] Box<figment::Error>),

    #[error("invalid hex")]
    Hex(#[from] hex::FromHexError),

    #[error("tokio join error")]
    TokioJoin(#[from] tokio::task::JoinError),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
