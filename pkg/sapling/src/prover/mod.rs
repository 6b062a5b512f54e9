//! The proving capability consumed by the forger
//!
//! Proof generation is delegated to a [`Prover`], resolved when the forger is called. A native or
//! remote implementation can plug in here. [`TransparentProver`] is a local reference
//! implementation that produces structurally valid descriptions without any zero-knowledge.

use std::fmt::Debug;

use async_trait::async_trait;
use sapling_primitives::Element;

use crate::{
    constants::{PROOF_SIZE, SIGNATURE_SIZE},
    InputNote, PaymentAddress, SpendDescription, SpendingKey, UnsignedSpendDescription, Witness,
};

mod transparent;

pub use transparent::{TransparentContext, TransparentProver};

/// The public values and proof of a new output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputProof {
    pub cv: Element,
    pub cm: Element,
    pub proof: [u8; PROOF_SIZE],
}

/// Generates proofs and signatures for shielded transactions
///
/// Calls may take arbitrarily long. No timeout is applied; callers who need one should wrap the
/// whole operation
#[async_trait]
pub trait Prover: Send + Sync {
    /// Per-transaction state, e.g. the value commitment randomness the binding signature needs
    type Context: Send;

    /// Load the spend and output proving parameters
    async fn init_parameters(
        &self,
        spend_parameters: &[u8],
        output_parameters: &[u8],
    ) -> Result<(), ProverError>;

    /// Start a new transaction
    fn new_context(&self) -> Result<Self::Context, ProverError>;

    /// Prove that `note` is in the tree `witness` was taken from, and that `spending_key` owns it
    async fn prepare_spend_description(
        &self,
        context: &mut Self::Context,
        spending_key: &SpendingKey,
        note: &InputNote,
        ar: Element,
        witness: &Witness,
    ) -> Result<UnsignedSpendDescription, ProverError>;

    /// Authorize a spend, once the transaction's sighash is known
    async fn sign_spend_description(
        &self,
        description: UnsignedSpendDescription,
        spending_key: &SpendingKey,
        ar: Element,
        sighash: Element,
    ) -> Result<SpendDescription, ProverError>;

    /// Prove that a new note for `address` with `value` and `rcm` is well formed
    async fn prepare_output_description(
        &self,
        context: &mut Self::Context,
        address: &PaymentAddress,
        rcm: Element,
        esk: &[u8; 32],
        value: u64,
    ) -> Result<OutputProof, ProverError>;

    /// Sign `(balance, sighash)` with the key implied by all value commitments of the context
    async fn create_binding_signature(
        &self,
        context: &mut Self::Context,
        balance: i64,
        sighash: Element,
    ) -> Result<[u8; SIGNATURE_SIZE], ProverError>;
}

/// An error produced by a [`Prover`]
///
/// Provers may sit behind an FFI or network boundary, so the error only keeps a description of
/// the underlying failure
#[derive(Debug)]
pub struct ProverError {
    /// The debug representation of the underlying error
    debug: String,
    /// The type name of the underlying error, for debugging only
    type_name: String,
}

impl ProverError {
    pub fn err<T: Debug>(inner: T) -> Self {
        Self {
            debug: format!("{inner:?}"),
            type_name: core::any::type_name::<T>().to_string(),
        }
    }

    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            debug: message.into(),
            type_name: "message".to_string(),
        }
    }

    #[inline]
    pub fn debug_repr(&self) -> &str {
        &self.debug
    }

    /// Note that the exact representation is unspecified, since it comes from
    /// [`core::any::type_name`], so don't try to parse it
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl std::error::Error for ProverError {}

impl core::fmt::Display for ProverError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ProverError(type = {}): {}", self.type_name, self.debug)
    }
}
