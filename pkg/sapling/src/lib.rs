#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::match_bool)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]

//! The shielded pool transaction engine
//!
//! Given a snapshot of the pool ([`StateDiff`]) and a viewing key, the engine recognises the notes
//! the key owns ([`bookkeeper`]), picks enough of them to cover a payment ([`selector`]), and
//! assembles a [`SaplingTransaction`] from spend and output descriptions produced by a pluggable
//! [`Prover`] ([`forger`]). Forged transactions have a single canonical binary form ([`encoder`]).
//!
//! Nothing here talks to the network. Every query starts from a freshly fetched [`StateDiff`], so
//! no state is kept between calls. As a consequence, two concurrent calls for the same key may
//! select the same notes: there is no reservation mechanism, and preventing double spends across
//! concurrent requests is left to the caller.

pub mod bookkeeper;
pub mod constants;
pub mod encoder;
pub mod encryption;
mod error;
pub mod forger;
mod keys;
mod note;
pub mod prover;
pub mod selector;
mod state;
mod transaction;

#[cfg(feature = "test")]
pub mod test;

pub use bookkeeper::{Party, TransactionDetails};
pub use encryption::Ciphertext;
pub use error::{Error, Result};
pub use keys::{xor_seed_halves, PaymentAddress, SpendingKey, ViewingKey};
pub use note::{InputNote, Note, SaplingOutput};
pub use prover::{Prover, ProverError, TransparentProver};
pub use state::StateDiff;
pub use transaction::{
    OutputDescription, SaplingTransaction, SpendDescription, UnsignedSaplingTransaction,
    UnsignedSpendDescription,
};

pub use commitment_tree::{StateTree, Witness};
pub use sapling_primitives::Element;
