#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::match_bool)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![deny(missing_docs)]

//! Core primitives shared by the shielded-pool crates
//!
//! Everything that ends up in the note commitment tree, or is published on chain as a commitment
//! or nullifier, is an [`Element`]: an opaque 32-byte value. Hashing is domain separated BLAKE2b,
//! with a distinct personalisation per purpose so that a commitment can never be confused with a
//! nullifier or an inner tree node.

mod element;
mod hash;
mod path;

pub use element::Element;
pub use hash::{empty_tree_hash, hash_bytes, hash_merge, Personalization};
pub use path::compute_merkle_root;
