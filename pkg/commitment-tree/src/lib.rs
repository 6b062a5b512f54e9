#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::match_bool)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![deny(missing_docs)]

//! # Note commitment tree
//!
//! An append-only, position-indexed Merkle [`CommitmentTree`] of configurable height.
//!
//! Note commitments are inserted in ledger order: the `n`th commitment published to the pool
//! occupies leaf position `n`. The root hash commits to the whole ordered list, and a [`Witness`]
//! proves that a commitment sits at a given position under a given root.
//!
//! ```rust
//! # use commitment_tree::*;
//! # use sapling_primitives::Element;
//! let mut tree = CommitmentTree::new(32);
//!
//! tree.append(Element::from_u64(1)).unwrap();
//! tree.append(Element::from_u64(2)).unwrap();
//!
//! let witness = tree.witness(1).unwrap();
//! assert!(witness.proves(Element::from_u64(2)));
//! assert_eq!(witness.root(), tree.root());
//! ```
//!
//! ## Empty subtrees
//!
//! Unoccupied positions hold [`Element::NULL_HASH`]. Subtrees that contain no commitments are
//! never materialised: their hashes come from a precomputed table, so a tree of height 32 costs
//! memory proportional to the number of commitments, not to its capacity.
//!
//! [`Element::NULL_HASH`]: sapling_primitives::Element::NULL_HASH

mod state;
mod tree;

pub use state::{build_state_tree, StateTree};
pub use tree::{CommitmentTree, TreeOverflow, Witness, DEFAULT_HEIGHT, MAX_HEIGHT};
