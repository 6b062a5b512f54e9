use std::sync::OnceLock;

use blake2b_simd::Params;

use crate::Element;

/// The largest tree height for which empty subtree hashes are precomputed
const COMPUTE_HEIGHT: usize = 64;

/// Domain separation tags for every BLAKE2b use in the shielded pool
///
/// Each variant maps to a distinct 16-byte BLAKE2b personalisation, so that hashes computed for one
/// purpose can never collide with hashes computed for another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Personalization {
    /// Inner nodes of the note commitment tree
    MerkleTree,
    /// Note commitments
    NoteCommitment,
    /// Value commitments
    ValueCommitment,
    /// Nullifiers
    Nullifier,
    /// Derivation of key material from a spending key
    KeyDerivation,
    /// Derivation of symmetric note encryption keys
    NoteEncryption,
    /// Derivation of outgoing cipher keys
    OutgoingCipherKey,
    /// The transaction hash signed by spend authorization and binding signatures
    SigHash,
    /// Proofs and signatures produced by the transparent reference prover
    TransparentProver,
}

impl Personalization {
    /// The 16 bytes fed to BLAKE2b as the personalisation parameter
    #[must_use]
    pub const fn as_bytes(self) -> &'static [u8; 16] {
        match self {
            Self::MerkleTree => b"Zet_MerkleTree__",
            Self::NoteCommitment => b"Zet_NoteCommit__",
            Self::ValueCommitment => b"Zet_ValueCommit_",
            Self::Nullifier => b"Zet_Nullifier___",
            Self::KeyDerivation => b"Zet_ExpandSeed__",
            Self::NoteEncryption => b"Zet_NoteEncrypt_",
            Self::OutgoingCipherKey => b"Zet_OutCipherKey",
            Self::SigHash => b"Zet_SigHash_____",
            Self::TransparentProver => b"Zet_Transparent_",
        }
    }

    /// Start a 32-byte BLAKE2b state with this personalisation
    #[must_use]
    pub fn state(self) -> blake2b_simd::State {
        self.state_with_length(32)
    }

    /// Start a BLAKE2b state with this personalisation and a custom output length
    #[must_use]
    pub fn state_with_length(self, length: usize) -> blake2b_simd::State {
        Params::new()
            .hash_length(length)
            .personal(self.as_bytes())
            .to_state()
    }
}

/// Hash `N` elements together under `personalization`
///
/// Inner nodes of the commitment tree are `hash_merge(MerkleTree, [left, right])`:
///
/// ```rust
/// # use sapling_primitives::*;
/// let a = Element::from_u64(1);
/// let b = Element::from_u64(2);
///
/// let ab = hash_merge(Personalization::MerkleTree, [a, b]);
/// let ba = hash_merge(Personalization::MerkleTree, [b, a]);
///
/// assert_ne!(ab, ba);
/// ```
#[inline]
#[must_use]
pub fn hash_merge<const N: usize>(personalization: Personalization, elements: [Element; N]) -> Element {
    let mut state = personalization.state();

    for element in &elements {
        state.update(element.as_bytes());
    }

    finalize(&state)
}

/// Hash a list of byte slices under `personalization`
///
/// Slices are concatenated, so callers hashing variable-length data must length-prefix it
/// themselves
///
/// ```rust
/// # use sapling_primitives::*;
/// let a = hash_bytes(Personalization::SigHash, [&[1, 2][..], &[3]]);
/// let b = hash_bytes(Personalization::SigHash, [&[1, 2, 3][..]]);
/// let c = hash_bytes(Personalization::Nullifier, [&[1, 2, 3][..]]);
///
/// assert_eq!(a, b);
/// assert_ne!(b, c);
/// ```
#[inline]
#[must_use]
pub fn hash_bytes<'a>(
    personalization: Personalization,
    parts: impl IntoIterator<Item = &'a [u8]>,
) -> Element {
    let mut state = personalization.state();

    for part in parts {
        state.update(part);
    }

    finalize(&state)
}

fn finalize(state: &blake2b_simd::State) -> Element {
    let hash = state.finalize();
    let mut bytes = [0; 32];
    bytes.copy_from_slice(hash.as_bytes());
    Element::new(bytes)
}

/// The root hash of an empty subtree of the given height
///
/// - `empty_tree_hash(0) = Element::NULL_HASH` (an empty leaf)
/// - `empty_tree_hash(n) = hash_merge(MerkleTree, [empty_tree_hash(n - 1); 2])`
///
/// Heights up to 64 are computed once and cached, so calls are essentially free after the first
///
/// # Panics
///
/// Panics if `height` is greater than 64, since such a tree could not be addressed by a `u64`
/// position anyway
#[inline]
#[must_use]
pub fn empty_tree_hash(height: usize) -> Element {
    assert!(
        height <= COMPUTE_HEIGHT,
        "tree height {height} exceeds the maximum of {COMPUTE_HEIGHT}"
    );

    get_cache()[height]
}

fn get_cache() -> &'static [Element] {
    static CACHE: OnceLock<Vec<Element>> = OnceLock::new();

    CACHE.get_or_init(|| {
        let mut vec = Vec::with_capacity(COMPUTE_HEIGHT + 1);
        vec.push(Element::NULL_HASH);

        for height in 0..COMPUTE_HEIGHT {
            let hash = vec[height];
            vec.push(hash_merge(Personalization::MerkleTree, [hash, hash]));
        }

        vec
    })
}
