use sapling_primitives::{compute_merkle_root, Element};

use crate::{CommitmentTree, TreeOverflow};

/// The authentication path of one position in a [`CommitmentTree`]
///
/// A witness holds the siblings of a leaf (deepest first), the leaf's position and the root of
/// the tree it was taken from. The prover uses it to show that a note commitment is in the tree
/// without revealing which one.
///
/// ```rust
/// # use commitment_tree::*;
/// # use sapling_primitives::Element;
/// let mut tree = CommitmentTree::new(32);
/// tree.extend((1..=5).map(Element::from_u64)).unwrap();
///
/// let witness = tree.witness(2).unwrap();
///
/// assert_eq!(witness.root(), tree.root());
/// assert!(witness.proves(Element::from_u64(3)));
/// assert!(!witness.proves(Element::from_u64(4)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    siblings: Vec<Element>,
    position: u64,
    root: Element,
}

impl Witness {
    /// The siblings of the leaf, from the leaf's own sibling up to the child of the root
    #[inline]
    #[must_use]
    pub fn siblings_deepest_first(&self) -> &[Element] {
        &self.siblings
    }

    /// The position of the leaf this witness was taken for
    #[inline]
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// The root hash of the tree when this witness was created
    #[inline]
    #[must_use]
    pub fn root(&self) -> Element {
        self.root
    }

    /// The root hash the tree would have with `leaf` at this witness's position
    #[must_use]
    pub fn compute_root(&self, leaf: Element) -> Element {
        compute_merkle_root(leaf, self.position, self.siblings.iter().copied())
    }

    /// Whether this witness proves that `leaf` is at its position
    #[inline]
    #[must_use]
    pub fn proves(&self, leaf: Element) -> bool {
        self.compute_root(leaf) == self.root
    }

    /// Serialize into the byte layout consumed by native provers
    ///
    /// The layout is the height as a single byte, then for every sibling (deepest first) the byte
    /// `0x20` followed by its 32 bytes, then the position as a little-endian `u64`
    ///
    /// ```rust
    /// # use commitment_tree::*;
    /// let tree = CommitmentTree::new(4);
    /// let bytes = tree.witness(3).unwrap().to_bytes();
    ///
    /// assert_eq!(bytes.len(), 1 + 4 * 33 + 8);
    /// assert_eq!(bytes[0], 4);
    /// assert_eq!(&bytes[bytes.len() - 8..], &3u64.to_le_bytes());
    /// ```
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.siblings.len() * 33 + 8);

        // heights are bounded by `MAX_HEIGHT`
        #[allow(clippy::cast_possible_truncation)]
        bytes.push(self.siblings.len() as u8);

        for sibling in &self.siblings {
            bytes.push(0x20);
            bytes.extend_from_slice(sibling.as_bytes());
        }

        bytes.extend_from_slice(&self.position.to_le_bytes());
        bytes
    }
}

impl CommitmentTree {
    /// Generate the [`Witness`] for `position`
    ///
    /// Positions past [`CommitmentTree::len`] but within capacity are valid: they prove
    /// [`Element::NULL_HASH`]
    ///
    /// # Errors
    ///
    /// Returns [`TreeOverflow`] if `position` is not less than [`CommitmentTree::capacity`]
    pub fn witness(&self, position: u64) -> Result<Witness, TreeOverflow> {
        self.check_position(position)?;

        Ok(Witness {
            siblings: self.tree.siblings(position, self.height),
            position,
            root: self.root(),
        })
    }
}
