use sapling_primitives::Element;

mod error;
mod insert;
mod path;
mod tree_repr;

pub use error::TreeOverflow;
pub use path::Witness;

#[cfg(any(test, feature = "proptest"))]
mod proptest;

/// The height used by the shielded pool contract
pub const DEFAULT_HEIGHT: usize = 32;

/// The largest supported height, so that every position fits in a `u64`
pub const MAX_HEIGHT: usize = 63;

/// An append-only Merkle tree of note commitments
///
/// Leaves are filled left to right. The root hash depends on the order of insertion, since the
/// `n`th commitment is always stored at position `n`:
///
/// ```rust
/// # use commitment_tree::*;
/// # use sapling_primitives::Element;
/// let a = Element::from_u64(1);
/// let b = Element::from_u64(2);
///
/// let mut ab = CommitmentTree::new(16);
/// ab.extend([a, b]).unwrap();
///
/// let mut ba = CommitmentTree::new(16);
/// ba.extend([b, a]).unwrap();
///
/// assert_ne!(ab.root(), ba.root());
/// ```
#[derive(Debug, Clone)]
pub struct CommitmentTree {
    tree: tree_repr::Node,
    height: usize,
    len: u64,
}

impl PartialEq for CommitmentTree {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.height == other.height && self.root() == other.root()
    }
}

impl Eq for CommitmentTree {}

impl Default for CommitmentTree {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_HEIGHT)
    }
}

impl CommitmentTree {
    /// Create a new, empty tree of the given height
    ///
    /// ```rust
    /// # use commitment_tree::*;
    /// # use sapling_primitives::empty_tree_hash;
    /// let tree = CommitmentTree::new(32);
    ///
    /// assert!(tree.is_empty());
    /// assert_eq!(tree.root(), empty_tree_hash(32));
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `height` is greater than [`MAX_HEIGHT`]
    #[inline]
    #[must_use]
    pub fn new(height: usize) -> Self {
        assert!(
            height <= MAX_HEIGHT,
            "tree height {height} exceeds the maximum of {MAX_HEIGHT}"
        );

        Self {
            tree: tree_repr::Node::Empty { height },
            height,
            len: 0,
        }
    }

    /// The height of the tree, i.e. the number of siblings in each [`Witness`]
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// The maximum number of commitments this tree can hold
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> u64 {
        1 << self.height
    }

    /// The number of commitments appended so far
    ///
    /// This is also the position the next commitment will occupy
    #[inline]
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether no commitments have been appended
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The root hash of the tree
    ///
    /// This value is cached internally, so calls to this function are essentially free
    #[inline]
    #[must_use]
    pub fn root(&self) -> Element {
        self.tree.hash()
    }

    fn check_position(&self, position: u64) -> Result<(), TreeOverflow> {
        match position < self.capacity() {
            true => Ok(()),
            false => Err(TreeOverflow {
                height: self.height,
                position,
            }),
        }
    }
}
