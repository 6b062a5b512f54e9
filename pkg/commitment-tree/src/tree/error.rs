/// An error indicating that a position lies outside the capacity of a [`CommitmentTree`]
///
/// Returned both when appending to a full tree and when asking for the witness of a position the
/// tree cannot hold:
///
/// ```rust
/// # use commitment_tree::*;
/// # use sapling_primitives::Element;
/// let mut tree = CommitmentTree::new(1);
/// tree.append(Element::from_u64(1)).unwrap();
/// tree.append(Element::from_u64(2)).unwrap();
///
/// let error = tree.append(Element::from_u64(3)).unwrap_err();
/// assert_eq!(error.position(), 2);
/// assert_eq!(error.capacity(), 2);
/// ```
///
/// [`CommitmentTree`]: crate::CommitmentTree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeOverflow {
    pub(crate) height: usize,
    pub(crate) position: u64,
}

impl core::fmt::Display for TreeOverflow {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let Self { height, position } = self;

        write!(
            f,
            "tree overflow: position {position} does not fit in a tree of height {height} (capacity {})",
            self.capacity()
        )
    }
}

impl std::error::Error for TreeOverflow {}

impl TreeOverflow {
    /// The position that did not fit
    #[inline]
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// The height of the tree that overflowed
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// The number of leaves the tree can hold
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> u64 {
        1 << self.height
    }
}
