use sapling_primitives::{empty_tree_hash, hash_merge, Element, Personalization};

/// The in-memory shape of a [`CommitmentTree`]
///
/// [`CommitmentTree`]: super::CommitmentTree
#[derive(Debug, Clone)]
pub(crate) enum Node {
    /// A single commitment at height 0
    Leaf(Element),

    /// A subtree of height `height` containing no commitments
    ///
    /// The hashes of empty subtrees are well-known, so they are looked up rather than stored
    Empty { height: usize },

    /// A parent of two subtrees of height `height - 1`, with a cached hash
    Parent {
        left: Box<Self>,
        right: Box<Self>,
        hash: Element,
        /// if true, a descendant has changed without recalculating the hash
        hash_dirty: bool,
    },
}

impl Node {
    pub fn hash(&self) -> Element {
        match self {
            Self::Leaf(hash) | Self::Parent { hash, .. } => *hash,
            Self::Empty { height } => empty_tree_hash(*height),
        }
    }

    /// Place `element` at `position`, relative to the leftmost leaf of this subtree
    ///
    /// This does not update hashes, instead it marks nodes on the way down as dirty
    pub(crate) fn insert_without_hashing(&mut self, element: Element, position: u64, height: usize) {
        match self {
            Self::Leaf(e) => *e = element,
            Self::Parent {
                left,
                right,
                hash_dirty,
                ..
            } => {
                let is_right = (position >> (height - 1)) & 1 == 1;

                match is_right {
                    false => left.insert_without_hashing(element, position, height - 1),
                    true => right.insert_without_hashing(element, position, height - 1),
                }

                *hash_dirty = true;
            }
            Self::Empty { height: 0 } => *self = Self::Leaf(element),
            Self::Empty { height: h } => {
                let child = *h - 1;

                // split an empty subtree into two empty halves
                *self = Self::Parent {
                    left: Box::new(Self::Empty { height: child }),
                    right: Box::new(Self::Empty { height: child }),
                    // overwritten by the next `recalculate_hashes`
                    hash: Element::NULL_HASH,
                    hash_dirty: true,
                };

                self.insert_without_hashing(element, position, height);
            }
        }
    }

    pub fn recalculate_hashes(&mut self) {
        let Self::Parent {
            left,
            right,
            hash,
            hash_dirty,
        } = self
        else {
            return;
        };

        if !*hash_dirty {
            return;
        }

        rayon::join(|| left.recalculate_hashes(), || right.recalculate_hashes());

        *hash = hash_merge(Personalization::MerkleTree, [left.hash(), right.hash()]);
        *hash_dirty = false;
    }

    /// Collect the siblings of the leaf at `position`, deepest first
    pub fn siblings(&self, position: u64, height: usize) -> Vec<Element> {
        let mut siblings = Vec::with_capacity(height);
        let mut node = self;
        let mut level = height;

        while level > 0 {
            match node {
                Self::Parent { left, right, .. } => {
                    let is_right = (position >> (level - 1)) & 1 == 1;

                    match is_right {
                        false => {
                            siblings.push(right.hash());
                            node = left;
                        }
                        true => {
                            siblings.push(left.hash());
                            node = right;
                        }
                    }

                    level -= 1;
                }
                // every sibling below an empty subtree is itself empty
                Self::Empty { .. } => {
                    siblings.extend((0..level).rev().map(empty_tree_hash));
                    break;
                }
                Self::Leaf(_) => break,
            }
        }

        siblings.reverse();
        siblings
    }
}
