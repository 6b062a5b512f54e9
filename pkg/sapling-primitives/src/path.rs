use crate::{hash_merge, Element, Personalization};

/// Compute the root hash of a commitment tree from a leaf and its authentication path
///
/// `siblings` yields the siblings of `leaf` deepest first, and `position` is the leaf's index in
/// the tree. Bit `i` of `position` (counting from the least significant bit) tells whether the
/// node at height `i` on the path is a right child (`1`) or a left child (`0`).
///
/// For example, consider the following tree:
/// ```text
///            C
///          /   \
///         A     B
///        / \   / \
///       0   1 2   3
/// ```
/// Here `A = hash_merge([0, 1])`, `B = hash_merge([2, 3])`, `C = hash_merge([A, B])`.
///
/// To prove that leaf `2` is at position 2:
/// ```rust
/// # use sapling_primitives::*;
/// let leaf = |i| Element::from_u64(i);
/// let merge = |l, r| hash_merge(Personalization::MerkleTree, [l, r]);
///
/// let a = merge(leaf(0), leaf(1));
/// let b = merge(leaf(2), leaf(3));
/// let c = merge(a, b);
///
/// let root = compute_merkle_root(leaf(2), 2, [leaf(3), a]);
/// assert_eq!(root, c);
///
/// // the same path does not prove a different leaf
/// assert_ne!(compute_merkle_root(leaf(1), 2, [leaf(3), a]), c);
/// ```
pub fn compute_merkle_root<I: IntoIterator<Item = Element>>(
    leaf: Element,
    position: u64,
    siblings: I,
) -> Element {
    let mut node = leaf;

    for (height, sibling) in siblings.into_iter().enumerate() {
        let is_right = (position >> height) & 1 == 1;

        node = match is_right {
            false => hash_merge(Personalization::MerkleTree, [node, sibling]),
            true => hash_merge(Personalization::MerkleTree, [sibling, node]),
        };
    }

    node
}
