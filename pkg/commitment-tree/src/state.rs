use sapling_primitives::Element;

use crate::{CommitmentTree, TreeOverflow};

/// A [`CommitmentTree`] rebuilt from a ledger snapshot, ready to hand out witnesses for spends
pub type StateTree = CommitmentTree;

/// Rebuild the commitment tree from every commitment published to the pool, in ledger order
///
/// When `pad_if_empty` is set and there are no commitments, a single [`Element::UNCOMMITTED`]
/// placeholder is inserted, so that proofs can still be generated against an empty pool:
///
/// ```rust
/// # use commitment_tree::*;
/// # use sapling_primitives::{empty_tree_hash, Element};
/// let padded = build_state_tree(std::iter::empty(), 32, true).unwrap();
/// assert_eq!(padded.len(), 1);
/// assert_ne!(padded.root(), empty_tree_hash(32));
///
/// let unpadded = build_state_tree(std::iter::empty(), 32, false).unwrap();
/// assert_eq!(unpadded.root(), empty_tree_hash(32));
/// ```
///
/// # Errors
///
/// Returns [`TreeOverflow`] if there are more than `2^height` commitments
pub fn build_state_tree<I>(
    commitments: I,
    height: usize,
    pad_if_empty: bool,
) -> Result<StateTree, TreeOverflow>
where
    I: IntoIterator<Item = Element>,
{
    let mut tree = CommitmentTree::new(height);
    tree.extend(commitments)?;

    if pad_if_empty && tree.is_empty() {
        tree.append(Element::UNCOMMITTED)?;
    }

    tracing::debug!(
        height,
        commitments = tree.len(),
        root = %tree.root(),
        "rebuilt commitment tree"
    );

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_only_applies_to_empty_trees() {
        let commitments = [Element::from_u64(1), Element::from_u64(2)];

        let padded = build_state_tree(commitments, 16, true).unwrap();
        let unpadded = build_state_tree(commitments, 16, false).unwrap();

        assert_eq!(padded, unpadded);
        assert_eq!(padded.len(), 2);
    }

    #[test]
    fn too_many_commitments_overflow() {
        let commitments = (0..5).map(Element::from_u64);
        let error = build_state_tree(commitments, 2, false).unwrap_err();

        assert_eq!(error.capacity(), 4);
        assert_eq!(error.position(), 4);
    }

    #[test]
    fn exactly_full_tree_is_fine() {
        let commitments = (0..4).map(Element::from_u64);
        let tree = build_state_tree(commitments, 2, false).unwrap();

        assert_eq!(tree.len(), tree.capacity());
    }

    #[test]
    fn witnesses_match_inserted_commitments() {
        let commitments: Vec<_> = (10..20).map(Element::from_u64).collect();
        let tree = build_state_tree(commitments.iter().copied(), 32, false).unwrap();

        for (position, commitment) in (0u64..).zip(&commitments) {
            let witness = tree.witness(position).unwrap();
            assert!(witness.proves(*commitment));
        }
    }
}
