use ::proptest::{arbitrary::StrategyFor, prelude::*, strategy::Map};
use sapling_primitives::Element;

use crate::CommitmentTree;

/// Arbitrary trees have height 8 and up to 64 commitments
impl Arbitrary for CommitmentTree {
    type Parameters = ();
    type Strategy = Map<StrategyFor<Vec<Element>>, fn(Vec<Element>) -> Self>;

    fn arbitrary_with((): Self::Parameters) -> Self::Strategy {
        any::<Vec<Element>>().prop_map(|elements| {
            let mut tree = CommitmentTree::new(8);
            tree.extend(elements.into_iter().take(64)).unwrap();
            tree
        })
    }
}
