use sapling_primitives::Element;

use crate::{CommitmentTree, TreeOverflow};

impl CommitmentTree {
    /// Append a commitment at the next free position, returning that position
    ///
    /// ```rust
    /// # use commitment_tree::*;
    /// # use sapling_primitives::Element;
    /// let mut tree = CommitmentTree::new(32);
    ///
    /// assert_eq!(tree.append(Element::from_u64(10)).unwrap(), 0);
    /// assert_eq!(tree.append(Element::from_u64(20)).unwrap(), 1);
    /// assert_eq!(tree.len(), 2);
    /// ```
    ///
    /// Hashes are recalculated after every call. When inserting many commitments at once, use
    /// [`CommitmentTree::extend`], which only recalculates them once
    ///
    /// # Errors
    ///
    /// Returns [`TreeOverflow`] if the tree is already full, in which case the tree is unchanged
    pub fn append(&mut self, element: Element) -> Result<u64, TreeOverflow> {
        let position = self.append_without_hashing(element)?;
        self.tree.recalculate_hashes();
        Ok(position)
    }

    /// Append many commitments, in iteration order
    ///
    /// ```rust
    /// # use commitment_tree::*;
    /// # use sapling_primitives::Element;
    /// let elements = (1..=5).map(Element::from_u64);
    ///
    /// let mut one_by_one = CommitmentTree::new(8);
    /// for element in elements.clone() {
    ///     one_by_one.append(element).unwrap();
    /// }
    ///
    /// let mut batched = CommitmentTree::new(8);
    /// batched.extend(elements).unwrap();
    ///
    /// assert_eq!(one_by_one.root(), batched.root());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`TreeOverflow`] as soon as the tree is full. Commitments before the overflowing
    /// one stay in the tree
    pub fn extend<I: IntoIterator<Item = Element>>(
        &mut self,
        elements: I,
    ) -> Result<(), TreeOverflow> {
        let result = elements
            .into_iter()
            .try_for_each(|element| self.append_without_hashing(element).map(drop));

        self.tree.recalculate_hashes();

        result
    }

    fn append_without_hashing(&mut self, element: Element) -> Result<u64, TreeOverflow> {
        let position = self.len;
        self.check_position(position)?;

        self.tree
            .insert_without_hashing(element, position, self.height);
        self.len += 1;

        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use proptest::{arbitrary::any, collection::vec};
    use test_strategy::proptest;

    use super::*;

    #[test]
    fn full_tree_rejects_append() {
        let mut tree = CommitmentTree::new(2);
        tree.extend((1..=4).map(Element::from_u64)).unwrap();

        let root = tree.root();
        let error = tree.append(Element::from_u64(5)).unwrap_err();

        assert_eq!(error.position(), 4);
        assert_eq!(tree.root(), root);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn extend_keeps_prefix_on_overflow() {
        let mut tree = CommitmentTree::new(2);
        let error = tree.extend((1..=6).map(Element::from_u64)).unwrap_err();

        assert_eq!(error.capacity(), 4);
        assert_eq!(tree.len(), 4);

        let mut expected = CommitmentTree::new(2);
        expected.extend((1..=4).map(Element::from_u64)).unwrap();
        assert_eq!(tree.root(), expected.root());
    }

    #[test]
    fn every_append_changes_the_root() {
        let mut tree = CommitmentTree::new(32);
        let mut roots = vec![tree.root()];

        for i in 1..=16 {
            tree.append(Element::from_u64(i)).unwrap();
            roots.push(tree.root());
        }

        roots.sort();
        roots.dedup();
        assert_eq!(roots.len(), 17);
    }

    #[proptest]
    fn batched_and_single_appends_agree(
        #[strategy(vec(any::<Element>(), 0..40))] elements: Vec<Element>,
    ) {
        let mut single = CommitmentTree::new(8);
        for element in &elements {
            single.append(*element).unwrap();
        }

        let mut batched = CommitmentTree::new(8);
        batched.extend(elements).unwrap();

        assert_eq!(single, batched);
    }
}
