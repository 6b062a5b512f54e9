use commitment_tree::{build_state_tree, StateTree};
use sapling_primitives::Element;
use serde::{Deserialize, Serialize};

use crate::{Ciphertext, Result};

/// A snapshot of the shielded pool
///
/// Holds every published commitment with its ciphertext, in ledger order, and every published
/// nullifier. Snapshots are fetched fresh for each query and never cached
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDiff {
    pub root: Element,
    pub commitments_and_ciphertexts: Vec<(Element, Ciphertext)>,
    pub nullifiers: Vec<Element>,
}

impl StateDiff {
    /// The commitments, in ledger order
    pub fn commitments(&self) -> impl Iterator<Item = Element> + '_ {
        self.commitments_and_ciphertexts.iter().map(|(cm, _)| *cm)
    }

    /// Rebuild the commitment tree of this snapshot
    ///
    /// See [`build_state_tree`] for the meaning of `pad_if_empty`
    pub fn state_tree(&self, height: usize, pad_if_empty: bool) -> Result<StateTree> {
        Ok(build_state_tree(self.commitments(), height, pad_if_empty)?)
    }

    /// The commitments and ciphertexts, tagged with their ledger position
    pub fn indexed(&self) -> Vec<(Element, Ciphertext, u64)> {
        (0u64..)
            .zip(&self.commitments_and_ciphertexts)
            .map(|(index, (cm, ciphertext))| (*cm, ciphertext.clone(), index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_node_json() {
        let cm = Element::from_u64(1);
        let json = serde_json::json!({
            "root": Element::from_u64(9).to_hex(),
            "commitments_and_ciphertexts": [[
                cm.to_hex(),
                {
                    "cv": Element::from_u64(2).to_hex(),
                    "epk": "11".repeat(32),
                    "payload_enc": "abcd",
                    "nonce_enc": "22".repeat(12),
                    "payload_out": "",
                    "nonce_out": "33".repeat(12),
                }
            ]],
            "nullifiers": [Element::from_u64(3).to_hex()],
        });

        let diff: StateDiff = serde_json::from_value(json).unwrap();

        assert_eq!(diff.commitments().collect::<Vec<_>>(), vec![cm]);
        assert_eq!(diff.commitments_and_ciphertexts[0].1.payload_enc, vec![0xab, 0xcd]);
        assert_eq!(diff.nullifiers, vec![Element::from_u64(3)]);
        assert_eq!(diff.indexed()[0].2, 0);
    }

    #[test]
    fn empty_diff_pads_tree_on_request() {
        let diff = StateDiff::default();

        assert_eq!(diff.state_tree(32, true).unwrap().len(), 1);
        assert_eq!(diff.state_tree(32, false).unwrap().len(), 0);
    }
}
