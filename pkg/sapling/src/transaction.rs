use borsh::{BorshDeserialize, BorshSerialize};
use sapling_primitives::{Element, Personalization};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{PROOF_SIZE, SIGNATURE_SIZE},
    Ciphertext, InputNote, SaplingOutput, StateDiff,
};

/// A spend description before its spend authorization signature is attached
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct UnsignedSpendDescription {
    /// Value commitment of the spent note
    pub cv: Element,
    /// The tree root the membership proof was made against
    pub root: Element,
    pub nullifier: Element,
    /// Randomized validating key
    pub rk: Element,
    pub proof: [u8; PROOF_SIZE],
}

impl UnsignedSpendDescription {
    /// Attach a spend authorization signature
    pub fn sign(self, spend_auth_sig: [u8; SIGNATURE_SIZE]) -> SpendDescription {
        let Self {
            cv,
            root,
            nullifier,
            rk,
            proof,
        } = self;

        SpendDescription {
            cv,
            root,
            nullifier,
            rk,
            proof,
            spend_auth_sig,
        }
    }

    fn hash_into(&self, state: &mut blake2b_simd::State) {
        state.update(self.cv.as_bytes());
        state.update(self.root.as_bytes());
        state.update(self.nullifier.as_bytes());
        state.update(self.rk.as_bytes());
        state.update(&self.proof);
    }
}

/// Consumes a note: publishes its nullifier and proves the note is in the tree
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SpendDescription {
    pub cv: Element,
    pub root: Element,
    pub nullifier: Element,
    pub rk: Element,
    pub proof: [u8; PROOF_SIZE],
    pub spend_auth_sig: [u8; SIGNATURE_SIZE],
}

impl SpendDescription {
    /// This description without its signature
    pub fn unsigned(&self) -> UnsignedSpendDescription {
        UnsignedSpendDescription {
            cv: self.cv,
            root: self.root,
            nullifier: self.nullifier,
            rk: self.rk,
            proof: self.proof,
        }
    }
}

/// Creates a note: publishes its commitment and the note encrypted to its recipient
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct OutputDescription {
    pub cm: Element,
    pub proof: [u8; PROOF_SIZE],
    pub ciphertext: Ciphertext,
}

impl OutputDescription {
    fn hash_into(&self, state: &mut blake2b_simd::State) {
        let Ciphertext {
            cv,
            epk,
            payload_enc,
            nonce_enc,
            payload_out,
            nonce_out,
        } = &self.ciphertext;

        state.update(self.cm.as_bytes());
        state.update(&self.proof);
        state.update(cv.as_bytes());
        state.update(epk);
        hash_prefixed(state, payload_enc);
        state.update(nonce_enc);
        hash_prefixed(state, payload_out);
        state.update(nonce_out);
    }
}

fn hash_prefixed(state: &mut blake2b_simd::State, bytes: &[u8]) {
    state.update(&(bytes.len() as u64).to_le_bytes());
    state.update(bytes);
}

/// The hash signed by every spend authorization signature and by the binding signature
///
/// Covers the anti-replay tag, all unsigned spends, all outputs and the bound data, so none of
/// them can be changed once the transaction is signed
pub fn sighash(
    spends: &[UnsignedSpendDescription],
    outputs: &[OutputDescription],
    anti_replay: &[u8],
    bound_data: &[u8],
) -> Element {
    let mut state = Personalization::SigHash.state();

    hash_prefixed(&mut state, anti_replay);

    state.update(&(spends.len() as u64).to_le_bytes());
    for spend in spends {
        spend.hash_into(&mut state);
    }

    state.update(&(outputs.len() as u64).to_le_bytes());
    for output in outputs {
        output.hash_into(&mut state);
    }

    hash_prefixed(&mut state, bound_data);

    let mut bytes = [0; 32];
    bytes.copy_from_slice(state.finalize().as_bytes());
    Element::new(bytes)
}

/// A forged shielded transaction
///
/// Immutable once forged. [`encoder::encode`](crate::encoder::encode) gives its canonical bytes
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SaplingTransaction {
    pub spends: Vec<SpendDescription>,
    pub outputs: Vec<OutputDescription>,
    pub binding_sig: [u8; SIGNATURE_SIZE],
    /// Value entering (negative) or leaving (positive) the pool
    pub balance: i64,
    pub root: Element,
    /// External data committed to by the signatures, e.g. the target of an unshield
    pub bound_data: Vec<u8>,
    /// Tag binding this transaction to one contract on one chain
    pub anti_replay: Vec<u8>,
}

impl SaplingTransaction {
    /// Recompute the hash this transaction's signatures were made over
    pub fn sighash(&self) -> Element {
        let spends: Vec<_> = self.spends.iter().map(SpendDescription::unsigned).collect();
        sighash(&spends, &self.outputs, &self.anti_replay, &self.bound_data)
    }
}

/// Everything a signer needs to forge a transaction
///
/// A watch-only wallet prepares it from a viewing key, and the device holding the spending key
/// forges and signs it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedSaplingTransaction {
    pub ins: Vec<InputNote>,
    pub outs: Vec<SaplingOutput>,
    pub contract_address: String,
    pub chain_id: String,
    pub state_diff: StateDiff,
    /// The base-chain address receiving the unshielded value, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unshield_target: Option<String>,
}
