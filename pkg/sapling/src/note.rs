use sapling_primitives::{hash_bytes, Element, Personalization};
use serde::{Deserialize, Serialize};

use crate::{PaymentAddress, ViewingKey};

/// A note: an amount owned by a [`PaymentAddress`]
///
/// Only the note's [commitment](Note::commitment) is ever published. The note itself travels
/// encrypted to its recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub address: PaymentAddress,
    pub value: u64,
    #[serde(with = "hex")]
    pub memo: Vec<u8>,
    /// Commitment randomness
    pub rcm: Element,
}

impl Note {
    /// The value that identifies this note in the commitment tree
    ///
    /// The memo is not committed to
    pub fn commitment(&self) -> Element {
        hash_bytes(
            Personalization::NoteCommitment,
            [
                self.address.diversifier().as_slice(),
                self.address.transmission_key(),
                &self.value.to_le_bytes(),
                self.rcm.as_bytes(),
            ],
        )
    }

    /// The nullifier published when this note is spent from `position`
    ///
    /// ```rust
    /// # use sapling::*;
    /// let vk = SpendingKey::new([1; 32]).viewing_key();
    /// let note = Note {
    ///     address: vk.default_address(),
    ///     value: 10,
    ///     memo: vec![],
    ///     rcm: Element::from_u64(5),
    /// };
    ///
    /// assert_eq!(note.nullifier(&vk, 3), note.nullifier(&vk, 3));
    /// assert_ne!(note.nullifier(&vk, 3), note.nullifier(&vk, 4));
    /// ```
    pub fn nullifier(&self, viewing_key: &ViewingKey, position: u64) -> Element {
        hash_bytes(
            Personalization::Nullifier,
            [
                viewing_key.nullifier_key().as_bytes().as_slice(),
                self.commitment().as_bytes(),
                &position.to_le_bytes(),
            ],
        )
    }
}

/// A note at a known position in the commitment tree, ready to be spent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputNote {
    #[serde(flatten)]
    pub note: Note,
    pub position: u64,
}

impl InputNote {
    pub fn new(note: Note, position: u64) -> Self {
        Self { note, position }
    }

    /// A zero-value input owned by `address`
    ///
    /// Dummy inputs are indistinguishable from real spends to anyone but the spender, and hide how
    /// many notes a transaction really consumes
    pub fn dummy(address: PaymentAddress, rng: impl rand::RngCore) -> Self {
        Self {
            note: Note {
                address,
                value: 0,
                memo: Vec::new(),
                rcm: Element::random(rng),
            },
            position: 0,
        }
    }

    pub fn value(&self) -> u64 {
        self.note.value
    }

    pub fn address(&self) -> &PaymentAddress {
        &self.note.address
    }

    pub fn commitment(&self) -> Element {
        self.note.commitment()
    }

    pub fn nullifier(&self, viewing_key: &ViewingKey) -> Element {
        self.note.nullifier(viewing_key, self.position)
    }
}

/// A note to be created by a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaplingOutput {
    pub address: PaymentAddress,
    pub value: u64,
    #[serde(with = "hex")]
    pub memo: Vec<u8>,
    /// Whether the sender can recover this output later with their outgoing key
    pub browsable: bool,
}

impl SaplingOutput {
    /// A browsable output with an all-zero memo
    pub fn new(address: PaymentAddress, value: u64, memo_size: usize) -> Self {
        Self {
            address,
            value,
            memo: vec![0; memo_size],
            browsable: true,
        }
    }

    /// A zero-value output to a throwaway address, with a random memo
    ///
    /// Dummy outputs are not browsable, so they never show up in the sender's history
    pub fn dummy(memo_size: usize, mut rng: impl rand::RngCore) -> Self {
        let mut memo = vec![0; memo_size];
        rng.fill_bytes(&mut memo);

        Self {
            address: PaymentAddress::random(&mut rng),
            value: 0,
            memo,
            browsable: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand_chacha::{rand_core::SeedableRng, ChaChaRng};
    use test_strategy::proptest;

    use crate::SpendingKey;

    use super::*;

    fn note(value: u64, rcm: Element) -> Note {
        Note {
            address: SpendingKey::new([2; 32]).viewing_key().default_address(),
            value,
            memo: vec![0; 8],
            rcm,
        }
    }

    #[proptest]
    fn nullifier_is_deterministic(value: u64, rcm: Element, position: u64, key: [u8; 32]) {
        let vk = SpendingKey::new(key).viewing_key();
        let note = note(value, rcm);

        assert_eq!(note.nullifier(&vk, position), note.nullifier(&vk, position));
    }

    #[test]
    fn nullifier_depends_on_key() {
        let note = note(10, Element::from_u64(1));
        let a = SpendingKey::new([1; 32]).viewing_key();
        let b = SpendingKey::new([2; 32]).viewing_key();

        assert_ne!(note.nullifier(&a, 0), note.nullifier(&b, 0));
    }

    #[test]
    fn memo_is_not_committed() {
        let mut a = note(10, Element::from_u64(1));
        let b = a.clone();
        a.memo = vec![1; 8];

        assert_eq!(a.commitment(), b.commitment());
    }

    #[test]
    fn dummies_carry_no_value() {
        let mut rng = ChaChaRng::from_seed([0; 32]);
        let address = SpendingKey::new([2; 32]).viewing_key().default_address();

        let input = InputNote::dummy(address, &mut rng);
        let output = SaplingOutput::dummy(8, &mut rng);

        assert_eq!(input.value(), 0);
        assert_eq!(input.address(), &address);
        assert_eq!(output.value, 0);
        assert_eq!(output.memo.len(), 8);
        assert!(!output.browsable);
    }

    #[test]
    fn input_note_serde_is_flat() {
        let input = InputNote::new(note(5, Element::from_u64(9)), 4);
        let json = serde_json::to_value(&input).unwrap();

        assert_eq!(json["value"], 5);
        assert_eq!(json["position"], 4);
        assert_eq!(serde_json::from_value::<InputNote>(json).unwrap(), input);
    }
}
