//! Recognising a viewing key's notes and describing transactions in plain terms
//!
//! Trial decryption runs in parallel over the whole snapshot, but results always come back in a
//! well-defined order. Notes the key cannot decrypt are skipped silently: failing to decrypt is
//! the normal outcome for almost every note in the pool.

use std::collections::HashSet;

use num_bigint::BigUint;
use rayon::prelude::*;
use sapling_primitives::Element;

use crate::{
    encryption::{try_decrypt_incoming, try_decrypt_outgoing},
    Ciphertext, Error, InputNote, Note, PaymentAddress, Result, SaplingOutput, SaplingTransaction,
    ViewingKey,
};

/// Decrypt every note in `indexed` with `decrypt`, keeping ledger order
fn decrypt_all<F>(indexed: &[(Element, Ciphertext, u64)], decrypt: F) -> Vec<InputNote>
where
    F: Fn(Element, &Ciphertext) -> Option<Note> + Sync,
{
    indexed
        .par_iter()
        .filter_map(|(cm, ciphertext, position)| {
            decrypt(*cm, ciphertext).map(|note| InputNote::new(note, *position))
        })
        .collect()
}

/// The notes owned by `viewing_key` that have not been spent, most recent first
///
/// `commitments_and_ciphertexts` must be in ledger order, so that each note's index is its
/// position in the commitment tree
#[tracing::instrument(skip_all, fields(notes = commitments_and_ciphertexts.len()))]
pub fn get_unspends(
    viewing_key: &ViewingKey,
    commitments_and_ciphertexts: &[(Element, Ciphertext)],
    nullifiers: &[Element],
) -> Vec<InputNote> {
    let nullifiers: HashSet<Element> = nullifiers.iter().copied().collect();

    let mut unspends: Vec<InputNote> = commitments_and_ciphertexts
        .par_iter()
        .enumerate()
        .filter_map(|(index, (cm, ciphertext))| {
            let note = try_decrypt_incoming(viewing_key, *cm, ciphertext)?;
            Some(InputNote::new(note, index as u64))
        })
        .filter(|input| !nullifiers.contains(&input.nullifier(viewing_key)))
        .collect();

    unspends.reverse();

    tracing::debug!(unspent = unspends.len(), "found unspent notes");

    unspends
}

/// Notes in `indexed` that were sent to `viewing_key`, in the order given
pub fn get_incoming_inputs(
    viewing_key: &ViewingKey,
    indexed: &[(Element, Ciphertext, u64)],
) -> Vec<InputNote> {
    decrypt_all(indexed, |cm, ciphertext| {
        try_decrypt_incoming(viewing_key, cm, ciphertext)
    })
}

/// Notes in `indexed` that `viewing_key` created, in the order given
///
/// Non-browsable outputs, such as dummies, never show up here
pub fn get_outgoing_inputs(
    viewing_key: &ViewingKey,
    indexed: &[(Element, Ciphertext, u64)],
) -> Vec<InputNote> {
    decrypt_all(indexed, |cm, ciphertext| {
        try_decrypt_outgoing(viewing_key, cm, ciphertext)
    })
}

/// The total value of `notes`
///
/// ```rust
/// # use sapling::bookkeeper::sum_notes;
/// # use num_bigint::BigUint;
/// assert_eq!(sum_notes(&[]), BigUint::from(0u32));
/// ```
pub fn sum_notes<'a, I>(notes: I) -> BigUint
where
    I: IntoIterator<Item = &'a InputNote>,
{
    notes
        .into_iter()
        .map(|input| BigUint::from(input.value()))
        .sum()
}

/// One side of a transaction, as shown to a user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Party {
    /// The pool itself, standing in for an unknown shielded counterparty
    ShieldedPool,
    Shielded(PaymentAddress),
    /// A base-chain address, packed as it appears in bound data
    External(Vec<u8>),
}

/// A plain description of the value moved by (part of) a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDetails {
    pub from: Vec<Party>,
    pub to: Vec<Party>,
    pub is_inbound: bool,
    pub amount: u64,
    pub fee: u64,
    pub memo: Option<Vec<u8>>,
}

impl TransactionDetails {
    fn new(from: Party, to: Party, is_inbound: bool, amount: u64, memo: Option<Vec<u8>>) -> Self {
        Self {
            from: vec![from],
            to: vec![to],
            is_inbound,
            amount,
            fee: 0,
            memo,
        }
    }
}

/// Describe forged transactions, as far as `known_viewing_keys` can see into them
///
/// Every output one of the keys can decrypt yields one record: outputs the key created come from
/// its default address, outputs it received come from the pool. Value leaving the pool yields a
/// record addressed to the bound data. Transactions nothing can be learned about yield a
/// pool-to-pool record with no amount
pub fn get_transactions_partial_details(
    transactions: &[SaplingTransaction],
    known_viewing_keys: &[ViewingKey],
) -> Vec<TransactionDetails> {
    let mut details = Vec::new();

    for transaction in transactions {
        let before = details.len();

        for output in &transaction.outputs {
            let record = known_viewing_keys.iter().find_map(|viewing_key| {
                if let Some(note) = try_decrypt_outgoing(viewing_key, output.cm, &output.ciphertext)
                {
                    let from = Party::Shielded(viewing_key.default_address());
                    return Some((from, note, false));
                }

                try_decrypt_incoming(viewing_key, output.cm, &output.ciphertext)
                    .map(|note| (Party::ShieldedPool, note, true))
            });

            if let Some((from, note, is_inbound)) = record {
                details.push(TransactionDetails::new(
                    from,
                    Party::Shielded(note.address),
                    is_inbound,
                    note.value,
                    Some(note.memo),
                ));
            }
        }

        if let Ok(unshielded @ 1..) = u64::try_from(transaction.balance) {
            details.push(TransactionDetails::new(
                Party::ShieldedPool,
                Party::External(transaction.bound_data.clone()),
                false,
                unshielded,
                None,
            ));
        }

        if details.len() == before {
            details.push(TransactionDetails::new(
                Party::ShieldedPool,
                Party::ShieldedPool,
                false,
                0,
                None,
            ));
        }
    }

    details
}

/// Describe a transaction that has not been forged yet
///
/// Every browsable output yields one record from `from`. If `unshield_target` is set, the
/// surplus of inputs over outputs yields one more record, addressed to it. Fails with
/// [`Error::ValueOverflow`] if that surplus does not fit in 64 bits
pub fn get_unsigned_transaction_details(
    from: &PaymentAddress,
    ins: &[InputNote],
    outs: &[SaplingOutput],
    unshield_target: Option<&[u8]>,
) -> Result<Vec<TransactionDetails>> {
    let mut details: Vec<_> = outs
        .iter()
        .filter(|output| output.browsable)
        .map(|output| {
            TransactionDetails::new(
                Party::Shielded(*from),
                Party::Shielded(output.address),
                false,
                output.value,
                Some(output.memo.clone()),
            )
        })
        .collect();

    if let Some(target) = unshield_target {
        let spent = sum_notes(ins);
        let created: BigUint = outs.iter().map(|output| BigUint::from(output.value)).sum();

        let surplus = match spent > created {
            true => spent - created,
            false => BigUint::default(),
        };
        let unshielded = u64::try_from(&surplus).map_err(|_| {
            Error::ValueOverflow(format!("unshielded amount {surplus} does not fit in 64 bits"))
        })?;

        details.push(TransactionDetails::new(
            Party::Shielded(*from),
            Party::External(target.to_vec()),
            false,
            unshielded,
            None,
        ));
    }

    Ok(details)
}
