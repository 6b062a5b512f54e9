use std::sync::OnceLock;

use async_trait::async_trait;
use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use sapling_primitives::{hash_bytes, Element, Personalization};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::{
    constants::{PROOF_SIZE, SIGNATURE_SIZE},
    InputNote, Note, PaymentAddress, SpendDescription, SpendingKey, UnsignedSpendDescription,
    Witness,
};

use super::{OutputProof, Prover, ProverError};

/// A local prover built from BLAKE2b
///
/// Proofs and signatures are deterministic digests of the public values they cover. They have
/// the right shape and bind the right data, but reveal nothing about the witness only because
/// they are hashes: there is no zero-knowledge and no soundness. Useful for tests and offline
/// tooling, never for a real pool.
#[derive(Debug, Default)]
pub struct TransparentProver {
    parameters: OnceLock<Element>,
}

/// Value commitment randomness of one transaction, in the order it was generated
#[derive(Debug)]
pub struct TransparentContext {
    rng: ChaChaRng,
    spend_rcvs: Vec<Element>,
    output_rcvs: Vec<Element>,
}

impl TransparentContext {
    fn value_commitment(&mut self, value: u64) -> (Element, Element) {
        let rcv = Element::random(&mut self.rng);
        let cv = hash_bytes(
            Personalization::ValueCommitment,
            [value.to_le_bytes().as_slice(), rcv.as_bytes()],
        );

        (cv, rcv)
    }
}

fn digest<const N: usize>(parts: &[&[u8]], counter: u8) -> [u8; N] {
    let mut state = Personalization::TransparentProver.state_with_length(N);
    state.update(&[counter]);

    for part in parts {
        state.update(part);
    }

    let mut bytes = [0; N];
    bytes.copy_from_slice(state.finalize().as_bytes());
    bytes
}

fn proof(parts: &[&[u8]]) -> [u8; PROOF_SIZE] {
    let mut proof = [0; PROOF_SIZE];

    for (counter, chunk) in (0u8..).zip(proof.chunks_mut(64)) {
        chunk.copy_from_slice(&digest::<64>(parts, counter));
    }

    proof
}

impl TransparentProver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A digest of the parameters passed to [`Prover::init_parameters`], if it has been called
    pub fn parameters_digest(&self) -> Option<Element> {
        self.parameters.get().copied()
    }

    /// The randomized validating key of `spending_key` under randomizer `ar`
    pub fn randomized_key(spending_key: &SpendingKey, ar: Element) -> Element {
        Element::new(digest::<32>(
            &[b"rk", spending_key.validating_key().as_bytes(), ar.as_bytes()],
            0,
        ))
    }
}

#[async_trait]
impl Prover for TransparentProver {
    type Context = TransparentContext;

    async fn init_parameters(
        &self,
        spend_parameters: &[u8],
        output_parameters: &[u8],
    ) -> Result<(), ProverError> {
        let digest = Element::new(digest::<32>(&[spend_parameters, output_parameters], 0));

        // a second call with the same parameters is a no-op
        match *self.parameters.get_or_init(|| digest) == digest {
            true => Ok(()),
            false => Err(ProverError::msg("parameters were already initialized")),
        }
    }

    fn new_context(&self) -> Result<Self::Context, ProverError> {
        let rng = ChaChaRng::from_rng(rand::thread_rng()).map_err(ProverError::err)?;

        Ok(TransparentContext {
            rng,
            spend_rcvs: Vec::new(),
            output_rcvs: Vec::new(),
        })
    }

    async fn prepare_spend_description(
        &self,
        context: &mut Self::Context,
        spending_key: &SpendingKey,
        note: &InputNote,
        ar: Element,
        witness: &Witness,
    ) -> Result<UnsignedSpendDescription, ProverError> {
        let cm = note.commitment();

        // zero-value notes are exempt from the membership check, which is what makes dummy
        // inputs possible
        if note.value() > 0 && !witness.proves(cm) {
            return Err(ProverError::msg(format!(
                "commitment {cm} is not at position {} under root {}",
                witness.position(),
                witness.root()
            )));
        }

        let (cv, rcv) = context.value_commitment(note.value());
        context.spend_rcvs.push(rcv);

        let root = witness.root();
        let nullifier = note.nullifier(&spending_key.viewing_key());
        let rk = Self::randomized_key(spending_key, ar);

        let proof = proof(&[
            b"spend",
            cv.as_bytes(),
            root.as_bytes(),
            nullifier.as_bytes(),
            rk.as_bytes(),
        ]);

        Ok(UnsignedSpendDescription {
            cv,
            root,
            nullifier,
            rk,
            proof,
        })
    }

    async fn sign_spend_description(
        &self,
        description: UnsignedSpendDescription,
        spending_key: &SpendingKey,
        ar: Element,
        sighash: Element,
    ) -> Result<SpendDescription, ProverError> {
        if Self::randomized_key(spending_key, ar) != description.rk {
            return Err(ProverError::msg("spend was prepared with a different key"));
        }

        let signature = digest::<SIGNATURE_SIZE>(
            &[
                b"spend_auth",
                spending_key.authorizing_key().as_bytes(),
                ar.as_bytes(),
                sighash.as_bytes(),
            ],
            0,
        );

        Ok(description.sign(signature))
    }

    async fn prepare_output_description(
        &self,
        context: &mut Self::Context,
        address: &PaymentAddress,
        rcm: Element,
        esk: &[u8; 32],
        value: u64,
    ) -> Result<OutputProof, ProverError> {
        let cm = Note {
            address: *address,
            value,
            memo: Vec::new(),
            rcm,
        }
        .commitment();

        let (cv, rcv) = context.value_commitment(value);
        context.output_rcvs.push(rcv);

        let epk = PublicKey::from(&StaticSecret::from(*esk));
        let proof = proof(&[b"output", cv.as_bytes(), cm.as_bytes(), epk.as_bytes()]);

        Ok(OutputProof { cv, cm, proof })
    }

    async fn create_binding_signature(
        &self,
        context: &mut Self::Context,
        balance: i64,
        sighash: Element,
    ) -> Result<[u8; SIGNATURE_SIZE], ProverError> {
        let mut bsk = Personalization::TransparentProver.state();
        bsk.update(b"bsk");

        for rcv in &context.spend_rcvs {
            bsk.update(&[0]);
            bsk.update(rcv.as_bytes());
        }

        for rcv in &context.output_rcvs {
            bsk.update(&[1]);
            bsk.update(rcv.as_bytes());
        }

        let bsk = bsk.finalize();

        Ok(digest::<SIGNATURE_SIZE>(
            &[
                b"binding",
                bsk.as_bytes(),
                &balance.to_le_bytes(),
                sighash.as_bytes(),
            ],
            0,
        ))
    }
}
