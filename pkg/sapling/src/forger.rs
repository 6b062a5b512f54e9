//! Assembling a [`SaplingTransaction`] from notes, with proofs from a [`Prover`]

use rand::RngCore;
use rand_chacha::{rand_core::SeedableRng, ChaChaRng};
use sapling_primitives::Element;

use crate::{
    encryption::encrypt_note, transaction::sighash, Error, InputNote, Note, OutputDescription,
    Prover, ProverError, Result, SaplingOutput, SaplingTransaction, SpendingKey, StateTree,
    UnsignedSpendDescription, ViewingKey,
};

fn require_key(spending_key: Option<&SpendingKey>) -> Result<&SpendingKey> {
    spending_key.ok_or_else(|| {
        Error::UnsupportedOperation("spending notes requires a spending key".to_owned())
    })
}

/// Value consumed minus value created
fn balance(ins: &[InputNote], outs: &[SaplingOutput]) -> Result<i64> {
    let consumed: i128 = ins.iter().map(|input| i128::from(input.value())).sum();
    let created: i128 = outs.iter().map(|output| i128::from(output.value)).sum();

    i64::try_from(consumed - created).map_err(|_| {
        Error::ValueOverflow(format!(
            "balance {} does not fit in 64 bits",
            consumed - created
        ))
    })
}

async fn prepare_spends<P: Prover>(
    prover: &P,
    context: &mut P::Context,
    spending_key: &SpendingKey,
    ins: &[InputNote],
    state_tree: &StateTree,
    rng: &mut ChaChaRng,
) -> Result<Vec<(UnsignedSpendDescription, Element)>> {
    let viewing_key = spending_key.viewing_key();
    let mut spends = Vec::with_capacity(ins.len());

    for input in ins {
        let ar = Element::random(&mut *rng);
        let witness = state_tree.witness(input.position)?;

        let description = prover
            .prepare_spend_description(context, spending_key, input, ar, &witness)
            .await?;

        if description.nullifier != input.nullifier(&viewing_key) {
            return Err(ProverError::msg(format!(
                "prover returned nullifier {} for the note at position {}",
                description.nullifier, input.position
            ))
            .into());
        }

        spends.push((description, ar));
    }

    Ok(spends)
}

async fn prepare_outputs<P: Prover>(
    prover: &P,
    context: &mut P::Context,
    viewing_key: Option<&ViewingKey>,
    outs: &[SaplingOutput],
    rng: &mut ChaChaRng,
) -> Result<Vec<OutputDescription>> {
    let mut outputs = Vec::with_capacity(outs.len());

    for output in outs {
        let rcm = Element::random(&mut *rng);
        let mut esk = [0; 32];
        rng.fill_bytes(&mut esk);

        let proof = prover
            .prepare_output_description(context, &output.address, rcm, &esk, output.value)
            .await?;

        let note = Note {
            address: output.address,
            value: output.value,
            memo: output.memo.clone(),
            rcm,
        };

        if proof.cm != note.commitment() {
            return Err(ProverError::msg(format!(
                "prover returned commitment {} for output {}",
                proof.cm,
                outputs.len()
            ))
            .into());
        }

        let ovk = match viewing_key {
            Some(viewing_key) if output.browsable => *viewing_key.outgoing_key(),
            _ => {
                let mut ovk = [0; 32];
                rng.fill_bytes(&mut ovk);
                ovk
            }
        };

        let ciphertext = encrypt_note(&note, &esk, proof.cv, &ovk, &mut *rng)?;

        outputs.push(OutputDescription {
            cm: proof.cm,
            proof: proof.proof,
            ciphertext,
        });
    }

    Ok(outputs)
}

/// Forge a transaction spending `ins` and creating `outs`
///
/// Every input is proven against `state_tree`, so each input's position must hold its
/// commitment there (zero-value dummies excepted). Spends and outputs keep the order they are
/// given in. The spend authorization signatures and the binding signature all cover the sighash,
/// which commits to `anti_replay`, every description, and `bound_data`.
///
/// Browsable outputs can be recovered later with the outgoing key of `spending_key`. Without a
/// spending key, e.g. when shielding, no output is browsable and `ins` must be empty.
///
/// Nothing is returned unless every prover call succeeds
#[tracing::instrument(
    skip_all,
    fields(inputs = ins.len(), outputs = outs.len(), root = %state_tree.root()),
    err
)]
pub async fn forge_sapling_transaction<P: Prover>(
    prover: &P,
    ins: &[InputNote],
    outs: &[SaplingOutput],
    state_tree: &StateTree,
    anti_replay: &[u8],
    bound_data: Option<&[u8]>,
    spending_key: Option<&SpendingKey>,
) -> Result<SaplingTransaction> {
    let balance = balance(ins, outs)?;
    let bound_data = bound_data.unwrap_or_default();

    let mut rng = ChaChaRng::from_entropy();
    let mut context = prover.new_context()?;

    let spends = match ins.is_empty() {
        true => Vec::new(),
        false => {
            let spending_key = require_key(spending_key)?;
            prepare_spends(
                prover,
                &mut context,
                spending_key,
                ins,
                state_tree,
                &mut rng,
            )
            .await?
        }
    };

    let viewing_key = spending_key.map(SpendingKey::viewing_key);
    let outputs = prepare_outputs(
        prover,
        &mut context,
        viewing_key.as_ref(),
        outs,
        &mut rng,
    )
    .await?;

    let unsigned: Vec<_> = spends
        .iter()
        .map(|(description, _)| description.clone())
        .collect();
    let sighash = sighash(&unsigned, &outputs, anti_replay, bound_data);

    let mut signed = Vec::with_capacity(spends.len());
    for (description, ar) in spends {
        let spending_key = require_key(spending_key)?;
        signed.push(
            prover
                .sign_spend_description(description, spending_key, ar, sighash)
                .await?,
        );
    }

    let binding_sig = prover
        .create_binding_signature(&mut context, balance, sighash)
        .await?;

    tracing::debug!(balance, %sighash, "forged sapling transaction");

    Ok(SaplingTransaction {
        spends: signed,
        outputs,
        binding_sig,
        balance,
        root: state_tree.root(),
        bound_data: bound_data.to_vec(),
        anti_replay: anti_replay.to_vec(),
    })
}
