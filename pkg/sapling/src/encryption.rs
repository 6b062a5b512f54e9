//! Note encryption
//!
//! Every output carries its note encrypted twice:
//!
//! ```text
//! payload_enc = ChaCha20-Poly1305(KDF(ECDH(esk, pk_d), epk), diversifier || value || rcm || memo)
//! payload_out = ChaCha20-Poly1305(KDF(ovk, cv, cm, epk), pk_d || esk)
//! ```
//!
//! The recipient opens `payload_enc` with their incoming key. The sender opens `payload_out` with
//! their outgoing key, recovers `esk`, and from there `payload_enc`. Outputs that should not be
//! browsable by the sender are encrypted to a random outgoing key.

use borsh::{BorshDeserialize, BorshSerialize};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use sapling_primitives::{hash_bytes, Element, Personalization};
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::{
    constants::{DIVERSIFIER_SIZE, NONCE_SIZE},
    Error, Note, PaymentAddress, Result, ViewingKey,
};

const PLAINTEXT_HEADER: usize = DIVERSIFIER_SIZE + 8 + 32;

/// The encrypted note attached to an output
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Ciphertext {
    /// Value commitment of the output
    pub cv: Element,
    /// Ephemeral public key
    #[serde(with = "hex")]
    pub epk: [u8; 32],
    #[serde(with = "hex")]
    pub payload_enc: Vec<u8>,
    #[serde(with = "hex")]
    pub nonce_enc: [u8; NONCE_SIZE],
    #[serde(with = "hex")]
    pub payload_out: Vec<u8>,
    #[serde(with = "hex")]
    pub nonce_out: [u8; NONCE_SIZE],
}

fn random_nonce(rng: &mut impl rand::RngCore) -> [u8; NONCE_SIZE] {
    let mut nonce = [0; NONCE_SIZE];
    rng.fill_bytes(&mut nonce);
    nonce
}

fn note_key(shared_secret: &[u8; 32], epk: &[u8; 32]) -> Element {
    hash_bytes(
        Personalization::NoteEncryption,
        [shared_secret.as_slice(), epk],
    )
}

fn outgoing_cipher_key(ovk: &[u8; 32], cv: Element, cm: Element, epk: &[u8; 32]) -> Element {
    hash_bytes(
        Personalization::OutgoingCipherKey,
        [ovk.as_slice(), cv.as_bytes(), cm.as_bytes(), epk],
    )
}

fn seal(key: Element, nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> Result<Vec<u8>> {
    ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()))
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| Error::Encryption)
}

fn open(key: Element, nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> Option<Vec<u8>> {
    ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()))
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .ok()
}

/// Encrypt `note` to its recipient, and to the sender's outgoing key `ovk`
///
/// `esk` is the ephemeral secret that was also handed to the prover for this output, and `cv` is
/// the value commitment the prover returned
pub fn encrypt_note(
    note: &Note,
    esk: &[u8; 32],
    cv: Element,
    ovk: &[u8; 32],
    mut rng: impl rand::RngCore,
) -> Result<Ciphertext> {
    let secret = StaticSecret::from(*esk);
    let epk = PublicKey::from(&secret).to_bytes();
    let recipient = PublicKey::from(*note.address.transmission_key());
    let shared = secret.diffie_hellman(&recipient);

    let mut plaintext = Vec::with_capacity(PLAINTEXT_HEADER + note.memo.len());
    plaintext.extend_from_slice(note.address.diversifier());
    plaintext.extend_from_slice(&note.value.to_le_bytes());
    plaintext.extend_from_slice(note.rcm.as_bytes());
    plaintext.extend_from_slice(&note.memo);

    let nonce_enc = random_nonce(&mut rng);
    let payload_enc = seal(note_key(shared.as_bytes(), &epk), &nonce_enc, &plaintext)?;

    let mut out_plaintext = [0; 64];
    out_plaintext[..32].copy_from_slice(note.address.transmission_key());
    out_plaintext[32..].copy_from_slice(esk);

    let ock = outgoing_cipher_key(ovk, cv, note.commitment(), &epk);
    let nonce_out = random_nonce(&mut rng);
    let payload_out = seal(ock, &nonce_out, &out_plaintext)?;

    Ok(Ciphertext {
        cv,
        epk,
        payload_enc,
        nonce_enc,
        payload_out,
        nonce_out,
    })
}

fn parse_plaintext(plaintext: &[u8], transmission_key: [u8; 32]) -> Option<Note> {
    if plaintext.len() < PLAINTEXT_HEADER {
        return None;
    }

    let (diversifier, rest) = plaintext.split_at(DIVERSIFIER_SIZE);
    let (value, rest) = rest.split_at(8);
    let (rcm, memo) = rest.split_at(32);

    Some(Note {
        address: PaymentAddress::new(diversifier.try_into().ok()?, transmission_key),
        value: u64::from_le_bytes(value.try_into().ok()?),
        memo: memo.to_vec(),
        rcm: Element::from_slice(rcm)?,
    })
}

/// Trial-decrypt a note sent to `viewing_key`
///
/// Returns `None` if the ciphertext was not meant for this key, or if the decrypted note does not
/// match the published commitment `cm`
pub fn try_decrypt_incoming(
    viewing_key: &ViewingKey,
    cm: Element,
    ciphertext: &Ciphertext,
) -> Option<Note> {
    let shared = viewing_key
        .incoming_secret()
        .diffie_hellman(&PublicKey::from(ciphertext.epk));
    let key = note_key(shared.as_bytes(), &ciphertext.epk);

    let plaintext = open(key, &ciphertext.nonce_enc, &ciphertext.payload_enc)?;
    let note = parse_plaintext(&plaintext, viewing_key.transmission_key())?;

    (note.commitment() == cm).then_some(note)
}

/// Recover a note that `viewing_key` created, whoever it was sent to
///
/// Returns `None` for notes created by other keys, and for non-browsable outputs
pub fn try_decrypt_outgoing(
    viewing_key: &ViewingKey,
    cm: Element,
    ciphertext: &Ciphertext,
) -> Option<Note> {
    let ock = outgoing_cipher_key(
        viewing_key.outgoing_key(),
        ciphertext.cv,
        cm,
        &ciphertext.epk,
    );
    let out_plaintext = open(ock, &ciphertext.nonce_out, &ciphertext.payload_out)?;

    let transmission_key: [u8; 32] = out_plaintext.get(..32)?.try_into().ok()?;
    let esk: [u8; 32] = out_plaintext.get(32..64)?.try_into().ok()?;

    let shared = StaticSecret::from(esk).diffie_hellman(&PublicKey::from(transmission_key));
    let key = note_key(shared.as_bytes(), &ciphertext.epk);

    let plaintext = open(key, &ciphertext.nonce_enc, &ciphertext.payload_enc)?;
    let note = parse_plaintext(&plaintext, transmission_key)?;

    (note.commitment() == cm).then_some(note)
}

#[cfg(test)]
mod tests {
    use rand_chacha::{rand_core::SeedableRng, ChaChaRng};

    use crate::SpendingKey;

    use super::*;

    struct Fixture {
        sender: ViewingKey,
        recipient: ViewingKey,
        stranger: ViewingKey,
        note: Note,
        ciphertext: Ciphertext,
    }

    fn fixture(browsable: bool) -> Fixture {
        let mut rng = ChaChaRng::from_seed([5; 32]);
        let sender = SpendingKey::new([1; 32]).viewing_key();
        let recipient = SpendingKey::new([2; 32]).viewing_key();
        let stranger = SpendingKey::new([3; 32]).viewing_key();

        let note = Note {
            address: recipient.address(4),
            value: 1234,
            memo: b"memo".to_vec(),
            rcm: Element::random(&mut rng),
        };

        let ovk = match browsable {
            true => *sender.outgoing_key(),
            false => Element::random(&mut rng).to_bytes(),
        };

        let esk = Element::random(&mut rng).to_bytes();
        let cv = Element::random(&mut rng);
        let ciphertext = encrypt_note(&note, &esk, cv, &ovk, &mut rng).unwrap();

        Fixture {
            sender,
            recipient,
            stranger,
            note,
            ciphertext,
        }
    }

    #[test]
    fn recipient_decrypts_incoming() {
        let f = fixture(true);
        let cm = f.note.commitment();

        assert_eq!(
            try_decrypt_incoming(&f.recipient, cm, &f.ciphertext),
            Some(f.note.clone())
        );
        assert_eq!(try_decrypt_incoming(&f.sender, cm, &f.ciphertext), None);
        assert_eq!(try_decrypt_incoming(&f.stranger, cm, &f.ciphertext), None);
    }

    #[test]
    fn sender_recovers_browsable_outputs() {
        let f = fixture(true);
        let cm = f.note.commitment();

        assert_eq!(
            try_decrypt_outgoing(&f.sender, cm, &f.ciphertext),
            Some(f.note.clone())
        );
        assert_eq!(try_decrypt_outgoing(&f.recipient, cm, &f.ciphertext), None);
    }

    #[test]
    fn non_browsable_outputs_are_hidden_from_sender() {
        let f = fixture(false);
        let cm = f.note.commitment();

        assert_eq!(try_decrypt_outgoing(&f.sender, cm, &f.ciphertext), None);
        assert!(try_decrypt_incoming(&f.recipient, cm, &f.ciphertext).is_some());
    }

    #[test]
    fn commitment_mismatch_is_rejected() {
        let f = fixture(true);

        assert_eq!(
            try_decrypt_incoming(&f.recipient, Element::from_u64(1), &f.ciphertext),
            None
        );
    }

    #[test]
    fn ciphertext_json_uses_hex_fields() {
        let f = fixture(true);
        let json = serde_json::to_value(&f.ciphertext).unwrap();

        assert_eq!(json["epk"], hex::encode(f.ciphertext.epk));
        assert_eq!(
            serde_json::from_value::<Ciphertext>(json).unwrap(),
            f.ciphertext
        );
    }
}
