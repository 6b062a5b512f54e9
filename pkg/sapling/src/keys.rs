use core::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use sapling_primitives::{hash_bytes, Element, Personalization};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::{
    constants::{DIVERSIFIER_SIZE, PAYMENT_ADDRESS_SIZE, VIEWING_KEY_SIZE},
    Error, Result,
};

/// Implement `Display`, `FromStr` and hex string serde for a type with `to_bytes`/`from_bytes`
macro_rules! hex_string {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.to_bytes()))
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
                    .map_err(|e| Error::InvalidKey(e.to_string()))?;
                Self::from_bytes(&bytes)
            }
        }

        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Fold a 64-byte seed into 32 bytes by XORing its two halves together
///
/// Wallets derive a 64-byte seed from a mnemonic, but spending keys are 32 bytes
///
/// ```rust
/// # use sapling::xor_seed_halves;
/// let mut seed = [0; 64];
/// seed[0] = 0b1100;
/// seed[32] = 0b1010;
///
/// assert_eq!(xor_seed_halves(&seed)[0], 0b0110);
/// ```
#[must_use]
pub fn xor_seed_halves(seed: &[u8; 64]) -> [u8; 32] {
    let (first, second) = seed.split_at(32);
    let mut folded = [0; 32];

    for (out, (a, b)) in folded.iter_mut().zip(first.iter().zip(second)) {
        *out = a ^ b;
    }

    folded
}

fn expand(key: &[u8; 32], domain: &[u8]) -> [u8; 32] {
    hash_bytes(Personalization::KeyDerivation, [key.as_slice(), domain]).to_bytes()
}

/// The capability to spend notes
///
/// Everything else is derived from it: the [`ViewingKey`], and through that every
/// [`PaymentAddress`] of the wallet
#[derive(Clone, PartialEq, Eq)]
pub struct SpendingKey([u8; 32]);

impl fmt::Debug for SpendingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SpendingKey(..)")
    }
}

impl SpendingKey {
    /// Wrap raw key bytes
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a spending key from a 64-byte mnemonic seed
    pub fn from_seed(seed: &[u8; 64]) -> Self {
        Self(xor_seed_halves(seed))
    }

    /// Parse from a byte slice, which must be 32 bytes long
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        <[u8; 32]>::try_from(bytes)
            .map(Self)
            .map_err(|_| Error::InvalidKey(format!("expected 32 bytes, got {}", bytes.len())))
    }

    /// A fresh random key
    pub fn random(mut rng: impl rand::RngCore) -> Self {
        let mut bytes = [0; 32];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The key that authorizes spends, never leaves the signer
    pub fn authorizing_key(&self) -> Element {
        Element::new(expand(&self.0, b"ask"))
    }

    /// The public counterpart of [`SpendingKey::authorizing_key`]
    pub fn validating_key(&self) -> Element {
        Element::new(expand(self.authorizing_key().as_bytes(), b"ak"))
    }

    /// The viewing key, which can recognise but not spend this key's notes
    pub fn viewing_key(&self) -> ViewingKey {
        ViewingKey {
            incoming: expand(&self.0, b"ivk"),
            outgoing: expand(&self.0, b"ovk"),
            nullifier: Element::new(expand(&self.0, b"nk")),
        }
    }
}

/// The capability to recognise notes
///
/// A viewing key has three parts:
///  - the incoming key, which trial-decrypts notes sent to the wallet
///  - the outgoing key, which recovers notes the wallet created for others
///  - the nullifier key, which tells whether a recognised note has been spent
///
/// ```rust
/// # use sapling::*;
/// let vk = SpendingKey::new([1; 32]).viewing_key();
///
/// let hex = vk.to_string();
/// let parsed: ViewingKey = hex.parse().unwrap();
///
/// assert_eq!(vk, parsed);
/// assert!(vk.owns(&vk.address(7)));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ViewingKey {
    incoming: [u8; 32],
    outgoing: [u8; 32],
    nullifier: Element,
}

impl fmt::Debug for ViewingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewingKey")
            .field("address", &self.default_address())
            .finish_non_exhaustive()
    }
}

hex_string!(ViewingKey);

impl ViewingKey {
    /// Same as [`SpendingKey::viewing_key`]
    pub fn from_spending_key(spending_key: &SpendingKey) -> Self {
        spending_key.viewing_key()
    }

    pub fn to_bytes(&self) -> [u8; VIEWING_KEY_SIZE] {
        let mut bytes = [0; VIEWING_KEY_SIZE];
        bytes[..32].copy_from_slice(&self.incoming);
        bytes[32..64].copy_from_slice(&self.outgoing);
        bytes[64..].copy_from_slice(self.nullifier.as_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes = <&[u8; VIEWING_KEY_SIZE]>::try_from(bytes).map_err(|_| {
            Error::InvalidKey(format!(
                "expected {VIEWING_KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;

        let mut incoming = [0; 32];
        let mut outgoing = [0; 32];
        let mut nullifier = [0; 32];
        incoming.copy_from_slice(&bytes[..32]);
        outgoing.copy_from_slice(&bytes[32..64]);
        nullifier.copy_from_slice(&bytes[64..]);

        Ok(Self {
            incoming,
            outgoing,
            nullifier: Element::new(nullifier),
        })
    }

    pub(crate) fn incoming_secret(&self) -> StaticSecret {
        StaticSecret::from(self.incoming)
    }

    pub(crate) fn outgoing_key(&self) -> &[u8; 32] {
        &self.outgoing
    }

    pub(crate) fn nullifier_key(&self) -> Element {
        self.nullifier
    }

    /// The transmission key shared by every diversified address of this key
    pub fn transmission_key(&self) -> [u8; 32] {
        PublicKey::from(&self.incoming_secret()).to_bytes()
    }

    /// The diversified address with the given index
    ///
    /// Every index yields a distinct address, and this key recognises notes sent to any of them
    pub fn address(&self, index: u64) -> PaymentAddress {
        let hash = hash_bytes(
            Personalization::KeyDerivation,
            [
                self.incoming.as_slice(),
                b"diversifier",
                &index.to_le_bytes(),
            ],
        );

        let mut diversifier = [0; DIVERSIFIER_SIZE];
        diversifier.copy_from_slice(&hash.as_bytes()[..DIVERSIFIER_SIZE]);

        PaymentAddress {
            diversifier,
            transmission_key: self.transmission_key(),
        }
    }

    pub fn default_address(&self) -> PaymentAddress {
        self.address(0)
    }

    /// The address after `index`, with its index, or `None` once the indices run out
    pub fn next_address(&self, index: u64) -> Option<(u64, PaymentAddress)> {
        let next = index.checked_add(1)?;
        Some((next, self.address(next)))
    }

    /// Whether `address` is one of this key's diversified addresses
    pub fn owns(&self, address: &PaymentAddress) -> bool {
        address.transmission_key == self.transmission_key()
    }
}

/// A shielded address: a diversifier plus the recipient's transmission key
#[derive(Clone, Copy, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub struct PaymentAddress {
    diversifier: [u8; DIVERSIFIER_SIZE],
    transmission_key: [u8; 32],
}

impl fmt::Debug for PaymentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PaymentAddress({self})")
    }
}

hex_string!(PaymentAddress);

impl PaymentAddress {
    pub fn new(diversifier: [u8; DIVERSIFIER_SIZE], transmission_key: [u8; 32]) -> Self {
        Self {
            diversifier,
            transmission_key,
        }
    }

    /// The default address of a throwaway key, used for dummy outputs
    pub fn random(rng: impl rand::RngCore) -> Self {
        SpendingKey::random(rng).viewing_key().default_address()
    }

    pub fn diversifier(&self) -> &[u8; DIVERSIFIER_SIZE] {
        &self.diversifier
    }

    pub fn transmission_key(&self) -> &[u8; 32] {
        &self.transmission_key
    }

    pub fn to_bytes(&self) -> [u8; PAYMENT_ADDRESS_SIZE] {
        let mut bytes = [0; PAYMENT_ADDRESS_SIZE];
        bytes[..DIVERSIFIER_SIZE].copy_from_slice(&self.diversifier);
        bytes[DIVERSIFIER_SIZE..].copy_from_slice(&self.transmission_key);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PAYMENT_ADDRESS_SIZE {
            return Err(Error::InvalidRecipient(format!(
                "expected {PAYMENT_ADDRESS_SIZE} address bytes, got {}",
                bytes.len()
            )));
        }

        let mut diversifier = [0; DIVERSIFIER_SIZE];
        let mut transmission_key = [0; 32];
        diversifier.copy_from_slice(&bytes[..DIVERSIFIER_SIZE]);
        transmission_key.copy_from_slice(&bytes[DIVERSIFIER_SIZE..]);

        Ok(Self {
            diversifier,
            transmission_key,
        })
    }
}
