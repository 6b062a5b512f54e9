//! Text forms of shielded (`zet1…`) and base-chain (`tz1…`, `tz2…`, `tz3…`) addresses
//!
//! Both are base58check strings: a fixed prefix, the payload, and a 4-byte checksum. The two
//! families are told apart by their leading characters alone, so a string can be classified
//! before it is decoded.

use std::{fmt, str::FromStr};

use sapling::{constants::PAYMENT_ADDRESS_SIZE, Error, PaymentAddress, Result};

const SHIELDED_PREFIX: [u8; 4] = [18, 71, 40, 223];
const SHIELDED_TEXT_LENGTH: usize = 69;
const BASE_CHAIN_TEXT_LENGTH: usize = 36;
const KEY_HASH_SIZE: usize = 20;

/// Packed michelson `address` tag bytes: `0x05` (packed data) then `0x0a` (bytes)
const PACKED_BYTES_TAG: [u8; 2] = [0x05, 0x0a];
const PACKED_ADDRESS_SIZE: u32 = 22;

fn is_base58_shaped(text: &str) -> bool {
    text.bytes().all(|c| c.is_ascii_alphanumeric() && c != b'0')
}

/// Whether `text` looks like a shielded address
///
/// ```rust
/// # use sapling_protocol::address::is_shielded_address;
/// assert!(!is_shielded_address("tz1"));
/// ```
pub fn is_shielded_address(text: &str) -> bool {
    text.len() == SHIELDED_TEXT_LENGTH && text.starts_with("zet1") && is_base58_shaped(text)
}

/// Whether `text` looks like an implicit base-chain account
pub fn is_base_chain_address(text: &str) -> bool {
    text.len() == BASE_CHAIN_TEXT_LENGTH
        && ["tz1", "tz2", "tz3"].iter().any(|p| text.starts_with(p))
        && is_base58_shaped(text)
}

pub fn encode_shielded_address(address: &PaymentAddress) -> String {
    let mut payload = Vec::with_capacity(SHIELDED_PREFIX.len() + PAYMENT_ADDRESS_SIZE);
    payload.extend_from_slice(&SHIELDED_PREFIX);
    payload.extend_from_slice(&address.to_bytes());

    bs58::encode(payload).with_check().into_string()
}

pub fn decode_shielded_address(text: &str) -> Result<PaymentAddress> {
    let invalid = || Error::InvalidRecipient(format!("expected a 'zet' address, got {text}"));

    if !is_shielded_address(text) {
        return Err(invalid());
    }

    let payload = bs58::decode(text)
        .with_check(None)
        .into_vec()
        .map_err(|_| invalid())?;

    match payload.strip_prefix(SHIELDED_PREFIX.as_slice()) {
        Some(bytes) => PaymentAddress::from_bytes(bytes),
        None => Err(invalid()),
    }
}

/// The signature scheme of an implicit account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    Ed25519,
    Secp256k1,
    P256,
}

impl Curve {
    const ALL: [Curve; 3] = [Curve::Ed25519, Curve::Secp256k1, Curve::P256];

    fn prefix(self) -> [u8; 3] {
        match self {
            Curve::Ed25519 => [6, 161, 159],
            Curve::Secp256k1 => [6, 161, 161],
            Curve::P256 => [6, 161, 164],
        }
    }

    fn tag(self) -> u8 {
        match self {
            Curve::Ed25519 => 0,
            Curve::Secp256k1 => 1,
            Curve::P256 => 2,
        }
    }
}

/// An implicit base-chain account: a curve and a 20-byte public key hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaseChainAddress {
    pub curve: Curve,
    pub key_hash: [u8; KEY_HASH_SIZE],
}

impl BaseChainAddress {
    /// The address as packed michelson data, the form bound into unshield transactions
    pub fn pack(&self) -> Vec<u8> {
        let mut packed = Vec::with_capacity(2 + 4 + PACKED_ADDRESS_SIZE as usize);
        packed.extend_from_slice(&PACKED_BYTES_TAG);
        packed.extend_from_slice(&PACKED_ADDRESS_SIZE.to_be_bytes());
        // implicit account
        packed.push(0);
        packed.push(self.curve.tag());
        packed.extend_from_slice(&self.key_hash);
        packed
    }

    /// The inverse of [`pack`](Self::pack), or `None` if `packed` is not a packed implicit
    /// account
    pub fn unpack(packed: &[u8]) -> Option<Self> {
        let rest = packed.strip_prefix(PACKED_BYTES_TAG.as_slice())?;
        let rest = rest.strip_prefix(PACKED_ADDRESS_SIZE.to_be_bytes().as_slice())?;
        let [0, tag, key_hash @ ..] = rest else {
            return None;
        };

        Some(Self {
            curve: *Curve::ALL.iter().find(|curve| curve.tag() == *tag)?,
            key_hash: key_hash.try_into().ok()?,
        })
    }
}

impl FromStr for BaseChainAddress {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let invalid = || Error::InvalidRecipient(format!("expected a 'tz' address, got {text}"));

        if !is_base_chain_address(text) {
            return Err(invalid());
        }

        let payload = bs58::decode(text)
            .with_check(None)
            .into_vec()
            .map_err(|_| invalid())?;

        Curve::ALL
            .into_iter()
            .find_map(|curve| {
                let key_hash = payload.strip_prefix(curve.prefix().as_slice())?;
                Some(Self {
                    curve,
                    key_hash: key_hash.try_into().ok()?,
                })
            })
            .ok_or_else(invalid)
    }
}

impl fmt::Display for BaseChainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut payload = self.curve.prefix().to_vec();
        payload.extend_from_slice(&self.key_hash);

        f.write_str(&bs58::encode(payload).with_check().into_string())
    }
}
