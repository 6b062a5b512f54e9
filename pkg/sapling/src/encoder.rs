//! The canonical binary form of a [`SaplingTransaction`]
//!
//! Fields are written in declaration order: the spends and the outputs (each a `u32` LE count
//! followed by the descriptions), the binding signature, the balance (`i64` LE), the root, the
//! bound data and the anti-replay tag (each a `u32` LE length followed by the bytes).
//! Fixed-size values are written as raw bytes, with no padding.
//!
//! Decoding rejects trailing bytes, so every transaction has exactly one encoding:
//! `encode(&decode(bytes)?)? == bytes` whenever `decode` succeeds.

use crate::{Error, Result, SaplingTransaction};

pub fn encode(transaction: &SaplingTransaction) -> Result<Vec<u8>> {
    borsh::to_vec(transaction).map_err(Error::Encode)
}

pub fn decode(bytes: &[u8]) -> Result<SaplingTransaction> {
    borsh::from_slice(bytes).map_err(Error::Decode)
}
