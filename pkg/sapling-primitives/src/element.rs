use core::fmt;
use std::str::FromStr;

/// A 32-byte value stored in, or derived from, the note commitment tree
///
/// Commitments, nullifiers, tree roots and inner nodes are all [`Element`]s. The bytes are opaque:
/// no arithmetic is defined on them, they are only hashed, compared and serialized.
///
/// ```rust
/// # use sapling_primitives::*;
/// let element = Element::from_u64(7);
/// assert_eq!(element.to_hex(), format!("07{}", "00".repeat(31)));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[cfg_attr(feature = "borsh", derive(borsh::BorshSerialize, borsh::BorshDeserialize))]
pub struct Element([u8; 32]);

impl Element {
    /// The number of bytes in an [`Element`]
    pub const SIZE: usize = 32;

    /// An all-zero element, used as the value of an empty leaf
    pub const NULL_HASH: Self = Self([0; 32]);

    /// The placeholder leaf inserted into an empty tree when a root is required anyway
    pub const UNCOMMITTED: Self = {
        let mut bytes = [0; 32];
        bytes[0] = 1;
        Self(bytes)
    };

    /// Wrap raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Little-endian encoding of `value`, zero-extended to 32 bytes
    ///
    /// Mostly useful in tests, where recognisable leaves are easier to reason about
    #[inline]
    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0; 32];
        bytes[..8].copy_from_slice(&value.to_le_bytes());
        Self(bytes)
    }

    /// Borrow the underlying bytes
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Copy out the underlying bytes
    #[inline]
    #[must_use]
    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }

    /// Lowercase hex representation, without a `0x` prefix
    #[inline]
    #[must_use]
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a byte slice, which must be exactly 32 bytes long
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(bytes).ok().map(Self)
    }

    /// A uniformly random element
    #[cfg(feature = "rand")]
    #[must_use]
    pub fn random(mut rng: impl rand::RngCore) -> Self {
        let mut bytes = [0; 32];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl From<[u8; 32]> for Element {
    #[inline]
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Element> for [u8; 32] {
    #[inline]
    fn from(element: Element) -> Self {
        element.0
    }
}

impl AsRef<[u8]> for Element {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Element {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element({})", self.to_hex())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Element {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Element {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(any(test, feature = "proptest"))]
mod proptest_impls {
    use super::Element;
    use ::proptest::{arbitrary::StrategyFor, prelude::*, strategy::Map};

    impl Arbitrary for Element {
        type Strategy = Map<StrategyFor<[u8; 32]>, fn([u8; 32]) -> Self>;
        type Parameters = ();

        fn arbitrary_with((): Self::Parameters) -> Self::Strategy {
            any::<[u8; 32]>().prop_map(Element)
        }
    }
}
