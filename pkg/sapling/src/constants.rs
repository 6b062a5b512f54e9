/// Length of the diversifier part of a [`PaymentAddress`](crate::PaymentAddress)
pub const DIVERSIFIER_SIZE: usize = 11;

/// Length of a serialized [`PaymentAddress`](crate::PaymentAddress)
pub const PAYMENT_ADDRESS_SIZE: usize = DIVERSIFIER_SIZE + 32;

/// Length of a serialized [`ViewingKey`](crate::ViewingKey)
pub const VIEWING_KEY_SIZE: usize = 96;

/// Length of every zero-knowledge proof
pub const PROOF_SIZE: usize = 192;

/// Length of spend authorization and binding signatures
pub const SIGNATURE_SIZE: usize = 64;

/// Length of the ChaCha20-Poly1305 nonces in a [`Ciphertext`](crate::Ciphertext)
pub const NONCE_SIZE: usize = 12;

/// The memo size used by the shielded tez contract
pub const DEFAULT_MEMO_SIZE: usize = 8;
