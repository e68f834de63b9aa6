//! Cryptographic primitives: Blake2b-256 hashing, Ed25519 keys and
//! signatures, and address derivation.

pub mod address;
pub mod hash;
pub mod keys;
pub mod sign;

pub use address::{decode_address, derive_address, validate_address};
pub use hash::{blake2b_256, blake2b_256_multi};
pub use keys::{generate_keypair, keypair_from_seed};
pub use sign::{sign_message, verify_signature};
