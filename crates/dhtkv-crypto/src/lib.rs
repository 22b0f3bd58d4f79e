//! Cryptographic primitives for dhtkv.
//!
//! Provides domain-separated BLAKE3 key hashing, Ed25519 signing/verification,
//! and the owner [`Identity`] that signs mutable items.
//!
//! Hashing and signatures come from `blake3` and `ed25519-dalek`.

pub mod hasher;
pub mod identity;
pub mod signer;

pub use hasher::KeyHasher;
pub use identity::Identity;
pub use signer::{Signature, SignatureError, SigningKey, VerifyingKey};
