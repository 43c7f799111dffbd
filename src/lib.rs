//! Stateless cryptographic operations: secure random bytes, AES-GCM, RSA-OAEP,
//! streaming digests and PBKDF2 key derivation.
//!
//! Every operation is a pure function of its inputs plus an [`EntropySource`].
//! Nothing is cached between calls.

pub mod api;
pub mod crypto;
mod error;

pub use crate::api::CryptoApi;
pub use crate::crypto::{
    CipherPayload, DerivedKey, Digest, EntropySource, HashAlgorithm, Hasher, KdfParams, KeyPair,
    OsEntropy, SymmetricKey,
};
pub use crate::error::{CryptoError, Result};
