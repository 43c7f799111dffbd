//! Cryptographic primitives for the engine.
//!
//! Provides random generation, symmetric and asymmetric encryption, hashing, and
//! key derivation. Every operation is a stateless function; randomness is passed in
//! as an [`EntropySource`].

pub mod aead;
pub mod asymmetric;
pub mod encoding;
pub mod hash;
pub mod kdf;
pub mod random;

pub use aead::{CipherPayload, SymmetricKey};
pub use asymmetric::KeyPair;
pub use hash::{Digest, HashAlgorithm, Hasher};
pub use kdf::{DerivedKey, KdfParams};
pub use random::{EntropySource, OsEntropy};
