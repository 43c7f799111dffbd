//! Request/response boundary.
//!
//! One handler per operation. Requests and responses are serde types shaped like the
//! JSON bodies callers exchange; binary fields are URL-safe base64, digests are hex.
//! Secret-bearing bodies are wiped on drop.

use std::io::Read;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{
    CipherPayload, EntropySource, HashAlgorithm, KdfParams, OsEntropy, SymmetricKey, aead,
    asymmetric, encoding, hash, kdf, random,
};
use crate::error::{CryptoError, Result};

const DEFAULT_HASH: HashAlgorithm = HashAlgorithm::Sha256;

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeyResponse {
    pub key: String,
}

#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricEncryptRequest {
    pub plaintext: String,
    pub key: String,
}

#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricDecryptRequest {
    pub ciphertext: String,
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CiphertextResponse {
    pub ciphertext: String,
}

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct PlaintextResponse {
    pub plaintext: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct KeyPairRequest {
    pub key_size: Option<usize>,
}

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeyPairResponse {
    pub public_key: String,
    pub private_key: String,
}

#[derive(Debug, Deserialize)]
pub struct AsymmetricEncryptRequest {
    pub plaintext: String,
    pub public_key: String,
}

#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct AsymmetricDecryptRequest {
    pub ciphertext: String,
    pub private_key: String,
}

#[derive(Debug, Deserialize)]
pub struct HashTextRequest {
    pub text: String,
    pub algorithm: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HashResponse {
    pub algorithm: HashAlgorithm,
    pub hash: String,
    /// Set for algorithms kept only for compatibility (md5, sha1).
    pub weak: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct RandomBytesRequest {
    pub length: Option<i64>,
}

#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct DeriveKeyRequest {
    pub password: String,
    pub salt: Option<String>,
    pub length: Option<i64>,
    pub iterations: Option<u32>,
}

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct DeriveKeyResponse {
    pub key: String,
    pub salt: String,
    pub salt_generated: bool,
}

/// Error body: the stable kind plus a human-readable detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
}

impl From<&CryptoError> for ErrorResponse {
    fn from(err: &CryptoError) -> Self {
        Self {
            error: err.code().to_string(),
            detail: err.to_string(),
        }
    }
}

/// MD5 and SHA-1 are offered for compatibility only.
pub fn is_weak(algorithm: HashAlgorithm) -> bool {
    matches!(algorithm, HashAlgorithm::Md5 | HashAlgorithm::Sha1)
}

fn parse_algorithm(name: Option<&str>) -> Result<HashAlgorithm> {
    match name {
        Some(name) => name.parse(),
        None => Ok(DEFAULT_HASH),
    }
}

fn to_length(value: i64, what: &str) -> Result<usize> {
    usize::try_from(value)
        .ok()
        .filter(|len| *len > 0)
        .ok_or_else(|| CryptoError::InvalidLength(format!("{what} must be positive, got {value}")))
}

fn into_text(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| CryptoError::NotUtf8)
}

/// Every operation, bound to one entropy source.
#[derive(Debug, Clone, Default)]
pub struct CryptoApi<S: EntropySource = OsEntropy> {
    entropy: S,
}

impl CryptoApi<OsEntropy> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: EntropySource> CryptoApi<S> {
    pub fn with_entropy(entropy: S) -> Self {
        Self { entropy }
    }

    pub fn generate_symmetric_key(&self) -> Result<KeyResponse> {
        let key = aead::generate_key(&self.entropy)?;
        Ok(KeyResponse { key: key.encode() })
    }

    pub fn symmetric_encrypt(&self, req: &SymmetricEncryptRequest) -> Result<CiphertextResponse> {
        let key = SymmetricKey::from_encoded(&req.key)?;
        let payload = aead::encrypt(req.plaintext.as_bytes(), &key, &self.entropy)?;
        Ok(CiphertextResponse {
            ciphertext: payload.to_token(),
        })
    }

    pub fn symmetric_decrypt(&self, req: &SymmetricDecryptRequest) -> Result<PlaintextResponse> {
        let key = SymmetricKey::from_encoded(&req.key)?;
        let payload = CipherPayload::from_token(&req.ciphertext)?;
        let plaintext = aead::decrypt(&payload, &key)?;
        Ok(PlaintextResponse {
            plaintext: into_text(&plaintext)?,
        })
    }

    pub fn generate_key_pair(&self, req: &KeyPairRequest) -> Result<KeyPairResponse> {
        let bits = req.key_size.unwrap_or(asymmetric::DEFAULT_KEY_SIZE);
        let pair = asymmetric::generate_key_pair(bits, &self.entropy)?;
        Ok(KeyPairResponse {
            public_key: pair.public_pem().to_string(),
            private_key: pair.private_pem().to_string(),
        })
    }

    pub fn asymmetric_encrypt(&self, req: &AsymmetricEncryptRequest) -> Result<CiphertextResponse> {
        let ciphertext =
            asymmetric::encrypt(req.plaintext.as_bytes(), &req.public_key, &self.entropy)?;
        Ok(CiphertextResponse {
            ciphertext: encoding::encode(&ciphertext),
        })
    }

    pub fn asymmetric_decrypt(&self, req: &AsymmetricDecryptRequest) -> Result<PlaintextResponse> {
        // Key format problems are reported before anything about the ciphertext.
        let private = asymmetric::parse_private_key(&req.private_key)?;
        let ciphertext = encoding::decode(&req.ciphertext, "ciphertext")
            .map_err(|_| CryptoError::DecryptionError)?;
        let plaintext = asymmetric::decrypt_with_key(&ciphertext, &private, &self.entropy)?;
        Ok(PlaintextResponse {
            plaintext: into_text(&plaintext)?,
        })
    }

    pub fn hash_algorithms(&self) -> Vec<&'static str> {
        hash::algorithms().iter().map(HashAlgorithm::id).collect()
    }

    pub fn hash_text(&self, req: &HashTextRequest) -> Result<HashResponse> {
        let algorithm = parse_algorithm(req.algorithm.as_deref())?;
        let digest = hash::hash([req.text.as_bytes()], algorithm);
        Ok(HashResponse {
            algorithm,
            hash: digest.to_hex(),
            weak: is_weak(algorithm),
        })
    }

    /// Stream `reader` through the digest without buffering it whole.
    pub fn hash_file<R: Read>(&self, reader: R, algorithm: Option<&str>) -> Result<HashResponse> {
        let algorithm = parse_algorithm(algorithm)?;
        let digest = hash::hash_reader(reader, algorithm)?;
        Ok(HashResponse {
            algorithm,
            hash: digest.to_hex(),
            weak: is_weak(algorithm),
        })
    }

    pub fn random_bytes(&self, req: &RandomBytesRequest) -> Result<KeyResponse> {
        let length = match req.length {
            Some(len) => to_length(len, "length")?,
            None => random::DEFAULT_RANDOM_LEN,
        };
        let bytes = random::generate(length, &self.entropy)?;
        Ok(KeyResponse {
            key: encoding::encode(&bytes),
        })
    }

    pub fn derive_key(&self, req: &DeriveKeyRequest) -> Result<DeriveKeyResponse> {
        if req.password.is_empty() {
            return Err(CryptoError::EmptyPassword);
        }

        let length = match req.length {
            Some(len) => to_length(len, "length")?,
            None => kdf::DEFAULT_KEY_LEN,
        };
        let iterations = req.iterations.unwrap_or(kdf::DEFAULT_ITERATIONS);
        let params = KdfParams::new(iterations, length)?;

        let salt = req
            .salt
            .as_deref()
            .map(|s| {
                encoding::decode(s, "salt")
                    .map_err(|_| CryptoError::InvalidSalt("salt is not valid base64".into()))
            })
            .transpose()?;

        let derived = kdf::derive_key(
            req.password.as_bytes(),
            salt.as_deref(),
            params,
            &self.entropy,
        )?;

        Ok(DeriveKeyResponse {
            key: encoding::encode(derived.key()),
            salt: encoding::encode(derived.salt()),
            salt_generated: derived.salt_generated(),
        })
    }
}
