//! RSA key pairs and RSA-OAEP (SHA-256 digest and MGF1) encryption.

use std::fmt;

use rsa::{
    Oaep, RsaPrivateKey, RsaPublicKey,
    pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey},
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding},
    traits::PublicKeyParts,
};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::random::{EntropyRng, EntropySource, ensure_available};
use crate::error::{CryptoError, Result};

pub const DEFAULT_KEY_SIZE: usize = 2048;
pub const MIN_KEY_SIZE: usize = 2048;
/// The RSA backend refuses to load keys with a larger modulus.
pub const MAX_KEY_SIZE: usize = RsaPublicKey::MAX_SIZE;

/// SHA-256 output length, used by the OAEP bound.
const HASH_LEN: usize = 32;

/// A freshly generated key pair in PEM form.
///
/// The public key is SubjectPublicKeyInfo, the private key unencrypted PKCS#8.
pub struct KeyPair {
    public_pem: String,
    private_pem: Zeroizing<String>,
}

impl KeyPair {
    pub fn public_pem(&self) -> &str {
        &self.public_pem
    }

    pub fn private_pem(&self) -> &str {
        &self.private_pem
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_pem", &self.public_pem)
            .finish_non_exhaustive()
    }
}

/// Largest plaintext OAEP-SHA256 can carry for a modulus of `key_bytes` bytes.
pub fn max_plaintext_len(key_bytes: usize) -> usize {
    key_bytes.saturating_sub(2 * HASH_LEN + 2)
}

fn validate_key_size(bits: usize) -> Result<()> {
    if bits < MIN_KEY_SIZE {
        return Err(CryptoError::WeakKeySize {
            bits,
            min: MIN_KEY_SIZE,
        });
    }
    if bits > MAX_KEY_SIZE {
        return Err(CryptoError::KeySizeTooLarge {
            bits,
            max: MAX_KEY_SIZE,
        });
    }
    if bits % 8 != 0 {
        return Err(CryptoError::InvalidLength(format!(
            "key size must be a multiple of 8 bits, got {bits}"
        )));
    }
    Ok(())
}

pub fn generate_key_pair(bits: usize, source: &impl EntropySource) -> Result<KeyPair> {
    validate_key_size(bits)?;

    ensure_available(source)?;

    let mut rng = EntropyRng::new(source);
    let private =
        RsaPrivateKey::new(&mut rng, bits).map_err(|_| CryptoError::KeyGenerationFailed)?;
    let public = RsaPublicKey::from(&private);

    let private_pem = private
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|_| CryptoError::KeyGenerationFailed)?;
    let public_pem = public
        .to_public_key_pem(LineEnding::LF)
        .map_err(|_| CryptoError::KeyGenerationFailed)?;

    tracing::debug!(bits, "generated RSA key pair");
    Ok(KeyPair {
        public_pem,
        private_pem,
    })
}

/// Parse a public key from SPKI PEM, falling back to PKCS#1 PEM.
pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey> {
    let pem = pem.trim();
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|_| CryptoError::InvalidKeyFormat)
}

/// Parse a private key from PKCS#8 PEM, falling back to PKCS#1 PEM.
pub fn parse_private_key(pem: &str) -> Result<RsaPrivateKey> {
    let pem = pem.trim();
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|_| CryptoError::InvalidKeyFormat)
}

pub fn encrypt(
    plaintext: &[u8],
    public_pem: &str,
    source: &impl EntropySource,
) -> Result<Vec<u8>> {
    let public = parse_public_key(public_pem)?;

    let max = max_plaintext_len(public.size());
    if plaintext.len() > max {
        return Err(CryptoError::PlaintextTooLarge {
            len: plaintext.len(),
            max,
        });
    }

    ensure_available(source)?;
    let mut rng = EntropyRng::new(source);
    let ciphertext = public
        .encrypt(&mut rng, Oaep::new::<Sha256>(), plaintext)
        .map_err(|_| CryptoError::EncryptionError)?;

    tracing::debug!(key_bytes = public.size(), len = plaintext.len(), "rsa-oaep encrypt");
    Ok(ciphertext)
}

/// Decrypt with blinding. Every padding or length failure collapses into `DecryptionError`.
pub fn decrypt(
    ciphertext: &[u8],
    private_pem: &str,
    source: &impl EntropySource,
) -> Result<Zeroizing<Vec<u8>>> {
    let private = parse_private_key(private_pem)?;
    decrypt_with_key(ciphertext, &private, source)
}

/// [`decrypt`] for an already parsed key.
pub fn decrypt_with_key(
    ciphertext: &[u8],
    private: &RsaPrivateKey,
    source: &impl EntropySource,
) -> Result<Zeroizing<Vec<u8>>> {
    ensure_available(source)?;
    let mut rng = EntropyRng::new(source);
    let plaintext = private
        .decrypt_blinded(&mut rng, Oaep::new::<Sha256>(), ciphertext)
        .map_err(|_| CryptoError::DecryptionError)?;

    Ok(Zeroizing::new(plaintext))
}
