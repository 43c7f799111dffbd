//! Authenticated symmetric encryption (AES-GCM).
//!
//! A token is `nonce || ciphertext || tag`. The cipher width follows the key length.

use std::fmt;

use aes_gcm::{
    Aes128Gcm, Aes256Gcm, AesGcm,
    aead::{Aead, AeadCore, KeyInit, consts::U12},
    aes::Aes192,
};
use zeroize::Zeroizing;

use super::encoding;
use super::random::{EntropySource, random_array};
use crate::error::{CryptoError, Result};

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Length of the per-call nonce (96 bits).
pub const NONCE_LEN: usize = 12;
/// Length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;
/// Length of keys produced by [`generate_key`].
pub const KEY_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrength {
    Aes128,
    Aes192,
    Aes256,
}

impl KeyStrength {
    fn from_len(len: usize) -> Option<Self> {
        match len {
            16 => Some(KeyStrength::Aes128),
            24 => Some(KeyStrength::Aes192),
            32 => Some(KeyStrength::Aes256),
            _ => None,
        }
    }
}

/// Symmetric key material. Wiped on drop.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: Zeroizing<Vec<u8>>,
    strength: KeyStrength,
}

impl SymmetricKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let strength = KeyStrength::from_len(bytes.len()).ok_or_else(|| {
            CryptoError::InvalidKey(format!(
                "key must be 16, 24 or 32 bytes, got {}",
                bytes.len()
            ))
        })?;

        Ok(Self {
            bytes: Zeroizing::new(bytes.to_vec()),
            strength,
        })
    }

    /// Parse a transport-encoded key.
    pub fn from_encoded(text: &str) -> Result<Self> {
        let bytes = Zeroizing::new(
            encoding::decode(text, "key")
                .map_err(|_| CryptoError::InvalidKey("key is not valid base64".into()))?,
        );
        Self::from_bytes(&bytes)
    }

    pub fn encode(&self) -> String {
        encoding::encode(&self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn strength(&self) -> KeyStrength {
        self.strength
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("strength", &self.strength)
            .finish_non_exhaustive()
    }
}

/// Output of [`encrypt`]: everything needed to decrypt under the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherPayload {
    nonce: [u8; NONCE_LEN],
    sealed: Vec<u8>,
}

impl CipherPayload {
    pub const MIN_LEN: usize = NONCE_LEN + TAG_LEN;

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Ciphertext followed by the tag.
    pub fn sealed(&self) -> &[u8] {
        &self.sealed
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(NONCE_LEN + self.sealed.len());
        buf.extend_from_slice(&self.nonce);
        buf.extend_from_slice(&self.sealed);
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_LEN {
            return Err(CryptoError::MalformedPayload);
        }

        let (nonce, sealed) = data.split_at(NONCE_LEN);
        let nonce: [u8; NONCE_LEN] = nonce
            .try_into()
            .map_err(|_| CryptoError::MalformedPayload)?;

        Ok(Self {
            nonce,
            sealed: sealed.to_vec(),
        })
    }

    pub fn to_token(&self) -> String {
        encoding::encode(&self.to_bytes())
    }

    pub fn from_token(token: &str) -> Result<Self> {
        let data =
            encoding::decode(token, "ciphertext").map_err(|_| CryptoError::MalformedPayload)?;
        Self::from_bytes(&data)
    }
}

/// Generate a fresh 256-bit key.
pub fn generate_key(source: &impl EntropySource) -> Result<SymmetricKey> {
    let bytes = Zeroizing::new(random_array::<KEY_LEN>(source)?);
    SymmetricKey::from_bytes(&*bytes)
}

/// Encrypt plaintext under a fresh random nonce.
pub fn encrypt(
    plaintext: &[u8],
    key: &SymmetricKey,
    source: &impl EntropySource,
) -> Result<CipherPayload> {
    let nonce = random_array::<NONCE_LEN>(source)?;

    let sealed = match key.strength {
        KeyStrength::Aes128 => seal::<Aes128Gcm>(key.as_bytes(), &nonce, plaintext)?,
        KeyStrength::Aes192 => seal::<Aes192Gcm>(key.as_bytes(), &nonce, plaintext)?,
        KeyStrength::Aes256 => seal::<Aes256Gcm>(key.as_bytes(), &nonce, plaintext)?,
    };

    tracing::debug!(strength = ?key.strength, len = plaintext.len(), "sealed payload");
    Ok(CipherPayload { nonce, sealed })
}

/// Verify and decrypt. No plaintext is released unless the tag verifies.
pub fn decrypt(payload: &CipherPayload, key: &SymmetricKey) -> Result<Zeroizing<Vec<u8>>> {
    let plaintext = match key.strength {
        KeyStrength::Aes128 => open::<Aes128Gcm>(key.as_bytes(), payload)?,
        KeyStrength::Aes192 => open::<Aes192Gcm>(key.as_bytes(), payload)?,
        KeyStrength::Aes256 => open::<Aes256Gcm>(key.as_bytes(), payload)?,
    };
    Ok(Zeroizing::new(plaintext))
}

/// Decrypt a transport token.
pub fn decrypt_token(token: &str, key: &SymmetricKey) -> Result<Zeroizing<Vec<u8>>> {
    let payload = CipherPayload::from_token(token)?;
    decrypt(&payload, key)
}

fn seal<C>(key: &[u8], nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>>
where
    C: KeyInit + Aead + AeadCore<NonceSize = U12>,
{
    let cipher = C::new_from_slice(key)
        .map_err(|_| CryptoError::InvalidKey("key rejected by cipher".into()))?;

    cipher
        .encrypt(aes_gcm::aead::Nonce::<C>::from_slice(nonce), plaintext)
        .map_err(|_| CryptoError::EncryptionError)
}

fn open<C>(key: &[u8], payload: &CipherPayload) -> Result<Vec<u8>>
where
    C: KeyInit + Aead + AeadCore<NonceSize = U12>,
{
    let cipher = C::new_from_slice(key)
        .map_err(|_| CryptoError::InvalidKey("key rejected by cipher".into()))?;

    cipher
        .decrypt(
            aes_gcm::aead::Nonce::<C>::from_slice(&payload.nonce),
            payload.sealed.as_slice(),
        )
        .map_err(|_| CryptoError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::random::OsEntropy;
    use crate::crypto::random::testing::FixedEntropy;

    #[test]
    fn roundtrip_every_strength() {
        for len in [16, 24, 32] {
            let key = SymmetricKey::from_bytes(&vec![7u8; len]).unwrap();
            let payload = encrypt(b"hello world", &key, &OsEntropy).unwrap();
            assert_eq!(*decrypt(&payload, &key).unwrap(), b"hello world");
        }
    }

    #[test]
    fn key_length_selects_strength() {
        for (len, strength) in [
            (16, KeyStrength::Aes128),
            (24, KeyStrength::Aes192),
            (32, KeyStrength::Aes256),
        ] {
            let key = SymmetricKey::from_bytes(&vec![7u8; len]).unwrap();
            assert_eq!(key.strength(), strength);
        }
        assert_eq!(generate_key(&OsEntropy).unwrap().strength(), KeyStrength::Aes256);
    }

    #[test]
    fn token_layout() {
        let key = generate_key(&OsEntropy).unwrap();
        let payload = encrypt(b"abc", &key, &OsEntropy).unwrap();
        assert_eq!(payload.sealed().len(), 3 + TAG_LEN);

        let bytes = payload.to_bytes();
        assert_eq!(bytes.len(), NONCE_LEN + 3 + TAG_LEN);
        assert_eq!(&bytes[..NONCE_LEN], payload.nonce());
        assert_eq!(&bytes[NONCE_LEN..], payload.sealed());
    }

    #[test]
    fn nonce_comes_from_source() {
        let key = SymmetricKey::from_bytes(&[1u8; 32]).unwrap();
        let payload = encrypt(b"x", &key, &FixedEntropy::new(&[9])).unwrap();
        assert_eq!(payload.nonce(), &[9u8; NONCE_LEN]);
    }

    #[test]
    fn fixed_source_is_deterministic() {
        let key = SymmetricKey::from_bytes(&[1u8; 32]).unwrap();
        let a = encrypt(b"same", &key, &FixedEntropy::new(&[3, 4])).unwrap();
        let b = encrypt(b"same", &key, &FixedEntropy::new(&[3, 4])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let key = generate_key(&OsEntropy).unwrap();
        let other = generate_key(&OsEntropy).unwrap();
        let payload = encrypt(b"secret", &key, &OsEntropy).unwrap();

        assert!(matches!(
            decrypt(&payload, &other),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn invalid_key_lengths_fail() {
        for len in [0, 8, 15, 31, 33, 64] {
            assert!(matches!(
                SymmetricKey::from_bytes(&vec![0u8; len]),
                Err(CryptoError::InvalidKey(_))
            ));
        }
        assert!(matches!(
            SymmetricKey::from_encoded("%%%"),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn short_payload_is_malformed() {
        assert!(matches!(
            CipherPayload::from_bytes(&[0u8; CipherPayload::MIN_LEN - 1]),
            Err(CryptoError::MalformedPayload)
        ));
        assert!(matches!(
            CipherPayload::from_token("***"),
            Err(CryptoError::MalformedPayload)
        ));
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let key = generate_key(&OsEntropy).unwrap();
        let payload = encrypt(b"", &key, &OsEntropy).unwrap();
        assert_eq!(payload.to_bytes().len(), CipherPayload::MIN_LEN);
        assert!(decrypt(&payload, &key).unwrap().is_empty());
    }

    #[test]
    fn debug_does_not_print_key_bytes() {
        let key = SymmetricKey::from_bytes(&[0x42; 16]).unwrap();
        let printed = format!("{key:?}");
        assert!(!printed.contains("66"));
        assert!(printed.contains("Aes128"));
    }
}
