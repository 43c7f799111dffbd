use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::random::{EntropySource, random_array};
use crate::error::{CryptoError, Result};

/// Length of a generated salt.
pub const SALT_LEN: usize = 16;
pub const DEFAULT_ITERATIONS: u32 = 100_000;
pub const MIN_ITERATIONS: u32 = 10_000;
pub const MAX_ITERATIONS: u32 = 10_000_000;
pub const DEFAULT_KEY_LEN: usize = 32;
pub const MAX_KEY_LEN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
    output_len: usize,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            output_len: DEFAULT_KEY_LEN,
        }
    }
}

impl KdfParams {
    pub fn new(iterations: u32, output_len: usize) -> Result<Self> {
        let params = Self {
            iterations,
            output_len,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn output_len(&self) -> usize {
        self.output_len
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations < MIN_ITERATIONS {
            return Err(CryptoError::IterationCountTooLow {
                count: self.iterations,
                min: MIN_ITERATIONS,
            });
        }
        if self.iterations > MAX_ITERATIONS {
            return Err(CryptoError::IterationCountTooHigh {
                count: self.iterations,
                max: MAX_ITERATIONS,
            });
        }
        if self.output_len == 0 || self.output_len > MAX_KEY_LEN {
            return Err(CryptoError::InvalidLength(format!(
                "derived key length must be between 1 and {MAX_KEY_LEN} bytes, got {}",
                self.output_len
            )));
        }
        Ok(())
    }
}

/// A derived key together with the salt that produced it.
pub struct DerivedKey {
    key: Zeroizing<Vec<u8>>,
    salt: Vec<u8>,
    salt_generated: bool,
}

impl DerivedKey {
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// True when the salt was generated here; the caller must store it.
    pub fn salt_generated(&self) -> bool {
        self.salt_generated
    }
}

pub fn generate_salt(source: &impl EntropySource) -> Result<[u8; SALT_LEN]> {
    random_array::<SALT_LEN>(source)
}

/// PBKDF2-HMAC-SHA256.
///
/// Without a salt, a fresh [`SALT_LEN`]-byte salt is generated and returned.
pub fn derive_key(
    password: &[u8],
    salt: Option<&[u8]>,
    kdf: KdfParams,
    source: &impl EntropySource,
) -> Result<DerivedKey> {
    if password.is_empty() {
        return Err(CryptoError::EmptyPassword);
    }
    kdf.validate()?;

    let (salt, salt_generated) = match salt {
        Some([]) => return Err(CryptoError::InvalidSalt("salt cannot be empty".into())),
        Some(s) => (s.to_vec(), false),
        None => (generate_salt(source)?.to_vec(), true),
    };

    let mut key = Zeroizing::new(vec![0u8; kdf.output_len]);
    pbkdf2_hmac::<Sha256>(password, &salt, kdf.iterations, &mut key);

    tracing::debug!(
        iterations = kdf.iterations,
        len = kdf.output_len,
        salt_generated,
        "derived key"
    );

    Ok(DerivedKey {
        key,
        salt,
        salt_generated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::random::OsEntropy;
    use crate::crypto::random::testing::FixedEntropy;

    const SALT: &[u8] = &[1, 2, 3, 4, 5, 6, 7, 8];

    #[test]
    fn kdf_is_deterministic() {
        let kdf = KdfParams::default();

        let k1 = derive_key(b"secret", Some(SALT), kdf, &OsEntropy).unwrap();
        let k2 = derive_key(b"secret", Some(SALT), kdf, &OsEntropy).unwrap();

        assert_eq!(k1.key(), k2.key());
        assert_eq!(k1.key().len(), DEFAULT_KEY_LEN);
        assert!(!k1.salt_generated());
        assert_eq!(k1.salt(), SALT);
    }

    #[test]
    fn matches_rfc7914_vector() {
        // RFC 7914 section 11, c = 1. The public API refuses this count.
        let mut out = [0u8; 64];
        pbkdf2_hmac::<Sha256>(b"passwd", b"salt", 1, &mut out);
        assert_eq!(
            hex::encode(out),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc49ca9cccf179b645991664b39d77ef317c71b845b1e30bd509112041d3a19783"
        );
    }

    #[test]
    fn kdf_params_affect_output() {
        let k1 = derive_key(b"pw", Some(SALT), KdfParams::new(10_000, 32).unwrap(), &OsEntropy)
            .unwrap();
        let k2 = derive_key(b"pw", Some(SALT), KdfParams::new(20_000, 32).unwrap(), &OsEntropy)
            .unwrap();
        assert_ne!(k1.key(), k2.key());
    }

    #[test]
    fn shorter_output_is_prefix() {
        let short = derive_key(b"pw", Some(SALT), KdfParams::new(10_000, 16).unwrap(), &OsEntropy)
            .unwrap();
        let long = derive_key(b"pw", Some(SALT), KdfParams::new(10_000, 64).unwrap(), &OsEntropy)
            .unwrap();
        assert_eq!(short.key(), &long.key()[..16]);
    }

    #[test]
    fn missing_salt_is_generated_from_source() {
        let kdf = KdfParams::new(MIN_ITERATIONS, 32).unwrap();
        let derived = derive_key(b"pw", None, kdf, &FixedEntropy::new(&[0x11])).unwrap();

        assert!(derived.salt_generated());
        assert_eq!(derived.salt(), [0x11u8; SALT_LEN]);

        let replay = derive_key(b"pw", Some(derived.salt()), kdf, &OsEntropy).unwrap();
        assert_eq!(replay.key(), derived.key());
    }

    #[test]
    fn fresh_salts_differ() {
        let kdf = KdfParams::new(MIN_ITERATIONS, 32).unwrap();
        let a = derive_key(b"pw", None, kdf, &OsEntropy).unwrap();
        let b = derive_key(b"pw", None, kdf, &OsEntropy).unwrap();
        assert_ne!(a.salt(), b.salt());
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn kdf_invalid_params_fail_gracefully() {
        assert!(matches!(
            KdfParams::new(9_999, 32),
            Err(CryptoError::IterationCountTooLow { count: 9_999, .. })
        ));
        assert!(matches!(
            KdfParams::new(MAX_ITERATIONS + 1, 32),
            Err(CryptoError::IterationCountTooHigh { .. })
        ));
        assert!(matches!(
            KdfParams::new(DEFAULT_ITERATIONS, 0),
            Err(CryptoError::InvalidLength(_))
        ));
        assert!(matches!(
            KdfParams::new(DEFAULT_ITERATIONS, MAX_KEY_LEN + 1),
            Err(CryptoError::InvalidLength(_))
        ));
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let kdf = KdfParams::default();
        assert!(matches!(
            derive_key(b"", Some(SALT), kdf, &OsEntropy),
            Err(CryptoError::EmptyPassword)
        ));
        assert!(matches!(
            derive_key(b"pw", Some(b"".as_slice()), kdf, &OsEntropy),
            Err(CryptoError::InvalidSalt(_))
        ));
    }
}
