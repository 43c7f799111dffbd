//! Secure random byte generation.
//!
//! All randomness in the engine flows through an [`EntropySource`], so tests can
//! substitute a fixed byte sequence while production code reads the OS generator.

use crate::error::{CryptoError, Result};
use zeroize::Zeroizing;

/// Upper bound on a single random byte request.
pub const MAX_RANDOM_LEN: usize = 1024;
/// Default length for random byte requests.
pub const DEFAULT_RANDOM_LEN: usize = 32;

/// A source of cryptographically secure random bytes.
pub trait EntropySource {
    /// Fill `buf` entirely with random bytes.
    fn fill(&self, buf: &mut [u8]) -> Result<()>;
}

/// The operating system's CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<()> {
        getrandom::fill(buf).map_err(|_| CryptoError::EntropyUnavailable)
    }
}

impl<S: EntropySource + ?Sized> EntropySource for &S {
    fn fill(&self, buf: &mut [u8]) -> Result<()> {
        (**self).fill(buf)
    }
}

/// Generate exactly `length` random bytes.
pub fn generate(length: usize, source: &impl EntropySource) -> Result<Zeroizing<Vec<u8>>> {
    if length == 0 || length > MAX_RANDOM_LEN {
        return Err(CryptoError::InvalidLength(format!(
            "random length must be between 1 and {MAX_RANDOM_LEN} bytes, got {length}"
        )));
    }

    let mut buf = Zeroizing::new(vec![0u8; length]);
    source.fill(&mut buf)?;
    tracing::debug!(length, "generated random bytes");
    Ok(buf)
}

/// Fixed-size variant of [`generate`] for nonces and salts.
pub(crate) fn random_array<const N: usize>(source: &impl EntropySource) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    source.fill(&mut buf)?;
    Ok(buf)
}

/// Fails with `EntropyUnavailable` if `source` cannot produce a byte.
///
/// Callers handing the source to [`EntropyRng`] run this first, since the adapter
/// can only panic once the RSA backend is drawing from it.
pub(crate) fn ensure_available(source: &impl EntropySource) -> Result<()> {
    source.fill(&mut [0u8; 1])
}

/// Adapts an [`EntropySource`] to the `rand_core` traits the RSA backend expects.
pub(crate) struct EntropyRng<'a, S: EntropySource + ?Sized> {
    source: &'a S,
}

impl<'a, S: EntropySource + ?Sized> EntropyRng<'a, S> {
    pub(crate) fn new(source: &'a S) -> Self {
        Self { source }
    }
}

impl<S: EntropySource + ?Sized> rand_core::RngCore for EntropyRng<'_, S> {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        // Same contract as rand_core::OsRng: an entropy failure mid-operation is fatal.
        if let Err(err) = self.try_fill_bytes(dest) {
            panic!("entropy source failed: {err}");
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
        self.source.fill(dest).map_err(rand_core::Error::new)
    }
}

impl<S: EntropySource + ?Sized> rand_core::CryptoRng for EntropyRng<'_, S> {}


#[cfg(test)]
mod tests {
    use super::testing::{BrokenEntropy, FixedEntropy};
    use super::*;

    #[test]
    fn generates_exact_length() {
        for len in [1, 16, 32, 64, MAX_RANDOM_LEN] {
            assert_eq!(generate(len, &OsEntropy).unwrap().len(), len);
        }
    }

    #[test]
    fn zero_and_oversized_lengths_fail() {
        assert!(matches!(
            generate(0, &OsEntropy),
            Err(CryptoError::InvalidLength(_))
        ));
        assert!(matches!(
            generate(MAX_RANDOM_LEN + 1, &OsEntropy),
            Err(CryptoError::InvalidLength(_))
        ));
    }

    #[test]
    fn os_entropy_outputs_differ() {
        let a = generate(32, &OsEntropy).unwrap();
        let b = generate(32, &OsEntropy).unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn fixed_source_is_replayed() {
        let source = FixedEntropy::new(&[1, 2, 3]);
        let bytes = generate(5, &source).unwrap();
        assert_eq!(*bytes, vec![1, 2, 3, 1, 2]);
    }

    #[test]
    fn broken_source_surfaces_error() {
        assert!(matches!(
            generate(8, &BrokenEntropy),
            Err(CryptoError::EntropyUnavailable)
        ));
        assert!(matches!(
            ensure_available(&BrokenEntropy),
            Err(CryptoError::EntropyUnavailable)
        ));
        assert!(ensure_available(&OsEntropy).is_ok());
    }

    #[test]
    fn rng_adapter_draws_from_source() {
        use rand_core::RngCore;

        let source = FixedEntropy::new(&[0xAB]);
        let mut rng = EntropyRng::new(&source);
        let mut buf = [0u8; 4];
        rng.fill_bytes(&mut buf);
        assert_eq!(buf, [0xAB; 4]);
    }
}
