//! Streaming message digests over a fixed set of algorithms.

use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

use blake2::Blake2b512;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest as _, Sha256, Sha384, Sha512};
use sha3::Sha3_256;

use super::encoding;
use crate::error::{CryptoError, Result};

/// Size of the window [`hash_reader`] reads at a time.
pub const CHUNK_LEN: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
    Sha3_256,
    Blake2b,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 7] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
        HashAlgorithm::Sha3_256,
        HashAlgorithm::Blake2b,
    ];

    /// Canonical wire identifier.
    pub fn id(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Sha3_256 => "sha3_256",
            HashAlgorithm::Blake2b => "blake2b",
        }
    }

    /// Digest length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 | HashAlgorithm::Sha3_256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 | HashAlgorithm::Blake2b => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CryptoError;

    /// Case-insensitive; `-` and `_` separators are ignored (`SHA3-256`, `sha-256`).
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "sha3256" => Ok(HashAlgorithm::Sha3_256),
            "blake2b" | "blake2b512" => Ok(HashAlgorithm::Blake2b),
            _ => Err(CryptoError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Supported algorithms, in a fixed order.
pub fn algorithms() -> &'static [HashAlgorithm] {
    &HashAlgorithm::ALL
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    algorithm: HashAlgorithm,
    bytes: Vec<u8>,
}

impl Digest {
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        encoding::encode_hex(&self.bytes)
    }
}

enum State {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
    Sha3_256(Sha3_256),
    Blake2b(Blake2b512),
}

/// Running digest state. Feed chunks with [`Hasher::update`].
pub struct Hasher {
    algorithm: HashAlgorithm,
    state: State,
}

impl Hasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let state = match algorithm {
            HashAlgorithm::Md5 => State::Md5(Md5::new()),
            HashAlgorithm::Sha1 => State::Sha1(Sha1::new()),
            HashAlgorithm::Sha256 => State::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => State::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => State::Sha512(Sha512::new()),
            HashAlgorithm::Sha3_256 => State::Sha3_256(Sha3_256::new()),
            HashAlgorithm::Blake2b => State::Blake2b(Blake2b512::new()),
        };
        Self { algorithm, state }
    }

    pub fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            State::Md5(h) => h.update(data),
            State::Sha1(h) => h.update(data),
            State::Sha256(h) => h.update(data),
            State::Sha384(h) => h.update(data),
            State::Sha512(h) => h.update(data),
            State::Sha3_256(h) => h.update(data),
            State::Blake2b(h) => h.update(data),
        }
    }

    pub fn finalize(self) -> Digest {
        let bytes = match self.state {
            State::Md5(h) => h.finalize().to_vec(),
            State::Sha1(h) => h.finalize().to_vec(),
            State::Sha256(h) => h.finalize().to_vec(),
            State::Sha384(h) => h.finalize().to_vec(),
            State::Sha512(h) => h.finalize().to_vec(),
            State::Sha3_256(h) => h.finalize().to_vec(),
            State::Blake2b(h) => h.finalize().to_vec(),
        };
        Digest {
            algorithm: self.algorithm,
            bytes,
        }
    }
}

/// Fold a sequence of chunks into one digest.
pub fn hash<I, C>(chunks: I, algorithm: HashAlgorithm) -> Digest
where
    I: IntoIterator<Item = C>,
    C: AsRef<[u8]>,
{
    let mut hasher = Hasher::new(algorithm);
    for chunk in chunks {
        hasher.update(chunk.as_ref());
    }
    hasher.finalize()
}

/// Digest everything `reader` yields, holding at most [`CHUNK_LEN`] bytes at once.
pub fn hash_reader<R: Read>(mut reader: R, algorithm: HashAlgorithm) -> Result<Digest> {
    let mut hasher = Hasher::new(algorithm);
    let mut buf = vec![0u8; CHUNK_LEN];
    let mut total: u64 = 0;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buf[..n]);
        total += n as u64;
    }

    tracing::debug!(%algorithm, bytes = total, "hashed stream");
    Ok(hasher.finalize())
}
