use thiserror::Error;

/// Every failure the engine can report.
///
/// Integrity failures (`AuthenticationFailed`, `DecryptionError`) never carry a cause:
/// callers learn that validation failed, not why.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid length: {0}")]
    InvalidLength(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("encryption failed")]
    EncryptionError,

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("malformed payload")]
    MalformedPayload,

    #[error("key size {bits} is below the minimum of {min} bits")]
    WeakKeySize { bits: usize, min: usize },

    #[error("key size {bits} exceeds the maximum of {max} bits")]
    KeySizeTooLarge { bits: usize, max: usize },

    #[error("key generation failed")]
    KeyGenerationFailed,

    #[error("plaintext of {len} bytes exceeds the maximum of {max} bytes for this key")]
    PlaintextTooLarge { len: usize, max: usize },

    #[error("invalid key format")]
    InvalidKeyFormat,

    #[error("decryption failed")]
    DecryptionError,

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("password cannot be empty")]
    EmptyPassword,

    #[error("invalid salt: {0}")]
    InvalidSalt(String),

    #[error("iteration count {count} is below the minimum of {min}")]
    IterationCountTooLow { count: u32, min: u32 },

    #[error("iteration count {count} exceeds the maximum of {max}")]
    IterationCountTooHigh { count: u32, max: u32 },

    #[error("OS random generator unavailable")]
    EntropyUnavailable,

    #[error("invalid encoding for {0}")]
    InvalidEncoding(&'static str),

    #[error("decrypted data is not valid UTF-8")]
    NotUtf8,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl CryptoError {
    /// Stable identifier for the error kind, used by the request/response boundary.
    pub fn code(&self) -> &'static str {
        match self {
            CryptoError::InvalidLength(_) => "InvalidLength",
            CryptoError::InvalidKey(_) => "InvalidKey",
            CryptoError::EncryptionError => "EncryptionError",
            CryptoError::AuthenticationFailed => "AuthenticationFailed",
            CryptoError::MalformedPayload => "MalformedPayload",
            CryptoError::WeakKeySize { .. } => "WeakKeySize",
            CryptoError::KeySizeTooLarge { .. } => "KeySizeTooLarge",
            CryptoError::KeyGenerationFailed => "KeyGenerationFailed",
            CryptoError::PlaintextTooLarge { .. } => "PlaintextTooLarge",
            CryptoError::InvalidKeyFormat => "InvalidKeyFormat",
            CryptoError::DecryptionError => "DecryptionError",
            CryptoError::UnsupportedAlgorithm(_) => "UnsupportedAlgorithm",
            CryptoError::EmptyPassword => "EmptyPassword",
            CryptoError::InvalidSalt(_) => "InvalidSalt",
            CryptoError::IterationCountTooLow { .. } => "IterationCountTooLow",
            CryptoError::IterationCountTooHigh { .. } => "IterationCountTooHigh",
            CryptoError::EntropyUnavailable => "EntropyUnavailable",
            CryptoError::InvalidEncoding(_) => "InvalidEncoding",
            CryptoError::NotUtf8 => "NotUtf8",
            CryptoError::Io(_) => "Io",
        }
    }
}

pub type Result<T> = std::result::Result<T, CryptoError>;
