//! Transport encodings shared by every service.
//!
//! Binary material (keys, tokens, random bytes, salts) travels as URL-safe base64
//! without padding. Decoding accepts padded input and the standard `+`/`/` alphabet too.
//! Digests travel as lowercase hex.

use base64::{
    Engine as _,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};

use crate::error::{CryptoError, Result};

const CONFIG: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent);

const B64: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, CONFIG);

/// Salts from older clients were written with the standard alphabet.
const B64_STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, CONFIG);

pub fn encode(bytes: &[u8]) -> String {
    B64.encode(bytes)
}

/// Decode base64 in either alphabet. `what` names the field for the error message.
pub fn decode(text: &str, what: &'static str) -> Result<Vec<u8>> {
    let text = text.trim();
    B64.decode(text)
        .or_else(|_| B64_STANDARD.decode(text))
        .map_err(|_| CryptoError::InvalidEncoding(what))
}

pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
