//! Content-addressing for contract text.
//!
//! The fingerprint is the SHA-256 digest of the UTF-8 bytes, hex-encoded.
//! It is not keyed: it identifies content, it does not authenticate it.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex-encoded 256-bit digest of contract text. Used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractFingerprint(String);

impl ContractFingerprint {
    /// Length of the hex encoding in characters.
    pub const HEX_LEN: usize = 64;

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap an already-computed hex digest read back from a store.
    ///
    /// Returns `None` unless the input is exactly 64 lowercase hex characters.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let valid = hex.len() == Self::HEX_LEN
            && hex
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(hex.to_string()))
    }
}

impl fmt::Display for ContractFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContractFingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fingerprint contract text.
///
/// The input is expected to be whitespace-normalised already; no further
/// normalisation happens here, so byte-identical text is the identity.
pub fn fingerprint(text: &str) -> ContractFingerprint {
    let digest = Sha256::digest(text.as_bytes());
    ContractFingerprint(hex::encode(digest))
}
