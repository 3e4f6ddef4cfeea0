//! Notification signatures.
//!
//! The gateway signs each status notification by hashing the raw request body concatenated with a shared key, and
//! sends the digest in a structured header:
//!
//! ```text
//! signature=<hex digest>;algorithm=SHA-256;sender=checkout
//! ```
//!
//! The digest is `SHA-256(body || key)`. This is not HMAC, and it is kept exactly as is only because the gateway
//! computes it this way. Do not reuse it for anything new.
use std::{collections::BTreeMap, str::FromStr};

use log::*;
use pob_common::Secret;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::SignatureError;

/// A parsed `key=value;key=value` signature header. Keys are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureHeader {
    fields: BTreeMap<String, String>,
}

impl FromStr for SignatureHeader {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = BTreeMap::new();
        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((key, value)) = part.split_once('=') else {
                debug!("🔐️ Ignoring signature header part '{part}'. It is not a key=value pair.");
                continue;
            };
            fields.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }
        if fields.is_empty() {
            return Err(SignatureError::MalformedHeader("the header is empty".into()));
        }
        Ok(Self { fields })
    }
}

impl SignatureHeader {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn signature(&self) -> Option<&str> {
        self.get("signature").filter(|s| !s.is_empty())
    }

    pub fn algorithm(&self) -> Option<&str> {
        self.get("algorithm")
    }

    pub fn sender(&self) -> Option<&str> {
        self.get("sender")
    }
}

/// Lower-case hex `SHA-256(body || key)`.
pub fn calculate_signature(body: &[u8], key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Checks the signature header against the raw body. On success, the parsed header is returned.
pub fn verify_signature(
    body: &[u8],
    header: Option<&str>,
    key: &Secret<String>,
) -> Result<SignatureHeader, SignatureError> {
    let header = header.ok_or(SignatureError::MissingHeader)?.parse::<SignatureHeader>()?;
    let received = header
        .signature()
        .ok_or_else(|| SignatureError::MalformedHeader("no 'signature' field".into()))?
        .to_ascii_lowercase();
    if let Some(algorithm) = header.algorithm() {
        if !is_sha256(algorithm) {
            return Err(SignatureError::UnsupportedAlgorithm(algorithm.to_string()));
        }
    }
    let expected = calculate_signature(body, key.reveal());
    if bool::from(expected.as_bytes().ct_eq(received.as_bytes())) {
        trace!("🔐️ Notification signature verified. Sender: {}", header.sender().unwrap_or("unknown"));
        Ok(header)
    } else {
        Err(SignatureError::Mismatch)
    }
}

fn is_sha256(algorithm: &str) -> bool {
    matches!(algorithm.to_ascii_uppercase().as_str(), "SHA-256" | "SHA256")
}
