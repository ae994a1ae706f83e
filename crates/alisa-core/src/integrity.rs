//! Content digests for tamper-evident log baselines.
//!
//! A log line's baseline is the SHA-256 digest of its UTF-8 bytes, with no
//! salt or key. Checking a line against an archived baseline needs nothing but
//! the line and the digest, so the same check can be replayed offline.
//!
//! # Example
//!
//! ```rust
//! use alisa_core::integrity::{self, IntegrityDigest};
//!
//! let baseline = integrity::digest("Jun 14 15:16:01 combo sshd: authentication failure");
//! assert!(integrity::verify("Jun 14 15:16:01 combo sshd: authentication failure", &baseline));
//! assert!(!integrity::verify("Jun 14 15:16:01 combo sshd: accepted password", &baseline));
//!
//! let parsed: IntegrityDigest = baseline.to_hex().parse().unwrap();
//! assert_eq!(parsed, baseline);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::Error;

/// Length of an integrity digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// A SHA-256 digest of a raw log line.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegrityDigest([u8; DIGEST_LEN]);

impl IntegrityDigest {
    /// Computes the digest of `content`.
    #[must_use]
    pub fn compute(content: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Wraps raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Returns the digest as 64 lowercase hex characters.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Computes the integrity digest of a log line.
#[must_use]
pub fn digest(content: &str) -> IntegrityDigest {
    IntegrityDigest::compute(content)
}

/// Returns true iff `content` hashes to `baseline`.
#[must_use]
pub fn verify(content: &str, baseline: &IntegrityDigest) -> bool {
    digest(content) == *baseline
}

impl fmt::Display for IntegrityDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for IntegrityDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntegrityDigest({})", self.to_hex())
    }
}

impl FromStr for IntegrityDigest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim()).map_err(|e| Error::InvalidDigest {
            reason: e.to_string(),
        })?;
        let bytes: [u8; DIGEST_LEN] =
            bytes
                .try_into()
                .map_err(|bytes: Vec<u8>| Error::InvalidDigest {
                    reason: format!("expected {DIGEST_LEN} bytes, got {}", bytes.len()),
                })?;
        Ok(Self(bytes))
    }
}

impl Serialize for IntegrityDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for IntegrityDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SSHD_LINE: &str = "Jun 14 15:16:01 combo sshd(pam_unix)[19939]: authentication failure; logname= uid=0 euid=0 tty=NODEV host=  user=root";

    #[test]
    fn test_digest_known_vector() {
        assert_eq!(
            digest("").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            digest("abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify_detects_tampering() {
        let baseline = digest(SSHD_LINE);
        let tampered = SSHD_LINE.replace("authentication failure", "accepted password");

        assert!(verify(SSHD_LINE, &baseline));
        assert!(!verify(&tampered, &baseline));
    }

    #[test]
    fn test_parse_accepts_uppercase_hex() {
        let baseline = digest(SSHD_LINE);
        let parsed: IntegrityDigest = baseline.to_hex().to_uppercase().parse().unwrap();
        assert_eq!(parsed, baseline);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let err = "abcd".parse::<IntegrityDigest>().unwrap_err();
        assert!(err.to_string().contains("expected 32 bytes, got 2"));
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        assert!("zz".repeat(32).parse::<IntegrityDigest>().is_err());
    }

    #[test]
    fn test_digest_serializes_as_hex_string() {
        let baseline = digest("abc");
        let json = serde_json::to_string(&baseline).unwrap();
        assert_eq!(
            json,
            "\"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad\""
        );

        let back: IntegrityDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, baseline);
    }
}
