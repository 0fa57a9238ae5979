//! Canonical byte encoding of predicate trees for query-result cache keys.

use crate::predicate::model::{ComparePredicate, Predicate};
use derive_more::Deref;
use sha2::{Digest, Sha256};
use std::fmt;

pub(crate) const TAG_ALWAYS: u8 = 0x21;
pub(crate) const TAG_NEVER: u8 = 0x22;
pub(crate) const TAG_AND: u8 = 0x23;
pub(crate) const TAG_OR: u8 = 0x24;
pub(crate) const TAG_NOT: u8 = 0x25;
pub(crate) const TAG_COMPARE: u8 = 0x26;

const FINGERPRINT_DOMAIN: &[u8] = b"havingfp:v1";

///
/// CacheKey
///
/// Encoded predicate sub-key. Identical trees always produce identical
/// bytes and structurally distinct trees never share an encoding. The outer
/// cache subsystem concatenates or hashes this with the other query facets.
///
/// Derefs to its byte buffer but never mutably.
///

#[derive(Clone, Debug, Deref, Eq, Hash, PartialEq)]
pub struct CacheKey(Vec<u8>);

impl CacheKey {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Fixed-width digest of this key for stores that want bounded keys.
    #[must_use]
    pub fn fingerprint(&self) -> KeyFingerprint {
        let mut hasher = Sha256::new();
        hasher.update(FINGERPRINT_DOMAIN);
        hasher.update(&self.0);
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);

        KeyFingerprint(out)
    }
}

///
/// KeyFingerprint
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct KeyFingerprint([u8; 32]);

impl KeyFingerprint {
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn as_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for byte in self.0 {
            use std::fmt::Write as _;
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl fmt::Display for KeyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_hex())
    }
}

/// Encode a predicate tree into its cache-key bytes.
#[must_use]
pub fn encode(predicate: &Predicate) -> CacheKey {
    let mut out = Vec::new();
    encode_into(&mut out, predicate);

    CacheKey(out)
}

fn encode_into(out: &mut Vec<u8>, predicate: &Predicate) {
    match predicate {
        Predicate::Always => write_tag(out, TAG_ALWAYS),
        Predicate::Never => write_tag(out, TAG_NEVER),
        Predicate::Not(inner) => {
            write_tag(out, TAG_NOT);
            encode_into(out, inner);
        }
        Predicate::And(children) => {
            write_tag(out, TAG_AND);
            write_children(out, children);
        }
        Predicate::Or(children) => {
            write_tag(out, TAG_OR);
            write_children(out, children);
        }
        Predicate::Compare(cmp) => write_compare(out, cmp),
    }
}

// Each child is framed by its own length so sibling boundaries are explicit.
fn write_children(out: &mut Vec<u8>, children: &[Predicate]) {
    for child in children {
        let len_at = out.len();
        write_u32(out, 0);
        encode_into(out, child);

        let child_len = out.len() - len_at - 4;
        let len = u32::try_from(child_len).unwrap_or(u32::MAX);
        out[len_at..len_at + 4].copy_from_slice(&len.to_be_bytes());
    }
}

fn write_compare(out: &mut Vec<u8>, cmp: &ComparePredicate) {
    write_tag(out, TAG_COMPARE);
    write_tag(out, cmp.op().tag());
    write_str(out, cmp.field());
    out.extend_from_slice(&cmp.threshold().to_be_bytes());
}

///
/// Encode one string with length prefix.
///

fn write_str(out: &mut Vec<u8>, value: &str) {
    write_len_u32(out, value.len());
    out.extend_from_slice(value.as_bytes());
}

/// Encode a platform-sized length as u32 with deterministic saturation.
fn write_len_u32(out: &mut Vec<u8>, len: usize) {
    let len = u32::try_from(len).unwrap_or(u32::MAX);
    write_u32(out, len);
}

fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn write_tag(out: &mut Vec<u8>, tag: u8) {
    out.push(tag);
}

///
/// TESTS
///
