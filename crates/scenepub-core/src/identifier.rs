//! # Content Identifiers
//!
//! [`ContentIdentifier`] is the content-addressed key for a file or a set of
//! files. The textual form is a CIDv1:
//!
//! ```text
//! "b" ++ base32lower( 0x01 | 0x55 (raw) | 0x12 (sha2-256) | 0x20 | sha256(bytes) )
//! ```
//!
//! giving strings of the shape `bafkrei…` (59 characters). The identifier
//! depends on the bytes alone; paths, timestamps and permissions never enter
//! the digest.
//!
//! ## Set Identifiers
//!
//! [`identifier_of_set`] hashes each entry, sorts by path, and folds the
//! listing `path 0x00 identifier 0x0a` for every entry into a single SHA-256
//! wrapped in the same CID envelope. Permuting the input never changes the
//! result.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::IdentifierError;

const CID_VERSION: u8 = 0x01;
const RAW_CODEC: u8 = 0x55;
const SHA2_256: u8 = 0x12;
const DIGEST_LEN: u8 = 0x20;
const MULTIBASE_BASE32: char = 'b';
const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Length of the binary CID: four header bytes plus the 32-byte digest.
const CID_BINARY_LEN: usize = 36;

/// A content identifier in CIDv1 textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentIdentifier(String);

impl ContentIdentifier {
    /// Wrap a raw SHA-256 digest in the CID envelope.
    pub fn from_sha256(digest: [u8; 32]) -> Self {
        let mut cid = Vec::with_capacity(CID_BINARY_LEN);
        cid.extend_from_slice(&[CID_VERSION, RAW_CODEC, SHA2_256, DIGEST_LEN]);
        cid.extend_from_slice(&digest);
        Self(format!("{MULTIBASE_BASE32}{}", base32_encode(&cid)))
    }

    /// Parse and validate a textual identifier.
    ///
    /// Accepts only the exact format produced by this crate; upper-case input
    /// is normalized to lower-case first.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let normalized = s.trim().to_ascii_lowercase();
        let err = |reason| IdentifierError {
            value: s.to_string(),
            reason,
        };
        let body = normalized
            .strip_prefix(MULTIBASE_BASE32)
            .ok_or_else(|| err("missing base32 multibase prefix"))?;
        let bytes = base32_decode(body).ok_or_else(|| err("invalid base32 payload"))?;
        if bytes.len() != CID_BINARY_LEN {
            return Err(err("unexpected CID length"));
        }
        if bytes[0] != CID_VERSION {
            return Err(err("unsupported CID version"));
        }
        if bytes[1] != RAW_CODEC {
            return Err(err("unsupported multicodec"));
        }
        if bytes[2] != SHA2_256 || bytes[3] != DIGEST_LEN {
            return Err(err("unsupported multihash"));
        }
        Ok(Self(normalized))
    }

    /// The textual identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 32-byte SHA-256 digest carried by the identifier.
    pub fn digest(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        // Constructed or parsed identifiers always decode to 36 bytes.
        if let Some(bytes) = self.0.strip_prefix(MULTIBASE_BASE32).and_then(base32_decode) {
            if bytes.len() == CID_BINARY_LEN {
                out.copy_from_slice(&bytes[4..]);
            }
        }
        out
    }
}

impl std::fmt::Display for ContentIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ContentIdentifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ContentIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for ContentIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ContentIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Compute the content identifier of a byte sequence.
pub fn identifier_of(bytes: &[u8]) -> ContentIdentifier {
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&Sha256::digest(bytes));
    ContentIdentifier::from_sha256(digest)
}

/// Fold a set of `(path, bytes)` entries into one root identifier.
pub fn identifier_of_set<P, B>(entries: &[(P, B)]) -> ContentIdentifier
where
    P: AsRef<str>,
    B: AsRef<[u8]>,
{
    let hashed: Vec<(&str, ContentIdentifier)> = entries
        .iter()
        .map(|(p, b)| (p.as_ref(), identifier_of(b.as_ref())))
        .collect();
    root_identifier(hashed.iter().map(|(p, id)| (*p, id)))
}

/// Fold already-computed `(path, identifier)` pairs into one root identifier.
///
/// Used by the watcher to derive a root from its live map without re-reading
/// file contents.
pub fn root_identifier<'a, I>(entries: I) -> ContentIdentifier
where
    I: IntoIterator<Item = (&'a str, &'a ContentIdentifier)>,
{
    let mut listing: Vec<(&str, &ContentIdentifier)> = entries.into_iter().collect();
    listing.sort();

    let mut hasher = Sha256::new();
    for (path, id) in listing {
        hasher.update(path.as_bytes());
        hasher.update([0u8]);
        hasher.update(id.as_str().as_bytes());
        hasher.update([b'\n']);
    }
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    ContentIdentifier::from_sha256(digest)
}

/// RFC 4648 base32, lower-case alphabet, no padding.
fn base32_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8 + 4) / 5);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    for &b in bytes {
        buffer = ((buffer << 8) | u32::from(b)) & 0xFFFF;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1F) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1F) as usize] as char);
    }
    out
}

fn base32_decode(s: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(s.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    for c in s.bytes() {
        let value = match c {
            b'a'..=b'z' => c - b'a',
            b'2'..=b'7' => c - b'2' + 26,
            _ => return None,
        };
        buffer = ((buffer << 5) | u32::from(value)) & 0xFFFF;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xFF) as u8);
        }
    }
    Some(out)
}
