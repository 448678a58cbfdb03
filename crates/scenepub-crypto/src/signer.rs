//! # Personal Signatures
//!
//! Implements Ethereum `personal_sign`: the message is prefixed with
//! `"\x19Ethereum Signed Message:\n" ++ len(message)` and hashed with
//! Keccak-256 before secp256k1 signing. Signatures are 65 bytes `r ‖ s ‖ v`
//! with `v = 27 + recovery_id`.
//!
//! [`LocalSigner`] signs with a private key supplied through configuration.
//! Browser wallets produce the same signature format through the linker, and
//! [`recover_address`] verifies either source.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use zeroize::Zeroizing;

use crate::address::Address;
use crate::error::CryptoError;
use crate::hex;

const PERSONAL_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Length of an ECDSA personal signature in bytes.
pub const ECDSA_SIGNATURE_LEN: usize = 65;

/// Keccak-256 of the `personal_sign` envelope around `message`.
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// A signature as returned by a signer.
///
/// ECDSA signatures are 65 bytes. Contract wallets (EIP-1654) may return
/// signatures of any length, which are carried opaquely.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PersonalSignature(Vec<u8>);

impl PersonalSignature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Parse a `0x`-prefixed hex signature.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let body = hex::strip_0x(s.trim())
            .ok_or_else(|| CryptoError::InvalidSignature("missing 0x prefix".to_string()))?;
        if body.is_empty() {
            return Err(CryptoError::InvalidSignature("signature is empty".to_string()));
        }
        let bytes = hex::decode(body).map_err(CryptoError::InvalidSignature)?;
        Ok(Self(bytes))
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// `0x`-prefixed lower-case hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    /// Whether this is a 65-byte ECDSA signature that can be recovered locally.
    pub fn is_ecdsa(&self) -> bool {
        self.0.len() == ECDSA_SIGNATURE_LEN
    }
}

impl std::fmt::Display for PersonalSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for PersonalSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = hex::encode(&self.0).chars().take(8).collect();
        write!(f, "PersonalSignature(0x{prefix}..., {} bytes)", self.0.len())
    }
}

impl Serialize for PersonalSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PersonalSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A secp256k1 signer backed by an in-memory private key.
///
/// Does not implement `Serialize`. The key never leaves this struct.
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl LocalSigner {
    /// Parse a hex private key: 64 hex characters, optionally `0x`-prefixed.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let trimmed = s.trim();
        let body = hex::strip_0x(trimmed).unwrap_or(trimmed);
        if body.len() != 64 {
            return Err(CryptoError::InvalidKey(format!(
                "expected 64 hex characters, got {}",
                body.len()
            )));
        }
        let bytes = Zeroizing::new(hex::decode(body).map_err(CryptoError::InvalidKey)?);
        let mut seed = Zeroizing::new([0u8; 32]);
        seed.copy_from_slice(&bytes);
        Self::from_bytes(&seed)
    }

    /// Build a signer from a raw 32-byte scalar.
    pub fn from_bytes(seed: &[u8; 32]) -> Result<Self, CryptoError> {
        let key = SigningKey::from_slice(seed)
            .map_err(|_| CryptoError::InvalidKey("scalar out of range".to_string()))?;
        let address = Address::from_verifying_key(key.verifying_key());
        Ok(Self { key, address })
    }

    /// The signer's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// `personal_sign` over `message`.
    pub fn sign_message(&self, message: &[u8]) -> Result<PersonalSignature, CryptoError> {
        let hash = personal_message_hash(message);
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&hash)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        let mut out = Vec::with_capacity(ECDSA_SIGNATURE_LEN);
        out.extend_from_slice(&signature.to_bytes());
        out.push(27 + recovery_id.to_byte());
        tracing::debug!(signer = %self.address, "signed message");
        Ok(PersonalSignature(out))
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LocalSigner({}, <private>)", self.address)
    }
}

/// Recover the address that produced a 65-byte `personal_sign` signature.
pub fn recover_address(
    message: &[u8],
    signature: &PersonalSignature,
) -> Result<Address, CryptoError> {
    let bytes = signature.as_bytes();
    if bytes.len() != ECDSA_SIGNATURE_LEN {
        return Err(CryptoError::InvalidSignature(format!(
            "expected {ECDSA_SIGNATURE_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    let sig = Signature::from_slice(&bytes[..64])
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    let v = bytes[64];
    let recovery_byte = if v >= 27 { v - 27 } else { v };
    let recovery_id = RecoveryId::from_byte(recovery_byte)
        .ok_or_else(|| CryptoError::InvalidSignature(format!("invalid recovery byte {v}")))?;

    let hash = personal_message_hash(message);
    let key = VerifyingKey::recover_from_prehash(&hash, &sig, recovery_id)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    Ok(Address::from_verifying_key(&key))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const ADDRESS: &str = "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23";

    fn hex32(s: &str) -> String {
        hex::encode(&personal_message_hash(s.as_bytes()))
    }

    #[test]
    fn message_hash_known_vector() {
        assert_eq!(
            hex32("Hello World"),
            "a1de988600a42c4b4ab089b619297c17d53cffae5d5120d82d8a92d0bb3b78f2"
        );
    }

    #[test]
    fn address_from_known_key() {
        let signer = LocalSigner::from_hex(KEY).unwrap();
        assert_eq!(signer.address().to_string(), ADDRESS);
    }

    #[test]
    fn key_accepted_without_prefix() {
        let signer = LocalSigner::from_hex(&KEY[2..]).unwrap();
        assert_eq!(signer.address().to_string(), ADDRESS);
    }

    #[test]
    fn sign_known_vector() {
        let signer = LocalSigner::from_hex(KEY).unwrap();
        let sig = signer.sign_message(b"Some data").unwrap();
        assert_eq!(
            sig.to_hex(),
            "0xb91467e570a6466aa9e9876cbcd013baba02900b8979d43fe208a4a4f339f5fd\
             6007e74cd82e037b800186422fc2da167c747ef045e5d18a5f5d4300f8e1a0291c"
        );
    }

    #[test]
    fn sign_then_recover() {
        let signer = LocalSigner::from_hex(KEY).unwrap();
        let msg = b"bafkreiclncvtqr763j6wyywb7pf65p5dl2vxgupnlz4pjxnn5jo7ms4acu";
        let sig = signer.sign_message(msg).unwrap();
        assert!(sig.is_ecdsa());
        assert_eq!(recover_address(msg, &sig).unwrap(), signer.address());
    }

    #[test]
    fn recover_with_other_message_yields_other_address() {
        let signer = LocalSigner::from_hex(KEY).unwrap();
        let sig = signer.sign_message(b"original").unwrap();
        let recovered = recover_address(b"tampered", &sig).unwrap();
        assert_ne!(recovered, signer.address());
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(LocalSigner::from_hex("0x1234").is_err());
        assert!(LocalSigner::from_hex(&"g".repeat(64)).is_err());
        assert!(LocalSigner::from_hex(&"0".repeat(64)).is_err());
    }

    #[test]
    fn recover_rejects_short_signature() {
        let sig = PersonalSignature::from_hex("0xdeadbeef").unwrap();
        assert!(!sig.is_ecdsa());
        assert!(recover_address(b"x", &sig).is_err());
    }

    #[test]
    fn signature_hex_requires_prefix() {
        assert!(PersonalSignature::from_hex("deadbeef").is_err());
        assert!(PersonalSignature::from_hex("0x").is_err());
        assert!(PersonalSignature::from_hex("0x+f").is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let signer = LocalSigner::from_hex(KEY).unwrap();
        let dbg = format!("{signer:?}");
        assert!(!dbg.contains("4c0883a6"));
        assert!(dbg.contains("<private>"));
    }
}
