//! Errors raised by key handling, signing and AuthChain verification.

use thiserror::Error;

/// Errors from cryptographic operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Private key material is malformed or out of range.
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// An address string is not `0x` followed by 40 hex characters.
    #[error("invalid address \"{value}\": {reason}")]
    InvalidAddress {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A signature string is malformed or cannot be used for recovery.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The secp256k1 signing operation failed.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// The AuthChain does not have the expected shape.
    #[error("malformed auth chain: {0}")]
    MalformedChain(String),

    /// The recovered signer differs from the declared one.
    #[error("signature was produced by {recovered}, expected {expected}")]
    SignerMismatch {
        /// Address declared in the SIGNER link.
        expected: String,
        /// Address recovered from the signature.
        recovered: String,
    },
}
