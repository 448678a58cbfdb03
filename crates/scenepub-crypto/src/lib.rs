//! # scenepub-crypto — Signing Primitives
//!
//! Provides the cryptographic building blocks for authorizing a deployment:
//!
//! - **Addresses**: 20-byte Ethereum-style signer addresses with EIP-55
//!   checksummed rendering.
//! - **Personal signatures**: `personal_sign` over an entity id with a local
//!   secp256k1 key, and recovery of the signing address.
//! - **AuthChain**: the ordered evidence list that binds an entity id to the
//!   address that authorized it.
//!
//! ## Crate Policy
//!
//! - Depends only on `scenepub-core` internally.
//! - Private key material lives in [`zeroize::Zeroizing`] buffers and is never
//!   serialized or logged. [`LocalSigner`] has a redacting `Debug`.
//! - No mocking of cryptographic operations in tests; all tests use real
//!   secp256k1 and Keccak-256.

pub mod address;
pub mod auth_chain;
pub mod error;
pub mod signer;

mod hex;

pub use address::Address;
pub use auth_chain::{AuthChain, AuthLink, AuthLinkType};
pub use error::CryptoError;
pub use signer::{personal_message_hash, recover_address, LocalSigner, PersonalSignature};
