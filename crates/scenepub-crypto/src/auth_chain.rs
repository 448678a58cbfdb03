//! # AuthChain
//!
//! Ordered evidence binding an entity id to the address that authorized it.
//! A deployment chain has exactly two links:
//!
//! 1. `SIGNER`: payload is the signer address, signature empty.
//! 2. `ECDSA_SIGNED_ENTITY`: payload is the entity id, signature is the
//!    65-byte `personal_sign` of the entity id. When the signer returned a
//!    non-ECDSA signature (a contract wallet), the link type is
//!    `ECDSA_EIP_1654_SIGNED_ENTITY` and verification is left to the server.

use scenepub_core::ContentIdentifier;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::CryptoError;
use crate::signer::{recover_address, PersonalSignature};

/// Kind of an AuthChain link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthLinkType {
    /// Declares the signer address.
    #[serde(rename = "SIGNER")]
    Signer,
    /// Entity id signed by an externally owned account.
    #[serde(rename = "ECDSA_SIGNED_ENTITY")]
    EcdsaSignedEntity,
    /// Entity id signed by a contract wallet.
    #[serde(rename = "ECDSA_EIP_1654_SIGNED_ENTITY")]
    EcdsaEip1654SignedEntity,
}

impl AuthLinkType {
    /// Wire name of the link type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signer => "SIGNER",
            Self::EcdsaSignedEntity => "ECDSA_SIGNED_ENTITY",
            Self::EcdsaEip1654SignedEntity => "ECDSA_EIP_1654_SIGNED_ENTITY",
        }
    }
}

/// One link of an AuthChain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthLink {
    /// Link kind.
    #[serde(rename = "type")]
    pub link_type: AuthLinkType,
    /// Address or entity id, depending on the kind.
    pub payload: String,
    /// `0x`-prefixed signature, empty for `SIGNER`.
    pub signature: String,
}

/// The ordered list of links sent alongside a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthChain(Vec<AuthLink>);

impl AuthChain {
    /// Build the two-link chain for a signed entity id.
    pub fn for_entity(
        signer: Address,
        entity_id: &ContentIdentifier,
        signature: &PersonalSignature,
    ) -> Self {
        let link_type = if signature.is_ecdsa() {
            AuthLinkType::EcdsaSignedEntity
        } else {
            AuthLinkType::EcdsaEip1654SignedEntity
        };
        Self(vec![
            AuthLink {
                link_type: AuthLinkType::Signer,
                payload: signer.to_checksum(),
                signature: String::new(),
            },
            AuthLink {
                link_type,
                payload: entity_id.to_string(),
                signature: signature.to_hex(),
            },
        ])
    }

    /// The links in order.
    pub fn links(&self) -> &[AuthLink] {
        &self.0
    }

    /// Address declared in the `SIGNER` link.
    pub fn signer(&self) -> Result<Address, CryptoError> {
        let first = self
            .0
            .first()
            .ok_or_else(|| CryptoError::MalformedChain("chain is empty".to_string()))?;
        if first.link_type != AuthLinkType::Signer {
            return Err(CryptoError::MalformedChain(format!(
                "first link must be SIGNER, got {}",
                first.link_type.as_str()
            )));
        }
        Address::parse(&first.payload)
    }

    /// Check that the chain authorizes `entity_id`.
    ///
    /// ECDSA links are verified by recovering the signer. Contract wallet
    /// links only have their payload checked; the signature is validated
    /// remotely against the wallet contract.
    pub fn verify(&self, entity_id: &ContentIdentifier) -> Result<(), CryptoError> {
        let signer = self.signer()?;
        let link = match self.0.as_slice() {
            [_, link] => link,
            links => {
                return Err(CryptoError::MalformedChain(format!(
                    "expected 2 links, got {}",
                    links.len()
                )))
            }
        };
        if link.payload != entity_id.as_str() {
            return Err(CryptoError::MalformedChain(format!(
                "signed payload {} does not match entity {entity_id}",
                link.payload
            )));
        }
        match link.link_type {
            AuthLinkType::EcdsaSignedEntity => {
                let signature = PersonalSignature::from_hex(&link.signature)?;
                let recovered = recover_address(entity_id.as_str().as_bytes(), &signature)?;
                if recovered != signer {
                    return Err(CryptoError::SignerMismatch {
                        expected: signer.to_checksum(),
                        recovered: recovered.to_checksum(),
                    });
                }
                Ok(())
            }
            AuthLinkType::EcdsaEip1654SignedEntity => {
                PersonalSignature::from_hex(&link.signature)?;
                Ok(())
            }
            AuthLinkType::Signer => Err(CryptoError::MalformedChain(
                "second link must sign the entity".to_string(),
            )),
        }
    }
}
