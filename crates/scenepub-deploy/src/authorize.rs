//! # Authorization
//!
//! Turns a built entity into an [`AuthChain`]. With a configured private key
//! the entity id is signed in-process; otherwise a signing session is opened
//! and the external signer's answer is used. Either way the chain is verified
//! locally before anything is sent.

use scenepub_core::Entity;
use scenepub_crypto::{AuthChain, LocalSigner};
use scenepub_linker::{LinkPayload, Linker};

use crate::config::DeployConfig;
use crate::error::DeployError;
use crate::observer::DeployObserver;

/// Source of entity signatures.
#[derive(Debug)]
pub enum Authorizer {
    /// Sign with a key held by this process.
    Local(LocalSigner),
    /// Ask an external signer through the signing handshake.
    Linker(Linker),
}

impl Authorizer {
    /// The local signer when a key is configured, the handshake otherwise.
    pub fn from_config(config: &DeployConfig) -> Result<Self, DeployError> {
        Ok(match config.signer()? {
            Some(signer) => Self::Local(signer),
            None => Self::Linker(Linker::new(config.linker.clone())),
        })
    }

    /// Short description for logs.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Local(_) => "local key",
            Self::Linker(_) => "signing handshake",
        }
    }

    /// Sign `entity` and return the verified chain.
    ///
    /// `target` is shown to the external signer.
    pub async fn authorize(
        &self,
        entity: &Entity,
        target: &str,
        observer: &dyn DeployObserver,
    ) -> Result<AuthChain, DeployError> {
        let chain = match self {
            Self::Local(signer) => {
                let signature = signer.sign_message(entity.id().as_str().as_bytes())?;
                AuthChain::for_entity(signer.address(), entity.id(), &signature)
            }
            Self::Linker(linker) => {
                let payload = LinkPayload::for_entity(
                    entity.id(),
                    entity.pointers(),
                    linker.config().network.clone(),
                    target,
                );
                let handle = linker.open(payload).await?;
                observer.signing_requested(handle.url());
                let signed = handle.wait().await?;
                AuthChain::for_entity(signed.address, entity.id(), &signed.signature)
            }
        };
        chain.verify(entity.id())?;
        tracing::info!(
            entity_id = %entity.id(),
            signer = %chain.signer()?,
            via = self.describe(),
            "entity authorized"
        );
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::SilentObserver;
    use scenepub_core::{EntityBuilder, EntityType, FileRecord};
    use scenepub_crypto::AuthLinkType;

    const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[tokio::test]
    async fn local_signer_produces_verified_chain() {
        let entity = EntityBuilder::new(EntityType::Scene)
            .pointers(["1,1"])
            .build(&[FileRecord::new("a.txt", b"a".to_vec()).unwrap()])
            .unwrap();
        let authorizer = Authorizer::Local(LocalSigner::from_hex(KEY).unwrap());
        let chain = authorizer
            .authorize(&entity, "https://peer.example", &SilentObserver)
            .await
            .unwrap();
        assert_eq!(chain.links().len(), 2);
        assert_eq!(chain.links()[0].link_type, AuthLinkType::Signer);
        assert_eq!(chain.links()[1].link_type, AuthLinkType::EcdsaSignedEntity);
        assert_eq!(chain.links()[1].payload, entity.id().as_str());
        assert_eq!(
            chain.signer().unwrap().to_string(),
            "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23"
        );
    }
}
