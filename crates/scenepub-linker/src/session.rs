//! # Session State
//!
//! A session publishes one [`LinkPayload`] and accepts one resolution. The
//! resolution slot is a `oneshot` sender behind a mutex: the first accepted
//! POST takes it, every later POST finds it empty and gets `409`.
//!
//! State changes are broadcast through a `tokio::sync::watch` channel so that
//! any number of observers see the latest [`LinkState`].

use std::sync::Arc;

use parking_lot::Mutex;
use scenepub_core::{ContentIdentifier, Pointer};
use scenepub_crypto::{Address, PersonalSignature};
use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, watch};
use uuid::Uuid;

/// What the signer is asked to sign, served at `GET /api/payload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPayload {
    /// Unique id of this session.
    pub session_id: Uuid,
    /// Entity being authorized.
    pub entity_id: ContentIdentifier,
    /// Exact message to pass to `personal_sign`.
    pub message: String,
    /// Pointers the entity will be published under.
    pub pointers: Vec<Pointer>,
    /// Network name.
    pub network: String,
    /// Content server the entity will be deployed to.
    pub target: String,
}

impl LinkPayload {
    /// Payload asking the signer to sign `entity_id`.
    pub fn for_entity(
        entity_id: &ContentIdentifier,
        pointers: &[Pointer],
        network: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            entity_id: entity_id.clone(),
            message: entity_id.to_string(),
            pointers: pointers.to_vec(),
            network: network.into(),
            target: target.into(),
        }
    }
}

/// A signature accepted from the signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedPayload {
    /// Address that signed.
    pub address: Address,
    /// Signature over [`LinkPayload::message`].
    pub signature: PersonalSignature,
    /// Chain the wallet was connected to, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

/// Observable state of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// Created, listener not yet bound.
    Pending,
    /// Listener bound, waiting for the signer.
    AwaitingResponse,
    /// The signer returned a valid signature.
    Signed(SignedPayload),
    /// The signer declined or the session broke.
    Failed {
        /// Reason reported by the signer or the driver.
        reason: String,
    },
    /// Cancelled by the caller or by Ctrl-C.
    Cancelled,
    /// No response before the timeout.
    TimedOut,
}

impl LinkState {
    /// Whether the session has reached an outcome.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::AwaitingResponse)
    }
}

/// What a POST resolved the session with.
#[derive(Debug)]
pub(crate) enum Resolution {
    Signed(SignedPayload),
    Rejected(String),
}

/// State shared between route handlers and the session driver.
#[derive(Clone)]
pub struct SessionState {
    payload: Arc<LinkPayload>,
    state: Arc<watch::Sender<LinkState>>,
    resolver: Arc<Mutex<Option<oneshot::Sender<Resolution>>>>,
}

impl SessionState {
    pub(crate) fn new(payload: LinkPayload) -> (Self, oneshot::Receiver<Resolution>) {
        let (tx, rx) = oneshot::channel();
        let (state, _) = watch::channel(LinkState::Pending);
        (
            Self {
                payload: Arc::new(payload),
                state: Arc::new(state),
                resolver: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    /// The published payload.
    pub fn payload(&self) -> &LinkPayload {
        &self.payload
    }

    /// The current state.
    pub fn current(&self) -> LinkState {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<LinkState> {
        self.state.subscribe()
    }

    pub(crate) fn publish(&self, state: LinkState) {
        tracing::debug!(session_id = %self.payload.session_id, ?state, "session state");
        self.state.send_replace(state);
    }

    /// Hand the resolution to the driver. Fails if the session already has one.
    pub(crate) fn resolve(&self, resolution: Resolution) -> Result<(), Resolution> {
        let sender = self.resolver.lock().take();
        match sender {
            Some(tx) => tx.send(resolution),
            None => Err(resolution),
        }
    }

    /// Whether a resolution can still be accepted.
    pub fn is_open(&self) -> bool {
        self.resolver
            .lock()
            .as_ref()
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("session_id", &self.payload.session_id)
            .field("state", &self.current())
            .finish()
    }
}
