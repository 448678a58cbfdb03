//! # scenepub-linker — Local Signing Handshake
//!
//! Bridges the CLI process to an external signer (a browser wallet). A
//! session binds a loopback HTTP listener, publishes the payload to sign and
//! resolves exactly once: signed, failed, cancelled or timed out.
//!
//! ## Routes
//!
//! - `GET /` — signing page (static directory when configured, inline page otherwise)
//! - `GET /api/payload` — the [`LinkPayload`] as JSON
//! - `POST /api/sign` — `{address, signature, chainId?}` from the signer
//!
//! ## Lifecycle
//!
//! `Pending → AwaitingResponse → Signed | Failed | Cancelled | TimedOut`
//!
//! One driver task per session owns the listener. It races the signer's
//! response against the timeout, explicit cancellation and Ctrl-C; the first
//! wins. The listener is shut down before the terminal state is published, so
//! an observer that sees a terminal state can rely on the port being closed.
//!
//! ## Crate Policy
//!
//! - No global state. Session exclusivity is scoped to one [`Linker`].
//! - Malformed POST bodies are answered with `400` and leave the session open.
//! - All HTTP errors use the JSON body `{"error": {"code", "message"}}`.

pub mod config;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;
pub mod session;
mod ui;

pub use config::LinkerConfig;
pub use error::{ApiError, LinkerError};
pub use server::{LinkHandle, Linker};
pub use session::{LinkPayload, LinkState, SignedPayload};
