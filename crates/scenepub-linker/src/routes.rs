//! # Routes
//!
//! - `GET /` — signing page
//! - `GET /api/payload` — payload to sign
//! - `POST /api/sign` — signer response

use std::path::Path;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use scenepub_crypto::{recover_address, Address, PersonalSignature};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, LinkerError};
use crate::extractors::{extract_validated_json, Validate};
use crate::session::{LinkPayload, Resolution, SessionState, SignedPayload};
use crate::ui;

/// Body of `POST /api/sign`.
///
/// Fields are optional so that missing values produce a descriptive `400`
/// rather than a generic deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    /// `0x` followed by 40 hex characters.
    pub address: Option<String>,
    /// `0x`-prefixed hex signature.
    pub signature: Option<String>,
    /// Chain the wallet is connected to.
    pub chain_id: Option<u64>,
    /// Set by the signing page when the user declined.
    pub error: Option<String>,
}

/// A validated signer response.
#[derive(Debug)]
pub enum SignerResponse {
    /// The signer produced a signature.
    Signed(SignedPayload),
    /// The signer declined.
    Rejected(String),
}

impl Validate for SignRequest {
    type Output = SignerResponse;

    fn validate(self) -> Result<SignerResponse, ApiError> {
        if let Some(reason) = self.error {
            if self.signature.is_none() {
                return Ok(SignerResponse::Rejected(reason));
            }
        }
        let address = self
            .address
            .ok_or_else(|| LinkerError::InvalidResponse("missing field \"address\"".into()))?;
        let signature = self
            .signature
            .ok_or_else(|| LinkerError::InvalidResponse("missing field \"signature\"".into()))?;
        Ok(SignerResponse::Signed(SignedPayload {
            address: Address::parse(&address)?,
            signature: PersonalSignature::from_hex(&signature)?,
            chain_id: self.chain_id,
        }))
    }
}

/// Body returned by a successful `POST /api/sign`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignAccepted {
    /// Always `true`.
    pub ok: bool,
}

/// Build the session router.
pub fn router(state: SessionState, ui_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route("/api/payload", get(get_payload))
        .route("/api/sign", post(post_sign));
    let app = match ui_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api.route("/", get(index)),
    };
    app.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(ui::INDEX_HTML)
}

async fn get_payload(State(state): State<SessionState>) -> Json<LinkPayload> {
    Json(state.payload().clone())
}

async fn post_sign(
    State(state): State<SessionState>,
    body: Result<Json<SignRequest>, JsonRejection>,
) -> Result<Json<SignAccepted>, ApiError> {
    if !state.is_open() {
        return Err(LinkerError::AlreadyResolved.into());
    }
    let resolution = match extract_validated_json(body)? {
        SignerResponse::Signed(signed) => {
            if signed.signature.is_ecdsa() {
                let recovered =
                    recover_address(state.payload().message.as_bytes(), &signed.signature)?;
                if recovered != signed.address {
                    return Err(LinkerError::InvalidResponse(format!(
                        "signature was produced by {recovered}, not {}",
                        signed.address
                    ))
                    .into());
                }
            }
            tracing::info!(
                session_id = %state.payload().session_id,
                address = %signed.address,
                "signature received"
            );
            Resolution::Signed(signed)
        }
        SignerResponse::Rejected(reason) => {
            tracing::info!(session_id = %state.payload().session_id, %reason, "signer declined");
            Resolution::Rejected(reason)
        }
    };
    state
        .resolve(resolution)
        .map_err(|_| ApiError::from(LinkerError::AlreadyResolved))?;
    Ok(Json(SignAccepted { ok: true }))
}
