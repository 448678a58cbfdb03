//! # Session Driver
//!
//! [`Linker::open`] binds the listener, spawns one driver task and hands back
//! a [`LinkHandle`]. The driver owns the listener for the whole session:
//!
//! 1. serve the router with a graceful-shutdown trigger,
//! 2. race the signer's resolution against timeout, cancellation and Ctrl-C,
//! 3. stop the server (aborting it if in-flight requests overrun the grace period),
//! 4. release the linker and publish the terminal [`LinkState`].

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch, Notify};
use uuid::Uuid;

use crate::config::LinkerConfig;
use crate::error::LinkerError;
use crate::routes;
use crate::session::{LinkPayload, LinkState, Resolution, SessionState, SignedPayload};

/// Opens signing sessions, at most one at a time.
///
/// Clones share the same session slot.
#[derive(Debug, Clone)]
pub struct Linker {
    config: LinkerConfig,
    busy: Arc<AtomicBool>,
}

impl Linker {
    /// Create a linker with the given configuration.
    pub fn new(config: LinkerConfig) -> Self {
        Self {
            config,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The linker's configuration.
    pub fn config(&self) -> &LinkerConfig {
        &self.config
    }

    /// Whether a session is currently live.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Bind the listener and start serving `payload`.
    ///
    /// Fails with [`LinkerError::SessionInProgress`] without binding when a
    /// previous session on this linker has not reached a terminal state.
    pub async fn open(&self, payload: LinkPayload) -> Result<LinkHandle, LinkerError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(LinkerError::SessionInProgress);
        }
        let guard = BusyGuard(self.busy.clone());

        let listener = bind(&self.config).await?;
        let addr = listener.local_addr().map_err(|source| LinkerError::Bind {
            addr: "127.0.0.1".to_string(),
            source,
        })?;

        let session_id = payload.session_id;
        let (state, resolution) = SessionState::new(payload.clone());
        let router = routes::router(state.clone(), self.config.ui_dir.as_deref());
        let receiver = state.subscribe();
        state.publish(LinkState::AwaitingResponse);

        let url = format!("http://{addr}/");
        tracing::info!(%session_id, %url, entity_id = %payload.entity_id, "signing session open");

        let cancel = Arc::new(Notify::new());
        tokio::spawn(drive(
            state,
            listener,
            router,
            resolution,
            cancel.clone(),
            self.config.clone(),
            guard,
        ));

        Ok(LinkHandle {
            url,
            addr,
            payload,
            state: receiver,
            cancel,
        })
    }
}

/// Clears the linker's busy flag when the session driver ends.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Handle to a live signing session. Dropping it cancels the session.
#[derive(Debug)]
pub struct LinkHandle {
    url: String,
    addr: SocketAddr,
    payload: LinkPayload,
    state: watch::Receiver<LinkState>,
    cancel: Arc<Notify>,
}

impl LinkHandle {
    /// URL of the signing page.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Address the listener is bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Id of this session.
    pub fn session_id(&self) -> Uuid {
        self.payload.session_id
    }

    /// The payload being served.
    pub fn payload(&self) -> &LinkPayload {
        &self.payload
    }

    /// Current session state.
    pub fn state(&self) -> LinkState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<LinkState> {
        self.state.clone()
    }

    /// Cancel the session. No-op once it is terminal.
    pub fn cancel(&self) {
        self.cancel.notify_one();
    }

    /// Wait for the session outcome.
    pub async fn wait(&self) -> Result<SignedPayload, LinkerError> {
        let mut rx = self.state.clone();
        let outcome = match rx.wait_for(LinkState::is_terminal).await {
            Ok(state) => state.clone(),
            Err(_) => {
                return Err(LinkerError::InvalidResponse(
                    "session ended without an outcome".to_string(),
                ))
            }
        };
        match outcome {
            LinkState::Signed(signed) => Ok(signed),
            LinkState::TimedOut => Err(LinkerError::TimedOut),
            LinkState::Cancelled => Err(LinkerError::Cancelled),
            LinkState::Failed { reason } => Err(LinkerError::Rejected(reason)),
            LinkState::Pending | LinkState::AwaitingResponse => Err(LinkerError::InvalidResponse(
                "session ended without an outcome".to_string(),
            )),
        }
    }
}

impl Drop for LinkHandle {
    fn drop(&mut self) {
        if !self.state.borrow().is_terminal() {
            self.cancel.notify_one();
        }
    }
}

async fn bind(config: &LinkerConfig) -> Result<TcpListener, LinkerError> {
    let port = config.port.unwrap_or(0);
    match TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await {
        Ok(listener) => Ok(listener),
        Err(err) if port == config.fallback_port => Err(bind_error(port, err)),
        Err(err) => {
            tracing::warn!(port, fallback = config.fallback_port, error = %err, "bind failed, trying fallback port");
            TcpListener::bind((Ipv4Addr::LOCALHOST, config.fallback_port))
                .await
                .map_err(|err| bind_error(config.fallback_port, err))
        }
    }
}

fn bind_error(port: u16, source: std::io::Error) -> LinkerError {
    if source.kind() == std::io::ErrorKind::AddrInUse {
        LinkerError::PortInUse { port }
    } else {
        LinkerError::Bind {
            addr: format!("127.0.0.1:{port}"),
            source,
        }
    }
}

async fn drive(
    state: SessionState,
    listener: TcpListener,
    router: axum::Router,
    resolution: oneshot::Receiver<Resolution>,
    cancel: Arc<Notify>,
    config: LinkerConfig,
    guard: BusyGuard,
) {
    let session_id = state.payload().session_id;
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                stop_rx.await.ok();
            })
            .await
    });

    let outcome = tokio::select! {
        res = resolution => match res {
            Ok(Resolution::Signed(signed)) => LinkState::Signed(signed),
            Ok(Resolution::Rejected(reason)) => LinkState::Failed { reason },
            Err(_) => LinkState::Failed { reason: "resolution channel closed".to_string() },
        },
        _ = tokio::time::sleep(config.timeout) => LinkState::TimedOut,
        _ = cancel.notified() => LinkState::Cancelled,
        _ = ctrl_c(config.cancel_on_ctrl_c) => LinkState::Cancelled,
    };

    stop_tx.send(()).ok();
    match tokio::time::timeout(config.shutdown_grace, &mut server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(err))) => tracing::warn!(%session_id, error = %err, "signing server failed"),
        Ok(Err(err)) => tracing::warn!(%session_id, error = %err, "signing server task failed"),
        Err(_) => {
            tracing::debug!(%session_id, "grace period elapsed, aborting signing server");
            server.abort();
            server.await.ok();
        }
    }

    match &outcome {
        LinkState::Signed(signed) => {
            tracing::info!(%session_id, address = %signed.address, "signing session signed")
        }
        LinkState::TimedOut => tracing::warn!(%session_id, "signing session timed out"),
        other => tracing::info!(%session_id, state = ?other, "signing session closed"),
    }

    drop(guard);
    state.publish(outcome);
}

async fn ctrl_c(enabled: bool) {
    if enabled && tokio::signal::ctrl_c().await.is_ok() {
        return;
    }
    std::future::pending::<()>().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_in_use_maps_to_port_in_use() {
        let err = bind_error(4044, std::io::Error::from(std::io::ErrorKind::AddrInUse));
        assert!(matches!(err, LinkerError::PortInUse { port: 4044 }));
        let err = bind_error(4044, std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(matches!(err, LinkerError::Bind { .. }));
    }

    #[tokio::test]
    async fn occupied_port_falls_back() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let taken_port = taken.local_addr().unwrap().port();
        let spare = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let spare_port = spare.local_addr().unwrap().port();
        drop(spare);

        let config = LinkerConfig {
            port: Some(taken_port),
            fallback_port: spare_port,
            ..LinkerConfig::for_tests(std::time::Duration::from_secs(1))
        };
        let listener = bind(&config).await.unwrap();
        assert_eq!(listener.local_addr().unwrap().port(), spare_port);
    }

    #[tokio::test]
    async fn both_ports_taken_is_port_in_use() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();
        let config = LinkerConfig {
            port: Some(port),
            fallback_port: port,
            ..LinkerConfig::for_tests(std::time::Duration::from_secs(1))
        };
        assert!(matches!(
            bind(&config).await,
            Err(LinkerError::PortInUse { .. })
        ));
    }
}
