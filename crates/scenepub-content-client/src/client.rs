//! Typed client for one content server.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/content/available-content?cid=…` | Which identifiers the server stores |
//! | POST   | `/content/entities` | Deploy an entity (multipart) |
//! | GET    | `/about` | Health check |

use std::time::Duration;

use scenepub_core::ContentIdentifier;
use url::Url;

use crate::config::ContentServerConfig;
use crate::discovery;
use crate::error::ContentServerError;
use crate::retry::retry_send;
use crate::types::{AvailableContent, DeployRequest, DeployResponse, RemoteContentStatus, ServerStatus};

/// Identifiers per availability request, keeping query strings bounded.
const AVAILABILITY_BATCH: usize = 50;

/// Client for a single content server.
#[derive(Debug, Clone)]
pub struct ContentClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ContentClient {
    /// Client for the server at `base_url`.
    pub fn new(base_url: Url, config: &ContentServerConfig) -> Result<Self, ContentServerError> {
        Ok(Self::with_http(http_client(config)?, base_url))
    }

    pub(crate) fn with_http(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// Client for the configured target, or for the first healthy server
    /// returned by discovery when no target is set.
    pub async fn connect(config: &ContentServerConfig) -> Result<Self, ContentServerError> {
        let http = http_client(config)?;
        let base_url = match &config.target {
            Some(target) => target.clone(),
            None => {
                let candidates = discovery::discover_servers(&http, &config.discovery_url).await?;
                discovery::select_healthy(&http, &candidates).await?
            }
        };
        tracing::info!(target = %base_url, "using content server");
        Ok(Self::with_http(http, base_url))
    }

    /// Root URL of the server.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Ask which of `ids` the server already stores.
    ///
    /// Calls `GET {base_url}/content/available-content?cid=…&cid=…`.
    /// Identifiers the server leaves out of its answer are reported missing.
    pub async fn available_content(
        &self,
        ids: &[ContentIdentifier],
    ) -> Result<RemoteContentStatus, ContentServerError> {
        let endpoint = "GET /content/available-content";
        let url = self.url("content/available-content");
        let mut status: RemoteContentStatus = ids.iter().map(|id| (id.clone(), false)).collect();

        for batch in ids.chunks(AVAILABILITY_BATCH) {
            let query: Vec<(&str, &str)> = batch.iter().map(|id| ("cid", id.as_str())).collect();
            let resp = retry_send(endpoint, || self.http.get(&url).query(&query).send())
                .await
                .map_err(|e| ContentServerError::Http {
                    endpoint: endpoint.into(),
                    source: e,
                })?;
            let entries: Vec<AvailableContent> = decode(endpoint, resp).await?;
            for entry in entries {
                match status.get_mut(&entry.cid) {
                    Some(slot) => *slot = entry.available,
                    None => {
                        return Err(ContentServerError::Malformed {
                            endpoint: endpoint.into(),
                            reason: format!("answer for unrequested identifier {}", entry.cid),
                        })
                    }
                }
            }
        }

        tracing::debug!(
            queried = ids.len(),
            available = status.values().filter(|v| **v).count(),
            "availability checked"
        );
        Ok(status)
    }

    /// Deploy an entity with its auth chain and any missing content.
    ///
    /// Calls `POST {base_url}/content/entities` with a multipart body. Unlike
    /// the read calls, the upload is never retried.
    pub async fn deploy(&self, request: &DeployRequest) -> Result<DeployResponse, ContentServerError> {
        let endpoint = "POST /content/entities";
        let url = self.url("content/entities");
        tracing::info!(
            entity_id = %request.entity_id(),
            files = request.content().len(),
            bytes = request.content_bytes(),
            "uploading deployment"
        );

        // Uploads are sent once, never through retry_send.
        let resp = self
            .http
            .post(&url)
            .multipart(request.to_form())
            .send()
            .await
            .map_err(|e| ContentServerError::UploadFailed {
                endpoint: endpoint.into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ContentServerError::UploadRejected {
                endpoint: endpoint.into(),
                status,
                body,
            });
        }

        resp.json().await.map_err(|e| ContentServerError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })
    }

    /// Fetch the server's status.
    ///
    /// Calls `GET {base_url}/about`.
    pub async fn about(&self) -> Result<ServerStatus, ContentServerError> {
        let endpoint = "GET /about";
        let url = self.url("about");
        let resp = retry_send(endpoint, || self.http.get(&url).send())
            .await
            .map_err(|e| ContentServerError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        decode(endpoint, resp).await
    }
}

pub(crate) fn http_client(config: &ContentServerConfig) -> Result<reqwest::Client, ContentServerError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(concat!("scenepub/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ContentServerError::Http {
            endpoint: "client_init".into(),
            source: e,
        })
}

pub(crate) async fn decode<T: serde::de::DeserializeOwned>(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<T, ContentServerError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(ContentServerError::Status {
            endpoint: endpoint.into(),
            status,
            body,
        });
    }
    resp.json().await.map_err(|e| ContentServerError::Deserialization {
        endpoint: endpoint.into(),
        source: e,
    })
}
