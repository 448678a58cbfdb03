//! Content server discovery.
//!
//! The discovery endpoint returns candidate servers in preference order.
//! Candidates are health-checked one by one; the first healthy one wins.

use url::Url;

use crate::client::{decode, ContentClient};
use crate::error::ContentServerError;
use crate::retry::retry_send;
use crate::types::ServerEntry;

/// Fetch the candidate list from `discovery_url`.
///
/// Entries whose `baseUrl` does not parse are skipped with a warning.
pub async fn discover_servers(
    http: &reqwest::Client,
    discovery_url: &Url,
) -> Result<Vec<Url>, ContentServerError> {
    let endpoint = "GET discovery";
    let resp = retry_send(endpoint, || http.get(discovery_url.clone()).send())
        .await
        .map_err(|e| ContentServerError::Http {
            endpoint: endpoint.into(),
            source: e,
        })?;
    let entries: Vec<ServerEntry> = decode(endpoint, resp).await?;

    let servers: Vec<Url> = entries
        .into_iter()
        .filter_map(|entry| match Url::parse(&entry.base_url) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(base_url = %entry.base_url, error = %e, "skipping unparsable server");
                None
            }
        })
        .collect();
    tracing::debug!(candidates = servers.len(), "discovered content servers");
    Ok(servers)
}

/// Return the first candidate whose `/about` reports healthy.
pub async fn select_healthy(
    http: &reqwest::Client,
    candidates: &[Url],
) -> Result<Url, ContentServerError> {
    for candidate in candidates {
        let client = ContentClient::with_http(http.clone(), candidate.clone());
        match client.about().await {
            Ok(status) if status.healthy => return Ok(candidate.clone()),
            Ok(_) => tracing::debug!(server = %candidate, "server reports unhealthy"),
            Err(e) => tracing::debug!(server = %candidate, error = %e, "server unreachable"),
        }
    }
    Err(ContentServerError::NoHealthyServer {
        candidates: candidates.len(),
    })
}
