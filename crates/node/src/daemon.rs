//! Client for the snapshot a running `staderd start` serves.

use crate::config::NodeConfig;
use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use reqwest::StatusCode;
use stader_state::NetworkSnapshot;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tracing::debug;

/// Reads the cached snapshot from a local daemon over its HTTP endpoint.
pub struct DaemonClient {
    base_url: String,
    operator: Address,
    http: reqwest::Client,
}

/// Address a local client dials for a server listening on `listen`.
fn dial_addr(listen: SocketAddr) -> SocketAddr {
    match listen.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(Ipv4Addr::LOCALHOST.into(), listen.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(Ipv6Addr::LOCALHOST.into(), listen.port())
        }
        _ => listen,
    }
}

impl DaemonClient {
    pub fn new(config: &NodeConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create daemon HTTP client")?;
        Ok(Self {
            base_url: format!("http://{}", dial_addr(config.metrics.listen_addr)),
            operator: config.node_address,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Snapshot the daemon is serving for the configured node address.
    ///
    /// `Ok(None)` when nothing listens or the daemon has not installed a
    /// snapshot yet.
    pub async fn served_snapshot(&self) -> Result<Option<NetworkSnapshot>> {
        let url = format!("{}/snapshot?operator={}", self.base_url, self.operator);
        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) if e.is_connect() => {
                debug!("No daemon at {}: {}", self.base_url, e);
                return Ok(None);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to query {url}")),
        };

        match response.status() {
            StatusCode::OK => {
                let snapshot = response
                    .json()
                    .await
                    .with_context(|| format!("Malformed snapshot from {url}"))?;
                Ok(Some(snapshot))
            }
            StatusCode::SERVICE_UNAVAILABLE => {
                debug!("Daemon at {} has no snapshot yet", self.base_url);
                Ok(None)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                bail!("Daemon at {} answered {}: {}", self.base_url, status, body)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dial_addr_replaces_unspecified() {
        assert_eq!(
            dial_addr("0.0.0.0:9102".parse().unwrap()),
            "127.0.0.1:9102".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            dial_addr("[::]:9102".parse().unwrap()),
            "[::1]:9102".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            dial_addr("10.0.0.5:9000".parse().unwrap()),
            "10.0.0.5:9000".parse::<SocketAddr>().unwrap()
        );
    }
}
