//! Network client for probes
//!
//! The coordinator only needs a GET that returns status and body, so it is
//! generic over [`Fetch`]. [`ClientProvider`] builds the proxy-aware reqwest
//! implementation used by the CLI.

use crate::error::ProbeError;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Response of a single probe fetch
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

/// A GET-style fetch shared read-only by every worker
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get(&self, url: &Url, user_agent: &str) -> Result<FetchResponse, ProbeError>;
}

/// Upstream proxy every probe is routed through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    pub host: String,
    pub port: u16,
}

impl ProxySettings {
    fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Builds configured HTTP clients
pub struct ClientProvider {
    timeout: Duration,
}

impl ClientProvider {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Client routed through `proxy`, or direct when `None`
    pub fn client(&self, proxy: Option<&ProxySettings>) -> Result<HttpClient, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout);

        builder = match proxy {
            Some(proxy) => {
                tracing::info!(host = %proxy.host, port = proxy.port, "Routing probes through proxy");
                builder.proxy(reqwest::Proxy::all(proxy.url())?)
            }
            // ignore HTTP_PROXY and friends: no proxy configured means direct
            None => builder.no_proxy(),
        };

        Ok(HttpClient {
            inner: builder.build()?,
        })
    }
}

/// reqwest-backed [`Fetch`]. Connections are released when dropped.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

#[async_trait]
impl Fetch for HttpClient {
    async fn get(&self, url: &Url, user_agent: &str) -> Result<FetchResponse, ProbeError> {
        let response = self
            .inner
            .get(url.clone())
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| ProbeError::Fetch {
                address: url.to_string(),
                source: Box::new(e),
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| ProbeError::Body {
            address: url.to_string(),
            source: Box::new(e),
        })?;

        Ok(FetchResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_url() {
        let proxy = ProxySettings {
            host: "10.0.0.2".to_string(),
            port: 3128,
        };
        assert_eq!(proxy.url(), "http://10.0.0.2:3128");
    }

    #[test]
    fn test_client_with_proxy_builds() {
        let provider = ClientProvider::new(Duration::from_secs(5));
        let proxy = ProxySettings {
            host: "127.0.0.1".to_string(),
            port: 8080,
        };
        assert!(provider.client(Some(&proxy)).is_ok());
        assert!(provider.client(None).is_ok());
    }
}
