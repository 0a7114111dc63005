//! Attribute resolvers: where the enrichment value comes from.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ResolutionError;

/// Source of a network-derived user attribute.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolver name for logs.
    fn name(&self) -> &str;

    /// Perform one resolution attempt.
    async fn resolve(&self) -> Result<String, ResolutionError>;
}

/// Looks up the public IP address through an ipify-style JSON endpoint.
pub struct HttpResolver {
    url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct IpResponse {
    ip: Option<String>,
}

impl HttpResolver {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Resolver for HttpResolver {
    fn name(&self) -> &str {
        "http"
    }

    async fn resolve(&self) -> Result<String, ResolutionError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ResolutionError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ResolutionError::Status(resp.status().as_u16()));
        }

        let body: IpResponse = resp
            .json()
            .await
            .map_err(|e| ResolutionError::InvalidResponse(e.to_string()))?;

        match body.ip {
            Some(ip) if !ip.trim().is_empty() => Ok(ip),
            _ => Err(ResolutionError::InvalidResponse("missing `ip` field".into())),
        }
    }
}
