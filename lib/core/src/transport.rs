use async_trait::async_trait;
use reqwest::Client;

use scroll_utils::errors::ScrollError;

use crate::loader::{Request, Response, Transport};

/// [`Transport`] for native hosts, backed by a `reqwest` client.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
    origin: String,
}

impl ReqwestTransport {
    /// `origin` is prepended to root-relative urls, e.g. `https://example.com`.
    pub fn new(origin: impl Into<String>) -> Result<Self, ScrollError> {
        let client = reqwest::ClientBuilder::new()
            .build()
            .map_err(|e| ScrollError::Platform(e.to_string()))?;
        Ok(Self::with_client(client, origin))
    }

    pub fn with_client(client: Client, origin: impl Into<String>) -> Self {
        ReqwestTransport {
            client,
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }

    fn absolute_url(&self, url: &str) -> String {
        match url.starts_with('/') {
            true => format!("{}{url}", self.origin),
            false => url.to_string(),
        }
    }
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response, ScrollError> {
        let response = self.client
            .request(request.method, self.absolute_url(&request.url))
            .headers(request.headers)
            .send()
            .await
            .map_err(|e| ScrollError::RequestFailed(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| ScrollError::RequestFailed(e.to_string()))?;
        Ok(Response { status, body })
    }
}
