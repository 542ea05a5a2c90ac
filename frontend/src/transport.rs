use async_trait::async_trait;
use gloo_net::http::RequestBuilder;
use http::StatusCode;

use infinite_scroll::loader::{Request, Response, Transport};
use scroll_utils::errors::ScrollError;

/// [`Transport`] using the fetch api of the browser.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlooTransport;

#[async_trait(?Send)]
impl Transport for GlooTransport {
    async fn send(&self, request: Request) -> Result<Response, ScrollError> {
        let mut builder = RequestBuilder::new(&request.url).method(request.method);
        for (name, value) in request.headers.iter() {
            let value = value.to_str().map_err(|e| ScrollError::InvalidHeader(e.to_string()))?;
            builder = builder.header(name.as_str(), value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ScrollError::RequestFailed(e.to_string()))?;
        let status = StatusCode::from_u16(response.status())
            .map_err(|e| ScrollError::RequestFailed(e.to_string()))?;
        let body = response
            .text()
            .await
            .map_err(|e| ScrollError::RequestFailed(e.to_string()))?;
        Ok(Response { status, body })
    }
}
