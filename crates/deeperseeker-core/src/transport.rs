use std::pin::Pin;

use bytes::Bytes;
use futures::StreamExt as _;
use reqwest::StatusCode;
use tracing::debug;

use crate::config::ClientConfig;
use crate::errors::ChatError;
use crate::request::OutboundRequest;

/// Readable response body: chunks of bytes until end-of-stream, or an error.
pub type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<Bytes, ChatError>> + Send + 'static>>;

/// What the transport got back for one request.
pub enum TransportResponse {
    /// Success status with a body to stream.
    Streaming(ByteStream),
    /// Non-success status. The body is read as plain text for diagnostics.
    Failed { status: u16, body: String },
    /// Success status without a readable body.
    NoBody,
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Streaming(_) => f.write_str("Streaming(..)"),
            Self::Failed { status, body } => f
                .debug_struct("Failed")
                .field("status", status)
                .field("body", body)
                .finish(),
            Self::NoBody => f.write_str("NoBody"),
        }
    }
}

/// Sends one streaming chat request.
///
/// Implementations issue exactly one request per call and never retry.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(
        &self,
        url: &str,
        bearer_token: &str,
        request: &OutboundRequest,
    ) -> Result<TransportResponse, ChatError>;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ChatError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ChatError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ChatTransport for HttpTransport {
    async fn send(
        &self,
        url: &str,
        bearer_token: &str,
        request: &OutboundRequest,
    ) -> Result<TransportResponse, ChatError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(bearer_token)
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::transport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Ok(TransportResponse::Failed {
                status: status.as_u16(),
                body,
            });
        }
        if status == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
            debug!(%status, "response carries no body");
            return Ok(TransportResponse::NoBody);
        }

        let stream = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| ChatError::transport(format!("stream read failed: {e}")))
        });
        Ok(TransportResponse::Streaming(Box::pin(stream)))
    }
}
