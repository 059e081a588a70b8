use std::sync::Arc;

use tracing::{Instrument as _, Span, debug, info_span};

use crate::config::ClientConfig;
use crate::content::{ContentFragment, Message};
use crate::credentials::{CredentialSource, resolve_token};
use crate::decoder::decode_stream;
use crate::errors::ChatError;
use crate::model::ModelId;
use crate::request::OutboundRequest;
use crate::run::{AbortSignal, RunStream, spawn_run};
use crate::stream::StreamSummary;
use crate::transport::{ByteStream, ChatTransport, HttpTransport, TransportResponse};

struct ClientInner {
    config: ClientConfig,
    credentials: Arc<dyn CredentialSource>,
    transport: Arc<dyn ChatTransport>,
}

/// Entry point for streaming chat calls.
///
/// Cheap to clone; clones share configuration, credentials and transport.
/// Independent calls never share decoding state.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<ClientInner>,
}

/// A validated request with its credential, ready to be sent.
pub(crate) struct PreparedCall {
    pub request_id: uuid::Uuid,
    pub model: ModelId,
    pub token: String,
    pub request: OutboundRequest,
}

impl PreparedCall {
    /// Span wrapping everything done for this call.
    pub fn span(&self) -> Span {
        info_span!(
            "chat_completion",
            request_id = %self.request_id,
            model = %self.model
        )
    }
}

impl ChatClient {
    /// Starts a builder for configuring a `ChatClient`.
    pub fn builder() -> ChatClientBuilder {
        ChatClientBuilder::default()
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Sends `history` to `model` and streams the reply into `on_fragment`.
    ///
    /// Blank history entries are dropped before sending. Fragments are
    /// delivered one at a time in arrival order. The future resolves after the
    /// whole body was drained, or fails without retrying.
    pub async fn send_message<F>(
        &self,
        history: &[Message],
        model: &ModelId,
        on_fragment: F,
    ) -> Result<StreamSummary, ChatError>
    where
        F: FnMut(ContentFragment),
    {
        let call = self.prepare(history, model)?;
        let span = call.span();
        async move {
            let body = self.open(call).await?;
            let outcome = decode_stream(body, None, on_fragment).await?;
            Ok::<StreamSummary, ChatError>(outcome.into())
        }
        .instrument(span)
        .await
    }

    /// Same as [`send_message`](Self::send_message), failing with
    /// `ChatError::Cancelled` once `abort` fires.
    pub async fn send_message_with_abort<F>(
        &self,
        history: &[Message],
        model: &ModelId,
        mut abort: AbortSignal,
        on_fragment: F,
    ) -> Result<StreamSummary, ChatError>
    where
        F: FnMut(ContentFragment),
    {
        let call = self.prepare(history, model)?;
        let span = call.span();
        async move {
            let body = tokio::select! {
                biased;
                _ = abort.cancelled() => return Err(ChatError::Cancelled),
                opened = self.open(call) => opened?,
            };
            let outcome = decode_stream(body, Some(abort), on_fragment).await?;
            Ok::<StreamSummary, ChatError>(outcome.into())
        }
        .instrument(span)
        .await
    }

    /// Starts the call on a background task and returns a handle yielding
    /// [`StreamEvent`](crate::StreamEvent)s through a bounded channel.
    ///
    /// Validation and credential errors are returned before anything is
    /// spawned.
    pub async fn start_stream(
        &self,
        history: Vec<Message>,
        model: ModelId,
    ) -> Result<RunStream, ChatError> {
        let call = self.prepare(&history, &model)?;
        Ok(spawn_run(self.clone(), call))
    }

    pub(crate) fn prepare(
        &self,
        history: &[Message],
        model: &ModelId,
    ) -> Result<PreparedCall, ChatError> {
        let request = OutboundRequest::from_history(history, model, &self.inner.config)?;
        let token = resolve_token(self.inner.credentials.as_ref())?;
        Ok(PreparedCall {
            request_id: uuid::Uuid::new_v4(),
            model: model.clone(),
            token,
            request,
        })
    }

    pub(crate) async fn open(&self, call: PreparedCall) -> Result<ByteStream, ChatError> {
        let url = self.inner.config.chat_completions_url();
        debug!(
            messages = call.request.messages.len(),
            "starting chat completion stream"
        );
        let response = self
            .inner
            .transport
            .send(&url, &call.token, &call.request)
            .await?;
        match response {
            TransportResponse::Streaming(body) => Ok(body),
            TransportResponse::Failed { status, body } => {
                debug!(status, "chat completion rejected");
                Err(ChatError::HttpStatus { status, body })
            }
            TransportResponse::NoBody => Err(ChatError::EmptyBody),
        }
    }
}

/// Builder used to assemble a [`ChatClient`].
#[derive(Default)]
pub struct ChatClientBuilder {
    config: Option<ClientConfig>,
    credentials: Option<Arc<dyn CredentialSource>>,
    transport: Option<Arc<dyn ChatTransport>>,
}

impl ChatClientBuilder {
    /// Sets the configuration. Defaults to `ClientConfig::default()`.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the credential source. Required.
    pub fn credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Replaces the default `reqwest` transport.
    pub fn transport(mut self, transport: Arc<dyn ChatTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Validates the configuration and builds the client.
    pub fn build(self) -> Result<ChatClient, ChatError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let credentials = self
            .credentials
            .ok_or_else(|| ChatError::Config("a credential source is required".into()))?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&config)?),
        };
        Ok(ChatClient {
            inner: Arc::new(ClientInner {
                config,
                credentials,
                transport,
            }),
        })
    }
}
