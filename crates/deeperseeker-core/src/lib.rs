//! Streaming chat-completion client core.
//!
//! Shapes conversation history into a chat-completions request, sends it, and
//! decodes the `data:`-framed response body incrementally, handing each
//! content delta to the caller as soon as its line is complete.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use deeperseeker_core::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ChatError> {
//! let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
//! let client = ChatClient::builder()
//!     .config(ClientConfig::from_env()?)
//!     .credentials(Arc::new(EnvOrStoreCredential::new(store.clone())))
//!     .build()?;
//!
//! let history = vec![Message::user("Why is the sky blue?")];
//! let model = ModelId::load_selected(store.as_ref());
//! client
//!     .send_message(&history, &model, |fragment| print!("{}", fragment.text))
//!     .await?;
//! # Ok(())
//! # }
//! ```

/// Chat client and builder (the request side of a call).
pub mod client;
/// Client configuration.
pub mod config;
/// Messages and streamed content fragments.
pub mod content;
/// In-memory conversation thread.
pub mod conversation;
/// Bearer credential sources.
pub mod credentials;
/// Incremental response-stream decoder.
pub mod decoder;
/// Error types.
pub mod errors;
/// Model identifiers and persisted model selection.
pub mod model;
/// Tracing subscriber setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Prompt templates for transcript input.
pub mod prompt;
/// Outbound request shaping.
pub mod request;
/// Background streaming handle and cancellation.
pub mod run;
/// Key-value persistence capability.
pub mod store;
/// Stream events and terminal summaries.
pub mod stream;
/// HTTP transport seam.
pub mod transport;

pub use client::{ChatClient, ChatClientBuilder};
pub use config::ClientConfig;
pub use content::{ContentFragment, Message, Role};
pub use conversation::Conversation;
pub use credentials::{CredentialSource, EnvOrStoreCredential, StaticCredential};
pub use decoder::{DecodeOutcome, FragmentDecoder, LineDecoder, decode_stream};
pub use errors::{ChatError, MalformedFrame};
pub use model::ModelId;
pub use prompt::TranscriptPrompt;
pub use request::OutboundRequest;
pub use run::{AbortHandle, AbortSignal, RunStream};
pub use store::{KeyValueStore, MemoryStore};
pub use stream::{StreamEvent, StreamSummary};
pub use transport::{ByteStream, ChatTransport, HttpTransport, TransportResponse};
