//! Common imports for typical client usage.
pub use crate::{
    AbortHandle, ChatClient, ChatError, ClientConfig, ContentFragment, Conversation,
    EnvOrStoreCredential, KeyValueStore, MemoryStore, Message, ModelId, Role, RunStream,
    StaticCredential, StreamEvent, StreamSummary, TranscriptPrompt,
};
