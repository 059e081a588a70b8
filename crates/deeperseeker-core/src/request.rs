use crate::config::ClientConfig;
use crate::content::{Message, Role};
use crate::errors::ChatError;
use crate::model::ModelId;

/// Message as it appears on the wire (`role` / `content` only).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

/// JSON body of one streaming chat-completion call.
///
/// Built fresh per call and never mutated after it is sent.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OutboundRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub stream: bool,
    pub max_tokens: u32,
}

impl OutboundRequest {
    /// Shapes conversation history into a request body.
    ///
    /// Blank entries are dropped; the remaining entries keep their order.
    pub fn from_history(
        history: &[Message],
        model: &ModelId,
        config: &ClientConfig,
    ) -> Result<Self, ChatError> {
        if model.as_str().trim().is_empty() {
            return Err(ChatError::Validation("model must not be empty".into()));
        }
        let messages = history
            .iter()
            .filter(|msg| !msg.is_blank())
            .map(|msg| WireMessage {
                role: msg.role,
                content: msg.content.clone(),
            })
            .collect();
        Ok(Self {
            model: model.as_str().to_string(),
            messages,
            stream: true,
            max_tokens: config.max_tokens,
        })
    }
}
