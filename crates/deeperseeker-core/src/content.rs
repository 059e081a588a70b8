/// Author of a conversation message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed (or composed) by the person using the app.
    User,
    /// Text produced by the model.
    Assistant,
}

/// One entry of the conversation history.
///
/// History order is chronological and is preserved when mapped onto the
/// outbound request.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Returns `true` when the content carries no text besides whitespace.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Unit of streamed output delivered to a fragment sink.
///
/// Fragments have no ordering key: concatenate them in delivery order to
/// rebuild the full reply.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContentFragment {
    /// Answer text.
    pub text: String,
    /// Separate "thinking" text. Never populated by the base decoder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_text: Option<String>,
}

impl ContentFragment {
    /// Creates a fragment with answer text only.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reasoning_text: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_message_is_blank() {
        assert!(Message::user(" \n\t").is_blank());
        assert!(!Message::assistant(" hi ").is_blank());
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_value(Message::assistant("ok")).expect("serialize");
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "ok"}));
    }
}
