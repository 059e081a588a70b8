use crate::client::ChatClient;
use crate::content::{ContentFragment, Message};
use crate::errors::ChatError;
use crate::model::ModelId;
use crate::stream::StreamSummary;

/// In-memory chat thread bound to one client and model.
///
/// Each `send` appends the prompt, streams the reply, and appends the
/// assistant message once the call succeeds. History is not persisted.
pub struct Conversation {
    client: ChatClient,
    model: ModelId,
    history: Vec<Message>,
}

impl Conversation {
    pub fn new(client: ChatClient, model: ModelId) -> Self {
        Self::with_history(client, model, Vec::new())
    }

    /// Resumes a thread from existing history.
    pub fn with_history(client: ChatClient, model: ModelId, history: Vec<Message>) -> Self {
        Self {
            client,
            model,
            history,
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn model(&self) -> &ModelId {
        &self.model
    }

    /// Switches the model used by later sends. History is kept.
    pub fn set_model(&mut self, model: ModelId) {
        self.model = model;
    }

    /// Sends `prompt` with the whole history and returns the reply text.
    ///
    /// `on_fragment` sees every fragment as it arrives. The user message stays
    /// in history even when the call fails; a partial reply is never recorded.
    pub async fn send<F>(
        &mut self,
        prompt: impl Into<String>,
        mut on_fragment: F,
    ) -> Result<(String, StreamSummary), ChatError>
    where
        F: FnMut(&ContentFragment),
    {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(ChatError::Validation("prompt must not be empty".into()));
        }
        self.history.push(Message::user(prompt));

        let mut reply = String::new();
        let summary = self
            .client
            .send_message(&self.history, &self.model, |fragment| {
                on_fragment(&fragment);
                reply.push_str(&fragment.text);
            })
            .await?;

        self.history.push(Message::assistant(reply.clone()));
        Ok((reply, summary))
    }
}
