use std::time::Duration;

use crate::errors::ChatError;

/// Default upper bound on generated tokens sent with every request.
pub const DEFAULT_MAX_TOKENS: u32 = 6000;

/// Configuration for [`ChatClient`](crate::ChatClient) and its HTTP transport.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the chat-completions compatible endpoint.
    ///
    /// Useful for proxies or local test servers.
    pub base_url: String,
    /// HTTP timeout for the whole request, including the streamed body.
    /// `None` leaves timeouts to the caller.
    pub timeout: Option<Duration>,
    /// `max_tokens` sent with every request.
    pub max_tokens: u32,
    /// Bounded event buffer size used by [`RunStream`](crate::RunStream).
    pub stream_buffer_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.perplexity.ai".to_string(),
            timeout: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            stream_buffer_capacity: 128,
        }
    }
}

impl ClientConfig {
    /// Builds a config from defaults overridden by `DEEPERSEEKER_BASE_URL` and
    /// `DEEPERSEEKER_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ChatError> {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var("DEEPERSEEKER_BASE_URL")
            && !base_url.trim().is_empty()
        {
            config.base_url = base_url.trim().to_string();
        }
        if let Ok(raw) = std::env::var("DEEPERSEEKER_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                ChatError::Config(format!("invalid DEEPERSEEKER_TIMEOUT_SECS {raw:?}: {e}"))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }

    /// Overrides the API base URL (for proxies or test servers).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets an HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overrides `max_tokens`.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the bounded stream buffer size used between the call task and the
    /// consumer.
    pub fn stream_buffer_capacity(mut self, capacity: usize) -> Self {
        self.stream_buffer_capacity = capacity;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ChatError> {
        if self.base_url.trim().is_empty() {
            return Err(ChatError::Config("base_url must not be empty".into()));
        }
        if self.max_tokens == 0 {
            return Err(ChatError::Config("max_tokens must be greater than 0".into()));
        }
        if self.stream_buffer_capacity == 0 {
            return Err(ChatError::Config(
                "stream_buffer_capacity must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_backend_contract() {
        let config = ClientConfig::default();
        assert_eq!(config.max_tokens, 6000);
        assert_eq!(
            config.chat_completions_url(),
            "https://api.perplexity.ai/chat/completions"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn trailing_slash_is_not_doubled() {
        let config = ClientConfig::default().base_url("http://localhost:8080/");
        assert_eq!(
            config.chat_completions_url(),
            "http://localhost:8080/chat/completions"
        );
    }

    #[test]
    fn zero_buffer_capacity_is_rejected() {
        let err = ClientConfig::default()
            .stream_buffer_capacity(0)
            .validate()
            .expect_err("should fail");
        assert!(matches!(err, ChatError::Config(msg) if msg.contains("stream_buffer_capacity")));
    }
}
