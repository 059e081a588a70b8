/// Errors that abort a chat call.
///
/// Malformed individual frames are not represented here; they are reported
/// through [`MalformedFrame`] and never end a stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Invalid caller input (for example an empty model id).
    #[error("validation error: {0}")]
    Validation(String),
    /// No bearer token was available when the call was issued.
    #[error("missing API credential")]
    MissingCredential,
    /// The backend answered with a non-success status before streaming began.
    #[error("request failed with status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    /// The backend reported success but gave no readable body.
    #[error("response has no readable body")]
    EmptyBody,
    /// Connection or stream I/O failed.
    #[error("transport error: {0}")]
    Transport(String),
    /// The caller aborted the call.
    #[error("cancelled")]
    Cancelled,
    /// Internal channel misuse or invariant violation.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ChatError {
    /// Creates a transport-level error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub(crate) fn protocol_msg(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Returns `true` when the error was caused by cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(value: reqwest::Error) -> Self {
        ChatError::Transport(value.to_string())
    }
}

impl From<std::convert::Infallible> for ChatError {
    fn from(value: std::convert::Infallible) -> Self {
        match value {}
    }
}

/// A `data:` line whose payload is not valid JSON.
///
/// Reported and counted by the decoder, then skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed frame ({reason}): {line}")]
pub struct MalformedFrame {
    /// The offending line, without the trailing line break.
    pub line: String,
    /// Parser error message.
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_message_includes_status_and_body() {
        let err = ChatError::HttpStatus {
            status: 401,
            body: "bad key".into(),
        };
        assert_eq!(err.to_string(), "request failed with status 401: bad key");
    }

    #[test]
    fn only_cancelled_reports_cancellation() {
        assert!(ChatError::Cancelled.is_cancelled());
        assert!(!ChatError::transport("reset").is_cancelled());
    }
}
