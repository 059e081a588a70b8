use crate::content::ContentFragment;
use crate::decoder::DecodeOutcome;
use crate::errors::ChatError;
use crate::model::ModelId;

/// Terminal statistics for a completed call.
///
/// Does not carry the reply text; callers accumulate fragments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Fragments delivered to the sink.
    pub fragments: u64,
    /// Whether the backend sent `[DONE]` before closing the body.
    pub saw_done: bool,
    /// Data frames skipped because their payload was not JSON.
    pub malformed_frames: usize,
}

impl From<DecodeOutcome> for StreamSummary {
    fn from(outcome: DecodeOutcome) -> Self {
        Self {
            fragments: outcome.fragments,
            saw_done: outcome.saw_done,
            malformed_frames: outcome.malformed_frames,
        }
    }
}

/// Events exposed by [`RunStream`](crate::RunStream).
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// First event for every call.
    Started {
        request_id: uuid::Uuid,
        model: ModelId,
    },
    /// Incremental content, in arrival order.
    Fragment {
        request_id: uuid::Uuid,
        seq: u64,
        fragment: ContentFragment,
    },
    /// Terminal success event.
    Completed {
        request_id: uuid::Uuid,
        summary: StreamSummary,
    },
    /// Terminal failure event.
    Error {
        request_id: uuid::Uuid,
        error: ChatError,
    },
}

impl StreamEvent {
    /// Returns `true` for `Completed` and `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Error { .. })
    }
}
