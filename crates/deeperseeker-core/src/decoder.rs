//! Incremental decoding of `data:`-framed chat-completion streams.
//!
//! The transport hands over chunks with arbitrary alignment. [`LineDecoder`]
//! accumulates raw bytes and only releases complete `\n`-terminated lines, so
//! neither a split line nor a split multi-byte character is ever decoded
//! early. Each released line is classified and, when it carries a content
//! delta, forwarded to the caller's sink before the next line is looked at.

use bytes::Bytes;
use futures::{Stream, StreamExt as _};
use tracing::{debug, warn};

use crate::content::ContentFragment;
use crate::errors::{ChatError, MalformedFrame};
use crate::run::AbortSignal;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Malformed frames kept verbatim in [`DecodeOutcome::malformed_samples`];
/// later ones are only counted.
pub const MAX_MALFORMED_SAMPLES: usize = 8;

/// Byte accumulator that splits a chunked body into complete lines.
///
/// Only the trailing partial line is retained between chunks. Bytes already
/// scanned for a line break are not scanned again.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
    scanned: usize,
}

impl LineDecoder {
    /// Appends a chunk and returns every line completed by it, without line
    /// terminators.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        let mut start = 0;
        for idx in self.scanned..self.buf.len() {
            if self.buf[idx] == b'\n' {
                lines.push(decode_line(&self.buf[start..idx]));
                start = idx + 1;
            }
        }
        self.buf.drain(..start);
        self.scanned = self.buf.len();
        lines
    }

    /// Number of buffered bytes that do not yet form a complete line.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    /// Ends decoding. An unterminated trailing line is dropped; the number of
    /// dropped bytes is returned.
    pub fn finish(self) -> usize {
        self.buf.len()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Classification of one complete line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Blank line, comment, keep-alive, or any non-`data:` field.
    Ignored,
    /// The `[DONE]` sentinel.
    Done,
    /// Payload following the `data: ` marker.
    Data(&'a str),
}

/// Classifies a complete line.
pub fn classify_line(line: &str) -> Frame<'_> {
    if line.trim().is_empty() {
        return Frame::Ignored;
    }
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Frame::Ignored;
    };
    if payload.trim_end() == DONE_SENTINEL {
        Frame::Done
    } else {
        Frame::Data(payload)
    }
}

/// Extracts the fragment carried by a data payload.
///
/// Returns `Ok(None)` for well-formed envelopes without text (role-only or
/// finish-reason chunks) and `Err` when the payload is not JSON.
pub fn extract_fragment(payload: &str) -> Result<Option<ContentFragment>, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(payload)?;
    let text = value
        .pointer("/choices/0/delta/content")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty());
    Ok(text.map(ContentFragment::text))
}

/// Result of draining one response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Fragments delivered to the sink.
    pub fragments: u64,
    /// Whether the `[DONE]` sentinel was seen before the body closed.
    pub saw_done: bool,
    /// Frames that were skipped because their payload was not JSON.
    pub malformed_frames: usize,
    /// The first [`MAX_MALFORMED_SAMPLES`] of those frames.
    pub malformed_samples: Vec<MalformedFrame>,
    /// Bytes of an unterminated trailing line dropped at end of body.
    pub discarded_bytes: usize,
}

/// Per-body decoding state: line framing plus frame interpretation.
///
/// Owned by exactly one call. After `[DONE]` further lines are still framed
/// (so the body can drain) but never emitted.
#[derive(Debug, Default)]
pub struct FragmentDecoder {
    lines: LineDecoder,
    outcome: DecodeOutcome,
}

impl FragmentDecoder {
    /// Feeds one chunk, calling `sink` for each fragment before the next line
    /// is interpreted.
    pub fn push_chunk_with<F>(&mut self, chunk: &[u8], sink: &mut F)
    where
        F: FnMut(ContentFragment),
    {
        for line in self.lines.push_chunk(chunk) {
            self.process_line(&line, sink);
        }
    }

    /// Feeds one chunk and returns the fragments it completed, in order.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<ContentFragment> {
        let mut fragments = Vec::new();
        self.push_chunk_with(chunk, &mut |fragment| fragments.push(fragment));
        fragments
    }

    /// Whether `[DONE]` has been seen.
    pub fn is_done(&self) -> bool {
        self.outcome.saw_done
    }

    /// Ends the body and returns what was decoded.
    pub fn finish(self) -> DecodeOutcome {
        let mut outcome = self.outcome;
        outcome.discarded_bytes = self.lines.finish();
        if outcome.discarded_bytes > 0 {
            debug!(
                bytes = outcome.discarded_bytes,
                "dropping unterminated trailing line"
            );
        }
        outcome
    }

    fn process_line<F>(&mut self, line: &str, sink: &mut F)
    where
        F: FnMut(ContentFragment),
    {
        if self.outcome.saw_done {
            return;
        }
        match classify_line(line) {
            Frame::Ignored => {}
            Frame::Done => self.outcome.saw_done = true,
            Frame::Data(payload) => match extract_fragment(payload) {
                Ok(Some(fragment)) => {
                    self.outcome.fragments += 1;
                    sink(fragment);
                }
                Ok(None) => {}
                Err(err) => {
                    let malformed = MalformedFrame {
                        line: line.to_string(),
                        reason: err.to_string(),
                    };
                    warn!(error = %malformed, "skipping malformed stream frame");
                    self.outcome.malformed_frames += 1;
                    if self.outcome.malformed_samples.len() < MAX_MALFORMED_SAMPLES {
                        self.outcome.malformed_samples.push(malformed);
                    }
                }
            },
        }
    }
}

/// Drains `stream`, invoking `on_fragment` for each content delta in arrival
/// order.
///
/// Returns once the transport closes, whether or not `[DONE]` was seen.
/// Transport errors are returned as-is; fragments already delivered stay
/// delivered. When `abort` fires, the call fails with [`ChatError::Cancelled`].
pub async fn decode_stream<S, E, F>(
    mut stream: S,
    mut abort: Option<AbortSignal>,
    mut on_fragment: F,
) -> Result<DecodeOutcome, ChatError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<ChatError>,
    F: FnMut(ContentFragment),
{
    let mut decoder = FragmentDecoder::default();

    loop {
        let next = match abort.as_mut() {
            Some(signal) => {
                tokio::select! {
                    biased;
                    _ = signal.cancelled() => {
                        debug!(fragments = decoder.outcome.fragments, "stream decode aborted");
                        return Err(ChatError::Cancelled);
                    }
                    next = stream.next() => next,
                }
            }
            None => stream.next().await,
        };

        match next {
            Some(Ok(chunk)) => decoder.push_chunk_with(&chunk, &mut on_fragment),
            Some(Err(err)) => return Err(err.into()),
            None => break,
        }
    }

    Ok(decoder.finish())
}
