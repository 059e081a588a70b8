use futures::StreamExt as _;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{Instrument as _, debug};

use crate::client::{ChatClient, PreparedCall};
use crate::decoder::FragmentDecoder;
use crate::errors::ChatError;
use crate::model::ModelId;
use crate::stream::{StreamEvent, StreamSummary};

/// Handle used to request cancellation of an in-flight call.
#[derive(Clone, Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Creates a handle and the signal observed by the call it controls.
    pub fn new() -> (Self, AbortSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, AbortSignal { rx })
    }

    /// Requests cancellation.
    ///
    /// The call fails with `ChatError::Cancelled`; fragments delivered before
    /// the abort are not retracted.
    pub fn abort(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiving side of an [`AbortHandle`].
#[derive(Clone, Debug)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    /// Returns `true` once abort was requested.
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when abort is requested. Never resolves if every handle is
    /// dropped without aborting.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                futures::future::pending::<()>().await;
            }
        }
    }
}

/// Streaming handle returned by [`ChatClient::start_stream`].
///
/// Use `next_event()` to consume events as they arrive and `finish()` to obtain
/// the final result after the terminal event.
pub struct RunStream {
    request_id: uuid::Uuid,
    model: ModelId,
    rx: mpsc::Receiver<StreamEvent>,
    final_rx: oneshot::Receiver<Result<StreamSummary, ChatError>>,
    abort_handle: AbortHandle,
    saw_terminal: bool,
}

impl RunStream {
    /// Returns the id attached to this call's log records.
    pub fn request_id(&self) -> uuid::Uuid {
        self.request_id
    }

    /// Returns a handle that can cancel the call.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort_handle.clone()
    }

    /// Waits for and returns the next event.
    ///
    /// Returns `None` after the event channel is closed.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        let event = self.rx.recv().await;
        if event.as_ref().is_some_and(StreamEvent::is_terminal) {
            self.saw_terminal = true;
        }
        event
    }

    /// Drains the stream (if needed) and returns the terminal result.
    ///
    /// Safe to call after consuming events manually with `next_event()`.
    pub async fn finish(mut self) -> Result<StreamSummary, ChatError> {
        while !self.saw_terminal {
            match self.rx.recv().await {
                Some(event) if event.is_terminal() => self.saw_terminal = true,
                Some(_) => {}
                None => break,
            }
        }
        self.final_result().await
    }

    /// Concatenates all remaining fragments and returns the full reply.
    pub async fn collect_text(mut self) -> Result<String, ChatError> {
        let mut text = String::new();
        while let Some(event) = self.next_event().await {
            match event {
                StreamEvent::Fragment { fragment, .. } => text.push_str(&fragment.text),
                event if event.is_terminal() => break,
                _ => {}
            }
        }
        self.final_result().await.map(|_| text)
    }

    async fn final_result(self) -> Result<StreamSummary, ChatError> {
        match self.final_rx.await {
            Ok(result) => result,
            Err(_) => Err(ChatError::protocol_msg(format!(
                "call task ended without final result (model={})",
                self.model
            ))),
        }
    }
}

pub(crate) fn spawn_run(client: ChatClient, call: PreparedCall) -> RunStream {
    let (tx, rx) = mpsc::channel(client.config().stream_buffer_capacity);
    let (final_tx, final_rx) = oneshot::channel();
    let (abort_handle, abort) = AbortHandle::new();
    let request_id = call.request_id;
    let model = call.model.clone();

    let span = call.span();
    tokio::spawn(run_task(client, call, tx, final_tx, abort).instrument(span));

    RunStream {
        request_id,
        model,
        rx,
        final_rx,
        abort_handle,
        saw_terminal: false,
    }
}

async fn run_task(
    client: ChatClient,
    call: PreparedCall,
    tx: mpsc::Sender<StreamEvent>,
    final_tx: oneshot::Sender<Result<StreamSummary, ChatError>>,
    mut abort: AbortSignal,
) {
    let request_id = call.request_id;
    let result = drive(&client, call, &tx, &mut abort).await;

    let terminal = match &result {
        Ok(summary) => StreamEvent::Completed {
            request_id,
            summary: summary.clone(),
        },
        Err(error) => StreamEvent::Error {
            request_id,
            error: error.clone(),
        },
    };
    let _ = send_event(&tx, terminal).await;
    let _ = final_tx.send(result);
}

async fn drive(
    client: &ChatClient,
    call: PreparedCall,
    tx: &mpsc::Sender<StreamEvent>,
    abort: &mut AbortSignal,
) -> Result<StreamSummary, ChatError> {
    let request_id = call.request_id;
    if !send_event(
        tx,
        StreamEvent::Started {
            request_id,
            model: call.model.clone(),
        },
    )
    .await
    {
        return Err(ChatError::protocol_msg(
            "run stream receiver dropped before Started",
        ));
    }

    let mut body = tokio::select! {
        biased;
        _ = abort.cancelled() => return Err(ChatError::Cancelled),
        opened = client.open(call) => opened?,
    };

    let mut decoder = FragmentDecoder::default();
    let mut seq = 0_u64;
    loop {
        let next = tokio::select! {
            biased;
            _ = abort.cancelled() => {
                debug!(seq, "call aborted mid-stream");
                return Err(ChatError::Cancelled);
            }
            next = body.next() => next,
        };
        match next {
            Some(Ok(chunk)) => {
                for fragment in decoder.push_chunk(&chunk) {
                    let event = StreamEvent::Fragment {
                        request_id,
                        seq,
                        fragment,
                    };
                    seq = seq.saturating_add(1);
                    if !send_event(tx, event).await {
                        return Err(ChatError::protocol_msg(
                            "run stream receiver dropped during output",
                        ));
                    }
                }
            }
            Some(Err(err)) => return Err(err),
            None => break,
        }
    }

    Ok(StreamSummary::from(decoder.finish()))
}

async fn send_event(tx: &mpsc::Sender<StreamEvent>, event: StreamEvent) -> bool {
    tx.send(event).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signal_resolves_after_abort() {
        let (handle, mut signal) = AbortHandle::new();
        assert!(!signal.is_aborted());
        handle.abort();
        tokio::time::timeout(std::time::Duration::from_secs(1), signal.cancelled())
            .await
            .expect("signal should resolve");
        assert!(signal.is_aborted());
    }

    #[tokio::test]
    async fn signal_stays_pending_when_handle_dropped() {
        let (handle, mut signal) = AbortHandle::new();
        drop(handle);
        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(50), signal.cancelled()).await;
        assert!(waited.is_err());
    }
}
