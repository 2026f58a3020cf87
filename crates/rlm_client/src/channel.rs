//! Session channel: one WebSocket connection for the lifetime of one query.
//! Non-blocking open, ordered event delivery tagged with a process-unique
//! channel identity so a superseded channel's late events stay identifiable.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Process-unique identity of one channel. Stale-event filtering compares
/// ids, never channel state.
pub type ChannelId = u64;

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// Events a channel delivers to its owner, tagged with the channel id.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// Transport established. At most once, before any `Frame`.
    Connected,
    /// One inbound text frame.
    Frame(String),
    /// An outbound write failed after the transport was connected.
    SendFailed(String),
    /// Transport gone. Exactly once, always last.
    Ended(ChannelEnd),
}

/// How a channel ended.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEnd {
    /// Whether the transport ever reached connected. `false` means the
    /// service was unreachable; `true` means a post-connect disconnect.
    pub connected: bool,
    /// Transport error detail, if the end was not a clean close.
    pub error: Option<String>,
}

/// Channel-level error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChannelError {
    #[error("channel is not connected")]
    NotConnected,
}

enum ChannelCommand {
    Send(String),
    Close,
}

/// An ordered, full-duplex, message-framed connection to one remote
/// endpoint, exclusively owned by a query session.
pub struct SessionChannel {
    id: ChannelId,
    cmd_tx: mpsc::UnboundedSender<ChannelCommand>,
    connected: Arc<AtomicBool>,
    closed: bool,
}

impl SessionChannel {
    /// Begin connecting to `address`. Returns immediately; completion is
    /// signaled on `events` with `Connected`, or with
    /// `Ended { connected: false, .. }` if the transport never gets there.
    pub fn open(address: &str, events: mpsc::UnboundedSender<(ChannelId, ChannelEvent)>) -> Self {
        let id = NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));
        tokio::spawn(run_channel(
            id,
            address.to_string(),
            cmd_rx,
            events,
            connected.clone(),
        ));
        Self {
            id,
            cmd_tx,
            connected,
            closed: false,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Queue one outbound text frame. Valid only while connected.
    pub fn send(&self, frame: String) -> Result<(), ChannelError> {
        if self.closed || !self.connected.load(Ordering::Acquire) {
            return Err(ChannelError::NotConnected);
        }
        self.cmd_tx
            .send(ChannelCommand::Send(frame))
            .map_err(|_| ChannelError::NotConnected)
    }

    /// Close the transport. Idempotent, safe from any state; the underlying
    /// connection is released exactly once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        // The pump task may already be gone; nothing left to release then.
        let _ = self.cmd_tx.send(ChannelCommand::Close);
    }
}

impl Drop for SessionChannel {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_channel(
    id: ChannelId,
    address: String,
    mut cmd_rx: mpsc::UnboundedReceiver<ChannelCommand>,
    events: mpsc::UnboundedSender<(ChannelId, ChannelEvent)>,
    connected: Arc<AtomicBool>,
) {
    let mut ws = match tokio_tungstenite::connect_async(address.as_str()).await {
        Ok((ws, _)) => ws,
        Err(e) => {
            tracing::debug!(channel = id, error = %e, "connect failed");
            let _ = events.send((
                id,
                ChannelEvent::Ended(ChannelEnd {
                    connected: false,
                    error: Some(e.to_string()),
                }),
            ));
            return;
        }
    };
    connected.store(true, Ordering::Release);
    tracing::debug!(channel = id, "connected");
    let _ = events.send((id, ChannelEvent::Connected));

    let mut end = ChannelEnd {
        connected: true,
        error: None,
    };
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(ChannelCommand::Send(frame)) => {
                    if let Err(e) = ws.send(Message::Text(frame)).await {
                        let _ = events.send((id, ChannelEvent::SendFailed(e.to_string())));
                        break;
                    }
                }
                Some(ChannelCommand::Close) | None => break,
            },
            inbound = ws.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send((id, ChannelEvent::Frame(text)));
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Ping/pong/binary are not part of the protocol.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    end.error = Some(e.to_string());
                    break;
                }
            },
        }
    }
    let _ = ws.close(None).await;
    tracing::debug!(channel = id, "ended");
    let _ = events.send((id, ChannelEvent::Ended(end)));
}
