//! Query session state machine. Owns one channel, accumulates streamed
//! events in arrival order, and resolves to exactly one terminal outcome.

use tokio::sync::mpsc;

use crate::channel::{ChannelEnd, ChannelError, ChannelEvent, ChannelId, SessionChannel};
use crate::protocol::{FinalResult, IterationRecord, QueryRequest, ServerEvent};

/// Lifecycle phase of a query session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Connecting,
    Streaming,
    Completed,
    Failed,
}

impl Phase {
    /// Whether the session has resolved and accepts no further events.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed)
    }
}

/// Why a session failed. Every failure path sets exactly one of these.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// Rejected locally before any network activity.
    #[error("{0}")]
    Validation(String),
    /// The transport never reached connected.
    #[error("could not reach the server: {0}")]
    ConnectFailed(String),
    /// The request frame could not be transmitted after connecting.
    #[error("failed to send the query: {0}")]
    Send(String),
    /// Malformed or unrecognized inbound frame.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// Server-reported failure, message passed through verbatim.
    #[error("{0}")]
    Server(String),
    /// The channel ended without a terminal event.
    #[error("connection closed unexpectedly")]
    UnexpectedClose,
}

/// Receiving half of a session's event stream. Pump it into
/// [`QuerySession::handle_event`].
pub struct SessionEvents {
    rx: mpsc::UnboundedReceiver<(ChannelId, ChannelEvent)>,
}

impl SessionEvents {
    /// Next channel event. Pends while nothing is in flight.
    pub async fn recv(&mut self) -> Option<(ChannelId, ChannelEvent)> {
        self.rx.recv().await
    }
}

/// One in-flight or completed query.
pub struct QuerySession {
    phase: Phase,
    document_id: String,
    question: String,
    status: Option<String>,
    iterations: Vec<IterationRecord>,
    result: Option<FinalResult>,
    error: Option<SessionError>,
    channel: Option<SessionChannel>,
    events_tx: mpsc::UnboundedSender<(ChannelId, ChannelEvent)>,
}

impl QuerySession {
    /// A new idle session and its event stream.
    pub fn new() -> (Self, SessionEvents) {
        let (events_tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                phase: Phase::Idle,
                document_id: String::new(),
                question: String::new(),
                status: None,
                iterations: Vec::new(),
                result: None,
                error: None,
                channel: None,
                events_tx,
            },
            SessionEvents { rx },
        )
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Latest status text reported by the server.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Iterations received so far, in arrival order.
    pub fn iterations(&self) -> &[IterationRecord] {
        &self.iterations
    }

    /// Most recently appended iteration (the one a UI shows as active).
    pub fn latest_iteration(&self) -> Option<&IterationRecord> {
        self.iterations.last()
    }

    pub fn result(&self) -> Option<&FinalResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    /// Start a new query. Any in-flight query is superseded first: its
    /// channel is closed and all accumulated state discarded. Invalid input
    /// fails the session immediately and opens no channel.
    pub fn start(&mut self, address: &str, document_id: &str, question: &str) {
        self.clear();
        let document_id = document_id.trim();
        let question = question.trim();
        if document_id.is_empty() || question.is_empty() {
            self.error = Some(SessionError::Validation(
                "both document_id and question are required".into(),
            ));
            self.phase = Phase::Failed;
            return;
        }
        self.document_id = document_id.to_string();
        self.question = question.to_string();
        self.phase = Phase::Connecting;
        tracing::debug!(document_id, "starting query session");
        self.channel = Some(SessionChannel::open(address, self.events_tx.clone()));
    }

    /// Back to `Idle`: closes any open channel and discards accumulated
    /// state. Safe from any state, idempotent.
    pub fn reset(&mut self) {
        self.clear();
    }

    /// Apply one channel event. Events from any channel other than the
    /// currently owned one are dropped; supersession and terminal
    /// transitions disown the channel, so a late frame can never corrupt
    /// the session.
    pub fn handle_event(&mut self, id: ChannelId, event: ChannelEvent) {
        let is_current = self.channel.as_ref().map(SessionChannel::id) == Some(id);
        if !is_current {
            tracing::trace!(channel = id, "dropping stale channel event");
            return;
        }
        match event {
            ChannelEvent::Connected => self.on_connected(),
            ChannelEvent::Frame(text) => self.on_frame(&text),
            ChannelEvent::SendFailed(detail) => self.fail(SessionError::Send(detail)),
            ChannelEvent::Ended(end) => self.on_ended(end),
        }
    }

    fn on_connected(&mut self) {
        if self.phase != Phase::Connecting {
            return;
        }
        let request = QueryRequest {
            document_id: self.document_id.clone(),
            question: self.question.clone(),
        };
        let frame = match serde_json::to_string(&request) {
            Ok(frame) => frame,
            Err(e) => return self.fail(SessionError::Send(e.to_string())),
        };
        let sent = match &self.channel {
            Some(channel) => channel.send(frame),
            None => Err(ChannelError::NotConnected),
        };
        match sent {
            Ok(()) => self.phase = Phase::Streaming,
            Err(e) => self.fail(SessionError::Send(e.to_string())),
        }
    }

    fn on_frame(&mut self, text: &str) {
        if self.phase != Phase::Streaming {
            return;
        }
        match ServerEvent::decode(text) {
            Ok(ServerEvent::Status { message }) => self.status = Some(message),
            // Step numbers are informational; arrival order is the order.
            Ok(ServerEvent::Iteration(iteration)) => self.iterations.push(iteration),
            Ok(ServerEvent::Result(result)) => {
                self.result = Some(result);
                self.phase = Phase::Completed;
                self.disown_channel();
            }
            Ok(ServerEvent::Error { message }) => self.fail(SessionError::Server(message)),
            Err(e) => {
                tracing::debug!(error = %e, "rejecting inbound frame");
                self.fail(SessionError::Protocol(e.to_string()));
            }
        }
    }

    fn on_ended(&mut self, end: ChannelEnd) {
        if end.connected {
            self.fail(SessionError::UnexpectedClose);
        } else {
            let detail = end.error.unwrap_or_else(|| "connection failed".into());
            self.fail(SessionError::ConnectFailed(detail));
        }
    }

    /// Terminal failure. Iterations accumulated so far are kept for display.
    fn fail(&mut self, error: SessionError) {
        tracing::debug!(error = %error, "query session failed");
        self.error = Some(error);
        self.phase = Phase::Failed;
        self.disown_channel();
    }

    // Once disowned, the channel id no longer matches and every late event
    // on it is dropped, which is what makes the terminal outcome exactly-once.
    fn disown_channel(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
    }

    fn clear(&mut self) {
        self.disown_channel();
        self.phase = Phase::Idle;
        self.document_id.clear();
        self.question.clear();
        self.status = None;
        self.iterations.clear();
        self.result = None;
        self.error = None;
    }
}
