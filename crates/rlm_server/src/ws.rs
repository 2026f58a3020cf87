//! WebSocket session handling: one query per connection, streamed as
//! status / iteration frames followed by exactly one terminal frame.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use rlm_client::protocol::{FinalResult, IterationRecord, Metrics, QueryRequest, ServerEvent};

use crate::engine::ReasoningEngine;
use crate::store::DocumentStore;

/// Pause between replayed iteration frames so the client can render the
/// trajectory incrementally.
const REPLAY_INTERVAL: Duration = Duration::from_millis(100);

/// Session-handler failure (transport or frame encoding).
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("websocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("frame encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Accept loop: one spawned session handler per connection.
pub async fn serve(
    listener: TcpListener,
    store: Arc<DocumentStore>,
    engine: Arc<dyn ReasoningEngine>,
) -> std::io::Result<()> {
    loop {
        let (tcp, peer) = listener.accept().await?;
        tracing::info!(%peer, "accepted connection");
        tokio::spawn(handle_session(tcp, store.clone(), engine.clone()));
    }
}

type WsStream = WebSocketStream<TcpStream>;

/// Handle one query session end to end. Every path that still has a peer
/// sends exactly one terminal frame (`result` or `error`).
pub async fn handle_session(
    tcp: TcpStream,
    store: Arc<DocumentStore>,
    engine: Arc<dyn ReasoningEngine>,
) {
    let ws = match tokio_tungstenite::accept_async(tcp).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!(error = %e, "websocket handshake failed");
            return;
        }
    };
    if let Err(e) = run_session(ws, store, engine).await {
        tracing::info!(error = %e, "session ended early");
    }
}

async fn run_session(
    mut ws: WsStream,
    store: Arc<DocumentStore>,
    engine: Arc<dyn ReasoningEngine>,
) -> Result<(), ServeError> {
    // Exactly one request frame opens the session.
    let request = loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => break text,
            Some(Ok(Message::Close(_))) | None => return Ok(()),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
        }
    };

    let request: QueryRequest = match serde_json::from_str(&request) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting malformed query frame");
            return send_error(&mut ws, "Both document_id and question are required").await;
        }
    };
    let document_id = request.document_id.trim().to_string();
    let question = request.question.trim().to_string();
    if document_id.is_empty() || question.is_empty() {
        return send_error(&mut ws, "Both document_id and question are required").await;
    }

    let Some(document) = store.get(&document_id) else {
        tracing::info!(%document_id, "query for unknown document");
        return send_error(&mut ws, "Document not found").await;
    };

    send_event(
        &mut ws,
        &ServerEvent::Status {
            message: "RLM is exploring your document...".into(),
        },
    )
    .await?;

    tracing::info!(%document_id, "running query");
    let started = Instant::now();
    let outcome =
        tokio::task::spawn_blocking(move || engine.run(&document.text, &question)).await;
    let elapsed = started.elapsed();

    let outcome = match outcome {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "engine run failed");
            return send_error(&mut ws, &e.to_string()).await;
        }
        Err(e) => {
            tracing::error!(error = %e, "engine task panicked");
            return send_error(&mut ws, "Internal error while running the query").await;
        }
    };

    // Replay the trajectory as the incremental part of the stream.
    let mut sub_llm_calls = 0u64;
    for (index, step) in outcome.trajectory.iter().enumerate() {
        if step.code.contains("llm_query") {
            sub_llm_calls += 1;
        }
        let record = IterationRecord {
            step: index as u64 + 1,
            reasoning: step.reasoning.clone(),
            code: step.code.clone(),
            output: step.output.clone(),
        };
        send_event(&mut ws, &ServerEvent::Iteration(record)).await?;
        tokio::time::sleep(REPLAY_INTERVAL).await;
    }

    let metrics = Metrics {
        tokens: outcome.total_tokens,
        time_s: round_centis(elapsed.as_secs_f64()),
        iterations: outcome.trajectory.len() as u64,
        depth: outcome.depth,
        sub_llm_calls,
    };
    send_event(
        &mut ws,
        &ServerEvent::Result(FinalResult {
            answer: outcome.answer,
            metrics,
        }),
    )
    .await?;
    let _ = ws.close(None).await;
    Ok(())
}

/// Round to centiseconds, the precision the metrics report.
fn round_centis(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

async fn send_event(ws: &mut WsStream, event: &ServerEvent) -> Result<(), ServeError> {
    let frame = serde_json::to_string(event)?;
    ws.send(Message::Text(frame)).await?;
    Ok(())
}

async fn send_error(ws: &mut WsStream, message: &str) -> Result<(), ServeError> {
    send_event(
        ws,
        &ServerEvent::Error {
            message: message.into(),
        },
    )
    .await?;
    let _ = ws.close(None).await;
    Ok(())
}
