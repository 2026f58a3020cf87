//! Wire protocol: the one query request and the four server event kinds.
//! Each frame is a single JSON object carried in a text WebSocket message.

use serde::{Deserialize, Serialize};

/// Client → server: query request, sent exactly once per session right after
/// the connection is established.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub document_id: String,
    pub question: String,
}

/// One reported step of the reasoning engine's exploration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub step: u64,
    pub reasoning: String,
    pub code: String,
    pub output: String,
}

impl IterationRecord {
    /// Whether the step output carries a failure marker from the engine's
    /// REPL (a traceback or an `Error:` line). Display policy only; the
    /// session state machine never acts on it.
    pub fn signals_failure(&self) -> bool {
        self.output.contains("Traceback") || self.output.contains("Error:")
    }
}

/// Run metrics attached to the terminal result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub tokens: u64,
    pub time_s: f64,
    pub iterations: u64,
    pub depth: u64,
    pub sub_llm_calls: u64,
}

/// Terminal success payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    pub answer: String,
    pub metrics: Metrics,
}

/// Server → client event. The JSON "type" field is the discriminator, the
/// payload sits under "data"; the `Serialize` impl produces exactly that
/// envelope for the emitting side.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ServerEvent {
    /// Non-terminal progress note.
    Status { message: String },
    /// One append-only exploration step.
    Iteration(IterationRecord),
    /// Terminal success.
    Result(FinalResult),
    /// Terminal failure.
    Error { message: String },
}

/// Frame rejection. `Syntax` means the text is not JSON at all;
/// `UnknownKind` means valid JSON whose "type" tag is missing or not one of
/// the four kinds; `Payload` means a recognized kind whose "data" is missing
/// a required field or carries the wrong type. Decoding never coerces and
/// never yields a partially-populated event.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed frame: {0}")]
    Syntax(String),
    #[error("unrecognized event kind: {0}")]
    UnknownKind(String),
    #[error("invalid {kind} payload: {message}")]
    Payload { kind: &'static str, message: String },
}

#[derive(Debug, Clone, Deserialize)]
struct StatusPayload {
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorPayload {
    message: String,
}

impl ServerEvent {
    /// Decode one inbound text frame into a typed event.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| DecodeError::Syntax(e.to_string()))?;
        let kind = match value.get("type").and_then(|t| t.as_str()) {
            Some(kind) => kind,
            None => return Err(DecodeError::UnknownKind("missing \"type\" tag".into())),
        };
        let data = value.get("data").cloned().unwrap_or(serde_json::Value::Null);
        match kind {
            "status" => {
                let payload: StatusPayload =
                    serde_json::from_value(data).map_err(|e| DecodeError::Payload {
                        kind: "status",
                        message: e.to_string(),
                    })?;
                Ok(ServerEvent::Status {
                    message: payload.message,
                })
            }
            "iteration" => {
                let payload: IterationRecord =
                    serde_json::from_value(data).map_err(|e| DecodeError::Payload {
                        kind: "iteration",
                        message: e.to_string(),
                    })?;
                Ok(ServerEvent::Iteration(payload))
            }
            "result" => {
                let payload: FinalResult =
                    serde_json::from_value(data).map_err(|e| DecodeError::Payload {
                        kind: "result",
                        message: e.to_string(),
                    })?;
                Ok(ServerEvent::Result(payload))
            }
            "error" => {
                let payload: ErrorPayload =
                    serde_json::from_value(data).map_err(|e| DecodeError::Payload {
                        kind: "error",
                        message: e.to_string(),
                    })?;
                Ok(ServerEvent::Error {
                    message: payload.message,
                })
            }
            other => Err(DecodeError::UnknownKind(other.to_string())),
        }
    }
}
