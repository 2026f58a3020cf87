//! Reasoning-engine seam. The engine is an opaque producer of answers and
//! exploration trajectories; the server only schedules it and streams what
//! it returns.

/// One step of the engine's exploration.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryStep {
    pub reasoning: String,
    pub code: String,
    pub output: String,
}

/// What one engine run produced.
#[derive(Debug, Clone, Default)]
pub struct QueryOutcome {
    pub answer: String,
    pub trajectory: Vec<TrajectoryStep>,
    pub total_tokens: u64,
    pub depth: u64,
}

/// Engine failure, surfaced to the client as the session's terminal error
/// event.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct EngineError(pub String);

/// Answers one question about one document. Runs are blocking; the session
/// handler offloads them to the blocking pool.
pub trait ReasoningEngine: Send + Sync + 'static {
    fn run(&self, document: &str, question: &str) -> Result<QueryOutcome, EngineError>;
}
