//! RLM Document Explorer server: WebSocket query sessions over an in-memory
//! document store and a pluggable reasoning engine.

pub mod engine;
pub mod store;
pub mod ws;

pub use engine::{EngineError, QueryOutcome, ReasoningEngine, TrajectoryStep};
pub use store::{Document, DocumentStore};
pub use ws::{handle_session, serve};
