//! Shared RLM Document Explorer client library (config, wire protocol,
//! session channel, query session state machine).
//! Used by the Tauri GUI and the `rlm-query` CLI.

pub mod channel;
pub mod config;
pub mod protocol;
pub mod session;

pub use channel::{ChannelEnd, ChannelError, ChannelEvent, ChannelId, SessionChannel};
pub use config::{default_config_path, ApiSection, Config, ConfigError, ServerSection};
pub use protocol::{
    DecodeError, FinalResult, IterationRecord, Metrics, QueryRequest, ServerEvent,
};
pub use session::{Phase, QuerySession, SessionError, SessionEvents};
