//! Tauri commands for config load/save and query session management.
//! The Tauri `#[command]` wrappers delegate to testable plain functions.

use rlm_client::config::{self, ApiSection, Config, ServerSection};
use rlm_client::session::{Phase, QuerySession};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::mpsc;

// ── Global runtime and query worker (single session slot for the GUI) ───

fn global_runtime() -> &'static tokio::runtime::Runtime {
    static RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
    RT.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("failed to create tokio runtime")
    })
}

enum WorkerCommand {
    Start {
        server_url: String,
        document_id: String,
        question: String,
    },
    Reset,
}

struct QueryWorker {
    commands: mpsc::UnboundedSender<WorkerCommand>,
    snapshot: Arc<Mutex<SessionSnapshot>>,
}

static WORKER: OnceLock<QueryWorker> = OnceLock::new();

fn query_worker() -> &'static QueryWorker {
    WORKER.get_or_init(|| {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let snapshot = Arc::new(Mutex::new(SessionSnapshot::idle()));
        global_runtime().spawn(run_worker(command_rx, snapshot.clone()));
        QueryWorker { commands, snapshot }
    })
}

/// Owns the one query session the GUI ever has. Start commands supersede the
/// in-flight query; every state change is published to the snapshot the
/// frontend polls.
async fn run_worker(
    mut commands: mpsc::UnboundedReceiver<WorkerCommand>,
    snapshot: Arc<Mutex<SessionSnapshot>>,
) {
    let (mut session, mut events) = QuerySession::new();
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(WorkerCommand::Start { server_url, document_id, question }) => {
                    session.start(&server_url, &document_id, &question);
                    publish(&snapshot, &session);
                }
                Some(WorkerCommand::Reset) => {
                    session.reset();
                    publish(&snapshot, &session);
                }
                None => break,
            },
            event = events.recv() => match event {
                Some((id, event)) => {
                    session.handle_event(id, event);
                    publish(&snapshot, &session);
                }
                None => break,
            },
        }
    }
}

fn publish(snapshot: &Mutex<SessionSnapshot>, session: &QuerySession) {
    if let Ok(mut guard) = snapshot.lock() {
        *guard = SessionSnapshot::from_session(session);
    }
}

// ── Session snapshot ────────────────────────────────────────────────────

/// One iteration plus its display-level failure flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IterationView {
    pub step: u64,
    pub reasoning: String,
    pub code: String,
    pub output: String,
    pub failed: bool,
}

/// JSON-friendly view of the query session, polled by the frontend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    /// "idle", "connecting", "streaming", "completed", or "failed".
    pub phase: String,
    pub status: Option<String>,
    pub iterations: Vec<IterationView>,
    pub answer: Option<String>,
    pub metrics: Option<rlm_client::protocol::Metrics>,
    pub error: Option<String>,
}

impl SessionSnapshot {
    fn idle() -> Self {
        Self {
            phase: "idle".into(),
            status: None,
            iterations: Vec::new(),
            answer: None,
            metrics: None,
            error: None,
        }
    }

    fn from_session(session: &QuerySession) -> Self {
        let phase = match session.phase() {
            Phase::Idle => "idle",
            Phase::Connecting => "connecting",
            Phase::Streaming => "streaming",
            Phase::Completed => "completed",
            Phase::Failed => "failed",
        };
        Self {
            phase: phase.into(),
            status: session.status().map(str::to_string),
            iterations: session
                .iterations()
                .iter()
                .map(|iteration| IterationView {
                    step: iteration.step,
                    reasoning: iteration.reasoning.clone(),
                    code: iteration.code.clone(),
                    output: iteration.output.clone(),
                    failed: iteration.signals_failure(),
                })
                .collect(),
            answer: session.result().map(|r| r.answer.clone()),
            metrics: session.result().map(|r| r.metrics.clone()),
            error: session.error().map(|e| e.to_string()),
        }
    }
}

// ── Testable backend functions ──────────────────────────────────────────

/// Queue a new query; any in-flight one is superseded.
pub fn do_start_query(server_url: &str, document_id: &str, question: &str) -> Result<(), String> {
    query_worker()
        .commands
        .send(WorkerCommand::Start {
            server_url: server_url.to_string(),
            document_id: document_id.to_string(),
            question: question.to_string(),
        })
        .map_err(|e| e.to_string())
}

/// Discard the current session and return to idle.
pub fn do_reset_session() -> Result<(), String> {
    query_worker()
        .commands
        .send(WorkerCommand::Reset)
        .map_err(|e| e.to_string())
}

/// Current session state for the frontend to render.
pub fn do_query_snapshot() -> SessionSnapshot {
    query_worker()
        .snapshot
        .lock()
        .map(|guard| guard.clone())
        .unwrap_or_else(|_| SessionSnapshot::idle())
}

// ── Config form ─────────────────────────────────────────────────────────

/// JSON-friendly config form values sent to/from the frontend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigForm {
    pub api_key: String,
    pub model: String,
    pub server_port: u16,
    pub directories: Vec<String>,
}

impl Default for ConfigForm {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: String::new(),
            server_port: config::DEFAULT_PORT,
            directories: Vec::new(),
        }
    }
}

impl From<Config> for ConfigForm {
    fn from(c: Config) -> Self {
        Self {
            api_key: c.api.api_key.unwrap_or_default(),
            model: c.api.model.unwrap_or_default(),
            server_port: c.server.port.unwrap_or(config::DEFAULT_PORT),
            directories: c.server.directories,
        }
    }
}

impl From<ConfigForm> for Config {
    fn from(f: ConfigForm) -> Self {
        Config {
            api: ApiSection {
                api_key: Some(f.api_key),
                model: Some(f.model),
            },
            server: ServerSection {
                port: Some(f.server_port),
                directories: f.directories,
            },
        }
    }
}

/// Resolve config path from optional override, env, or default.
pub fn resolve_config_path(override_path: Option<&str>) -> Result<PathBuf, String> {
    if let Some(p) = override_path {
        return Ok(PathBuf::from(p));
    }
    if let Ok(val) = std::env::var("RLM_CONFIG") {
        return Ok(PathBuf::from(val));
    }
    config::default_config_path().ok_or_else(|| "Cannot determine config path".into())
}

/// Load config from `path` and return form values.
pub fn do_load_config(path: &str) -> Result<ConfigForm, String> {
    let cfg = config::load(std::path::Path::new(path)).map_err(|e| e.to_string())?;
    Ok(ConfigForm::from(cfg))
}

/// Save form values to `path` as YAML. Creates parent dirs if needed.
pub fn do_save_config(path: &str, form: &ConfigForm) -> Result<(), String> {
    let cfg: Config = form.clone().into();
    config::save(std::path::Path::new(path), &cfg).map_err(|e| e.to_string())
}

// ── Tauri command wrappers ──────────────────────────────────────────────

#[tauri::command]
pub fn get_config_path() -> Result<String, String> {
    let p = resolve_config_path(None)?;
    p.to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| "Config path is not valid UTF-8".into())
}

#[tauri::command]
pub fn load_config(path: String) -> Result<ConfigForm, String> {
    do_load_config(&path)
}

#[tauri::command]
pub fn save_config(path: String, form: ConfigForm) -> Result<(), String> {
    do_save_config(&path, &form)
}

#[tauri::command]
pub fn start_query(
    server_url: String,
    document_id: String,
    question: String,
) -> Result<(), String> {
    do_start_query(&server_url, &document_id, &question)
}

#[tauri::command]
pub fn reset_session() -> Result<(), String> {
    do_reset_session()
}

#[tauri::command]
pub fn query_snapshot() -> SessionSnapshot {
    do_query_snapshot()
}
