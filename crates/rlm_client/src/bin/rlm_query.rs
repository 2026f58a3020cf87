//! rlm-query: CLI for the RLM Document Explorer.
//! Reads config, connects to the WebSocket server, runs one query session to
//! its terminal phase, and streams status, iterations, and the final answer
//! to the terminal.

use rlm_client::config;
use rlm_client::session::{Phase, QuerySession};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

struct CliArgs {
    config: Option<PathBuf>,
    document: Option<String>,
    question: Option<String>,
}

fn parse_args() -> CliArgs {
    let mut cli = CliArgs {
        config: None,
        document: None,
        question: None,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => cli.config = args.next().map(PathBuf::from),
            "--document" => cli.document = args.next(),
            _ => {
                // First positional argument is the question.
                if cli.question.is_none() {
                    cli.question = Some(arg);
                }
            }
        }
    }
    cli
}

fn resolve_config_path(flag: Option<PathBuf>) -> PathBuf {
    // 1. --config <path> flag
    if let Some(path) = flag {
        return path;
    }
    // 2. RLM_CONFIG env var
    if let Ok(val) = std::env::var("RLM_CONFIG") {
        return PathBuf::from(val);
    }
    // 3. Default path (~/.rlm-explorer/config.yaml)
    config::default_config_path().unwrap_or_else(|| {
        eprintln!("Error: unable to determine config path (set --config or RLM_CONFIG)");
        process::exit(1);
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = parse_args();
    let config_path = resolve_config_path(cli.config);

    let cfg = match config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!(
                "Error: failed to load config from {}: {}",
                config_path.display(),
                e
            );
            process::exit(1);
        }
    };

    let port = cfg.server.port.unwrap_or(config::DEFAULT_PORT);
    let server_url = format!("ws://127.0.0.1:{}", port);

    let document = cli.document.unwrap_or_else(|| {
        eprintln!("Error: --document <id> is required");
        process::exit(1);
    });

    // Question from the positional argument, or the first stdin line.
    let question = match cli.question {
        Some(q) => q,
        None => {
            let stdin = io::stdin();
            let mut line = String::new();
            stdin.lock().read_line(&mut line).unwrap_or(0);
            line.trim().to_string()
        }
    };

    if question.trim().is_empty() {
        eprintln!("Error: no question provided");
        process::exit(1);
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Error: failed to create runtime: {}", e);
            process::exit(1);
        });

    rt.block_on(async {
        let (mut session, mut events) = QuerySession::new();
        session.start(&server_url, &document, &question);

        let mut printed = 0usize;
        let mut last_status: Option<String> = None;

        while !session.phase().is_terminal() {
            let Some((id, event)) = events.recv().await else {
                break;
            };
            session.handle_event(id, event);

            if session.status() != last_status.as_deref() {
                if let Some(status) = session.status() {
                    eprintln!("[{}]", status);
                    last_status = Some(status.to_string());
                }
            }

            let stdout = io::stdout();
            let mut out = stdout.lock();
            for iteration in &session.iterations()[printed..] {
                let _ = writeln!(out, "--- iteration {} ---", iteration.step);
                if !iteration.reasoning.is_empty() {
                    let _ = writeln!(out, "{}", iteration.reasoning);
                }
                if !iteration.code.is_empty() {
                    let _ = writeln!(out, ">>> {}", iteration.code);
                }
                if !iteration.output.is_empty() {
                    let _ = writeln!(out, "{}", iteration.output);
                }
                if iteration.signals_failure() {
                    let _ = writeln!(out, "(step {} reported an error)", iteration.step);
                }
                let _ = out.flush();
            }
            printed = session.iterations().len();
        }

        match session.phase() {
            Phase::Completed => {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                if let Some(result) = session.result() {
                    let _ = writeln!(out, "\nAnswer:\n{}", result.answer);
                    let m = &result.metrics;
                    let _ = writeln!(
                        out,
                        "\ntokens: {}  time: {}s  iterations: {}  depth: {}  sub-calls: {}",
                        m.tokens, m.time_s, m.iterations, m.depth, m.sub_llm_calls
                    );
                }
            }
            _ => {
                let message = session
                    .error()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "session ended without a result".into());
                eprintln!("Error: {}", message);
                process::exit(1);
            }
        }
    });
}
