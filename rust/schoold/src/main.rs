mod assistant;
mod attendance;
mod capture;
mod config;
mod error;
mod export;
mod idcard;
mod ipc;
mod jobs;
mod model;
mod store;

use std::io::{self, BufRead, Write};
use std::sync::{mpsc, Arc};
use std::thread;

use jobs::{Event, Jobs};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn write_line(stdout: &mut io::Stdout, value: &serde_json::Value) {
    let _ = writeln!(
        stdout,
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{\"ok\":false}".to_string())
    );
    let _ = stdout.flush();
}

fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();
    let config = config::Config::from_env();
    tracing::info!(?config, "starting schoold");

    let service: Arc<dyn assistant::GenerativeService> =
        match assistant::GeminiClient::from_config(&config) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "failed to set up generative client");
                std::process::exit(1);
            }
        };
    if config.ai_api_key.is_none() {
        tracing::warn!("no AI API key configured; assistant replies will use the fallback text");
    }

    let (tx, rx) = mpsc::channel::<Event>();
    let reader_tx = tx.clone();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if reader_tx.send(Event::Line(line)).is_err() {
                return;
            }
        }
        let _ = reader_tx.send(Event::InputClosed);
    });

    let mut state = ipc::AppState::new(&config, service, Jobs::new(tx));
    let mut stdout = io::stdout();
    let mut input_open = true;

    // Drain in-flight assistant calls after stdin closes so every request
    // gets its response.
    while input_open || state.jobs.pending() > 0 {
        let Ok(event) = rx.recv() else { break };
        match event {
            Event::Line(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let req: ipc::Request = match serde_json::from_str(&line) {
                    Ok(v) => v,
                    Err(e) => {
                        // Can't reply without id.
                        tracing::warn!(error = %e, "bad request json");
                        write_line(
                            &mut stdout,
                            &serde_json::json!({
                                "ok": false,
                                "error": { "code": "bad_json", "message": e.to_string() }
                            }),
                        );
                        continue;
                    }
                };
                if let ipc::Reply::Now(resp) = ipc::handle_request(&mut state, req) {
                    write_line(&mut stdout, &resp);
                }
            }
            Event::InputClosed => input_open = false,
            Event::Completed(done) => {
                let resp = ipc::complete_job(&mut state, done);
                write_line(&mut stdout, &resp);
            }
        }
    }
    tracing::info!("input closed, exiting");
}
