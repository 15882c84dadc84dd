//! `chainguard-server` entry point: a line-delimited JSON request/response
//! loop over stdin/stdout (§6). Each line is one `ToolRequest`; each
//! response is one JSON-encoded `ToolResponse`.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use chainguard_core::Settings;
use chainguard_protocol::ToolRequest;
use chainguard_server::{AppState, Dispatcher};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("chainguard-server v{} starting", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load();
    let app = Arc::new(AppState::new(settings));
    let dispatcher = Dispatcher::new(app.clone());

    let shutdown_app = app.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutting down, flushing pending project writes");
        shutdown_app.projects.flush_all().await;
        std::process::exit(0);
    });

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ToolRequest>(&line) {
            Ok(req) => dispatcher.dispatch(req).await,
            Err(err) => chainguard_protocol::ToolResponse::single(format!("INVALID_REQUEST: {err}")),
        };

        let Ok(encoded) = serde_json::to_string(&response) else {
            tracing::warn!("failed to encode response");
            continue;
        };
        stdout.write_all(encoded.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    app.projects.flush_all().await;
    Ok(())
}
