// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use pgn_analyzer::config::{load_and_validate_config, Config, LogFormat};
use pgn_analyzer::engine::{EnginePool, UciLauncher};
use pgn_analyzer::http::{build_router, serve, shutdown_signal, AppState};
use pgn_analyzer::observability::init_tracing;

#[derive(Parser)]
#[command(name = "pgn-analyzer", version, about = "Chess game analysis over HTTP, backed by a UCI engine.")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Engine executable, a path or a name looked up on PATH
    #[arg(long)]
    engine_path: Option<String>,

    /// Maximum number of engine processes
    #[arg(long)]
    pool_size: Option<usize>,

    /// Log output format: text or json
    #[arg(long)]
    log_format: Option<LogFormat>,
}

impl Cli {
    /// Flags win over the file and the environment.
    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(path) = &self.engine_path {
            config.engine.path = path.clone();
        }
        if let Some(size) = self.pool_size {
            config.engine.pool_size = size;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_and_validate_config(cli.config.as_deref())
        .context("failed to load configuration")?;
    cli.apply(&mut config);
    config.validate().context("invalid command line overrides")?;

    init_tracing(&config.logging);

    let launcher = Arc::new(UciLauncher::new(config.engine.clone()));
    let pool = EnginePool::new(
        launcher,
        config.engine.pool_size,
        config.engine.checkout_timeout(),
    );
    if config.engine.prewarm {
        // Logged inside; the first request retries.
        let _ = pool.prewarm().await;
    }

    let bind_addr = config.server.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    let app = build_router(
        AppState::new(pool.clone(), config.analysis.clone()),
        config.server.body_limit_bytes,
    );

    let served = serve(listener, app, shutdown_signal()).await;
    pool.shutdown().await;
    served.context("server failed")
}
