// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashSet;
use std::env;
use std::ffi::OsString;
use std::io;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::config::EngineConfig;
use crate::engine::uci::{
    parse_line, EngineMessage, SearchCollector, SearchOutcome, SearchRequest, UciCommand,
};
use crate::errors::{EngineError, EngineResult};
use crate::observability::messages::engine::{
    EngineExchangeFailed, EngineOptionSkipped, EngineReady, EngineSpawned, EngineStopped,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{ChessEngine, EngineLauncher};

const MULTIPV_OPTION: &str = "MultiPV";

/// One UCI engine child process, driven over its stdin and stdout.
///
/// Every exchange runs under a deadline. Any failure (timeout, closed pipe,
/// unparseable output) marks the session dead, since the engine may still
/// be mid-search and its output can no longer be trusted.
pub struct UciEngine {
    name: String,
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    /// Advertised option names, lowercased. UCI option names are case-insensitive.
    options: HashSet<String>,
    multipv: u32,
    response_grace: Duration,
    ping_timeout: Duration,
    quit_timeout: Duration,
    alive: bool,
}

impl UciEngine {
    /// Start the engine, complete the `uci` handshake, apply configured
    /// options and wait for `readyok`.
    pub async fn spawn(config: &EngineConfig) -> EngineResult<Self> {
        let started = Instant::now();
        let mut command = Command::new(&config.path);
        command
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(path) = search_path(&config.search_paths) {
            command.env("PATH", path);
        }

        let mut child = command.spawn().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => EngineError::ProcessUnavailable(format!(
                "engine executable '{}' not found",
                config.path
            )),
            _ => EngineError::ProcessUnavailable(format!(
                "failed to start engine '{}': {}",
                config.path, e
            )),
        })?;

        EngineSpawned {
            path: &config.path,
            pid: child.id(),
        }
        .log();

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                return Err(EngineError::ProcessUnavailable(
                    "engine stdio was not captured".to_string(),
                ))
            }
        };

        let mut engine = Self {
            name: config.path.clone(),
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            options: HashSet::new(),
            multipv: 1,
            response_grace: config.response_grace(),
            ping_timeout: config.ping_timeout(),
            quit_timeout: config.quit_timeout(),
            alive: true,
        };

        let startup = config.startup_timeout();
        let handshake = tokio::time::timeout(startup, engine.handshake(config)).await;
        match handshake {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(engine.fail("uci", e)),
            Err(_) => return Err(engine.fail("uci", EngineError::Timeout(startup))),
        }

        EngineReady {
            name: &engine.name,
            option_count: engine.options.len(),
            duration: started.elapsed(),
        }
        .log();

        Ok(engine)
    }

    async fn handshake(&mut self, config: &EngineConfig) -> EngineResult<()> {
        self.send(UciCommand::Uci).await?;
        loop {
            match parse_line(&self.read_line().await?)? {
                EngineMessage::IdName(name) if !name.is_empty() => self.name = name,
                EngineMessage::Option(option) => {
                    self.options.insert(option.to_ascii_lowercase());
                }
                EngineMessage::UciOk => break,
                _ => {}
            }
        }

        for (name, value) in &config.options {
            if self.supports(name) {
                self.send(UciCommand::SetOption { name, value }).await?;
                if name.eq_ignore_ascii_case(MULTIPV_OPTION) {
                    self.multipv = value.trim().parse().unwrap_or(1);
                }
            } else {
                EngineOptionSkipped {
                    engine: &self.name,
                    option: name,
                }
                .log();
            }
        }

        self.sync().await
    }

    pub fn supports(&self, option: &str) -> bool {
        self.options.contains(&option.to_ascii_lowercase())
    }

    async fn send(&mut self, command: UciCommand<'_>) -> EngineResult<()> {
        let line = format!("{}\n", command);
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> EngineResult<String> {
        match self.stdout.next_line().await? {
            Some(line) => Ok(line),
            None => Err(EngineError::ProcessUnavailable(format!(
                "engine '{}' closed its output",
                self.name
            ))),
        }
    }

    /// `isready` and wait for `readyok`, skipping anything else.
    async fn sync(&mut self) -> EngineResult<()> {
        self.send(UciCommand::IsReady).await?;
        loop {
            if let EngineMessage::ReadyOk = parse_line(&self.read_line().await?)? {
                return Ok(());
            }
        }
    }

    async fn search(&mut self, request: &SearchRequest) -> EngineResult<SearchOutcome> {
        let multipv = request.multipv.max(1);
        if multipv != self.multipv && self.supports(MULTIPV_OPTION) {
            let value = multipv.to_string();
            self.send(UciCommand::SetOption {
                name: MULTIPV_OPTION,
                value: &value,
            })
            .await?;
            self.multipv = multipv;
        }

        self.send(UciCommand::Position { fen: &request.fen }).await?;
        self.send(UciCommand::Go(&request.limit)).await?;

        let mut collector = SearchCollector::new();
        loop {
            match parse_line(&self.read_line().await?)? {
                EngineMessage::Info(info) => collector.observe(info),
                EngineMessage::BestMove(best) => return Ok(collector.finish(best, multipv)),
                _ => {}
            }
        }
    }

    /// Mark the session dead and log the failed exchange.
    fn fail(&mut self, command: &str, error: EngineError) -> EngineError {
        self.alive = false;
        EngineExchangeFailed {
            engine: &self.name,
            command,
            error: &error,
        }
        .log();
        error
    }

    fn ensure_alive(&self) -> EngineResult<()> {
        if self.alive {
            Ok(())
        } else {
            Err(EngineError::ProcessUnavailable(format!(
                "engine '{}' is no longer usable",
                self.name
            )))
        }
    }
}

#[async_trait]
impl ChessEngine for UciEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyse(&mut self, request: &SearchRequest) -> EngineResult<SearchOutcome> {
        self.ensure_alive()?;
        // Depth-only searches get the grace period alone.
        let deadline = request.limit.movetime.unwrap_or_default() + self.response_grace;
        let result = tokio::time::timeout(deadline, self.search(request)).await;
        match result {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(e)) => Err(self.fail("go", e)),
            Err(_) => Err(self.fail("go", EngineError::Timeout(deadline))),
        }
    }

    async fn new_game(&mut self) -> EngineResult<()> {
        self.ensure_alive()?;
        let deadline = self.response_grace;
        let reset = async {
            self.send(UciCommand::UciNewGame).await?;
            self.sync().await
        };
        let result = tokio::time::timeout(deadline, reset).await;
        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(self.fail("ucinewgame", e)),
            Err(_) => Err(self.fail("ucinewgame", EngineError::Timeout(deadline))),
        }
    }

    async fn ping(&mut self) -> EngineResult<()> {
        self.ensure_alive()?;
        let deadline = self.ping_timeout;
        let result = tokio::time::timeout(deadline, self.sync()).await;
        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(self.fail("isready", e)),
            Err(_) => Err(self.fail("isready", EngineError::Timeout(deadline))),
        }
    }

    fn is_alive(&mut self) -> bool {
        self.alive && matches!(self.child.try_wait(), Ok(None))
    }

    async fn quit(&mut self) {
        self.alive = false;
        let _ = self.send(UciCommand::Quit).await;
        let graceful = matches!(
            tokio::time::timeout(self.quit_timeout, self.child.wait()).await,
            Ok(Ok(_))
        );
        if !graceful {
            let _ = self.child.kill().await;
        }
        EngineStopped {
            engine: &self.name,
            graceful,
        }
        .log();
    }
}

/// Directories from `search_paths` followed by the inherited PATH.
fn search_path(extra: &[std::path::PathBuf]) -> Option<OsString> {
    if extra.is_empty() {
        return None;
    }
    let inherited = env::var_os("PATH").unwrap_or_default();
    let dirs = extra
        .iter()
        .cloned()
        .chain(env::split_paths(&inherited))
        .collect::<Vec<_>>();
    env::join_paths(dirs).ok()
}

/// Launches [`UciEngine`] processes from the engine configuration.
pub struct UciLauncher {
    config: EngineConfig,
}

impl UciLauncher {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EngineLauncher for UciLauncher {
    async fn launch(&self) -> EngineResult<Box<dyn ChessEngine>> {
        let engine = UciEngine::spawn(&self.config).await?;
        Ok(Box::new(engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn search_path_prepends_configured_directories() {
        let joined = search_path(&[PathBuf::from("/usr/games"), PathBuf::from("/opt/engines")])
            .expect("joinable");
        let dirs: Vec<PathBuf> = env::split_paths(&joined).collect();
        assert_eq!(dirs[0], PathBuf::from("/usr/games"));
        assert_eq!(dirs[1], PathBuf::from("/opt/engines"));
    }

    #[test]
    fn no_search_paths_leaves_path_alone() {
        assert!(search_path(&[]).is_none());
    }

    #[tokio::test]
    async fn missing_executable_is_unavailable() {
        let config = EngineConfig {
            path: "/nonexistent/engine-binary".to_string(),
            search_paths: Vec::new(),
            ..EngineConfig::default()
        };
        match UciEngine::spawn(&config).await {
            Err(EngineError::ProcessUnavailable(message)) => {
                assert!(message.contains("not found"), "{message}");
            }
            Err(other) => panic!("expected ProcessUnavailable, got {:?}", other),
            Ok(_) => panic!("spawn should fail"),
        }
    }
}
