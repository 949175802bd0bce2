// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::engine::uci::{SearchOutcome, SearchRequest};
use crate::errors::{EngineError, EngineResult};
use crate::observability::messages::engine::{
    EngineCheckedOut, EngineDiscarded, PoolPrewarmFailed, PoolShutDown,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{ChessEngine, EngineLauncher};

/// Bounded set of engine sessions shared by all requests.
///
/// At most `capacity` sessions exist at once; each is used by one request at
/// a time. Idle sessions are reused. Sessions that failed an exchange are
/// dropped (killing the process) and replaced on demand.
#[derive(Clone)]
pub struct EnginePool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    launcher: Arc<dyn EngineLauncher>,
    idle: Mutex<Vec<Box<dyn ChessEngine>>>,
    permits: Arc<Semaphore>,
    capacity: usize,
    checkout_timeout: Duration,
    shutdown: CancellationToken,
    engine_name: Mutex<Option<String>>,
}

impl PoolInner {
    fn idle(&self) -> MutexGuard<'_, Vec<Box<dyn ChessEngine>>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remember_name(&self, name: &str) {
        let mut slot = self.engine_name.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_deref() != Some(name) {
            *slot = Some(name.to_string());
        }
    }
}

/// Point-in-time pool occupancy, reported by `/readyz`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub capacity: usize,
    pub idle: usize,
    pub in_use: usize,
    pub engine_name: Option<String>,
}

impl EnginePool {
    pub fn new(
        launcher: Arc<dyn EngineLauncher>,
        capacity: usize,
        checkout_timeout: Duration,
    ) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(PoolInner {
                launcher,
                idle: Mutex::new(Vec::with_capacity(capacity)),
                permits: Arc::new(Semaphore::new(capacity)),
                capacity,
                checkout_timeout,
                shutdown: CancellationToken::new(),
                engine_name: Mutex::new(None),
            }),
        }
    }

    /// Get exclusive use of an engine, waiting up to the checkout timeout
    /// when every engine is busy.
    pub async fn checkout(&self) -> EngineResult<PooledEngine> {
        let inner = &self.inner;
        let started = Instant::now();

        let permit = tokio::select! {
            _ = inner.shutdown.cancelled() => {
                return Err(EngineError::ProcessUnavailable("engine pool is shutting down".to_string()));
            }
            acquired = tokio::time::timeout(inner.checkout_timeout, inner.permits.clone().acquire_owned()) => {
                match acquired {
                    Ok(Ok(permit)) => permit,
                    Ok(Err(_)) => {
                        return Err(EngineError::ProcessUnavailable("engine pool is closed".to_string()));
                    }
                    Err(_) => return Err(EngineError::PoolExhausted(inner.checkout_timeout)),
                }
            }
        };

        let (engine, reused) = match self.take_idle() {
            Some(engine) => (engine, true),
            None => {
                let engine = inner.launcher.launch().await?;
                inner.remember_name(engine.name());
                (engine, false)
            }
        };

        EngineCheckedOut {
            reused,
            in_use: inner.capacity - inner.permits.available_permits(),
            capacity: inner.capacity,
            waited: started.elapsed(),
        }
        .log();

        Ok(PooledEngine {
            engine: Some(engine),
            healthy: true,
            pool: inner.clone(),
            _permit: permit,
        })
    }

    /// Pop idle engines until a live one turns up.
    fn take_idle(&self) -> Option<Box<dyn ChessEngine>> {
        let mut idle = self.inner.idle();
        while let Some(mut engine) = idle.pop() {
            if engine.is_alive() {
                return Some(engine);
            }
            EngineDiscarded {
                engine: engine.name(),
                reason: "process exited while idle",
            }
            .log();
        }
        None
    }

    /// Start one engine ahead of the first request. Failure is logged and
    /// returned; the pool still works and retries on checkout.
    pub async fn prewarm(&self) -> EngineResult<()> {
        match self.inner.launcher.launch().await {
            Ok(engine) => {
                self.inner.remember_name(engine.name());
                self.inner.idle().push(engine);
                Ok(())
            }
            Err(error) => {
                PoolPrewarmFailed { error: &error }.log();
                Err(error)
            }
        }
    }

    pub fn stats(&self) -> PoolStats {
        let inner = &self.inner;
        PoolStats {
            capacity: inner.capacity,
            idle: inner.idle().len(),
            in_use: inner.capacity - inner.permits.available_permits(),
            engine_name: inner
                .engine_name
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Refuse new checkouts and stop idle engines. Engines still checked out
    /// are stopped when their request releases them.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.inner.permits.close();

        let drained: Vec<Box<dyn ChessEngine>> = self.inner.idle().drain(..).collect();
        let stopped = drained.len();
        for mut engine in drained {
            engine.quit().await;
        }

        PoolShutDown { stopped }.log();
    }
}

/// An engine checked out of the pool. Returned to the pool on drop unless an
/// exchange failed or the pool is shutting down.
pub struct PooledEngine {
    engine: Option<Box<dyn ChessEngine>>,
    healthy: bool,
    pool: Arc<PoolInner>,
    // Released after `drop` has put the engine back.
    _permit: OwnedSemaphorePermit,
}

impl PooledEngine {
    fn engine(&mut self) -> EngineResult<&mut Box<dyn ChessEngine>> {
        self.engine
            .as_mut()
            .ok_or_else(|| EngineError::ProcessUnavailable("engine already released".to_string()))
    }

    /// Mark the engine busy for the length of one exchange. A request
    /// dropped mid-search leaves it marked, so a busy engine never goes back
    /// to the pool.
    fn begin(&mut self) -> bool {
        std::mem::replace(&mut self.healthy, false)
    }

    fn finish<T>(&mut self, was_healthy: bool, result: EngineResult<T>) -> EngineResult<T> {
        self.healthy = was_healthy && result.is_ok();
        result
    }
}

#[async_trait]
impl ChessEngine for PooledEngine {
    fn name(&self) -> &str {
        self.engine.as_deref().map_or("released", |engine| engine.name())
    }

    async fn analyse(&mut self, request: &SearchRequest) -> EngineResult<SearchOutcome> {
        let was_healthy = self.begin();
        let result = match self.engine() {
            Ok(engine) => engine.analyse(request).await,
            Err(error) => Err(error),
        };
        self.finish(was_healthy, result)
    }

    async fn new_game(&mut self) -> EngineResult<()> {
        let was_healthy = self.begin();
        let result = match self.engine() {
            Ok(engine) => engine.new_game().await,
            Err(error) => Err(error),
        };
        self.finish(was_healthy, result)
    }

    async fn ping(&mut self) -> EngineResult<()> {
        let was_healthy = self.begin();
        let result = match self.engine() {
            Ok(engine) => engine.ping().await,
            Err(error) => Err(error),
        };
        self.finish(was_healthy, result)
    }

    fn is_alive(&mut self) -> bool {
        self.healthy && self.engine.as_mut().is_some_and(|engine| engine.is_alive())
    }

    async fn quit(&mut self) {
        self.healthy = false;
        if let Some(engine) = self.engine.as_mut() {
            engine.quit().await;
        }
    }
}

impl Drop for PooledEngine {
    fn drop(&mut self) {
        let Some(mut engine) = self.engine.take() else {
            return;
        };

        let reason = if self.pool.shutdown.is_cancelled() {
            "pool shut down"
        } else if !self.healthy {
            "exchange failed"
        } else if !engine.is_alive() {
            "process exited"
        } else {
            self.pool.idle().push(engine);
            return;
        };

        EngineDiscarded {
            engine: engine.name(),
            reason,
        }
        .log();
    }
}
