//! Server lifecycle: bind, serve in the background, wait for a termination
//! signal, then drain within a bounded time.
//!
//! ```text
//! NotStarted --start()--> Running --signal--> ShuttingDown --drain/timeout--> Stopped
//! ```

use axum::Router;
use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    Running,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::NotStarted => "not_started",
            LifecycleState::Running => "running",
            LifecycleState::ShuttingDown => "shutting_down",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to bind listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Server cannot start from state {state}")]
    AlreadyStarted { state: LifecycleState },

    #[error("Server error: {0}")]
    Serve(#[from] io::Error),

    #[error("Server forced to shutdown: drain exceeded {timeout:?}")]
    ForcedShutdown { timeout: Duration },

    #[error("Server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Owns the lifecycle state of the HTTP server
pub struct LifecycleController {
    state: Arc<watch::Sender<LifecycleState>>,
    shutdown_timeout: Duration,
}

impl LifecycleController {
    pub fn new(shutdown_timeout: Duration) -> Self {
        let (state, _) = watch::channel(LifecycleState::NotStarted);
        Self {
            state: Arc::new(state),
            shutdown_timeout,
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Bind `addr` and start serving `app` on a background task. Returns as
    /// soon as the listener is bound.
    pub async fn start(&self, addr: SocketAddr, app: Router) -> Result<RunningServer, LifecycleError> {
        let current = self.state();
        if current != LifecycleState::NotStarted {
            return Err(LifecycleError::AlreadyStarted { state: current });
        }

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| LifecycleError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        let (trigger, triggered) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    // A dropped trigger also means shut down.
                    let _ = triggered.await;
                })
                .await
        });

        self.state.send_replace(LifecycleState::Running);
        info!("Server is running on http://{}", local_addr);

        Ok(RunningServer {
            local_addr,
            state: Arc::clone(&self.state),
            shutdown_timeout: self.shutdown_timeout,
            trigger: Some(trigger),
            task,
        })
    }
}

/// Handle to a server that is accepting connections
pub struct RunningServer {
    local_addr: SocketAddr,
    state: Arc<watch::Sender<LifecycleState>>,
    shutdown_timeout: Duration,
    trigger: Option<oneshot::Sender<()>>,
    task: JoinHandle<io::Result<()>>,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Serve until `signal` resolves, then shut down. `teardown` runs
    /// alongside the drain (typically flushing the trace exporter).
    pub async fn run_until<S, T>(mut self, signal: S, teardown: T) -> Result<(), LifecycleError>
    where
        S: Future<Output = ()>,
        T: Future<Output = ()>,
    {
        tokio::select! {
            _ = signal => {
                info!("Server is shutting down...");
            }
            result = &mut self.task => {
                // The serve loop only ends on its own if something broke.
                self.state.send_replace(LifecycleState::Stopped);
                teardown.await;
                return match result {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => {
                        error!(error = %e, "Server stopped unexpectedly");
                        Err(LifecycleError::Serve(e))
                    }
                    Err(e) => Err(LifecycleError::Task(e)),
                };
            }
        }

        self.shutdown(teardown).await
    }

    /// Stop accepting connections and wait for in-flight requests, for at
    /// most the configured shutdown timeout. On timeout the serve task is
    /// aborted and [`LifecycleError::ForcedShutdown`] is returned.
    pub async fn shutdown<T>(mut self, teardown: T) -> Result<(), LifecycleError>
    where
        T: Future<Output = ()>,
    {
        self.state.send_replace(LifecycleState::ShuttingDown);

        if let Some(trigger) = self.trigger.take() {
            let _ = trigger.send(());
        }

        let timeout = self.shutdown_timeout;
        let task = &mut self.task;
        let (drained, ()) = tokio::join!(tokio::time::timeout(timeout, task), teardown);

        let result = match drained {
            Ok(Ok(Ok(()))) => {
                info!("Server exiting");
                Ok(())
            }
            Ok(Ok(Err(e))) => {
                error!(error = %e, "Server error during shutdown");
                Err(LifecycleError::Serve(e))
            }
            Ok(Err(e)) => Err(LifecycleError::Task(e)),
            Err(_) => {
                warn!(?timeout, "Graceful shutdown timed out, aborting server");
                self.task.abort();
                Err(LifecycleError::ForcedShutdown { timeout })
            }
        };

        self.state.send_replace(LifecycleState::Stopped);
        result
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Interrupt signal received"),
        _ = terminate => info!("Terminate signal received"),
    }
}
