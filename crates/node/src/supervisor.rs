//! Task supervision for the daemon.
//!
//! The refresher and the metrics server run as tracked tasks sharing one
//! [`CancellationToken`]. Shutdown cancels the token, closes the tracker
//! and waits (bounded) for every task to return. A critical task that fails
//! outside of shutdown cancels the others.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// Default timeout for graceful shutdown before giving up on stragglers.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Result type for supervised tasks
pub type SupervisedResult = Result<(), anyhow::Error>;

/// Owns the lifecycle of the daemon's background tasks.
#[derive(Clone)]
pub struct NodeSupervisor {
    tracker: TaskTracker,
    token: CancellationToken,
    shutting_down: Arc<AtomicBool>,
    shutdown_timeout: Duration,
}

impl Default for NodeSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeSupervisor {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_SHUTDOWN_TIMEOUT)
    }

    /// Create a supervisor with a custom shutdown timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            tracker: TaskTracker::new(),
            token: CancellationToken::new(),
            shutting_down: Arc::new(AtomicBool::new(false)),
            shutdown_timeout: timeout,
        }
    }

    /// Token cancelled when shutdown starts.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Spawn a task that watches the token itself and returns promptly once
    /// it is cancelled.
    pub fn spawn_cancellable<F, Fut>(&self, name: &'static str, f: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = SupervisedResult> + Send + 'static,
    {
        let token = self.token.clone();
        let shutting_down = self.shutting_down.clone();

        self.tracker.spawn(async move {
            match f(token).await {
                Ok(()) => info!("[{}] Task completed", name),
                Err(e) if shutting_down.load(Ordering::SeqCst) => {
                    info!("[{}] Task stopped during shutdown: {}", name, e)
                }
                Err(e) => error!("[{}] Task failed: {:?}", name, e),
            }
        });
    }

    /// Like [`NodeSupervisor::spawn_cancellable`], but a failure outside of
    /// shutdown cancels every other task.
    pub fn spawn_critical<F, Fut>(&self, name: &'static str, f: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = SupervisedResult> + Send + 'static,
    {
        let token = self.token.clone();
        let shutting_down = self.shutting_down.clone();

        self.tracker.spawn(async move {
            match f(token.clone()).await {
                Ok(()) => info!("[{}] Critical task completed", name),
                Err(e) if shutting_down.load(Ordering::SeqCst) => {
                    info!("[{}] Critical task stopped during shutdown: {}", name, e)
                }
                Err(e) => {
                    error!("[{}] CRITICAL TASK FAILED: {:?}", name, e);
                    error!("Initiating shutdown due to critical task failure");
                    token.cancel();
                }
            }
        });
    }

    /// Cancel every task and wait for them, up to the shutdown timeout.
    pub async fn shutdown(&self) -> Result<(), ShutdownError> {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            warn!("Shutdown already in progress");
            return Ok(());
        }

        info!("Initiating graceful shutdown...");
        self.tracker.close();
        self.token.cancel();

        match tokio::time::timeout(self.shutdown_timeout, self.tracker.wait()).await {
            Ok(()) => {
                info!("All tasks terminated gracefully");
                Ok(())
            }
            Err(_) => {
                error!(
                    "Shutdown timeout ({:?}) exceeded, some tasks may still be running",
                    self.shutdown_timeout
                );
                Err(ShutdownError::Timeout(self.shutdown_timeout))
            }
        }
    }

    /// Number of tasks still tracked.
    pub fn task_count(&self) -> usize {
        self.tracker.len()
    }
}

/// Errors that can occur during shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShutdownError {
    #[error("shutdown timeout of {0:?} exceeded")]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_shutdown_waits_for_tasks() {
        let supervisor = NodeSupervisor::with_timeout(Duration::from_secs(5));
        let stopped = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let stopped = stopped.clone();
            supervisor.spawn_cancellable("worker", move |token| async move {
                token.cancelled().await;
                sleep(Duration::from_millis(20)).await;
                stopped.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        assert_eq!(supervisor.task_count(), 3);

        supervisor.shutdown().await.unwrap();
        assert_eq!(stopped.load(Ordering::SeqCst), 3);
        assert!(supervisor.is_shutting_down());
        assert_eq!(supervisor.task_count(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_timeout() {
        let supervisor = NodeSupervisor::with_timeout(Duration::from_millis(50));
        supervisor.spawn_cancellable("stubborn", |_token| async move {
            sleep(Duration::from_secs(60)).await;
            Ok(())
        });

        let err = supervisor.shutdown().await.unwrap_err();
        assert_eq!(err, ShutdownError::Timeout(Duration::from_millis(50)));
        // A second call is a no-op.
        assert!(supervisor.shutdown().await.is_ok());
    }

    #[tokio::test]
    async fn test_critical_task_failure_triggers_shutdown() {
        let supervisor = NodeSupervisor::new();
        let token = supervisor.cancellation_token();

        supervisor.spawn_critical("failing-critical", |_token| async move {
            sleep(Duration::from_millis(20)).await;
            Err(anyhow::anyhow!("bind failed"))
        });

        tokio::time::timeout(Duration::from_secs(5), token.cancelled())
            .await
            .expect("critical failure should cancel the token");
    }

    #[tokio::test]
    async fn test_failure_during_shutdown_does_not_escalate() {
        let supervisor = NodeSupervisor::new();
        supervisor.spawn_cancellable("worker", |token| async move {
            token.cancelled().await;
            Err(anyhow::anyhow!("interrupted"))
        });
        supervisor.shutdown().await.unwrap();
    }
}
