use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::DomainError;

/// Connected flag shared by the audio link adapters.
///
/// Subscribers see only transitions, never repeats of the current value.
pub struct ConnectionSignal {
    connected: AtomicBool,
    tx: broadcast::Sender<bool>,
}

impl Default for ConnectionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionSignal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            connected: AtomicBool::new(false),
            tx,
        }
    }

    pub fn get(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Store `connected`; returns true and notifies subscribers if it changed.
    pub fn set(&self, connected: bool) -> bool {
        let previous = self.connected.swap(connected, Ordering::SeqCst);
        if previous == connected {
            return false;
        }

        debug!(connected, "Audio link state changed");
        let _ = self.tx.send(connected);
        true
    }

    pub fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Run blocking `work` on the blocking pool with a deadline.
///
/// The work cannot be interrupted, so after a timeout it keeps running and a
/// successful late result is passed to `late` rather than dropped. Link
/// handles must go through `late` to be closed.
pub async fn run_bounded<T, F, L, Fut>(timeout: Duration, work: F, late: L) -> Result<T, DomainError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
    L: FnOnce(T) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut task = tokio::task::spawn_blocking(work);
    match tokio::time::timeout(timeout, &mut task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(DomainError::Internal(join.to_string())),
        Err(_) => {
            tokio::spawn(async move {
                if let Ok(Ok(value)) = task.await {
                    warn!("Blocking link call finished after its timeout");
                    late(value).await;
                }
            });
            Err(DomainError::AudioLinkTimeout {
                secs: timeout.as_secs(),
            })
        }
    }
}
