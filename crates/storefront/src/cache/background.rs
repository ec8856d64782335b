//! Background work that may outlive the request that started it.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

/// Tracks tasks spawned after (or alongside) a response.
///
/// Cache writes and stale-while-revalidate refreshes run here so the page
/// does not wait on them. Nothing orders this work relative to later
/// requests. [`BackgroundTasks::flush`] waits for everything outstanding and
/// is called on graceful shutdown.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl BackgroundTasks {
    /// Create an empty task tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` on the runtime without awaiting it.
    pub fn spawn<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(work);

        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Number of tasks that have not completed yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    /// Wait until every tracked task has finished.
    ///
    /// Tasks spawned while flushing are awaited as well.
    pub async fn flush(&self) {
        loop {
            let pending = std::mem::take(
                &mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner),
            );
            if pending.is_empty() {
                break;
            }

            for handle in pending {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "Background task failed");
                }
            }
        }
    }
}
