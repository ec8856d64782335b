//! Deferred page data.
//!
//! A [`Deferred`] starts loading as soon as it is created and is awaited only
//! when the page reaches the section that needs it. Loading never fails the
//! page: errors and panics are logged and resolve to `None`.

use std::fmt::Display;
use std::future::Future;

use tokio::task::JoinHandle;
use tracing::Instrument;

/// Data loading on its own task.
#[derive(Debug)]
pub struct Deferred<T> {
    handle: JoinHandle<Option<T>>,
}

impl<T: Send + 'static> Deferred<T> {
    /// Start loading `future` on a new task in the current span.
    pub fn spawn<F, E>(label: &'static str, future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        E: Display,
    {
        let task = async move {
            match future.await {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::error!(error = %e, deferred = label, "Deferred load failed");
                    None
                }
            }
        };

        Self {
            handle: tokio::spawn(task.in_current_span()),
        }
    }

    /// Wait for the data.
    pub async fn resolve(self) -> Option<T> {
        self.handle.await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Deferred task did not complete");
            None
        })
    }
}
