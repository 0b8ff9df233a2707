use crate::error::{Result, ShopError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// A cancellation scope owned by whatever screen or command issued the fetches.
///
/// Every fetch runs through [`FetchScope::run`]. Once the scope is cancelled,
/// pending fetches resolve to [`ShopError::Cancelled`] and a fetch that
/// finishes after cancellation has its result discarded, so callers never
/// apply state for a screen that has gone away.
#[derive(Clone, Debug)]
pub struct FetchScope {
    cancelled: Arc<watch::Sender<bool>>,
}

impl Default for FetchScope {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchScope {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            cancelled: Arc::new(tx),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Resolves once the scope is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.cancelled.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Returns a guard that cancels the scope when dropped, tying the scope to
    /// the lifetime of its owner.
    pub fn guard(&self) -> CancelOnDrop {
        CancelOnDrop {
            scope: self.clone(),
        }
    }

    /// Runs `fut` unless the scope is, or becomes, cancelled.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(ShopError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(ShopError::Cancelled),
            result = fut => {
                if self.is_cancelled() {
                    Err(ShopError::Cancelled)
                } else {
                    result
                }
            }
        }
    }
}

pub struct CancelOnDrop {
    scope: FetchScope,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
