//! # Dispatch Context
//!
//! [`Context`] is handed to every handler and pipeline behavior. It carries
//! cancellation, an optional deadline and request-scoped values. The
//! mediator itself never inspects it; handlers and behaviors decide whether
//! to honour cancellation.
//!
//! Contexts are immutable. Deriving a child (`with_cancel`, `with_timeout`,
//! `with_value`) never changes the parent, and a child is cancelled whenever
//! any of its ancestors is.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future;
use tokio::sync::Notify;
use tokio::time::Instant;

#[derive(Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

#[derive(Clone, Default)]
pub struct Context {
    cancels: Vec<Arc<CancelState>>,
    deadline: Option<Instant>,
    values: Arc<HashMap<&'static str, Arc<dyn Any + Send + Sync>>>,
}

/// Cancels the context returned alongside it by [`Context::with_cancel`].
#[derive(Clone)]
pub struct CancelHandle {
    state: Arc<CancelState>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.state.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }
}

impl Context {
    /// Root context: never cancelled, no deadline, no values.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let state = Arc::new(CancelState::default());
        let mut child = self.clone();
        child.cancels.push(Arc::clone(&state));
        (child, CancelHandle { state })
    }

    /// Child with `deadline`, or the parent's deadline if that is earlier.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut child = self.clone();
        child.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        child
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_value<T: Any + Send + Sync>(&self, key: &'static str, value: T) -> Self {
        let mut values = (*self.values).clone();
        values.insert(key, Arc::new(value));
        Self {
            cancels: self.cancels.clone(),
            deadline: self.deadline,
            values: Arc::new(values),
        }
    }

    /// Value stored under `key`, if present and of type `T`.
    pub fn value<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| (**v).downcast_ref::<T>())
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancels
            .iter()
            .any(|c| c.cancelled.load(Ordering::SeqCst))
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the context is cancelled or its deadline passes.
    /// Never resolves for a background context.
    pub async fn cancelled(&self) {
        // Register waiters before checking the flags so a concurrent
        // cancel cannot slip between the check and the await.
        let waiters: Vec<_> = self
            .cancels
            .iter()
            .map(|c| Box::pin(c.notify.notified()))
            .collect();

        if self.is_cancelled() {
            return;
        }

        let deadline = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => future::pending::<()>().await,
            }
        };

        if waiters.is_empty() {
            deadline.await;
            return;
        }

        tokio::select! {
            _ = future::select_all(waiters) => {}
            _ = deadline => {}
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("Context")
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.deadline)
            .field("values", &keys)
            .finish()
    }
}
