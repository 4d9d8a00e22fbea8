use std::{
    future::Future,
    panic::AssertUnwindSafe,
    pin::Pin,
    sync::{Arc, RwLock},
};

use futures_util::FutureExt;
use log::*;
use thiserror::Error;

use crate::events::OrderCreatedEvent;

#[derive(Debug, Clone, Error)]
#[error("Order listener failed: {0}")]
pub struct ListenerError(pub String);

pub type OrderListener =
    Arc<dyn Fn(OrderCreatedEvent) -> Pin<Box<dyn Future<Output = Result<(), ListenerError>> + Send>> + Send + Sync>;

/// Wraps a synchronous closure as an [`OrderListener`].
pub fn listener_from_fn<F>(f: F) -> OrderListener
where F: Fn(OrderCreatedEvent) -> Result<(), ListenerError> + Send + Sync + 'static {
    Arc::new(move |ev| {
        let result = f(ev);
        Box::pin(async move { result })
    })
}

/// Holds the (at most one) registered order listener.
#[derive(Default)]
pub struct ListenerSlot {
    listener: RwLock<Option<OrderListener>>,
}

impl ListenerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `listener`, replacing any previous one. Returns true if a listener was replaced.
    pub fn replace(&self, listener: OrderListener) -> bool {
        let mut slot = match self.listener.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.replace(listener).is_some()
    }

    /// Removes the listener, if any. Returns true if a listener was removed.
    pub fn clear(&self) -> bool {
        let mut slot = match self.listener.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.take().is_some()
    }

    pub fn is_registered(&self) -> bool {
        self.current().is_some()
    }

    fn current(&self) -> Option<OrderListener> {
        match self.listener.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Invokes the registered listener with `event` and waits for it to finish.
    ///
    /// Returns `Ok(false)` if no listener is registered. A listener that panics is reported as an error.
    pub async fn notify(&self, event: OrderCreatedEvent) -> Result<bool, ListenerError> {
        // Clone the handler out so that the lock is not held while the listener runs
        let Some(listener) = self.current() else {
            trace!("📦️ No order listener registered");
            return Ok(false);
        };
        match AssertUnwindSafe(async move { (listener)(event).await }).catch_unwind().await {
            Ok(Ok(())) => Ok(true),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ListenerError("the listener panicked".into())),
        }
    }
}
