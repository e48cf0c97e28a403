//! Session context: the app's view of who is signed in, fed by the identity provider.

use std::sync::Arc;

use identity::IdentityProvider;
use shared::domain::Identity;
use tokio::{sync::watch, task::JoinHandle};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub current_identity: Option<Identity>,
    /// True until the provider delivers its first notification; never becomes true again.
    pub is_resolving: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            current_identity: None,
            is_resolving: true,
        }
    }
}

/// Read-only, cloneable view of the session handed to workflows.
#[derive(Clone)]
pub struct SessionHandle {
    rx: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub fn snapshot(&self) -> SessionSnapshot {
        self.rx.borrow().clone()
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.rx.borrow().current_identity.clone()
    }

    pub fn is_resolving(&self) -> bool {
        self.rx.borrow().is_resolving
    }

    /// Waits for the first provider notification. `None` if the context was torn down first.
    pub async fn resolved(&mut self) -> Option<SessionSnapshot> {
        self.rx
            .wait_for(|snapshot| !snapshot.is_resolving)
            .await
            .ok()
            .map(|snapshot| (*snapshot).clone())
    }

    /// Waits for the next change. Returns false once the context is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Current snapshot followed by every subsequent change.
    pub fn changes(&self) -> WatchStream<SessionSnapshot> {
        WatchStream::new(self.rx.clone())
    }
}

/// Owns the provider subscription. Created at app start; dropping or shutting it down
/// unsubscribes.
///
/// There is no retry: a provider that never calls back leaves the session resolving forever.
pub struct SessionContext {
    rx: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<()>,
}

impl SessionContext {
    pub fn start(provider: Arc<dyn IdentityProvider>) -> Self {
        let (tx, rx) = watch::channel(SessionSnapshot::default());
        let task = tokio::spawn(async move {
            let mut subscription = provider.subscribe().await;
            while let Some(change) = subscription.next().await {
                let identity = change.into_identity();
                let signed_in = identity.is_some();
                let previous = tx.send_replace(SessionSnapshot {
                    current_identity: identity,
                    is_resolving: false,
                });
                if previous.is_resolving {
                    info!(signed_in, "session resolved");
                } else {
                    debug!(signed_in, "session changed");
                }
            }
            debug!("identity provider closed session notifications");
        });

        Self { rx, task }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            rx: self.rx.clone(),
        }
    }

    pub async fn shutdown(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
        debug!("session context torn down");
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
