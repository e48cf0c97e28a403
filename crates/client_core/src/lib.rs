use std::sync::Arc;

use identity::IdentityProvider;
use storage::DirectoryStore;
use tokio::sync::broadcast;
use tracing::{debug, info};

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod events;
pub mod groups;
pub mod navigation;
pub mod profile;
pub mod session;

pub use auth::{AuthFlows, SignInOutcome};
pub use config::{load_settings, ClientSettings};
pub use error::AppError;
pub use events::{ClientEvent, Notice};
pub use groups::{GroupFormation, Selection};
pub use navigation::{Navigator, Screen};
pub use profile::{Dashboard, ProfileSummary};
pub use session::{SessionContext, SessionHandle, SessionSnapshot};

/// Collaborators every workflow needs, passed explicitly instead of living in globals.
#[derive(Clone)]
pub struct AppContext {
    store: Arc<dyn DirectoryStore>,
    identity: Arc<dyn IdentityProvider>,
    session: SessionHandle,
    events: broadcast::Sender<ClientEvent>,
}

impl AppContext {
    pub fn new(
        store: Arc<dyn DirectoryStore>,
        identity: Arc<dyn IdentityProvider>,
        session: SessionHandle,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self {
            store,
            identity,
            session,
            events,
        }
    }

    pub fn store(&self) -> &Arc<dyn DirectoryStore> {
        &self.store
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: ClientEvent) {
        // Nobody listening is fine; events are advisory.
        let _ = self.events.send(event);
    }

    pub(crate) fn notify(&self, notice: Notice) {
        debug!(title = %notice.title, "notice");
        self.emit(ClientEvent::Notice(notice));
    }

    /// Publishes the user-visible side of a failure and hands the error back.
    pub(crate) fn report(&self, err: AppError) -> AppError {
        match err.notice() {
            Some(notice) => self.notify(notice),
            None => debug!(error = %err, "failure without user notice"),
        }
        err
    }
}

/// Application lifetime: owns the session context and builds per-screen workflows.
pub struct App {
    session: SessionContext,
    context: AppContext,
    settings: ClientSettings,
}

impl App {
    pub fn start(
        settings: ClientSettings,
        store: Arc<dyn DirectoryStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let session = SessionContext::start(Arc::clone(&identity));
        let (events, _) = broadcast::channel(settings.event_capacity.max(1));
        let context = AppContext::new(store, identity, session.handle(), events);
        info!("client started");
        Self {
            session,
            context,
            settings,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn session(&self) -> SessionHandle {
        self.session.handle()
    }

    pub fn navigator(&self) -> Navigator {
        Navigator::new(self.settings.splash_delay(), self.context.events.clone())
    }

    pub fn auth(&self) -> AuthFlows {
        AuthFlows::new(self.context.clone())
    }

    pub fn group_formation(&self) -> GroupFormation {
        GroupFormation::new(self.context.clone())
    }

    pub async fn shutdown(self) {
        self.session.shutdown().await;
        info!("client stopped");
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
