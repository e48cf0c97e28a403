//! Linear screen stack: Splash, SignIn, SignUp and the signed-in MainArea.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::{events::ClientEvent, session::SessionHandle};

pub const DEFAULT_SPLASH_DELAY: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Splash,
    SignIn,
    SignUp,
    MainArea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Push,
    /// Discards the stack; there is no way back to earlier screens.
    Reset,
    Back,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("illegal navigation from {from:?} to {to:?}")]
    IllegalTransition { from: Screen, to: Screen },
    #[error("no screen to go back to from {0:?}")]
    NothingToPop(Screen),
    #[error("splash resolution requested while on {0:?}")]
    NotOnSplash(Screen),
    #[error("session context was torn down before it resolved")]
    SessionUnavailable,
}

fn is_allowed(from: Screen, to: Screen) -> bool {
    matches!(
        (from, to),
        (Screen::Splash, Screen::SignIn)
            | (Screen::Splash, Screen::MainArea)
            | (Screen::SignIn, Screen::SignUp)
            | (Screen::SignIn, Screen::MainArea)
            | (Screen::SignUp, Screen::SignIn)
    )
}

pub struct Navigator {
    stack: Vec<Screen>,
    splash_delay: Duration,
    events: broadcast::Sender<ClientEvent>,
}

impl Navigator {
    pub fn new(splash_delay: Duration, events: broadcast::Sender<ClientEvent>) -> Self {
        Self {
            stack: vec![Screen::Splash],
            splash_delay,
            events,
        }
    }

    pub fn current(&self) -> Screen {
        self.stack.last().copied().unwrap_or(Screen::Splash)
    }

    pub fn stack(&self) -> &[Screen] {
        &self.stack
    }

    pub fn push(&mut self, to: Screen) -> Result<(), NavigationError> {
        self.check(to)?;
        self.stack.push(to);
        self.announce(to, TransitionKind::Push);
        Ok(())
    }

    pub fn reset(&mut self, to: Screen) -> Result<(), NavigationError> {
        self.check(to)?;
        self.stack.clear();
        self.stack.push(to);
        self.announce(to, TransitionKind::Reset);
        Ok(())
    }

    pub fn back(&mut self) -> Result<Screen, NavigationError> {
        let from = self.current();
        let Some(&to) = self.stack.iter().rev().nth(1) else {
            return Err(NavigationError::NothingToPop(from));
        };
        if !is_allowed(from, to) {
            return Err(NavigationError::IllegalTransition { from, to });
        }
        self.stack.pop();
        self.announce(to, TransitionKind::Back);
        Ok(to)
    }

    pub fn open_sign_up(&mut self) -> Result<(), NavigationError> {
        self.push(Screen::SignUp)
    }

    /// From SignUp: pops back when SignIn is underneath, otherwise resets onto it.
    pub fn open_sign_in(&mut self) -> Result<(), NavigationError> {
        if self.stack.iter().rev().nth(1) == Some(&Screen::SignIn) {
            self.back().map(|_| ())
        } else {
            self.reset(Screen::SignIn)
        }
    }

    pub fn enter_main_area(&mut self) -> Result<(), NavigationError> {
        self.reset(Screen::MainArea)
    }

    /// Holds the splash screen until the session resolves, then for the minimum display delay,
    /// and resets to MainArea or SignIn. A session change during the delay restarts it.
    pub async fn resolve_splash(
        &mut self,
        session: &mut SessionHandle,
    ) -> Result<Screen, NavigationError> {
        let current = self.current();
        if current != Screen::Splash {
            return Err(NavigationError::NotOnSplash(current));
        }

        let mut snapshot = session
            .resolved()
            .await
            .ok_or(NavigationError::SessionUnavailable)?;
        debug!(delay_ms = self.splash_delay.as_millis() as u64, "splash delay started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.splash_delay) => break,
                alive = session.changed() => {
                    if !alive {
                        break;
                    }
                    snapshot = session.snapshot();
                    debug!("session changed during splash delay; restarting");
                }
            }
        }

        let next = if snapshot.current_identity.is_some() {
            Screen::MainArea
        } else {
            Screen::SignIn
        };
        self.reset(next)?;
        info!(screen = ?next, "splash resolved");
        Ok(next)
    }

    fn check(&self, to: Screen) -> Result<(), NavigationError> {
        let from = self.current();
        if is_allowed(from, to) {
            Ok(())
        } else {
            Err(NavigationError::IllegalTransition { from, to })
        }
    }

    fn announce(&self, screen: Screen, kind: TransitionKind) {
        debug!(?screen, ?kind, "navigated");
        let _ = self.events.send(ClientEvent::Navigated { screen, kind });
    }
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;
