//! Sign-in, sign-up and federated sign-in flows.

use identity::FederatedTokenSource;
use shared::{
    domain::Identity,
    error::{AuthFailure, FederatedSignInError},
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    directory,
    error::AppError,
    events::{ClientEvent, Notice},
    navigation::Navigator,
    AppContext,
};

const LOGIN_FAILED: &str = "Login Failed";
const REGISTRATION_ERROR: &str = "Registration Error";
const FEDERATED_FAILED: &str = "Federated Sign-In Failed";

pub struct SignInOutcome {
    pub identity: Identity,
    /// Best-effort directory registration still running in the background.
    pub registration: JoinHandle<()>,
}

pub struct AuthFlows {
    ctx: AppContext,
}

impl AuthFlows {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub async fn sign_in_with_password(
        &self,
        nav: &mut Navigator,
        email: &str,
        password: &str,
    ) -> Result<SignInOutcome, AppError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(self.ctx.report(AppError::validation(
                "Missing Fields",
                "Please enter both email and password.",
            )));
        }

        let identity = self
            .ctx
            .identity()
            .sign_in_with_password(email, password)
            .await
            .map_err(|failure| {
                debug!(%failure, "password sign-in rejected");
                self.ctx.report(AppError::auth_failure(LOGIN_FAILED, &failure))
            })?;

        if !identity.email_verified {
            return Err(self.ctx.report(AppError::auth(
                "Email Not Verified",
                "Your email address has not been verified yet.\nPlease check your inbox for the verification email.",
            )));
        }

        nav.enter_main_area()?;
        info!(email = %identity.email, "signed in with password");

        let registration = self.spawn_directory_registration(identity.email.clone());
        Ok(SignInOutcome {
            identity,
            registration,
        })
    }

    pub async fn sign_up_with_password(
        &self,
        nav: &mut Navigator,
        email: &str,
        password: &str,
    ) -> Result<Identity, AppError> {
        let provider = self.ctx.identity();
        let registration_error =
            |failure: AuthFailure| AppError::auth(REGISTRATION_ERROR, failure.to_string());

        let identity = provider
            .sign_up_with_password(email.trim(), password)
            .await
            .map_err(|failure| self.ctx.report(registration_error(failure)))?;
        provider
            .send_verification_email(&identity)
            .await
            .map_err(|failure| self.ctx.report(registration_error(failure)))?;

        self.ctx.notify(Notice::new(
            "Verify your email",
            "A verification link has been sent to your email address. Please verify it before logging in.",
        ));

        // Verification is enforced by making the user sign in again.
        provider
            .sign_out()
            .await
            .map_err(|failure| self.ctx.report(registration_error(failure)))?;
        nav.open_sign_in()?;
        info!(email = %identity.email, "account registered; verification pending");
        Ok(identity)
    }

    pub async fn sign_in_with_federated(
        &self,
        nav: &mut Navigator,
        source: &dyn FederatedTokenSource,
    ) -> Result<Identity, AppError> {
        let token = match source.request_id_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                return Err(self.ctx.report(AppError::auth(
                    FEDERATED_FAILED,
                    "Unable to retrieve an ID token from the identity provider.",
                )))
            }
            Err(FederatedSignInError::Cancelled) => {
                debug!("federated sign-in cancelled by user");
                return Err(AppError::Cancelled);
            }
            Err(FederatedSignInError::InProgress) => {
                return Err(self.ctx.report(AppError::auth(
                    "Sign In",
                    "Sign in is already in progress.",
                )))
            }
            Err(FederatedSignInError::ServiceUnavailable) => {
                return Err(self.ctx.report(AppError::auth(
                    "Error",
                    "Federated sign-in service is not available or outdated.",
                )))
            }
            Err(FederatedSignInError::Other(message)) => {
                return Err(self.ctx.report(AppError::auth(FEDERATED_FAILED, message)))
            }
        };

        let identity = self
            .ctx
            .identity()
            .sign_in_with_federated_credential(&token)
            .await
            .map_err(|failure| self.ctx.report(AppError::auth(FEDERATED_FAILED, failure.to_string())))?;

        register_quietly(&self.ctx, &identity.email).await;
        nav.enter_main_area()?;
        info!(email = %identity.email, "signed in with federated credential");
        Ok(identity)
    }

    pub async fn sign_out(&self) -> Result<(), AppError> {
        self.ctx
            .identity()
            .sign_out()
            .await
            .map_err(|failure| self.ctx.report(AppError::auth("Sign Out Failed", failure.to_string())))
    }

    /// Detached and best-effort: failures are logged and never reach the user.
    fn spawn_directory_registration(&self, email: String) -> JoinHandle<()> {
        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            register_quietly(&ctx, &email).await;
        })
    }
}

async fn register_quietly(ctx: &AppContext, email: &str) {
    match directory::register_user_if_absent(ctx.store().as_ref(), email).await {
        Ok(true) => {
            info!(%email, "registered user in directory");
            ctx.emit(ClientEvent::UserRegistered {
                email: email.to_string(),
            });
        }
        Ok(false) => debug!(%email, "user already present in directory"),
        Err(error) => warn!(%email, error = %format!("{error:#}"), "directory registration skipped"),
    }
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
