use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use crate::api::AuthApi;
use crate::error::AppError;
use crate::guard::InFlight;
use crate::models::{Credentials, User};
use crate::validation;

/// Result of asking the server whether the current client still has a
/// valid session.
#[derive(Debug)]
pub enum SessionProbe {
    Authenticated(User),
    Anonymous,
    /// The probe could not be completed; the session state is unknown.
    ProbeFailed(AppError),
}

impl SessionProbe {
    /// Collapses a failed probe into "no user".
    pub fn into_user(self) -> Option<User> {
        match self {
            SessionProbe::Authenticated(user) => Some(user),
            SessionProbe::Anonymous | SessionProbe::ProbeFailed(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    Authenticated(User),
    Rejected,
}

/// Tracks who is signed in for this client. One instance per process,
/// built at startup and shared by reference.
pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    user: RwLock<Option<User>>,
    in_flight: InFlight,
}

impl SessionManager {
    pub fn new(api: Arc<dyn AuthApi>) -> Self {
        Self {
            api,
            user: RwLock::new(None),
            in_flight: InFlight::new(),
        }
    }

    pub fn user(&self) -> Option<User> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    fn set_user(&self, user: Option<User>) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = user;
    }

    /// Creates an account. Does not touch the local session.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        repeat_password: &str,
    ) -> Result<(), AppError> {
        validation::validate_sign_up(email, password, repeat_password).into_result()?;

        let _token = self.in_flight.begin("sign-up")?;
        self.api.sign_up(&Credentials::new(email, password)).await?;
        info!(email, "account registered");
        Ok(())
    }

    /// Signs up, then asks the server for the session it established.
    /// `Ok(None)` means the account exists but no session was created.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        repeat_password: &str,
    ) -> Result<Option<User>, AppError> {
        self.sign_up(email, password, repeat_password).await?;

        match self.check_session().await {
            SessionProbe::Authenticated(user) => Ok(Some(user)),
            SessionProbe::Anonymous => Ok(None),
            SessionProbe::ProbeFailed(err) => Err(err),
        }
    }

    /// The server answers sign-in with a cookie and no body, so the session
    /// user is the email the caller submitted.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, AppError> {
        validation::validate_sign_in(email, password).into_result()?;

        let _token = self.in_flight.begin("sign-in")?;
        if self.api.sign_in(&Credentials::new(email, password)).await? {
            let user = User {
                email: email.to_string(),
            };
            self.set_user(Some(user.clone()));
            info!(email, "signed in");
            Ok(SignInOutcome::Authenticated(user))
        } else {
            info!(email, "sign-in rejected");
            Ok(SignInOutcome::Rejected)
        }
    }

    /// An `Anonymous` answer clears the local session. A failed probe leaves
    /// it as it was and is reported to the caller.
    pub async fn check_session(&self) -> SessionProbe {
        match self.api.current_user().await {
            Ok(Some(user)) => {
                self.set_user(Some(user.clone()));
                SessionProbe::Authenticated(user)
            }
            Ok(None) => {
                if self.is_authenticated() {
                    info!("session no longer valid");
                }
                self.set_user(None);
                SessionProbe::Anonymous
            }
            Err(err) => {
                warn!(error = %err, "session probe failed");
                SessionProbe::ProbeFailed(err)
            }
        }
    }

    pub async fn current_user(&self) -> Option<User> {
        self.check_session().await.into_user()
    }

    /// The local session is cleared whether or not the server call succeeds.
    pub async fn logout(&self) -> Result<(), AppError> {
        let _token = self.in_flight.begin("logout")?;
        let result = self.api.logout().await;
        self.set_user(None);

        match &result {
            Ok(()) => info!("signed out"),
            Err(err) => warn!(error = %err, "logout failed on the server"),
        }
        result
    }
}
