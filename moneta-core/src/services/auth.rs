//! Auth service - login, registration and logout

use std::sync::Arc;

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::domain::result::{Error, Result};
use crate::domain::Session;
use crate::ports::{FinanceApi, LoginOutcome, RegisterOutcome};
use crate::services::SessionStore;

/// Loose `local@domain.tld` shape check; the server has the final word
fn is_plausible_email(email: &str) -> bool {
    static EMAIL_PATTERN: OnceCell<Regex> = OnceCell::new();
    EMAIL_PATTERN
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
        .is_match(email)
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{} is required", field)));
    }
    Ok(())
}

pub struct AuthService {
    api: Arc<dyn FinanceApi>,
    session: Arc<SessionStore>,
}

impl AuthService {
    pub fn new(api: Arc<dyn FinanceApi>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    /// Log in and persist the session on success
    ///
    /// A rejected login leaves any existing session untouched and is returned
    /// as `Ok(LoginOutcome::Rejected)`; only transport and server failures
    /// are errors.
    pub fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        require(email, "Email")?;
        require(password, "Password")?;

        let outcome = self.api.login(email.trim(), password)?;
        if let LoginOutcome::Authenticated { token, email } = &outcome {
            self.session.set_session(token, email)?;
        }
        Ok(outcome)
    }

    /// Create an account. The user is not logged in afterwards.
    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<RegisterOutcome> {
        require(name, "Name")?;
        require(email, "Email")?;
        require(password, "Password")?;
        if !is_plausible_email(email.trim()) {
            return Err(Error::validation(format!(
                "'{}' is not a valid email address",
                email.trim()
            )));
        }

        self.api.register(name.trim(), email.trim(), password)
    }

    /// Forget the session. Nothing is sent to the server.
    pub fn logout(&self) -> Result<()> {
        self.session.clear_session()
    }

    /// The logged-in user, if any
    pub fn current_user(&self) -> Option<Session> {
        self.session.guard().ok()
    }
}
