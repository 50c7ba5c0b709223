//! Session store - the client's record of who is logged in
//!
//! One instance is created at startup and shared by reference with the HTTP
//! adapter (which reads the token for every request) and with the command
//! layer (which uses [`SessionStore::guard`] before protected operations).

use crate::domain::result::{Error, Result};
use crate::domain::Session;
use crate::ports::KeyValueStore;

/// Storage key of the bearer token
pub const TOKEN_KEY: &str = "authToken";
/// Storage key of the authenticated user's email
pub const USER_EMAIL_KEY: &str = "userEmail";

pub struct SessionStore {
    store: Box<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Store a session, overwriting any previous one.
    ///
    /// The token is opaque: any non-empty string is accepted.
    pub fn set_session(&self, token: &str, user_email: &str) -> Result<()> {
        if token.is_empty() {
            return Err(Error::validation("Token cannot be empty"));
        }
        self.store.set(TOKEN_KEY, token)?;
        self.store.set(USER_EMAIL_KEY, user_email)?;
        Ok(())
    }

    /// The stored bearer token, if any
    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// The stored user email, if any
    pub fn user_email(&self) -> Option<String> {
        self.store.get(USER_EMAIL_KEY).filter(|e| !e.is_empty())
    }

    /// Forget the session
    pub fn clear_session(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_EMAIL_KEY)?;
        Ok(())
    }

    /// True iff a token is stored. Expiry and signature are not checked.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Route guard for protected operations
    ///
    /// Returns the current session, or `Error::Auth` when the caller must be
    /// sent to the login screen. A token without an email is not usable
    /// because every protected query is scoped by email.
    pub fn guard(&self) -> Result<Session> {
        let token = self
            .token()
            .ok_or_else(|| Error::auth("Not logged in"))?;
        let user_email = self
            .user_email()
            .ok_or_else(|| Error::auth("Session has no user email, log in again"))?;
        Ok(Session::new(token, user_email))
    }
}
