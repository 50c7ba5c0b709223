//! Session domain model

use serde::{Deserialize, Serialize};

/// An authenticated session as held by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque bearer token issued by the server
    pub token: String,
    pub user_email: String,
}

impl Session {
    pub fn new(token: impl Into<String>, user_email: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_email: user_email.into(),
        }
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        bearer(&self.token)
    }
}

/// Format a token as an `Authorization` header value
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
