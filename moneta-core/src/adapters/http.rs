//! Finance API HTTP client
//!
//! Talks JSON to the finance server. Every request leaves through
//! [`HttpFinanceApi::send`], which attaches the session's bearer token unless
//! the path is an authentication endpoint.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use url::Url;

use crate::domain::result::{Error, Result};
use crate::domain::{
    bearer, Category, DateRange, Summary, Transaction, TransactionDraft, TransactionType,
};
use crate::ports::{FinanceApi, LoginOutcome, RegisterOutcome};
use crate::services::SessionStore;

// =============================================================================
// Request decoration
// =============================================================================

/// Paths that must go out without credentials, matched by substring
pub const UNAUTHENTICATED_PATHS: [&str; 2] = ["/auth/login", "/auth/register"];

/// Whether `path` targets login or registration
pub fn is_auth_endpoint(path: &str) -> bool {
    UNAUTHENTICATED_PATHS.iter().any(|p| path.contains(p))
}

/// `Authorization` header value for a request to `path`, if one is due
///
/// A stale token is never sent to the auth endpoints.
pub fn authorization_for(path: &str, token: Option<&str>) -> Option<String> {
    if is_auth_endpoint(path) {
        return None;
    }
    token.map(bearer)
}

// =============================================================================
// Wire models
// =============================================================================

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Response of both auth endpoints
///
/// Registration reuses `token` for its confirmation text, so `token` alone
/// never decides success.
#[derive(Debug, Clone, Default, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Transaction as the server sends it
///
/// Two shapes exist: a flat DTO with `categoryId`/`categoryName`, and the raw
/// entity with a nested `category` object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTransaction {
    id: i64,
    #[serde(default)]
    description: Option<String>,
    #[serde(deserialize_with = "deserialize_amount")]
    amount: Decimal,
    date: String,
    #[serde(rename = "type")]
    transaction_type: String,
    #[serde(default)]
    category_id: Option<i64>,
    #[serde(default)]
    category_name: Option<String>,
    #[serde(default)]
    category: Option<WireCategory>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireCategory {
    Entity {
        id: i64,
        #[serde(default)]
        name: Option<String>,
    },
    Name(String),
}

/// Deserialize amount that can be number or string
fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    match value {
        JsonValue::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map_err(|e| D::Error::custom(format!("invalid decimal: {}", e))),
        JsonValue::String(s) => s
            .trim()
            .parse::<Decimal>()
            .map_err(|e| D::Error::custom(format!("invalid decimal: {}", e))),
        _ => Err(D::Error::custom("expected number or string for amount")),
    }
}

/// Decide a login from the response shape: a token AND the email it was issued for
fn classify_login(response: AuthResponse) -> LoginOutcome {
    let token = response.token.filter(|t| !t.trim().is_empty());
    let email = response.email.filter(|e| !e.trim().is_empty());

    match (token, email) {
        (Some(token), Some(email)) => LoginOutcome::Authenticated { token, email },
        _ => LoginOutcome::Rejected {
            message: response
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Invalid credentials".to_string()),
        },
    }
}

/// Decide a registration: the server echoes the email only when the account was created
fn classify_register(response: AuthResponse) -> RegisterOutcome {
    let text = response
        .message
        .filter(|m| !m.trim().is_empty())
        .or(response.token.filter(|t| !t.trim().is_empty()));

    match response.email.filter(|e| !e.trim().is_empty()) {
        Some(email) => RegisterOutcome::Registered {
            email,
            message: text.unwrap_or_else(|| "Registration complete".to_string()),
        },
        None => RegisterOutcome::Rejected {
            message: text.unwrap_or_else(|| "Registration failed".to_string()),
        },
    }
}

/// Normalize a wire transaction into the domain shape
fn map_transaction(wire: WireTransaction) -> Result<Transaction> {
    let date_str = wire.date.get(..10).unwrap_or(&wire.date);
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| {
        Error::server(200, format!("Transaction {} has invalid date '{}'", wire.id, wire.date))
    })?;

    let transaction_type: TransactionType = wire
        .transaction_type
        .parse()
        .map_err(|_| {
            Error::server(
                200,
                format!(
                    "Transaction {} has invalid type '{}'",
                    wire.id, wire.transaction_type
                ),
            )
        })?;

    let (nested_id, nested_name) = match wire.category {
        Some(WireCategory::Entity { id, name }) => (Some(id), name),
        Some(WireCategory::Name(name)) => (None, Some(name)),
        None => (None, None),
    };
    let category_name = wire.category_name.or(nested_name);

    let category_id = wire
        .category_id
        .or(nested_id)
        .or_else(|| {
            let name = category_name.as_deref()?;
            Category::ALL
                .into_iter()
                .find(|c| c.name() == name)
                .map(Category::id)
        })
        .ok_or_else(|| Error::server(200, format!("Transaction {} has no category", wire.id)))?;

    Ok(Transaction {
        id: wire.id,
        description: wire.description.unwrap_or_default(),
        amount: wire.amount,
        date,
        transaction_type,
        category_id,
        category_name,
    })
}

/// Pull a human message out of an error body (Spring style `message`/`error`, or plain text)
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(json) = serde_json::from_str::<JsonValue>(trimmed) {
        return ["message", "error"]
            .iter()
            .filter_map(|key| json.get(key).and_then(|v| v.as_str()))
            .find(|s| !s.trim().is_empty())
            .map(str::to_string);
    }

    if trimmed.len() <= 200 {
        Some(trimmed.to_string())
    } else {
        None
    }
}

// =============================================================================
// HTTP client
// =============================================================================

/// Default API URL for a locally running server
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Finance API over HTTP
pub struct HttpFinanceApi {
    client: Client,
    base_url: Url,
    session: Arc<SessionStore>,
}

impl HttpFinanceApi {
    /// Create a client for `base_url` reading credentials from `session`
    pub fn new(base_url: &str, session: Arc<SessionStore>) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| Error::Config(format!("Invalid API URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("Invalid API URL '{}'", base_url)));
        }

        // no client-side timeout: a request lasts as long as the server takes
        let client = Client::builder()
            .timeout(Option::<Duration>::None)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for the given path segments (each one percent-encoded)
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Invalid API URL '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Endpoint with the owner email and date range as query parameters
    fn ranged_endpoint(&self, segments: &[&str], email: &str, range: &DateRange) -> Result<Url> {
        let mut url = self.endpoint(segments)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("email", email);
            for (key, value) in range.query_params() {
                query.append_pair(key, &value);
            }
        }
        Ok(url)
    }

    /// Attach the bearer token when the request is due one
    fn authorize(&self, request: RequestBuilder, url: &Url) -> RequestBuilder {
        match authorization_for(url.path(), self.session.token().as_deref()) {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        }
    }

    /// Send one request, once. Non-2xx responses become errors.
    fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Response> {
        let mut request = self.client.request(method, url.clone());
        request = self.authorize(request, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(|e| self.map_request_error(e))?;
        self.check_response_status(response)
    }

    fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T> {
        let response = self.send(method, url, body)?;
        let status = response.status().as_u16();
        response
            .json::<T>()
            .map_err(|e| Error::server(status, format!("Unreadable response: {}", e)))
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_connect() {
            Error::network(format!("Unable to connect to {}", self.base_url))
        } else {
            Error::network(format!("Request failed: {}", error))
        }
    }

    /// Check response status and return appropriate errors
    fn check_response_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

        match status.as_u16() {
            401 => Err(Error::auth(format!(
                "The server rejected the session ({}). Log in again.",
                message
            ))),
            403 => Err(Error::auth(format!("Access denied: {}", message))),
            code => Err(Error::server(code, message)),
        }
    }
}

impl FinanceApi for HttpFinanceApi {
    fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let url = self.endpoint(&["auth", "login"])?;
        let response: AuthResponse =
            self.send_json(Method::POST, url, Some(&LoginRequest { email, password }))?;
        Ok(classify_login(response))
    }

    fn register(&self, name: &str, email: &str, password: &str) -> Result<RegisterOutcome> {
        let url = self.endpoint(&["auth", "register"])?;
        let response: AuthResponse = self.send_json(
            Method::POST,
            url,
            Some(&RegisterRequest {
                name,
                email,
                password,
            }),
        )?;
        Ok(classify_register(response))
    }

    fn list_transactions_by_email(
        &self,
        email: &str,
        range: &DateRange,
    ) -> Result<Vec<Transaction>> {
        let url = self.ranged_endpoint(&["transactions", "by-email", email], email, range)?;
        let wire: Vec<WireTransaction> = self.send_json::<(), _>(Method::GET, url, None)?;

        // the server may ignore the range parameters
        let mut transactions = Vec::with_capacity(wire.len());
        for item in wire {
            let tx = map_transaction(item)?;
            if range.contains(tx.date) {
                transactions.push(tx);
            }
        }
        Ok(transactions)
    }

    fn create_transaction(&self, draft: &TransactionDraft) -> Result<Transaction> {
        let url = self.endpoint(&["transactions"])?;
        let wire: WireTransaction = self.send_json(Method::POST, url, Some(draft))?;
        map_transaction(wire)
    }

    fn update_transaction(&self, id: i64, draft: &TransactionDraft) -> Result<Transaction> {
        let url = self.endpoint(&["transactions", &id.to_string()])?;
        let wire: WireTransaction = self.send_json(Method::PUT, url, Some(draft))?;
        map_transaction(wire)
    }

    fn delete_transaction(&self, id: i64) -> Result<()> {
        let url = self.endpoint(&["transactions", &id.to_string()])?;
        self.send::<()>(Method::DELETE, url, None)?;
        Ok(())
    }

    fn get_summary(&self, email: &str, range: &DateRange) -> Result<Summary> {
        let url = self.ranged_endpoint(&["transactions", "summary", "by-email"], email, range)?;
        self.send_json::<(), _>(Method::GET, url, None)
    }
}

// =============================================================================
// Tests
// =============================================================================
