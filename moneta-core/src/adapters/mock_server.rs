//! Mock finance server for testing
//!
//! Simulates the finance backend with in-memory state so the HTTP client and
//! the services can be exercised end to end:
//! - POST /auth/register, POST /auth/login
//! - GET /transactions/by-email/{email}, GET /transactions/summary/by-email
//! - POST /transactions, PUT /transactions/{id}, DELETE /transactions/{id}
//!
//! Every request is recorded with its `Authorization` header so tests can
//! check request decoration.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::domain::{Category, DateRange, Summary, Transaction, TransactionType};

/// Configuration for the simulated backend
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Reject protected endpoints without a valid bearer token
    pub require_auth: bool,
    /// Return every transaction regardless of `start`/`end`, like the real backend
    pub ignore_date_range: bool,
    /// Answer the summary endpoint with HTTP 500
    pub fail_summary: bool,
    /// Answer the list endpoint with HTTP 500
    pub fail_list: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            ignore_date_range: false,
            fail_summary: false,
            fail_list: false,
        }
    }
}

/// A request as seen by the mock server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Debug, Default)]
struct MockState {
    /// email -> (name, password)
    users: HashMap<String, (String, String)>,
    /// token -> email
    tokens: HashMap<String, String>,
    /// (owner email, transaction), in insertion order
    transactions: Vec<(String, Transaction)>,
    next_id: i64,
    requests: Vec<RecordedRequest>,
}

/// Mock finance server for testing
pub struct MockFinanceServer {
    port: u16,
    running: Arc<AtomicBool>,
    state: Arc<Mutex<MockState>>,
    config: Arc<Mutex<MockConfig>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl MockFinanceServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let state = Arc::new(Mutex::new(MockState {
            next_id: 1,
            ..Default::default()
        }));
        let config = Arc::new(Mutex::new(config));

        // Set listener to non-blocking for graceful shutdown
        listener.set_nonblocking(true)?;

        let running_clone = running.clone();
        let state_clone = state.clone();
        let config_clone = config.clone();
        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let state = state_clone.clone();
                        let config = config_clone.clone();
                        thread::spawn(move || handle_connection(stream, &state, &config));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            state,
            config,
            thread_handle: Some(thread_handle),
        })
    }

    /// Get the base URL for this mock server
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Register a user directly, bypassing HTTP
    pub fn add_user(&self, name: &str, email: &str, password: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .users
            .insert(email.to_string(), (name.to_string(), password.to_string()));
    }

    /// Insert a transaction directly, bypassing HTTP (a concurrent edit from elsewhere)
    pub fn seed_transaction(
        &self,
        owner: &str,
        description: &str,
        amount: Decimal,
        date: &str,
        transaction_type: TransactionType,
        category: Category,
    ) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.transactions.push((
            owner.to_string(),
            Transaction {
                id,
                description: description.to_string(),
                amount,
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                transaction_type,
                category_id: category.id(),
                category_name: Some(category.name().to_string()),
            },
        ));
        id
    }

    /// Ids of all stored transactions
    pub fn transaction_ids(&self) -> Vec<i64> {
        let state = self.state.lock().unwrap();
        state.transactions.iter().map(|(_, tx)| tx.id).collect()
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Change the server behavior for the following requests
    pub fn set_config(&self, config: MockConfig) {
        *self.config.lock().unwrap() = config;
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockFinanceServer {
    fn drop(&mut self) {
        self.stop();
    }
}

struct ParsedRequest {
    method: String,
    path: String,
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

fn read_request(stream: &TcpStream) -> Option<ParsedRequest> {
    stream.set_nonblocking(false).ok()?;
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_lowercase(), value.trim().to_string());
        }
    }

    let length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).ok()?;

    let (path, query_string) = target.split_once('?').unwrap_or((target.as_str(), ""));
    let query = url::form_urlencoded::parse(query_string.as_bytes())
        .into_owned()
        .collect();

    Some(ParsedRequest {
        method,
        path: path.to_string(),
        query,
        headers,
        body,
    })
}

fn handle_connection(mut stream: TcpStream, state: &Mutex<MockState>, config: &Mutex<MockConfig>) {
    let Some(request) = read_request(&stream) else {
        send_response(&mut stream, 400, "Bad Request", r#"{"error": "Invalid request"}"#);
        return;
    };
    let config = config.lock().unwrap().clone();
    let (status, reason, body) = route(&request, &mut state.lock().unwrap(), &config);
    send_response(&mut stream, status, reason, &body);
}

#[derive(Deserialize)]
struct AuthBody {
    #[serde(default)]
    name: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftBody {
    description: String,
    amount: f64,
    date: NaiveDate,
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    category_id: i64,
    email: String,
}

fn route(
    request: &ParsedRequest,
    state: &mut MockState,
    config: &MockConfig,
) -> (u16, &'static str, String) {
    state.requests.push(RecordedRequest {
        method: request.method.clone(),
        path: request.path.clone(),
        authorization: request.headers.get("authorization").cloned(),
    });

    let segments: Vec<&str> = request.path.trim_matches('/').split('/').collect();

    // auth endpoints answer 200 with the outcome in the body, like the real backend
    match (request.method.as_str(), segments.as_slice()) {
        ("POST", ["auth", "register"]) => {
            let Ok(body) = serde_json::from_slice::<AuthBody>(&request.body) else {
                return (400, "Bad Request", r#"{"message": "Invalid body"}"#.to_string());
            };
            if state.users.contains_key(&body.email) {
                let response = json!({
                    "token": "Email já está em uso.",
                    "email": null,
                    "message": null
                });
                return (200, "OK", response.to_string());
            }
            state.users.insert(body.email.clone(), (body.name, body.password));
            let response = json!({
                "token": "Registo concluído com sucesso.",
                "email": body.email,
                "message": null
            });
            return (200, "OK", response.to_string());
        }
        ("POST", ["auth", "login"]) => {
            let Ok(body) = serde_json::from_slice::<AuthBody>(&request.body) else {
                return (400, "Bad Request", r#"{"message": "Invalid body"}"#.to_string());
            };
            let valid = state
                .users
                .get(&body.email)
                .map(|(_, password)| *password == body.password)
                .unwrap_or(false);
            if !valid {
                let response = json!({
                    "token": null,
                    "email": null,
                    "message": "Credenciais inválidas"
                });
                return (200, "OK", response.to_string());
            }
            let token = format!("abc123{:08x}", state.tokens.len() + 1);
            state.tokens.insert(token.clone(), body.email.clone());
            let response = json!({
                "token": token,
                "email": body.email,
                "message": "Login efetuado com sucesso."
            });
            return (200, "OK", response.to_string());
        }
        _ => {}
    }

    if config.require_auth {
        let authorized = request
            .headers
            .get("authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|token| state.tokens.contains_key(token))
            .unwrap_or(false);
        if !authorized {
            return (401, "Unauthorized", r#"{"error": "Unauthorized"}"#.to_string());
        }
    }

    match (request.method.as_str(), segments.as_slice()) {
        ("GET", ["transactions", "by-email", email]) => {
            if config.fail_list {
                return internal_error("List failed");
            }
            let range = query_range(request);
            let list: Vec<serde_json::Value> = state
                .transactions
                .iter()
                .filter(|(owner, _)| owner == email)
                .filter(|(_, tx)| {
                    config.ignore_date_range || range.map_or(true, |r| r.contains(tx.date))
                })
                .map(|(_, tx)| entity_json(tx))
                .collect();
            (200, "OK", serde_json::Value::Array(list).to_string())
        }
        ("GET", ["transactions", "summary", "by-email"]) => {
            if config.fail_summary {
                return internal_error("Summary failed");
            }
            let email = request.query.get("email").cloned().unwrap_or_default();
            let range = query_range(request);
            let summary = Summary::from_transactions(
                state
                    .transactions
                    .iter()
                    .filter(|(owner, _)| *owner == email)
                    .filter(|(_, tx)| range.map_or(true, |r| r.contains(tx.date)))
                    .map(|(_, tx)| tx),
            );
            (200, "OK", serde_json::to_string(&summary).unwrap())
        }
        ("POST", ["transactions"]) => {
            let Ok(body) = serde_json::from_slice::<DraftBody>(&request.body) else {
                return (400, "Bad Request", r#"{"message": "Invalid body"}"#.to_string());
            };
            let Some(category) = Category::from_id(body.category_id) else {
                return internal_error("Category not found");
            };
            let id = state.next_id;
            state.next_id += 1;
            let tx = to_transaction(id, &body, category);
            let response = dto_json(&tx);
            state.transactions.push((body.email, tx));
            (200, "OK", response.to_string())
        }
        ("PUT", ["transactions", id]) => {
            let Ok(body) = serde_json::from_slice::<DraftBody>(&request.body) else {
                return (400, "Bad Request", r#"{"message": "Invalid body"}"#.to_string());
            };
            let Some(category) = Category::from_id(body.category_id) else {
                return internal_error("Category not found");
            };
            let id: i64 = id.parse().unwrap_or(-1);
            let Some(slot) = state.transactions.iter_mut().find(|(_, tx)| tx.id == id) else {
                return internal_error("Transaction not found");
            };
            let tx = to_transaction(id, &body, category);
            let response = dto_json(&tx);
            *slot = (body.email, tx);
            (200, "OK", response.to_string())
        }
        ("DELETE", ["transactions", id]) => {
            let id: i64 = id.parse().unwrap_or(-1);
            state.transactions.retain(|(_, tx)| tx.id != id);
            (200, "OK", String::new())
        }
        _ => (404, "Not Found", r#"{"error": "Endpoint not found"}"#.to_string()),
    }
}

fn query_range(request: &ParsedRequest) -> Option<DateRange> {
    let start = request.query.get("start")?;
    let end = request.query.get("end")?;
    DateRange::parse(start, end).ok()
}

fn internal_error(message: &str) -> (u16, &'static str, String) {
    (
        500,
        "Internal Server Error",
        json!({"status": 500, "error": "Internal Server Error", "message": message}).to_string(),
    )
}

fn to_transaction(id: i64, body: &DraftBody, category: Category) -> Transaction {
    Transaction {
        id,
        description: body.description.clone(),
        amount: Decimal::try_from(body.amount).unwrap_or_default(),
        date: body.date,
        transaction_type: body.transaction_type,
        category_id: category.id(),
        category_name: Some(category.name().to_string()),
    }
}

/// Flat response DTO, as returned by create/update
fn dto_json(tx: &Transaction) -> serde_json::Value {
    json!({
        "id": tx.id,
        "description": tx.description,
        "amount": tx.amount.to_string().parse::<f64>().unwrap_or_default(),
        "type": tx.transaction_type.as_str(),
        "date": tx.date.format("%Y-%m-%d").to_string(),
        "categoryId": tx.category_id,
        "categoryName": tx.category_name,
    })
}

/// Raw entity with nested category, as returned by the list endpoint
fn entity_json(tx: &Transaction) -> serde_json::Value {
    json!({
        "id": tx.id,
        "description": tx.description,
        "amount": tx.amount.to_string().parse::<f64>().unwrap_or_default(),
        "date": tx.date.format("%Y-%m-%d").to_string(),
        "type": tx.transaction_type.as_str(),
        "category": {"id": tx.category_id, "name": tx.category_name},
    })
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::HttpFinanceApi;
    use crate::adapters::memory_store::MemoryStore;
    use crate::domain::TransactionForm;
    use crate::ports::{FinanceApi, LoginOutcome, RegisterOutcome};
    use crate::services::SessionStore;

    fn client(server: &MockFinanceServer) -> (HttpFinanceApi, Arc<SessionStore>) {
        let session = Arc::new(SessionStore::new(Box::new(MemoryStore::new())));
        let api = HttpFinanceApi::new(&server.base_url(), session.clone()).unwrap();
        (api, session)
    }

    fn may_2025() -> DateRange {
        DateRange::parse("2025-05-01", "2025-05-31").unwrap()
    }

    fn draft(
        description: &str,
        cents: i64,
        date: &str,
        email: &str,
    ) -> crate::domain::TransactionDraft {
        TransactionForm {
            description: Some(description.to_string()),
            amount: Some(Decimal::new(cents, 2)),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            ..TransactionForm::default()
        }
        .validate(email)
        .unwrap()
    }

    fn logged_in(server: &MockFinanceServer) -> (HttpFinanceApi, Arc<SessionStore>) {
        server.add_user("Ana", "a@x.com", "pw");
        let (api, session) = client(server);
        match api.login("a@x.com", "pw").unwrap() {
            LoginOutcome::Authenticated { token, email } => {
                session.set_session(&token, &email).unwrap()
            }
            other => panic!("login failed: {:?}", other),
        }
        (api, session)
    }

    #[test]
    fn test_register_then_login() {
        let server = MockFinanceServer::start(MockConfig::default()).unwrap();
        let (api, _) = client(&server);

        let registered = api.register("Ana", "a@x.com", "pw").unwrap();
        assert!(matches!(registered, RegisterOutcome::Registered { .. }));

        let again = api.register("Ana", "a@x.com", "pw").unwrap();
        assert_eq!(
            again,
            RegisterOutcome::Rejected {
                message: "Email já está em uso.".to_string()
            }
        );

        match api.login("a@x.com", "pw").unwrap() {
            LoginOutcome::Authenticated { token, email } => {
                assert!(token.starts_with("abc123"));
                assert_eq!(email, "a@x.com");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_login_with_bad_password() {
        let server = MockFinanceServer::start(MockConfig::default()).unwrap();
        server.add_user("Ana", "a@x.com", "pw");
        let (api, _) = client(&server);

        let outcome = api.login("a@x.com", "wrong").unwrap();
        assert_eq!(
            outcome,
            LoginOutcome::Rejected {
                message: "Credenciais inválidas".to_string()
            }
        );
    }

    #[test]
    fn test_auth_requests_never_carry_token() {
        let server = MockFinanceServer::start(MockConfig::default()).unwrap();
        let (api, session) = client(&server);
        session.set_session("stale-token", "old@x.com").unwrap();

        let _ = api.register("Ana", "a@x.com", "pw").unwrap();
        let _ = api.login("a@x.com", "pw").unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.authorization.is_none()));
    }

    #[test]
    fn test_protected_requests_carry_token() {
        let server = MockFinanceServer::start(MockConfig::default()).unwrap();
        let (api, session) = logged_in(&server);
        let token = session.token().unwrap();

        api.list_transactions_by_email("a@x.com", &may_2025()).unwrap();
        api.get_summary("a@x.com", &may_2025()).unwrap();
        let created = api
            .create_transaction(&draft("Lunch", 1200, "2025-05-02", "a@x.com"))
            .unwrap();
        api.delete_transaction(created.id).unwrap();

        let expected = format!("Bearer {}", token);
        let protected: Vec<_> = server
            .requests()
            .into_iter()
            .filter(|r| !r.path.starts_with("/auth/"))
            .collect();
        assert_eq!(protected.len(), 4);
        assert!(protected
            .iter()
            .all(|r| r.authorization.as_deref() == Some(expected.as_str())));
    }

    #[test]
    fn test_no_header_without_session() {
        let server = MockFinanceServer::start(MockConfig::default()).unwrap();
        let (api, _) = client(&server);

        let result = api.list_transactions_by_email("a@x.com", &may_2025());
        assert!(matches!(result, Err(crate::Error::Auth(_))));
        assert_eq!(server.requests()[0].authorization, None);
    }

    #[test]
    fn test_list_filters_inclusive_range() {
        let server = MockFinanceServer::start(MockConfig {
            ignore_date_range: true,
            ..Default::default()
        })
        .unwrap();
        let (api, _) = logged_in(&server);

        for date in ["2025-04-30", "2025-05-01", "2025-05-15", "2025-05-31", "2025-06-01"] {
            server.seed_transaction(
                "a@x.com",
                date,
                Decimal::new(100, 0),
                date,
                TransactionType::Expense,
                Category::Food,
            );
        }
        server.seed_transaction(
            "b@x.com",
            "someone else",
            Decimal::new(100, 0),
            "2025-05-10",
            TransactionType::Expense,
            Category::Food,
        );

        let list = api.list_transactions_by_email("a@x.com", &may_2025()).unwrap();
        let dates: Vec<String> = list.iter().map(|t| t.date.to_string()).collect();
        assert_eq!(dates, vec!["2025-05-01", "2025-05-15", "2025-05-31"]);
    }

    #[test]
    fn test_create_appears_once_and_delete_removes() {
        let server = MockFinanceServer::start(MockConfig::default()).unwrap();
        let (api, _) = logged_in(&server);

        let created = api
            .create_transaction(&draft("Groceries", 4550, "2025-05-03", "a@x.com"))
            .unwrap();
        assert_eq!(created.category(), Some(Category::Food));
        assert_eq!(created.amount, Decimal::new(4550, 2));

        let list = api.list_transactions_by_email("a@x.com", &may_2025()).unwrap();
        assert_eq!(list.iter().filter(|t| t.id == created.id).count(), 1);

        api.delete_transaction(created.id).unwrap();
        let list = api.list_transactions_by_email("a@x.com", &may_2025()).unwrap();
        assert!(list.iter().all(|t| t.id != created.id));
    }

    #[test]
    fn test_update_replaces() {
        let server = MockFinanceServer::start(MockConfig::default()).unwrap();
        let (api, _) = logged_in(&server);

        let created = api
            .create_transaction(&draft("Bus", 300, "2025-05-03", "a@x.com"))
            .unwrap();
        let updated = api
            .update_transaction(created.id, &draft("Train", 900, "2025-05-04", "a@x.com"))
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.description, "Train");
        assert_eq!(server.transaction_ids(), vec![created.id]);
    }

    #[test]
    fn test_update_missing_is_server_error() {
        let server = MockFinanceServer::start(MockConfig::default()).unwrap();
        let (api, _) = logged_in(&server);

        let err = api
            .update_transaction(999, &draft("Bus", 300, "2025-05-03", "a@x.com"))
            .unwrap_err();
        match err {
            crate::Error::Server { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Transaction not found");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_summary_balance_matches_totals() {
        let server = MockFinanceServer::start(MockConfig::default()).unwrap();
        let (api, _) = logged_in(&server);

        let seeds = [
            ("Salary", 250000, "2025-05-28", TransactionType::Income, Category::Leisure),
            ("Food", 4550, "2025-05-03", TransactionType::Expense, Category::Food),
            ("Old", 9999, "2025-04-03", TransactionType::Expense, Category::Food),
        ];
        for (description, cents, date, transaction_type, category) in seeds {
            server.seed_transaction(
                "a@x.com",
                description,
                Decimal::new(cents, 2),
                date,
                transaction_type,
                category,
            );
        }

        let summary = api.get_summary("a@x.com", &may_2025()).unwrap();
        assert_eq!(summary.balance, Decimal::new(245450, 2));
        assert!(summary.is_consistent());
        assert_eq!(summary.totals_by_category["Alimentação"], Decimal::new(4550, 2));
    }

    #[test]
    fn test_connection_refused_is_network_error() {
        let base_url = {
            let server = MockFinanceServer::start(MockConfig::default()).unwrap();
            server.base_url()
        };
        let session = Arc::new(SessionStore::new(Box::new(MemoryStore::new())));
        let api = HttpFinanceApi::new(&base_url, session).unwrap();

        let result = api.login("a@x.com", "pw");
        assert!(matches!(result, Err(crate::Error::Network(_))));
    }
}
