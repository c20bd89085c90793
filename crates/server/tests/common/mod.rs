//! Common test utilities for driving the HTTP API in-process.
//!
//! The fixture wires a real engine over a temporary SQLite file, with the
//! chat platform mocked so tests can inspect and break side effects.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use quickeats_core::{
    config::{AccessConfig, DatabaseConfig, TicketsConfig},
    create_audit_system, testing::MockMessenger, AuditStore, AuthMethod, Config,
    NoneAuthenticator, SqliteAuditStore, SqliteChefLedger, SqliteTicketStore,
    StaticAccessControl, TicketEngine,
};

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON error body carries the expected code.
#[macro_export]
macro_rules! assert_error_code {
    ($response:expr, $code:expr) => {
        assert_eq!(
            $response.body["code"], $code,
            "Expected error code {}, got body {}",
            $code, $response.body
        );
    };
}

pub const ADMIN: &str = "admin";
pub const CHEFS: [&str; 2] = ["chef-1", "chef-2"];

/// In-process server with a mocked chat platform.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new().await;
/// let response = fixture.post("/api/v1/tickets", order_body("cust-1")).await;
/// assert_eq!(response.status, StatusCode::CREATED);
/// ```
pub struct TestFixture {
    pub router: Router,
    pub messenger: Arc<MockMessenger>,
    pub audit_store: Arc<dyn AuditStore>,
    /// Keeps the database alive for the fixture's lifetime
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            access: AccessConfig {
                admins: vec![ADMIN.to_string()],
                chefs: CHEFS.iter().map(|c| c.to_string()).collect(),
            },
            tickets: TicketsConfig {
                completion_grace_secs: 0,
                close_grace_secs: 0,
                ..TicketsConfig::default()
            },
            ..Config::with_auth(AuthMethod::None)
        };

        let audit_store: Arc<dyn AuditStore> = Arc::new(
            SqliteAuditStore::new(&db_path).expect("Failed to create audit store"),
        );
        let ticket_store =
            Arc::new(SqliteTicketStore::new(&db_path).expect("Failed to create ticket store"));
        let ledger =
            Arc::new(SqliteChefLedger::new(&db_path).expect("Failed to create chef ledger"));
        let messenger = Arc::new(MockMessenger::new());

        let (audit_handle, audit_writer) = create_audit_system(Arc::clone(&audit_store), 100);
        tokio::spawn(audit_writer.run());

        let engine = TicketEngine::new(
            ticket_store,
            ledger,
            messenger.clone(),
            Arc::new(StaticAccessControl::new(&config.access)),
            config.orders.clone(),
            config.tickets.clone(),
        )
        .expect("Failed to create engine")
        .with_audit(audit_handle.clone());

        let state = Arc::new(quickeats_server::state::AppState::new(
            config,
            Arc::new(NoneAuthenticator),
            engine,
            audit_handle,
            Arc::clone(&audit_store),
        ));

        Self {
            router: quickeats_server::api::create_router(state),
            messenger,
            audit_store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a DELETE request with JSON body.
    pub async fn delete_with_body(&self, path: &str, body: Value) -> TestResponse {
        self.request("DELETE", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    /// Set a chef's status through the API.
    pub async fn set_status(&self, chef_id: &str, status: &str) -> TestResponse {
        self.put(
            &format!("/api/v1/chefs/{}/status", chef_id),
            json!({ "actor_id": chef_id, "status": status }),
        )
        .await
    }

    /// Create a ticket and return its channel id.
    pub async fn create_ticket(&self, customer_id: &str) -> String {
        let response = self.post("/api/v1/tickets", order_body(customer_id)).await;
        assert_status!(response, StatusCode::CREATED);
        response.body["ticket"]["channel_id"]
            .as_str()
            .expect("channel_id missing")
            .to_string()
    }
}

/// Parse a serialized decimal amount for value comparison.
pub fn amount(value: &Value) -> Decimal {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("not a decimal amount: {}", value))
}

/// A DoorDash order request body.
pub fn order_body(customer_id: &str) -> Value {
    json!({
        "customer_id": customer_id,
        "order_type": "doordash",
        "order_link": format!("https://order.example.com/{}", customer_id),
        "total": "$24.50"
    })
}
