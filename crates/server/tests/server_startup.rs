use std::io::Write;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tempfile::{NamedTempFile, TempDir};
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Config with the database inside `dir`
fn config_with_db(port: u16, dir: &Path) -> String {
    format!(
        r#"
[auth]
method = "none"

[server]
host = "127.0.0.1"
port = {}

[database]
path = "{}"

[access]
admins = ["admin"]
chefs = ["chef-1"]
"#,
        port,
        dir.join("quickeats.db").display()
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_quickeats"))
        .env("QUICKEATS_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_health_config_and_metrics() {
    let port = get_available_port();
    let dir = TempDir::new().unwrap();
    let config = write_config(&config_with_db(port, dir.path()));
    let mut server = spawn_server(config.path()).await;

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let base = format!("http://127.0.0.1:{}/api/v1", port);

    let json: serde_json::Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["status"], "ok");

    let json: serde_json::Value = client
        .get(format!("{}/config", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["auth"]["method"], "none");
    assert_eq!(json["server"]["port"], port);
    assert_eq!(json["access"]["admin_count"], 1);

    let response = client.get(format!("{}/metrics", base)).send().await.unwrap();
    assert!(response.status().is_success());
    let text = response.text().await.unwrap();
    assert!(text.contains("quickeats_http_requests_total"));

    server.kill().await.ok();
}

#[tokio::test]
async fn test_ledger_survives_restart() {
    let port = get_available_port();
    let dir = TempDir::new().unwrap();
    let config = write_config(&config_with_db(port, dir.path()));
    let client = Client::new();
    let base = format!("http://127.0.0.1:{}/api/v1", port);

    let mut server = spawn_server(config.path()).await;
    assert!(wait_for_server(port, 40).await, "Server did not start in time");

    let response = client
        .put(format!("{}/chefs/chef-1/status", base))
        .json(&json!({ "actor_id": "chef-1", "status": "OPEN", "name": "Marco" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/tickets", base))
        .json(&json!({
            "customer_id": "cust-1",
            "order_type": "ubereats",
            "order_link": "https://order.example.com/1",
            "total": "$12.00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    server.kill().await.ok();
    let _ = server.wait().await;

    let mut server = spawn_server(config.path()).await;
    assert!(wait_for_server(port, 40).await, "Server did not restart in time");

    let chefs: serde_json::Value = client
        .get(format!("{}/chefs", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(chefs[0]["name"], "Marco");
    assert_eq!(chefs[0]["status"], "OPEN");

    let active: serde_json::Value = client
        .get(format!("{}/tickets?actor_id=admin", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(active["tickets"][0]["customer_id"], "cust-1");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_quickeats"))
            .env("QUICKEATS_CONFIG", "/nonexistent/config.toml")
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_missing_auth_section_exits_with_error() {
    let config = write_config(
        r#"
[server]
port = 8080
"#,
    );

    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_quickeats"))
            .env("QUICKEATS_CONFIG", config.path())
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}
