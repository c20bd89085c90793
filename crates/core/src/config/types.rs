use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub orders: OrdersConfig,
    #[serde(default)]
    pub tickets: TicketsConfig,
    #[serde(default)]
    pub messaging: MessagingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration for the bridge-facing API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// API key (required when method = "api_key")
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("quickeats.db")
}

/// Role assignments for the static access control backend.
///
/// Admins implicitly pass every chef check.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub chefs: Vec<String>,
}

/// Pricing and completion detection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrdersConfig {
    /// Debt charged per completed DoorDash order when no amount is given.
    #[serde(default = "default_fee")]
    pub doordash_fee: Decimal,
    /// Debt charged per completed UberEats order when no amount is given.
    #[serde(default = "default_fee")]
    pub ubereats_fee: Decimal,
    /// Amount used by chat-triggered completion when the ticket total can't be parsed.
    #[serde(default = "default_fee")]
    pub fallback_amount: Decimal,
    /// Largest amount a single completion may charge.
    #[serde(default = "default_max_amount")]
    pub max_amount: Decimal,
    /// Regex matched against messages from the assigned chef to auto-complete a ticket.
    #[serde(default = "default_completion_pattern")]
    pub completion_pattern: String,
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            doordash_fee: default_fee(),
            ubereats_fee: default_fee(),
            fallback_amount: default_fee(),
            max_amount: default_max_amount(),
            completion_pattern: default_completion_pattern(),
        }
    }
}

fn default_fee() -> Decimal {
    Decimal::new(500, 2)
}

fn default_max_amount() -> Decimal {
    Decimal::new(100_000, 2)
}

fn default_completion_pattern() -> String {
    r"(?i)\border\s+(placed|complete|completed|delivered)\b".to_string()
}

/// Ticket lifecycle tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TicketsConfig {
    /// Seconds a completed ticket lingers before its record and channel are removed.
    #[serde(default = "default_completion_grace")]
    pub completion_grace_secs: u64,
    /// Seconds between close/cancel and channel deletion.
    #[serde(default = "default_close_grace")]
    pub close_grace_secs: u64,
    /// Active ticket count at which customers get a high demand warning.
    #[serde(default = "default_high_demand_threshold")]
    pub high_demand_threshold: usize,
    /// Which chef statuses may claim tickets.
    #[serde(default)]
    pub claim_policy: ClaimPolicy,
    /// Channel receiving the chef status dashboard, if any.
    #[serde(default)]
    pub status_channel: Option<String>,
    /// Number of chef seats shown on the dashboard ("2/4 chefs open").
    #[serde(default = "default_dashboard_capacity")]
    pub dashboard_capacity: usize,
}

impl Default for TicketsConfig {
    fn default() -> Self {
        Self {
            completion_grace_secs: default_completion_grace(),
            close_grace_secs: default_close_grace(),
            high_demand_threshold: default_high_demand_threshold(),
            claim_policy: ClaimPolicy::default(),
            status_channel: None,
            dashboard_capacity: default_dashboard_capacity(),
        }
    }
}

fn default_completion_grace() -> u64 {
    30
}

fn default_close_grace() -> u64 {
    10
}

fn default_high_demand_threshold() -> usize {
    2
}

fn default_dashboard_capacity() -> usize {
    4
}

/// Chef eligibility for claiming tickets.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClaimPolicy {
    /// Any status except CLOSED may claim.
    #[default]
    NotClosed,
    /// Only OPEN chefs may claim.
    OpenOnly,
}

/// Messaging backend configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MessagingConfig {
    #[serde(default)]
    pub backend: MessagingBackend,
    /// Webhook-specific configuration (required when backend = "webhook")
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

/// Available messaging backends
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessagingBackend {
    /// Log side effects only.
    #[default]
    Log,
    /// Forward side effects to a chat bridge over HTTP.
    Webhook,
}

/// Chat bridge webhook configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookConfig {
    /// Bridge base URL (e.g., "http://localhost:3001")
    pub url: String,
    /// Shared secret sent as a bearer token
    #[serde(default)]
    pub token: Option<String>,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,
}

fn default_webhook_timeout() -> u64 {
    10
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub access: SanitizedAccessConfig,
    pub orders: OrdersConfig,
    pub tickets: TicketsConfig,
    pub messaging: SanitizedMessagingConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub api_key_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAccessConfig {
    pub admin_count: usize,
    pub chef_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedMessagingConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    pub webhook_token_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::ApiKey => "api_key".to_string(),
                },
                api_key_configured: config
                    .auth
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
            },
            server: config.server.clone(),
            database: config.database.clone(),
            access: SanitizedAccessConfig {
                admin_count: config.access.admins.len(),
                chef_count: config.access.chefs.len(),
            },
            orders: config.orders.clone(),
            tickets: config.tickets.clone(),
            messaging: SanitizedMessagingConfig {
                backend: match config.messaging.backend {
                    MessagingBackend::Log => "log".to_string(),
                    MessagingBackend::Webhook => "webhook".to_string(),
                },
                webhook_url: config.messaging.webhook.as_ref().map(|w| w.url.clone()),
                webhook_token_configured: config
                    .messaging
                    .webhook
                    .as_ref()
                    .and_then(|w| w.token.as_ref())
                    .is_some_and(|t| !t.is_empty()),
            },
        }
    }
}

impl Config {
    /// Minimal configuration with defaults everywhere (useful for testing).
    pub fn with_auth(method: AuthMethod) -> Self {
        Self {
            auth: AuthConfig {
                method,
                api_key: None,
            },
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            access: AccessConfig::default(),
            orders: OrdersConfig::default(),
            tickets: TicketsConfig::default(),
            messaging: MessagingConfig::default(),
        }
    }
}
