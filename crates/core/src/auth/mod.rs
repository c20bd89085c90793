//! Authentication of the bridge process calling the command API.
//!
//! This guards the HTTP surface only. Which chat users may do what is decided
//! by [`crate::access`].

mod api_key;

pub use api_key::ApiKeyAuthenticator;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::{AuthConfig, AuthMethod};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Request headers relevant to authentication, keyed by lowercase name.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub headers: HashMap<String, String>,
}

impl Credentials {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Token from `Authorization: Bearer <token>`, scheme matched case-insensitively.
    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.header("authorization")?;
        let (scheme, token) = value.split_once(' ')?;
        scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
    }
}

/// Caller accepted by an authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub principal: String,
    pub method: &'static str,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            principal: "anonymous".to_string(),
            method: "none",
        }
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, AuthError>;

    fn method_name(&self) -> &'static str;
}

/// Accepts every request. Must be chosen explicitly in the config.
#[derive(Debug, Default)]
pub struct NoneAuthenticator;

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, _credentials: &Credentials) -> Result<Identity, AuthError> {
        Ok(Identity::anonymous())
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}

/// Build the authenticator selected in the config.
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator)),
        AuthMethod::ApiKey => {
            let key = config
                .api_key
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| {
                    AuthError::ConfigurationError(
                        "api_key must be set when using the api_key method".to_string(),
                    )
                })?;
            Ok(Box::new(ApiKeyAuthenticator::new(key)))
        }
    }
}
