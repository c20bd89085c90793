use async_trait::async_trait;

use super::{AuthError, Authenticator, Credentials, Identity};

/// Shared-secret authentication for the bridge.
///
/// The key may arrive as `Authorization: Bearer <key>` or `X-API-Key: <key>`.
pub struct ApiKeyAuthenticator {
    key: String,
}

impl ApiKeyAuthenticator {
    pub fn new(key: String) -> Self {
        Self { key }
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let provided = credentials
            .bearer_token()
            .or_else(|| credentials.header("x-api-key"))
            .ok_or(AuthError::NotAuthenticated)?;

        if !keys_match(provided.as_bytes(), self.key.as_bytes()) {
            return Err(AuthError::InvalidCredentials("Invalid API key".to_string()));
        }

        Ok(Identity {
            principal: "bridge".to_string(),
            method: "api_key",
        })
    }

    fn method_name(&self) -> &'static str {
        "api_key"
    }
}

/// Length-checked comparison that touches every byte.
fn keys_match(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
