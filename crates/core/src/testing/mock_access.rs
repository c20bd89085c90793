//! Mock access control for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::access::{AccessControl, AccessError, Capabilities};

/// Role table that tests can edit while the engine is running.
///
/// Unknown users have no roles.
#[derive(Debug, Default)]
pub struct MockAccessControl {
    roles: Arc<RwLock<HashMap<String, Capabilities>>>,
    failing: Arc<RwLock<bool>>,
}

impl MockAccessControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_capabilities(&self, user_id: &str, caps: Capabilities) {
        self.roles.write().await.insert(user_id.to_string(), caps);
    }

    pub async fn grant_admin(&self, user_id: &str) {
        self.set_capabilities(user_id, Capabilities::admin()).await;
    }

    pub async fn grant_chef(&self, user_id: &str) {
        self.set_capabilities(user_id, Capabilities::chef()).await;
    }

    /// Make every lookup fail.
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }
}

#[async_trait]
impl AccessControl for MockAccessControl {
    async fn capabilities(&self, user_id: &str) -> Result<Capabilities, AccessError> {
        if *self.failing.read().await {
            return Err(AccessError::Lookup("mock lookup failure".to_string()));
        }
        Ok(self
            .roles
            .read()
            .await
            .get(user_id)
            .copied()
            .unwrap_or(Capabilities::NONE))
    }
}
