use std::sync::Arc;

use shared::domain::AccessToken;
use storage::KeyValueStore;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::ClientError;

/// Storage key holding the bearer token between runs.
pub const TOKEN_KEY: &str = "token";

/// Authenticated identity for the lifetime of the client.
pub struct Session {
    store: Arc<dyn KeyValueStore>,
    token: RwLock<Option<AccessToken>>,
}

impl Session {
    /// Restores any token persisted by an earlier run.
    pub async fn init(store: Arc<dyn KeyValueStore>) -> Result<Self, ClientError> {
        let token = store
            .get_value(TOKEN_KEY)
            .await
            .map_err(ClientError::storage)?
            .filter(|raw| !raw.trim().is_empty())
            .map(AccessToken::new);
        info!(restored = token.is_some(), "session: initialized");
        Ok(Self {
            store,
            token: RwLock::new(token),
        })
    }

    pub async fn token(&self) -> Option<AccessToken> {
        self.token.read().await.clone()
    }

    pub async fn require_token(&self) -> Result<AccessToken, ClientError> {
        self.token().await.ok_or(ClientError::Unauthenticated)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Persists first so a crash never leaves an in-memory-only session.
    pub async fn establish(&self, token: AccessToken) -> Result<(), ClientError> {
        self.store
            .set_value(TOKEN_KEY, token.as_str())
            .await
            .map_err(ClientError::storage)?;
        *self.token.write().await = Some(token);
        info!("session: established");
        Ok(())
    }

    /// Forgets the durable token first; a store failure leaves the
    /// session signed in.
    pub async fn teardown(&self) -> Result<(), ClientError> {
        self.store
            .remove_value(TOKEN_KEY)
            .await
            .map_err(ClientError::storage)?;
        self.token.write().await.take();
        info!("session: cleared");
        Ok(())
    }
}
