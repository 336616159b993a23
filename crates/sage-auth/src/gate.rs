//! Session Gate
//!
//! Two states per client: unauthenticated, authenticated. `login` moves to
//! authenticated when the injected [`Authenticator`] accepts the pair,
//! `logout` moves back. Every protected request goes through `authorize`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::credentials::{Authenticator, StaticCredentials};
use crate::error::{AuthError, Result};
use crate::session::{MemorySessionStore, Session, SessionStore};
use crate::token::TokenSigner;

/// Gate configuration
pub struct AuthConfig {
    pub credentials: StaticCredentials,
    pub signer: TokenSigner,
    pub session_ttl: Duration,
}

impl AuthConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = match lookup("SAGE_CREDENTIALS") {
            Some(list) => StaticCredentials::parse(&list)?,
            None => StaticCredentials::new(Vec::<(String, String)>::new()),
        };

        let signer = match lookup("SAGE_SESSION_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => TokenSigner::new(secret)?,
            None => TokenSigner::ephemeral(),
        };

        let minutes = lookup("SAGE_SESSION_TTL_MINUTES")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|m| *m > 0)
            .unwrap_or(12 * 60);

        Ok(Self {
            credentials,
            signer,
            session_ttl: Duration::minutes(minutes),
        })
    }
}

/// What a successful login hands back
#[derive(Clone, Debug, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues, checks and revokes sessions
pub struct SessionManager {
    authenticator: Arc<dyn Authenticator>,
    store: Arc<dyn SessionStore>,
    signer: TokenSigner,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        store: Arc<dyn SessionStore>,
        signer: TokenSigner,
        ttl: Duration,
    ) -> Self {
        Self {
            authenticator,
            store,
            signer,
            ttl,
        }
    }

    /// Build from config with the static allow-list and an in-memory store
    pub fn from_config(config: AuthConfig) -> Self {
        Self::new(
            Arc::new(config.credentials),
            Arc::new(MemorySessionStore::new()),
            config.signer,
            config.session_ttl,
        )
    }

    /// Verify credentials and open a session
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken> {
        if !self.authenticator.verify(username, password).await {
            tracing::warn!(username = %username, "Login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        if let Ok(purged) = self.store.purge_expired(now) {
            if purged > 0 {
                tracing::debug!(purged, "Purged expired sessions");
            }
        }

        let session = Session::new(username, now + self.ttl);
        self.store.save(&session)?;

        tracing::info!(session_id = %session.id, username = %username, "Session opened");

        Ok(IssuedToken {
            token: self.signer.sign(&session.id, session.expires_at),
            expires_at: session.expires_at,
        })
    }

    /// Check a bearer token; called on every protected request
    pub fn authorize(&self, token: &str) -> Result<Session> {
        self.authorize_at(token, Utc::now())
    }

    fn authorize_at(&self, token: &str, now: DateTime<Utc>) -> Result<Session> {
        let claims = self.signer.verify(token, now)?;

        let session = self
            .store
            .load(&claims.session_id)?
            .ok_or_else(|| AuthError::InvalidToken("unknown session".into()))?;

        if !session.active {
            return Err(AuthError::Revoked);
        }
        if !session.is_valid_at(now) {
            return Err(AuthError::Expired);
        }
        Ok(session)
    }

    /// Revoke the session behind a token
    pub fn logout(&self, token: &str) -> Result<Session> {
        let session = self.authorize(token)?;
        self.store.revoke(&session.id)?;
        tracing::info!(session_id = %session.id, username = %session.username, "Session closed");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        SessionManager::new(
            Arc::new(StaticCredentials::new([("Rut", "Patel")])),
            Arc::new(MemorySessionStore::new()),
            TokenSigner::ephemeral(),
            Duration::minutes(30),
        )
    }

    #[tokio::test]
    async fn test_login_authorize_logout() {
        let gate = manager();
        let issued = gate.login("Rut", "Patel").await.unwrap();

        let session = gate.authorize(&issued.token).unwrap();
        assert_eq!(session.username, "Rut");

        gate.logout(&issued.token).unwrap();
        assert_eq!(gate.authorize(&issued.token).unwrap_err(), AuthError::Revoked);
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let gate = manager();
        let err = gate.login("Rut", "patel").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
        assert_eq!(err.to_string(), "Invalid username or password.");
    }

    #[tokio::test]
    async fn test_expiry_is_enforced() {
        let gate = manager();
        let issued = gate.login("Rut", "Patel").await.unwrap();
        let later = Utc::now() + Duration::minutes(31);
        assert_eq!(gate.authorize_at(&issued.token, later).unwrap_err(), AuthError::Expired);
    }

    #[tokio::test]
    async fn test_token_from_another_gate_is_rejected() {
        let issued = manager().login("Rut", "Patel").await.unwrap();
        assert!(matches!(manager().authorize(&issued.token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_config_from_lookup() {
        let config = AuthConfig::from_lookup(|key| match key {
            "SAGE_CREDENTIALS" => Some("Rut:Patel".into()),
            "SAGE_SESSION_TTL_MINUTES" => Some("5".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.credentials.len(), 1);
        assert_eq!(config.session_ttl, Duration::minutes(5));
    }

    #[test]
    fn test_config_rejects_short_secret() {
        let result = AuthConfig::from_lookup(|key| (key == "SAGE_SESSION_SECRET").then(|| "tiny".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_issued_token_serializes() {
        let issued = IssuedToken {
            token: "t".into(),
            expires_at: Utc::now(),
        };
        let json = serde_json::to_value(&issued).unwrap();
        assert_eq!(json["token"], "t");
    }
}
