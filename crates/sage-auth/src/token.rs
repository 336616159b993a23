//! Session Tokens
//!
//! Token format: `<session-id>.<expiry-unix-seconds>.<hex hmac-sha256>`, the
//! signature covering `<session-id>.<expiry>`. Tokens are self-checking;
//! revocation is tracked separately by the session store.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AuthError, Result};
use crate::session::SessionId;

type HmacSha256 = Hmac<Sha256>;

/// Contents of a verified token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenClaims {
    pub session_id: SessionId,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies session tokens
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.len() < 16 {
            return Err(AuthError::Config(
                "session secret must be at least 16 bytes".into(),
            ));
        }
        Ok(Self {
            secret: secret.to_vec(),
        })
    }

    /// Signer with a random per-process secret (tokens die with the process)
    pub fn ephemeral() -> Self {
        let mut secret = uuid::Uuid::new_v4().as_bytes().to_vec();
        secret.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
        Self { secret }
    }

    fn mac(&self, payload: &str) -> HmacSha256 {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .unwrap_or_else(|_| unreachable!());
        mac.update(payload.as_bytes());
        mac
    }

    /// Issue a token for a session
    pub fn sign(&self, session_id: &SessionId, expires_at: DateTime<Utc>) -> String {
        let payload = format!("{}.{}", session_id, expires_at.timestamp());
        let signature = hex::encode(self.mac(&payload).finalize().into_bytes());
        format!("{payload}.{signature}")
    }

    /// Check signature and expiry
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims> {
        let mut parts = token.trim().split('.');
        let (Some(id), Some(expiry), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken("malformed token".into()));
        };

        let signature =
            hex::decode(signature).map_err(|_| AuthError::InvalidToken("bad signature encoding".into()))?;

        self.mac(&format!("{id}.{expiry}"))
            .verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken("signature mismatch".into()))?;

        let expires_at = expiry
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .ok_or_else(|| AuthError::InvalidToken("bad expiry".into()))?;

        if now >= expires_at {
            return Err(AuthError::Expired);
        }

        Ok(TokenClaims {
            session_id: SessionId::from_string(id),
            expires_at,
        })
    }
}
