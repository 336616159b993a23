//! Credential Verification
//!
//! `Authenticator` is the seam for swapping in a real identity system.
//! `StaticCredentials` is a configured allow-list: exact, case-sensitive
//! username match, password compared as a keyed digest in constant time.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AuthError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Verifies a username/password pair
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn verify(&self, username: &str, password: &str) -> bool;
}

struct Credential {
    username: String,
    digest: Vec<u8>,
}

/// Fixed allow-list of username/password pairs
pub struct StaticCredentials {
    key: Vec<u8>,
    entries: Vec<Credential>,
}

impl StaticCredentials {
    /// Build from `(username, password)` pairs
    pub fn new<I, U, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: AsRef<str>,
    {
        let key = uuid::Uuid::new_v4().as_bytes().to_vec();
        let entries = pairs
            .into_iter()
            .map(|(username, password)| Credential {
                username: username.into(),
                digest: digest(&key, password.as_ref()),
            })
            .collect();

        Self { key, entries }
    }

    /// Parse `user:password` pairs separated by commas
    ///
    /// Usernames cannot contain `:`; passwords may. Blank items are skipped.
    pub fn parse(list: &str) -> Result<Self> {
        let mut pairs = Vec::new();
        for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (username, password) = item
                .split_once(':')
                .filter(|(u, p)| !u.is_empty() && !p.is_empty())
                .ok_or_else(|| AuthError::Config(format!("credential entry '{item}' is not user:password")))?;
            pairs.push((username.to_string(), password.to_string()));
        }
        Ok(Self::new(pairs))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn new_mac(key: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length
    <HmacSha256 as Mac>::new_from_slice(key).unwrap_or_else(|_| unreachable!())
}

fn digest(key: &[u8], password: &str) -> Vec<u8> {
    let mut mac = new_mac(key);
    mac.update(password.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

#[async_trait]
impl Authenticator for StaticCredentials {
    async fn verify(&self, username: &str, password: &str) -> bool {
        self.entries
            .iter()
            .filter(|entry| entry.username == username)
            .any(|entry| {
                let mut mac = new_mac(&self.key);
                mac.update(password.as_bytes());
                mac.verify_slice(&entry.digest).is_ok()
            })
    }
}
