//! Result Cache
//!
//! Short-lived, in-memory store of finished analyses keyed by a generated id,
//! so clients fetch results by id instead of carrying the whole payload in a
//! URL. Entries expire after a TTL and the cache never grows past its
//! capacity (oldest entry evicted first).

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::PortfolioAnalysisResult;

/// Identifier handed to the client after a successful analysis
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultId(String);

impl ResultId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ResultId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ResultId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

struct CachedResult {
    result: PortfolioAnalysisResult,
    owner: Option<String>,
    stored_at: DateTime<Utc>,
}

/// Cache sizing
#[derive(Clone, Copy, Debug)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(15),
            capacity: 1024,
        }
    }
}

impl CacheConfig {
    /// Read `SAGE_RESULT_TTL_SECS` and `SAGE_RESULT_CAPACITY`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset or unparsable values fall back to the defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let ttl = lookup("SAGE_RESULT_TTL_SECS")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(defaults.ttl, Duration::seconds);
        let capacity = lookup("SAGE_RESULT_CAPACITY")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.capacity);

        Self { ttl, capacity }
    }
}

/// In-memory result cache
pub struct ResultCache {
    entries: RwLock<HashMap<ResultId, CachedResult>>,
    config: CacheConfig,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Store a result and return its id
    ///
    /// `owner` scopes the entry to one session; `None` makes it readable by anyone
    /// holding the id.
    pub fn insert(&self, result: PortfolioAnalysisResult, owner: Option<&str>) -> ResultId {
        self.insert_at(result, owner, Utc::now())
    }

    fn insert_at(&self, result: PortfolioAnalysisResult, owner: Option<&str>, now: DateTime<Utc>) -> ResultId {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        let ttl = self.config.ttl;
        entries.retain(|_, entry| now - entry.stored_at < ttl);

        while entries.len() >= self.config.capacity.max(1) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    tracing::debug!(result_id = %id, "Evicting oldest cached result");
                    entries.remove(&id);
                }
                None => break,
            }
        }

        let id = ResultId::new();
        entries.insert(
            id.clone(),
            CachedResult {
                result,
                owner: owner.map(str::to_string),
                stored_at: now,
            },
        );
        id
    }

    /// Fetch a live result visible to `requester`
    pub fn get(&self, id: &ResultId, requester: Option<&str>) -> Option<PortfolioAnalysisResult> {
        self.get_at(id, requester, Utc::now())
    }

    fn get_at(&self, id: &ResultId, requester: Option<&str>, now: DateTime<Utc>) -> Option<PortfolioAnalysisResult> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(id)?;

        if now - entry.stored_at >= self.config.ttl {
            return None;
        }
        match entry.owner.as_deref() {
            Some(owner) if Some(owner) != requester => None,
            _ => Some(entry.result.clone()),
        }
    }

    /// Drop every entry owned by a session (used on logout)
    pub fn remove_owned_by(&self, owner: &str) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.owner.as_deref() != Some(owner));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(analysis: &str) -> PortfolioAnalysisResult {
        PortfolioAnalysisResult {
            portfolio: Vec::new(),
            analysis: analysis.into(),
            competitor_analysis: None,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let cache = ResultCache::default();
        let id = cache.insert(result("a"), Some("session-1"));

        assert_eq!(cache.get(&id, Some("session-1")).unwrap().analysis, "a");
        assert!(cache.get(&id, Some("session-2")).is_none());
        assert!(cache.get(&id, None).is_none());
        assert!(cache.get(&ResultId::from_string("nope"), Some("session-1")).is_none());
    }

    #[test]
    fn test_unowned_entries_are_shared() {
        let cache = ResultCache::default();
        let id = cache.insert(result("shared"), None);
        assert!(cache.get(&id, Some("anyone")).is_some());
    }

    #[test]
    fn test_expiry() {
        let cache = ResultCache::new(CacheConfig {
            ttl: Duration::seconds(60),
            capacity: 10,
        });
        let start = Utc::now();
        let id = cache.insert_at(result("a"), None, start);

        assert!(cache.get_at(&id, None, start + Duration::seconds(59)).is_some());
        assert!(cache.get_at(&id, None, start + Duration::seconds(60)).is_none());

        // Expired entries are purged on the next insert
        cache.insert_at(result("b"), None, start + Duration::seconds(120));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = ResultCache::new(CacheConfig {
            ttl: Duration::hours(1),
            capacity: 2,
        });
        let start = Utc::now();
        let first = cache.insert_at(result("1"), None, start);
        let second = cache.insert_at(result("2"), None, start + Duration::seconds(1));
        let third = cache.insert_at(result("3"), None, start + Duration::seconds(2));

        let later = start + Duration::seconds(3);
        assert_eq!(cache.len(), 2);
        assert!(cache.get_at(&first, None, later).is_none());
        assert!(cache.get_at(&second, None, later).is_some());
        assert!(cache.get_at(&third, None, later).is_some());
    }

    #[test]
    fn test_config_from_lookup() {
        let config = CacheConfig::from_lookup(|key| match key {
            "SAGE_RESULT_TTL_SECS" => Some("30".into()),
            "SAGE_RESULT_CAPACITY" => Some("zero".into()),
            _ => None,
        });
        assert_eq!(config.ttl, Duration::seconds(30));
        assert_eq!(config.capacity, 1024);
    }

    #[test]
    fn test_remove_owned_by() {
        let cache = ResultCache::default();
        cache.insert(result("a"), Some("s1"));
        cache.insert(result("b"), Some("s1"));
        cache.insert(result("c"), Some("s2"));

        assert_eq!(cache.remove_owned_by("s1"), 2);
        assert_eq!(cache.len(), 1);
    }
}
