//! Entity version counters backing list-response cache invalidation.
//!
//! Every mutation to an entity kind bumps its counter; list caches embed the
//! current counter in their keys, so a bump invalidates every cached page of
//! that kind without issuing deletes. Callers bump explicitly at the mutation
//! site; nothing here hooks into saves.

use async_trait::async_trait;
use dashmap::DashMap;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use crate::error::{Result, ScanError};

/// Cache-versioned entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Owners,
    Repos,
    ScanResults,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Owners => "owners",
            EntityKind::Repos => "repos",
            EntityKind::ScanResults => "scan_results",
        }
    }

    fn redis_key(&self) -> String {
        format!("leakwatch:version:{}", self.as_str())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Version-token service consumed by the HTTP layer and the scan
/// coordinator.
#[async_trait]
pub trait CacheVersions: Send + Sync {
    /// Increment and return the new version.
    async fn bump(&self, kind: EntityKind) -> Result<u64>;

    /// Current version; a kind that has never been bumped reads as 0.
    async fn current(&self, kind: EntityKind) -> Result<u64>;
}

/// Redis-backed counters. INCR is atomic, so concurrent bumps from separate
/// workers never lose an invalidation.
#[derive(Clone)]
pub struct RedisCacheVersions {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisCacheVersions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCacheVersions")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl RedisCacheVersions {
    pub async fn new(redis_url: &str) -> Result<Self> {
        info!("connecting to Redis at {}", redis_url);

        let client = redis::Client::open(redis_url)
            .map_err(|e| ScanError::Internal(format!("Failed to create Redis client: {e}")))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| ScanError::Internal(format!("Failed to connect to Redis: {e}")))?;

        Ok(Self { conn })
    }

    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CacheVersions for RedisCacheVersions {
    async fn bump(&self, kind: EntityKind) -> Result<u64> {
        let mut conn = self.conn.clone();
        let version: u64 = conn
            .incr(kind.redis_key(), 1u64)
            .await
            .map_err(|e| ScanError::Internal(format!("Redis INCR failed: {e}")))?;
        debug!(kind = %kind, version, "bumped cache version");
        Ok(version)
    }

    async fn current(&self, kind: EntityKind) -> Result<u64> {
        let mut conn = self.conn.clone();
        let version: Option<u64> = conn
            .get(kind.redis_key())
            .await
            .map_err(|e| ScanError::Internal(format!("Redis GET failed: {e}")))?;
        Ok(version.unwrap_or(0))
    }
}

/// Process-local counters for tests and cache-disabled deployments.
#[derive(Debug, Default)]
pub struct InMemoryCacheVersions {
    counters: DashMap<EntityKind, AtomicU64>,
}

impl InMemoryCacheVersions {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheVersions for InMemoryCacheVersions {
    async fn bump(&self, kind: EntityKind) -> Result<u64> {
        let counter = self.counters.entry(kind).or_insert_with(|| AtomicU64::new(0));
        Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn current(&self, kind: EntityKind) -> Result<u64> {
        Ok(self
            .counters
            .get(&kind)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0))
    }
}
